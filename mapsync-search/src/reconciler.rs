use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mapsync_core::{Entity, EntityId};

use crate::error::SearchError;
use crate::request::SearchResponse;

/// Which responses count as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Apply any response newer than the last applied one. Intermediate
    /// results may show briefly while a newer request is still in flight.
    #[default]
    NewerThanApplied,
    /// Apply only the response to the most recently dispatched request.
    LatestDispatchedOnly,
}

/// An immutable, shareable snapshot of the published results.
#[derive(Debug, Clone)]
pub struct ResultSet {
    sequence: u64,
    entities: Arc<[Entity]>,
    index: Arc<HashMap<EntityId, usize>>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new(0, Vec::new())
    }
}

impl ResultSet {
    pub fn new(sequence: u64, entities: Vec<Entity>) -> Self {
        let mut index = HashMap::with_capacity(entities.len());
        for (i, e) in entities.iter().enumerate() {
            // First occurrence wins on duplicate ids.
            index.entry(e.id.clone()).or_insert(i);
        }
        Self {
            sequence,
            entities: entities.into(),
            index: Arc::new(index),
        }
    }

    /// Sequence of the response this set came from; 0 for the initial empty set.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Owner of the published result set.
///
/// Responses may arrive in any order. A response is applied only when it is
/// newer than everything applied so far, so the published set never moves
/// backwards in sequence.
#[derive(Debug, Default)]
pub struct ResultReconciler {
    policy: StalePolicy,
    latest_dispatched: u64,
    latest_applied: u64,
    discarded: u64,
    results: ResultSet,
}

impl ResultReconciler {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Record that a request with `sequence` has gone out.
    pub fn note_dispatched(&mut self, sequence: u64) {
        self.latest_dispatched = self.latest_dispatched.max(sequence);
    }

    /// Apply a response, replacing the published set in one step.
    ///
    /// Stale responses come back as [`SearchError::StaleResponse`]; callers
    /// are expected to drop them quietly.
    pub fn apply(&mut self, response: SearchResponse) -> crate::Result<&ResultSet> {
        let sequence = response.sequence;
        if sequence > self.latest_dispatched {
            return Err(SearchError::UnknownSequence {
                sequence,
                latest_dispatched: self.latest_dispatched,
            });
        }

        let stale = match self.policy {
            StalePolicy::NewerThanApplied => sequence <= self.latest_applied,
            StalePolicy::LatestDispatchedOnly => {
                sequence <= self.latest_applied || sequence != self.latest_dispatched
            }
        };
        if stale {
            self.discarded += 1;
            debug!(
                sequence,
                latest_applied = self.latest_applied,
                latest_dispatched = self.latest_dispatched,
                "Discarding stale response"
            );
            return Err(SearchError::StaleResponse {
                sequence,
                latest: self.latest_applied,
            });
        }

        self.latest_applied = sequence;
        self.results = ResultSet::new(sequence, response.entities);
        debug!(sequence, count = self.results.len(), "Applied search response");
        Ok(&self.results)
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn latest_applied(&self) -> u64 {
        self.latest_applied
    }

    pub fn latest_dispatched(&self) -> u64 {
        self.latest_dispatched
    }

    /// Responses dropped as stale so far.
    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    /// Whether a dispatched request still has no applied answer.
    pub fn is_awaiting(&self) -> bool {
        self.latest_applied < self.latest_dispatched
    }
}
