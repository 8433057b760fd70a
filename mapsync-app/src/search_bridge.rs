use std::time::Instant;

use tracing::warn;

use mapsync_search::{SearchError, SearchResponse, SearchTransport};

use crate::controller::{current_bounds, MapController};
use crate::engine::MapEngine;
use crate::signal::ControllerSignal;

impl<E: MapEngine, T: SearchTransport> MapController<E, T> {
    /// Advance timers and collect search responses. Call from the event
    /// loop at least as often as [`next_deadline`](Self::next_deadline).
    pub fn tick(&mut self, now: Instant) {
        self.poll_dispatcher(now);
        self.poll_responses();
        self.resilience.poll(now, &mut self.engine);
    }

    /// Earliest instant at which [`tick`](Self::tick) has timed work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.dispatcher.next_deadline(), self.resilience.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Change the free-text query; a changed query schedules a search.
    pub fn set_query(&mut self, text: impl Into<String>, now: Instant) {
        self.dispatcher.set_query(text, now);
    }

    pub fn query(&self) -> &str {
        self.dispatcher.query()
    }

    /// Whether a dispatched search still has no applied answer.
    pub fn is_awaiting_results(&self) -> bool {
        self.reconciler.is_awaiting()
    }

    fn poll_dispatcher(&mut self, now: Instant) {
        let degraded = self.resilience.is_degraded();
        let (extractor, engine, store) = (&self.extractor, &self.engine, &mut self.store);
        let request = self
            .dispatcher
            .poll(now, || current_bounds(extractor, engine, store, degraded));
        let Some(request) = request else {
            return;
        };

        let sequence = request.sequence;
        self.reconciler.note_dispatched(sequence);
        if let Err(e) = self.transport.dispatch(request) {
            warn!(sequence, "Search dispatch failed: {e}");
        }
    }

    fn poll_responses(&mut self) {
        while let Some(response) = self.transport.try_recv() {
            self.apply_response(response);
        }
    }

    /// Reconcile one response and re-validate the selection against it.
    pub fn apply_response(&mut self, response: SearchResponse) {
        let published = self
            .reconciler
            .apply(response)
            .map(|set| (set.sequence(), set.len()));
        match published {
            Ok((sequence, count)) => {
                self.signals
                    .push(ControllerSignal::ResultsPublished { sequence, count });
                self.selection
                    .on_results_changed(self.reconciler.results(), &mut self.signals);
            }
            // Already logged at debug level by the reconciler.
            Err(SearchError::StaleResponse { .. }) => {}
            Err(e) => warn!("Search response dropped: {e}"),
        }
    }
}
