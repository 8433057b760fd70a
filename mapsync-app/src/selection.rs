use serde::{Deserialize, Serialize};
use tracing::debug;

use mapsync_core::{BoundingBox, EntityId, LngLat};
use mapsync_search::ResultSet;

use crate::signal::ControllerSignal;

/// Where a selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// A row in the result list; the row is already visible.
    #[default]
    List,
    /// A marker on the map; the list has to scroll to the row.
    Marker,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub active_id: Option<EntityId>,
    /// A re-center toward the active entity is under way.
    pub centering: bool,
}

/// Owner of the single active entity.
///
/// Reads the result set and bounds it is handed but never mutates them;
/// re-centering is returned to the caller as a target position.
#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    state: SelectionState,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn active_id(&self) -> Option<&EntityId> {
        self.state.active_id.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.active_id.is_some()
    }

    pub fn is_centering(&self) -> bool {
        self.state.centering
    }

    /// Make `id` the active entity.
    ///
    /// Returns where the viewport should be centred, or `None` when the
    /// entity is unknown or its coordinates are unusable. An entity with
    /// invalid coordinates is still selected and its panel still opens.
    pub fn select(
        &mut self,
        id: &EntityId,
        source: SelectionSource,
        results: &ResultSet,
        signals: &mut Vec<ControllerSignal>,
    ) -> Option<LngLat> {
        let Some(entity) = results.get(id) else {
            debug!(%id, "Ignoring selection of an entity outside the result set");
            return None;
        };

        if self.state.active_id.as_ref() != Some(id) {
            self.state.active_id = Some(id.clone());
            signals.push(ControllerSignal::PanelOpened(id.clone()));
        }
        if source == SelectionSource::Marker {
            signals.push(ControllerSignal::ScrollListTo(id.clone()));
        }

        if entity.has_valid_coordinates() {
            self.state.centering = true;
            Some(entity.coordinates)
        } else {
            debug!(%id, "Selected entity has invalid coordinates, not centering");
            self.state.centering = false;
            None
        }
    }

    /// Drop the selection. Returns `false` when nothing was selected.
    pub fn clear(&mut self, signals: &mut Vec<ControllerSignal>) -> bool {
        self.state.centering = false;
        match self.state.active_id.take() {
            Some(id) => {
                debug!(%id, "Selection cleared");
                signals.push(ControllerSignal::PanelClosed);
                true
            }
            None => false,
        }
    }

    /// The centering move has landed (or was abandoned).
    pub fn end_centering(&mut self) {
        self.state.centering = false;
    }

    /// Clear the selection if the active entity is outside `bounds`.
    ///
    /// Skipped while centering, and for entities without a usable position
    /// since those are never on the map. Returns whether it cleared.
    pub fn on_bounds_changed(
        &mut self,
        bounds: &BoundingBox,
        results: &ResultSet,
        signals: &mut Vec<ControllerSignal>,
    ) -> bool {
        if self.state.centering {
            return false;
        }
        let Some(entity) = self.state.active_id.as_ref().and_then(|id| results.get(id)) else {
            return false;
        };
        if !entity.has_valid_coordinates() || bounds.contains(entity.coordinates) {
            return false;
        }
        debug!(id = %entity.id, "Active entity left the visible bounds");
        self.clear(signals)
    }

    /// Clear the selection if the active entity is absent from `results`.
    pub fn on_results_changed(
        &mut self,
        results: &ResultSet,
        signals: &mut Vec<ControllerSignal>,
    ) -> bool {
        if self.state.centering {
            return false;
        }
        match &self.state.active_id {
            Some(id) if !results.contains(id) => {
                debug!(%id, sequence = results.sequence(), "Active entity dropped from results");
                self.clear(signals)
            }
            _ => false,
        }
    }
}
