use mapsync_core::EntityId;

/// Notifications for the list/panel UI, drained from
/// [`MapController::drain_signals`](crate::MapController::drain_signals).
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerSignal {
    /// A new result set replaced the previous one.
    ResultsPublished { sequence: u64, count: usize },
    PanelOpened(EntityId),
    PanelClosed,
    /// Bring this entity's row into view in the result list.
    ScrollListTo(EntityId),
    /// Recovery keeps failing; map interaction may be impaired.
    MapDegraded,
    MapRecovered,
}
