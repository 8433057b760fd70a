use thiserror::Error;

/// Errors originating from query dispatch and reconciliation.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Superseded by a newer response. Expected during normal operation.
    #[error("stale response {sequence} (latest applied {latest})")]
    StaleResponse { sequence: u64, latest: u64 },

    #[error("response {sequence} was never dispatched (latest dispatched {latest_dispatched})")]
    UnknownSequence { sequence: u64, latest_dispatched: u64 },

    #[error("search transport closed")]
    TransportClosed,

    #[error("invalid entity fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] mapsync_core::CoreError),
}
