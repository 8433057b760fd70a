use thiserror::Error;

/// Errors surfaced by the map controller and the session tooling around it.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The engine cannot be trusted for bounds right now. Recovered by
    /// skipping the query; the next gesture tries again.
    #[error("map engine not ready: {reason}")]
    EngineNotReady { reason: String },

    #[error("map engine transform fault: {message}")]
    TransformFault { message: String },

    #[error("invalid session script: {0}")]
    Script(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] mapsync_core::CoreError),

    #[error(transparent)]
    Search(#[from] mapsync_search::SearchError),
}

impl ControllerError {
    pub(crate) fn not_ready(reason: impl Into<String>) -> Self {
        Self::EngineNotReady {
            reason: reason.into(),
        }
    }
}
