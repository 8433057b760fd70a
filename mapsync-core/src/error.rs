use thiserror::Error;

/// Errors originating from the geographic data model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinate: {field} = {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("invalid bounds: {reason}")]
    InvalidBounds { reason: String },
}
