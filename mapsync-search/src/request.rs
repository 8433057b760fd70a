use std::fmt;

use serde::{Deserialize, Serialize};

use mapsync_core::{BoundingBox, Entity};

/// Why the dispatcher was notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    MoveStart,
    MoveEnd,
    ZoomEnd,
    QueryChanged,
    /// The engine became usable for the first time.
    EngineReady,
}

impl Trigger {
    pub fn label(self) -> &'static str {
        match self {
            Self::MoveStart => "move-start",
            Self::MoveEnd => "move-end",
            Self::ZoomEnd => "zoom-end",
            Self::QueryChanged => "query-changed",
            Self::EngineReady => "engine-ready",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One geospatial query, as handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Strictly increasing per dispatcher; pairs the request with its response.
    pub sequence: u64,
    pub bounds: BoundingBox,
    pub zoom: f64,
    pub query: String,
}

impl SearchRequest {
    /// Build the response for this request.
    pub fn respond(&self, entities: Vec<Entity>) -> SearchResponse {
        SearchResponse {
            sequence: self.sequence,
            entities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub sequence: u64,
    pub entities: Vec<Entity>,
}
