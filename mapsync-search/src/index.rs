use rayon::prelude::*;
use tracing::{debug, info};

use mapsync_core::{Entity, LngLat};

use crate::request::SearchRequest;
use crate::worker::QueryExecutor;

/// Default cap on entities returned per query.
pub const DEFAULT_RESULT_LIMIT: usize = 200;

/// A reference backend holding every entity in memory.
///
/// Matches entities inside the request bounds whose name contains the query
/// (case-insensitive; an empty query matches everything). Output keeps the
/// index's insertion order; no ranking is applied.
#[derive(Debug, Clone)]
pub struct InMemoryIndex {
    entities: Vec<Entity>,
    limit: usize,
}

impl InMemoryIndex {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Load entities from a JSON array.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let entities: Vec<Entity> = serde_json::from_str(json)?;
        info!("Loaded {} entities into the in-memory index", entities.len());
        Ok(Self::new(entities))
    }

    /// A `rows × cols` grid of entities around `center`, `spacing` degrees apart.
    ///
    /// Ids are `biz-0`, `biz-1`, ... in row-major order.
    pub fn demo_grid(center: LngLat, rows: u32, cols: u32, spacing: f64) -> Self {
        let half_r = (rows.saturating_sub(1)) as f64 / 2.0;
        let half_c = (cols.saturating_sub(1)) as f64 / 2.0;
        let mut entities = Vec::with_capacity((rows * cols) as usize);
        for r in 0..rows {
            for c in 0..cols {
                let n = r * cols + c;
                let pos = LngLat::new(
                    center.lng + (c as f64 - half_c) * spacing,
                    center.lat + (r as f64 - half_r) * spacing,
                );
                entities.push(Entity::new(format!("biz-{n}"), pos).with_name(format!("Business {n}")));
            }
        }
        Self::new(entities)
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl QueryExecutor for InMemoryIndex {
    fn execute(&self, request: &SearchRequest) -> Vec<Entity> {
        let needle = request.query.trim().to_lowercase();
        let mut hits: Vec<Entity> = self
            .entities
            .par_iter()
            .filter(|e| request.bounds.contains(e.coordinates))
            .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if hits.len() > self.limit {
            debug!(
                sequence = request.sequence,
                total = hits.len(),
                limit = self.limit,
                "Truncating results"
            );
            hits.truncate(self.limit);
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use mapsync_core::BoundingBox;

    use super::*;

    fn request(bounds: BoundingBox, query: &str) -> SearchRequest {
        SearchRequest {
            sequence: 1,
            bounds,
            zoom: 12.0,
            query: query.into(),
        }
    }

    #[test]
    fn filters_by_bounds() {
        let index = InMemoryIndex::demo_grid(LngLat::new(-74.0, 40.0), 5, 5, 0.1);
        assert_eq!(index.len(), 25);
        let bounds = BoundingBox::around(LngLat::new(-74.0, 40.0), 0.05, 0.05).unwrap();
        let hits = index.execute(&request(bounds, ""));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "biz-12");
    }

    #[test]
    fn filters_by_name() {
        let json = r#"[
            {"id":"a","coordinates":{"lng":0.0,"lat":0.0},"name":"Pizza Place"},
            {"id":"b","coordinates":{"lng":0.1,"lat":0.1},"name":"Book Shop"}
        ]"#;
        let index = InMemoryIndex::from_json(json).unwrap();
        let bounds = BoundingBox::around(LngLat::new(0.0, 0.0), 1.0, 1.0).unwrap();
        let hits = index.execute(&request(bounds, "PIZZA"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "a");
        assert_eq!(index.execute(&request(bounds, "")).len(), 2);
    }

    #[test]
    fn respects_limit_and_order() {
        let index = InMemoryIndex::demo_grid(LngLat::new(0.0, 0.0), 10, 10, 0.01).with_limit(3);
        let bounds = BoundingBox::around(LngLat::new(0.0, 0.0), 1.0, 1.0).unwrap();
        let hits = index.execute(&request(bounds, ""));
        let ids: Vec<_> = hits.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["biz-0", "biz-1", "biz-2"]);
    }

    #[test]
    fn malformed_fixture_is_an_error() {
        assert!(InMemoryIndex::from_json("{not json").is_err());
    }
}
