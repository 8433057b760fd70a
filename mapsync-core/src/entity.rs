use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// Identifier of a search result, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A search result as delivered by the backend.
///
/// Everything beyond `id` and `coordinates` is opaque to the controller and
/// carried through to the list UI untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub coordinates: LngLat,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, coordinates: LngLat) -> Self {
        Self {
            id: id.into(),
            coordinates,
            name: String::new(),
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.coordinates.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_record() {
        let json = r#"{"id":"biz-42","coordinates":{"lng":-74.0,"lat":40.5}}"#;
        let e: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(e.id, EntityId::from("biz-42"));
        assert_eq!(e.coordinates, LngLat::new(-74.0, 40.5));
        assert!(e.name.is_empty());
        assert!(e.properties.is_empty());
    }

    #[test]
    fn keeps_opaque_properties() {
        let json = r#"{"id":"a","coordinates":{"lng":0.0,"lat":0.0},"name":"Cafe","properties":{"rating":4.5}}"#;
        let e: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(e.name, "Cafe");
        assert_eq!(e.properties["rating"], serde_json::json!(4.5));
    }

    #[test]
    fn invalid_coordinates_are_detected() {
        assert!(Entity::new("ok", LngLat::new(10.0, 10.0)).has_valid_coordinates());
        assert!(!Entity::new("bad", LngLat::new(f64::NAN, 10.0)).has_valid_coordinates());
        assert!(!Entity::new("far", LngLat::new(200.0, 10.0)).has_valid_coordinates());
    }
}
