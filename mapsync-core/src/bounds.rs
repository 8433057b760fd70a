use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::{check_range, wrap_longitude, LngLat};

/// The geographic rectangle visible on the map surface.
///
/// A box with `west > east` crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> crate::Result<Self> {
        Self {
            north,
            south,
            east,
            west,
        }
        .validated()
    }

    /// A box spanning `half_lat` / `half_lng` degrees either side of `center`.
    ///
    /// Longitudes wrap; latitudes clamp to the poles.
    pub fn around(center: LngLat, half_lat: f64, half_lng: f64) -> crate::Result<Self> {
        let (east, west) = if half_lng >= 180.0 {
            (180.0, -180.0)
        } else {
            (
                wrap_longitude(center.lng + half_lng),
                wrap_longitude(center.lng - half_lng),
            )
        };
        Self::new(
            (center.lat + half_lat).min(90.0),
            (center.lat - half_lat).max(-90.0),
            east,
            west,
        )
    }

    pub fn validated(self) -> crate::Result<Self> {
        check_range("north", self.north, -90.0, 90.0)?;
        check_range("south", self.south, -90.0, 90.0)?;
        check_range("east", self.east, -180.0, 180.0)?;
        check_range("west", self.west, -180.0, 180.0)?;
        if self.north < self.south {
            return Err(CoreError::InvalidBounds {
                reason: format!("north {} is below south {}", self.north, self.south),
            });
        }
        Ok(self)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether `pos` lies inside the box, edges included.
    pub fn contains(&self, pos: LngLat) -> bool {
        if !pos.is_finite() || pos.lat > self.north || pos.lat < self.south {
            return false;
        }
        if self.crosses_antimeridian() {
            pos.lng >= self.west || pos.lng <= self.east
        } else {
            pos.lng >= self.west && pos.lng <= self.east
        }
    }

    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    pub fn width_deg(&self) -> f64 {
        if self.crosses_antimeridian() {
            360.0 - (self.west - self.east)
        } else {
            self.east - self.west
        }
    }

    pub fn center(&self) -> LngLat {
        let lat = (self.north + self.south) / 2.0;
        let lng = wrap_longitude(self.west + self.width_deg() / 2.0);
        LngLat::new(lng, lat)
    }
}

/// A bounding box and zoom level read from the engine at one instant.
///
/// Only meaningful until the next viewport mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsSnapshot {
    pub bounds: BoundingBox,
    pub zoom: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn contains_inclusive_edges() {
        let b = BoundingBox::new(41.0, 40.0, -73.0, -75.0).unwrap();
        assert!(b.contains(LngLat::new(-74.0, 40.5)));
        assert!(b.contains(LngLat::new(-75.0, 41.0)));
        assert!(!b.contains(LngLat::new(-72.9, 40.5)));
        assert!(!b.contains(LngLat::new(-74.0, 41.1)));
        assert!(!b.contains(LngLat::new(f64::NAN, 40.5)));
    }

    #[test]
    fn antimeridian_box() {
        let b = BoundingBox::new(10.0, -10.0, -170.0, 170.0).unwrap();
        assert!(b.crosses_antimeridian());
        assert!(b.contains(LngLat::new(175.0, 0.0)));
        assert!(b.contains(LngLat::new(-175.0, 0.0)));
        assert!(!b.contains(LngLat::new(0.0, 0.0)));
        assert!((b.width_deg() - 20.0).abs() < EPSILON);
        assert!((b.center().lng.abs() - 180.0).abs() < EPSILON);
    }

    #[test]
    fn inverted_latitudes_are_rejected() {
        assert!(matches!(
            BoundingBox::new(10.0, 20.0, 5.0, 0.0),
            Err(CoreError::InvalidBounds { .. })
        ));
        assert!(BoundingBox::new(f64::NAN, 0.0, 5.0, 0.0).is_err());
    }

    #[test]
    fn around_centers_the_box() {
        let b = BoundingBox::around(LngLat::new(-74.0, 40.5), 0.1, 0.2).unwrap();
        let c = b.center();
        assert!((c.lat - 40.5).abs() < EPSILON);
        assert!((c.lng - (-74.0)).abs() < EPSILON);
        assert!((b.height_deg() - 0.2).abs() < EPSILON);
    }

    #[test]
    fn around_wraps_across_the_antimeridian() {
        let b = BoundingBox::around(LngLat::new(179.0, 0.0), 1.0, 2.0).unwrap();
        assert!(b.crosses_antimeridian());
        assert!(b.contains(LngLat::new(-179.5, 0.0)));
    }
}
