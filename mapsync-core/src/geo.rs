use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Latitude limit of the Web-Mercator projection.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Check that both components are finite and inside the geographic range.
    pub fn validate(&self) -> crate::Result<Self> {
        check_range("latitude", self.lat, -90.0, 90.0)?;
        check_range("longitude", self.lng, -180.0, 180.0)?;
        Ok(*self)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Largest per-axis difference from `other`, in degrees.
    pub fn max_delta(&self, other: &LngLat) -> f64 {
        (self.lng - other.lng).abs().max((self.lat - other.lat).abs())
    }
}

/// A position on the rendered map surface, in CSS pixels from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub(crate) fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> crate::Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidCoordinate { field, value })
    }
}

// ---------------------------------------------------------------------------
// Web-Mercator helpers
// ---------------------------------------------------------------------------

/// Side length of the whole world in pixels at `zoom`.
#[inline]
pub fn world_size(zoom: f64, tile_size: f64) -> f64 {
    tile_size * 2f64.powf(zoom)
}

/// Project a position to world pixel coordinates for a world of side `world`.
///
/// Latitude is clamped to the Mercator limit so the poles stay finite.
pub fn lnglat_to_world(pos: LngLat, world: f64) -> ScreenPoint {
    let lat = pos
        .lat
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (pos.lng + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    ScreenPoint::new(x, y)
}

/// Inverse of [`lnglat_to_world`].
pub fn world_to_lnglat(point: ScreenPoint, world: f64) -> LngLat {
    let lng = point.x / world * 360.0 - 180.0;
    let n = PI - 2.0 * PI * point.y / world;
    let lat = n.sinh().atan().to_degrees();
    LngLat::new(lng, lat)
}

/// Wrap a longitude into `[-180, 180]`.
pub fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn validate_rejects_out_of_range_and_nan() {
        assert!(LngLat::new(-74.0, 40.0).validate().is_ok());
        assert!(LngLat::new(-181.0, 40.0).validate().is_err());
        assert!(LngLat::new(0.0, 90.5).validate().is_err());
        assert!(LngLat::new(f64::NAN, 0.0).validate().is_err());
        assert!(LngLat::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn mercator_round_trip() {
        let world = world_size(12.0, 512.0);
        let pos = LngLat::new(-74.006, 40.7128);
        let back = world_to_lnglat(lnglat_to_world(pos, world), world);
        assert!(pos.max_delta(&back) < EPSILON);
    }

    #[test]
    fn origin_projects_to_world_center() {
        let world = world_size(3.0, 256.0);
        let p = lnglat_to_world(LngLat::new(0.0, 0.0), world);
        assert!((p.x - world / 2.0).abs() < EPSILON);
        assert!((p.y - world / 2.0).abs() < EPSILON);
    }

    #[test]
    fn poles_stay_finite() {
        let world = world_size(1.0, 512.0);
        assert!(lnglat_to_world(LngLat::new(0.0, 90.0), world).is_finite());
        assert!(lnglat_to_world(LngLat::new(0.0, -90.0), world).is_finite());
    }

    #[test]
    fn wrap_longitude_folds_into_range() {
        assert!((wrap_longitude(190.0) - (-170.0)).abs() < EPSILON);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < EPSILON);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-12.5), -12.5);
    }
}
