use serde::{Deserialize, Serialize};

use crate::geo::{check_range, LngLat};

/// Lowest zoom level a viewport may hold.
pub const MIN_ZOOM: f64 = 1.0;
/// Highest zoom level a viewport may hold.
pub const MAX_ZOOM: f64 = 20.0;
/// Steepest camera pitch, in degrees.
pub const MAX_PITCH: f64 = 85.0;

/// The camera over the map: center, zoom and orientation.
///
/// Fields are public so candidates can be built freely; a value only
/// becomes authoritative once it passes [`Viewport::validated`], which is
/// what [`ViewportStore`](crate::ViewportStore) does on every `set`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,

    /// Degrees clockwise from north.
    #[serde(default)]
    pub bearing: f64,

    /// Degrees away from straight-down.
    #[serde(default)]
    pub pitch: f64,
}

impl Default for Viewport {
    /// Whole-world view centred on the origin.
    fn default() -> Self {
        Self::from_parts(0.0, 0.0, 2.0)
    }
}

impl Viewport {
    /// Create a validated viewport with no bearing or pitch.
    pub fn new(latitude: f64, longitude: f64, zoom: f64) -> crate::Result<Self> {
        Self::from_parts(latitude, longitude, zoom).validated()
    }

    /// Build a candidate without validating it.
    pub const fn from_parts(latitude: f64, longitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    /// Check every field and return the canonical form of the viewport.
    ///
    /// Bearing is only required to be finite and is normalized into
    /// `[0, 360)`. Everything else must already be in range; nothing is
    /// clamped.
    pub fn validated(self) -> crate::Result<Self> {
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_range("zoom", self.zoom, MIN_ZOOM, MAX_ZOOM)?;
        check_range("bearing", self.bearing, f64::MIN, f64::MAX)?;
        check_range("pitch", self.pitch, 0.0, MAX_PITCH)?;
        Ok(Self {
            bearing: self.bearing.rem_euclid(360.0),
            ..self
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validated().is_ok()
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    /// Same camera, moved to `center`.
    pub fn recentered(&self, center: LngLat) -> Self {
        Self {
            latitude: center.lat,
            longitude: center.lng,
            ..*self
        }
    }

    /// Same camera, at another zoom level.
    pub fn with_zoom(&self, zoom: f64) -> Self {
        Self { zoom, ..*self }
    }

    pub fn with_orientation(&self, bearing: f64, pitch: f64) -> Self {
        Self {
            bearing,
            pitch,
            ..*self
        }
    }
}
