use tracing::debug;

use mapsync_core::BoundsSnapshot;

use crate::engine::{EngineEvent, MapEngine};
use crate::error::ControllerError;

/// Default tolerance for the projection round trip, in degrees.
pub const DEFAULT_PROJECTION_TOLERANCE: f64 = 1e-6;

/// Reads bounds and zoom from the engine, but only when it can be trusted.
///
/// Readiness has two stages. The engine must report its style as loaded
/// (and `style-ready` plus `idle` must each have been seen), and projecting
/// the current center then unprojecting it must land back within
/// `tolerance` degrees. The second stage catches the window after a style
/// reload where the transform matrices are not yet valid.
#[derive(Debug, Clone)]
pub struct BoundsExtractor {
    tolerance: f64,
    style_ready_seen: bool,
    idle_seen: bool,
}

impl BoundsExtractor {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            DEFAULT_PROJECTION_TOLERANCE
        };
        Self {
            tolerance,
            style_ready_seen: false,
            idle_seen: false,
        }
    }

    /// Track the lifecycle notifications readiness depends on.
    pub fn on_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::StyleReady => self.style_ready_seen = true,
            EngineEvent::Idle => self.idle_seen = true,
            EngineEvent::StyleLoading => {
                debug!("Style reload started, bounds extraction suspended");
                self.style_ready_seen = false;
            }
            _ => {}
        }
    }

    /// Whether both lifecycle notifications have been seen.
    pub fn lifecycle_ready(&self) -> bool {
        self.style_ready_seen && self.idle_seen
    }

    pub fn extract<E: MapEngine + ?Sized>(&self, engine: &E) -> crate::Result<BoundsSnapshot> {
        if !self.lifecycle_ready() {
            return Err(ControllerError::not_ready(
                "waiting for style-ready and idle",
            ));
        }
        if !engine.is_style_loaded() {
            return Err(ControllerError::not_ready("style not loaded"));
        }
        self.check_projection(engine)?;

        let bounds = engine
            .bounds()
            .validated()
            .map_err(|e| ControllerError::not_ready(format!("engine bounds: {e}")))?;
        let zoom = engine.zoom();
        if !zoom.is_finite() {
            return Err(ControllerError::not_ready(format!("engine zoom: {zoom}")));
        }
        Ok(BoundsSnapshot { bounds, zoom })
    }

    fn check_projection<E: MapEngine + ?Sized>(&self, engine: &E) -> crate::Result<()> {
        let probe = engine.center();
        if !probe.is_valid() {
            return Err(ControllerError::not_ready(format!(
                "engine center unusable: {probe:?}"
            )));
        }
        let screen = engine.project(probe);
        if !screen.is_finite() {
            return Err(ControllerError::not_ready("projection returned non-finite point"));
        }
        let back = engine.unproject(screen);
        if !back.is_finite() {
            return Err(ControllerError::not_ready("unprojection returned non-finite point"));
        }
        let drift = probe.max_delta(&back);
        if drift > self.tolerance {
            return Err(ControllerError::not_ready(format!(
                "projection round trip drifted {drift:e} degrees"
            )));
        }
        Ok(())
    }
}

impl Default for BoundsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECTION_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use mapsync_core::{LngLat, Viewport};

    use super::*;
    use crate::sim::SimulatedEngine;

    fn ready_pair() -> (BoundsExtractor, SimulatedEngine) {
        let mut x = BoundsExtractor::default();
        x.on_event(&EngineEvent::StyleReady);
        x.on_event(&EngineEvent::Idle);
        let mut e = SimulatedEngine::new(800, 600);
        e.set_view(&Viewport::new(40.0, -74.0, 12.0).unwrap());
        (x, e)
    }

    fn assert_not_ready(r: crate::Result<BoundsSnapshot>) {
        assert!(
            matches!(r, Err(ControllerError::EngineNotReady { .. })),
            "expected EngineNotReady, got {r:?}"
        );
    }

    #[test]
    fn ready_engine_yields_snapshot() {
        let (x, e) = ready_pair();
        let snap = x.extract(&e).unwrap();
        assert_eq!(snap.zoom, 12.0);
        assert!(snap.bounds.contains(LngLat::new(-74.0, 40.0)));
    }

    #[test]
    fn unready_until_both_lifecycle_events() {
        let mut x = BoundsExtractor::default();
        let (_, e) = ready_pair();
        assert_not_ready(x.extract(&e));
        x.on_event(&EngineEvent::StyleReady);
        assert_not_ready(x.extract(&e));
        x.on_event(&EngineEvent::Idle);
        assert!(x.extract(&e).is_ok());
    }

    #[test]
    fn style_reload_resets_readiness() {
        let (mut x, e) = ready_pair();
        x.on_event(&EngineEvent::StyleLoading);
        assert_not_ready(x.extract(&e));
        x.on_event(&EngineEvent::StyleReady);
        assert!(x.extract(&e).is_ok());
    }

    #[test]
    fn unloaded_style_is_unready() {
        let (x, mut e) = ready_pair();
        e.set_style_loaded(false);
        assert_not_ready(x.extract(&e));
    }

    #[test]
    fn broken_transform_is_unready() {
        let (x, mut e) = ready_pair();
        e.break_transform();
        assert_not_ready(x.extract(&e));
        e.heal_transform();
        assert!(x.extract(&e).is_ok());
    }
}
