use tracing::debug;

use mapsync_core::geo::{lnglat_to_world, world_size, world_to_lnglat, wrap_longitude};
use mapsync_core::{LngLat, ScreenPoint, Viewport, ViewportStore, MAX_ZOOM, MIN_ZOOM};

/// What a captured input event did to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// A drag began; the camera has not moved yet.
    Started,
    /// The store accepted a panned viewport.
    Moved(Viewport),
    /// The drag finished.
    Ended,
    /// The store accepted a zoomed viewport.
    Zoomed(Viewport),
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    last: ScreenPoint,
    moved: bool,
}

/// Pointer and wheel capture used while the engine's own handlers are off.
///
/// Every mutation goes through [`ViewportStore::try_set`]; the overlay never
/// writes a viewport the store would refuse. Panning assumes a north-up
/// camera.
#[derive(Debug, Clone)]
pub struct GestureOverlay {
    tile_size: f64,
    wheel_step: f64,
    drag: Option<DragState>,
}

impl GestureOverlay {
    pub fn new(tile_size: f64, wheel_step: f64) -> Self {
        let tile_size = if tile_size.is_finite() && tile_size > 0.0 {
            tile_size
        } else {
            512.0
        };
        let wheel_step = if wheel_step.is_finite() && wheel_step > 0.0 {
            wheel_step
        } else {
            0.5
        };
        Self {
            tile_size,
            wheel_step,
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, at: ScreenPoint) -> GestureOutcome {
        if !at.is_finite() {
            return GestureOutcome::Ignored;
        }
        self.drag = Some(DragState {
            last: at,
            moved: false,
        });
        GestureOutcome::Started
    }

    pub fn pointer_move(&mut self, at: ScreenPoint, store: &mut ViewportStore) -> GestureOutcome {
        let Some(drag) = self.drag.as_mut() else {
            return GestureOutcome::Ignored;
        };
        if !at.is_finite() {
            return GestureOutcome::Ignored;
        }
        let dx = at.x - drag.last.x;
        let dy = at.y - drag.last.y;
        drag.last = at;
        if dx == 0.0 && dy == 0.0 {
            return GestureOutcome::Ignored;
        }

        let candidate = pan_candidate(&store.current(), dx, dy, self.tile_size);
        match store.try_set(candidate) {
            Ok(vp) => {
                drag.moved = true;
                GestureOutcome::Moved(vp)
            }
            Err(e) => {
                debug!("Pan rejected: {e}");
                GestureOutcome::Ignored
            }
        }
    }

    /// Finish the drag. `Ended` is reported even if the pointer never moved.
    pub fn pointer_up(&mut self) -> GestureOutcome {
        match self.drag.take() {
            Some(drag) => {
                debug!(moved = drag.moved, "Overlay drag finished");
                GestureOutcome::Ended
            }
            None => GestureOutcome::Ignored,
        }
    }

    pub fn pointer_leave(&mut self) -> GestureOutcome {
        self.pointer_up()
    }

    /// One wheel notch. Negative `delta_y` (scrolling up) zooms in.
    pub fn wheel(&mut self, delta_y: f64, store: &mut ViewportStore) -> GestureOutcome {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return GestureOutcome::Ignored;
        }
        let current = store.current();
        let step = if delta_y < 0.0 {
            self.wheel_step
        } else {
            -self.wheel_step
        };
        let zoom = (current.zoom + step).clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == current.zoom {
            return GestureOutcome::Ignored;
        }
        match store.try_set(current.with_zoom(zoom)) {
            Ok(vp) => GestureOutcome::Zoomed(vp),
            Err(e) => {
                debug!("Wheel zoom rejected: {e}");
                GestureOutcome::Ignored
            }
        }
    }

    pub fn reset(&mut self) {
        self.drag = None;
    }
}

impl Default for GestureOverlay {
    fn default() -> Self {
        Self::new(512.0, 0.5)
    }
}

/// Viewport after dragging the map content by `(dx, dy)` screen pixels.
///
/// Dragging right moves the center west; dragging down moves it north.
pub fn pan_candidate(current: &Viewport, dx: f64, dy: f64, tile_size: f64) -> Viewport {
    let world = world_size(current.zoom, tile_size);
    let c = lnglat_to_world(current.center(), world);
    let moved = world_to_lnglat(ScreenPoint::new(c.x - dx, c.y - dy), world);
    let center = LngLat::new(wrap_longitude(moved.lng), moved.lat);
    current.recentered(center)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(lat: f64, lng: f64, zoom: f64) -> ViewportStore {
        ViewportStore::new(Viewport::new(lat, lng, zoom).unwrap())
    }

    #[test]
    fn drag_pans_through_the_store() {
        let mut overlay = GestureOverlay::default();
        let mut store = store_at(40.0, -74.0, 12.0);
        assert_eq!(overlay.pointer_down(ScreenPoint::new(100.0, 100.0)), GestureOutcome::Started);

        // Content dragged right and down: center goes west and north.
        let outcome = overlay.pointer_move(ScreenPoint::new(150.0, 140.0), &mut store);
        let GestureOutcome::Moved(vp) = outcome else {
            panic!("expected Moved, got {outcome:?}");
        };
        assert_eq!(vp, store.current());
        assert!(vp.longitude < -74.0);
        assert!(vp.latitude > 40.0);
        assert_eq!(vp.zoom, 12.0);

        assert_eq!(overlay.pointer_up(), GestureOutcome::Ended);
        assert!(!overlay.is_dragging());
        assert_eq!(
            overlay.pointer_move(ScreenPoint::new(0.0, 0.0), &mut store),
            GestureOutcome::Ignored
        );
    }

    #[test]
    fn pan_is_zoom_scaled() {
        let far = pan_candidate(&Viewport::new(0.0, 0.0, 2.0).unwrap(), 100.0, 0.0, 512.0);
        let near = pan_candidate(&Viewport::new(0.0, 0.0, 10.0).unwrap(), 100.0, 0.0, 512.0);
        assert!(far.longitude.abs() > near.longitude.abs() * 100.0);
    }

    #[test]
    fn pan_across_the_antimeridian_wraps() {
        let vp = pan_candidate(&Viewport::new(0.0, 179.9, 8.0).unwrap(), -1000.0, 0.0, 512.0);
        assert!(vp.is_valid());
        assert!(vp.longitude < 0.0);
    }

    #[test]
    fn leaving_the_surface_ends_the_drag() {
        let mut overlay = GestureOverlay::default();
        overlay.pointer_down(ScreenPoint::new(0.0, 0.0));
        assert_eq!(overlay.pointer_leave(), GestureOutcome::Ended);
        assert_eq!(overlay.pointer_leave(), GestureOutcome::Ignored);
    }

    #[test]
    fn wheel_zooms_by_step_and_clamps() {
        let mut overlay = GestureOverlay::new(512.0, 0.5);
        let mut store = store_at(40.0, -74.0, 19.8);

        assert_eq!(
            overlay.wheel(-1.0, &mut store),
            GestureOutcome::Zoomed(store.current())
        );
        assert_eq!(store.current().zoom, MAX_ZOOM);
        assert_eq!(overlay.wheel(-1.0, &mut store), GestureOutcome::Ignored);

        overlay.wheel(3.0, &mut store);
        assert_eq!(store.current().zoom, 19.5);
        assert_eq!(overlay.wheel(f64::NAN, &mut store), GestureOutcome::Ignored);
    }

    #[test]
    fn wheel_never_goes_below_min_zoom() {
        let mut overlay = GestureOverlay::new(512.0, 2.0);
        let mut store = store_at(0.0, 0.0, 2.0);
        overlay.wheel(1.0, &mut store);
        assert_eq!(store.current().zoom, MIN_ZOOM);
        assert_eq!(overlay.wheel(1.0, &mut store), GestureOutcome::Ignored);
    }
}
