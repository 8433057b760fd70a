use tracing::{debug, info};

use mapsync_core::{LngLat, Viewport};
use mapsync_search::SearchTransport;

use crate::controller::MapController;
use crate::engine::MapEngine;

impl<E: MapEngine, T: SearchTransport> MapController<E, T> {
    /// Offer a viewport. The engine is only moved if the store accepts it;
    /// returns whatever the store holds afterwards.
    pub fn set_viewport(&mut self, candidate: Viewport) -> Viewport {
        // Rejections are logged by the store.
        let _ = self.try_set_viewport(candidate);
        self.store.current()
    }

    pub(crate) fn try_set_viewport(&mut self, candidate: Viewport) -> crate::Result<Viewport> {
        let vp = self.store.try_set(candidate)?;
        self.engine.set_view(&vp);
        Ok(vp)
    }

    /// Center on a one-shot position fix, at the configured geolocation zoom.
    ///
    /// The fix goes through the same validation as any other viewport; an
    /// unusable fix leaves the map where it is.
    pub fn apply_geolocation(&mut self, latitude: f64, longitude: f64) -> Viewport {
        let mut candidate = self
            .store
            .current()
            .recentered(LngLat::new(longitude, latitude));
        if let Some(zoom) = self.geolocation_zoom {
            candidate.zoom = zoom;
        }
        match self.try_set_viewport(candidate) {
            Ok(vp) => {
                info!(lat = vp.latitude, lng = vp.longitude, zoom = vp.zoom, "Centered on geolocation");
                vp
            }
            Err(e) => {
                debug!("Geolocation fix ignored: {e}");
                self.store.current()
            }
        }
    }

    /// Pull the engine camera into the store after a native move.
    pub(crate) fn sync_from_engine(&mut self) {
        let center = self.engine.center();
        let candidate = Viewport {
            latitude: center.lat,
            longitude: center.lng,
            zoom: self.engine.zoom(),
            bearing: self.engine.bearing(),
            pitch: self.engine.pitch(),
        };
        if candidate == self.store.current() {
            return;
        }
        if let Err(e) = self.store.try_set(candidate) {
            debug!("Engine camera not synced: {e}");
        }
    }
}
