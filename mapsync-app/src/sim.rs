//! A headless stand-in for the embedded map engine.
//!
//! Web-Mercator camera over a fixed-size surface, with switches to mimic the
//! engine's failure modes: an unloaded style and a broken transform that
//! turns every projection into NaN. Camera changes queue the notifications
//! a real engine would emit; the host drains them with
//! [`SimulatedEngine::drain_events`].

use std::collections::VecDeque;

use tracing::debug;

use mapsync_core::geo::{lnglat_to_world, world_size, world_to_lnglat, wrap_longitude};
use mapsync_core::{BoundingBox, LngLat, ScreenPoint, Viewport};

use crate::engine::{EngineEvent, EngineEventKind, EngineSubscription, MapEngine};

#[derive(Debug)]
pub struct SimulatedEngine {
    width: f64,
    height: f64,
    tile_size: f64,
    view: Viewport,
    style_loaded: bool,
    transform_broken: bool,
    heal_on_relayout: bool,
    native_input: bool,
    relayouts: u32,
    set_view_calls: u32,
    next_subscription: u64,
    subscriptions: Vec<(EngineSubscription, EngineEventKind)>,
    outbox: VecDeque<EngineEvent>,
}

impl SimulatedEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f64,
            height: height.max(1) as f64,
            tile_size: 512.0,
            view: Viewport::default(),
            style_loaded: true,
            transform_broken: false,
            heal_on_relayout: true,
            native_input: true,
            relayouts: 0,
            set_view_calls: 0,
            next_subscription: 1,
            subscriptions: Vec::new(),
            outbox: VecDeque::new(),
        }
    }

    pub fn with_tile_size(mut self, tile_size: f64) -> Self {
        if tile_size.is_finite() && tile_size > 0.0 {
            self.tile_size = tile_size;
        }
        self
    }

    /// Move the camera as a native gesture would, bypassing the controller.
    pub fn jump_to(&mut self, viewport: Viewport) {
        self.move_camera(viewport);
    }

    /// Queue a notification as if the engine had raised it.
    pub fn emit(&mut self, event: EngineEvent) {
        if self.is_subscribed(event.kind()) {
            self.outbox.push_back(event);
        }
    }

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.outbox.drain(..).collect()
    }

    pub fn view(&self) -> Viewport {
        self.view
    }

    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    pub fn break_transform(&mut self) {
        self.transform_broken = true;
    }

    pub fn heal_transform(&mut self) {
        self.transform_broken = false;
    }

    /// Whether a re-layout repairs a broken transform. On by default.
    pub fn set_heal_on_relayout(&mut self, heal: bool) {
        self.heal_on_relayout = heal;
    }

    pub fn is_transform_broken(&self) -> bool {
        self.transform_broken
    }

    pub fn relayout_count(&self) -> u32 {
        self.relayouts
    }

    pub fn set_view_count(&self) -> u32 {
        self.set_view_calls
    }

    pub fn native_input_enabled(&self) -> bool {
        self.native_input
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    fn is_subscribed(&self, kind: EngineEventKind) -> bool {
        self.subscriptions.iter().any(|(_, k)| *k == kind)
    }

    fn move_camera(&mut self, viewport: Viewport) {
        let zoomed = viewport.zoom != self.view.zoom;
        self.view = viewport;
        self.emit(EngineEvent::MoveStart);
        self.emit(EngineEvent::MoveEnd);
        if zoomed {
            self.emit(EngineEvent::ZoomEnd);
        }
        self.emit(EngineEvent::Idle);
    }

    fn world(&self) -> f64 {
        world_size(self.view.zoom, self.tile_size)
    }
}

impl MapEngine for SimulatedEngine {
    fn set_view(&mut self, viewport: &Viewport) {
        self.set_view_calls += 1;
        self.move_camera(*viewport);
    }

    fn center(&self) -> LngLat {
        if self.transform_broken {
            return LngLat::new(f64::NAN, f64::NAN);
        }
        self.view.center()
    }

    fn zoom(&self) -> f64 {
        self.view.zoom
    }

    fn bearing(&self) -> f64 {
        self.view.bearing
    }

    fn pitch(&self) -> f64 {
        self.view.pitch
    }

    fn bounds(&self) -> BoundingBox {
        let world = self.world();
        let nw = self.unproject(ScreenPoint::new(0.0, 0.0));
        let se = self.unproject(ScreenPoint::new(self.width, self.height));
        let (west, east) = if self.width >= world {
            (-180.0, 180.0)
        } else {
            (wrap_longitude(nw.lng), wrap_longitude(se.lng))
        };
        BoundingBox {
            north: nw.lat,
            south: se.lat,
            east,
            west,
        }
    }

    fn project(&self, pos: LngLat) -> ScreenPoint {
        if self.transform_broken {
            return ScreenPoint::new(f64::NAN, f64::NAN);
        }
        let world = self.world();
        let c = lnglat_to_world(self.view.center(), world);
        let p = lnglat_to_world(pos, world);
        ScreenPoint::new(
            p.x - c.x + self.width / 2.0,
            p.y - c.y + self.height / 2.0,
        )
    }

    fn unproject(&self, point: ScreenPoint) -> LngLat {
        if self.transform_broken {
            return LngLat::new(f64::NAN, f64::NAN);
        }
        let world = self.world();
        let c = lnglat_to_world(self.view.center(), world);
        world_to_lnglat(
            ScreenPoint::new(
                point.x - self.width / 2.0 + c.x,
                point.y - self.height / 2.0 + c.y,
            ),
            world,
        )
    }

    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn relayout(&mut self) {
        self.relayouts += 1;
        if self.heal_on_relayout {
            self.transform_broken = false;
        }
        debug!(count = self.relayouts, healed = !self.transform_broken, "Simulated re-layout");
    }

    fn set_native_input(&mut self, enabled: bool) {
        self.native_input = enabled;
    }

    fn subscribe(&mut self, kind: EngineEventKind) -> EngineSubscription {
        let handle = EngineSubscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push((handle, kind));
        handle
    }

    fn unsubscribe(&mut self, subscription: EngineSubscription) {
        self.subscriptions.retain(|(h, _)| *h != subscription);
    }
}
