use std::time::Instant;

use tracing::{debug, info, warn};

use mapsync_core::{
    BoundsSnapshot, EntityId, Subscriptions, SubscriptionId, Viewport, ViewportStore,
};
use mapsync_search::{
    Notified, QueryDispatcher, ResultReconciler, ResultSet, SearchTransport, Trigger,
};

use crate::config::{ControllerConfig, InputMode};
use crate::engine::{EngineEvent, EngineEventKind, EngineSubscription, MapEngine};
use crate::error::ControllerError;
use crate::extractor::BoundsExtractor;
use crate::gesture::GestureOverlay;
use crate::resilience::ResilienceLayer;
use crate::selection::{SelectionCoordinator, SelectionSource, SelectionState};
use crate::signal::ControllerSignal;

/// One map instance and everything synchronized with it.
///
/// Owns the viewport store, the search pipeline, the selection and the
/// resilience layer. All methods run to completion on the caller's thread;
/// the only asynchrony is the search transport, drained in
/// [`tick`](Self::tick).
pub struct MapController<E: MapEngine, T: SearchTransport> {
    pub(crate) engine: E,
    pub(crate) transport: T,
    pub(crate) store: ViewportStore,
    pub(crate) extractor: BoundsExtractor,
    pub(crate) dispatcher: QueryDispatcher,
    pub(crate) reconciler: ResultReconciler,
    pub(crate) selection: SelectionCoordinator,
    pub(crate) resilience: ResilienceLayer,
    pub(crate) overlay: GestureOverlay,
    pub(crate) input_mode: InputMode,
    pub(crate) auto_safe_mode: bool,
    pub(crate) geolocation_zoom: Option<f64>,
    initial_search_done: bool,
    subscriptions: Subscriptions<EngineSubscription>,
    pub(crate) signals: Vec<ControllerSignal>,
}

impl<E: MapEngine, T: SearchTransport> MapController<E, T> {
    pub fn new(engine: E, transport: T, config: &ControllerConfig) -> Self {
        let mut controller = Self {
            engine,
            transport,
            store: ViewportStore::new(config.initial_viewport),
            extractor: BoundsExtractor::new(config.projection_tolerance_deg),
            dispatcher: QueryDispatcher::new(config.dispatcher()),
            reconciler: ResultReconciler::new(config.stale_policy),
            selection: SelectionCoordinator::new(),
            resilience: ResilienceLayer::new(config.resilience()),
            overlay: GestureOverlay::new(config.tile_size_px, config.wheel_zoom_step),
            input_mode: InputMode::Native,
            auto_safe_mode: config.auto_safe_mode,
            geolocation_zoom: config.geolocation_zoom,
            initial_search_done: false,
            subscriptions: Subscriptions::new(),
            signals: Vec::new(),
        };
        let initial = controller.store.current();
        controller.engine.set_view(&initial);
        controller.set_input_mode(config.input_mode);
        controller
    }

    // -----------------------------------------------------------------------
    // Engine lifecycle
    // -----------------------------------------------------------------------

    /// Subscribe to every engine notification. Calling it twice is a no-op.
    pub fn attach(&mut self) {
        if !self.subscriptions.is_empty() {
            return;
        }
        for kind in EngineEventKind::ALL {
            let handle = self.engine.subscribe(kind);
            self.subscriptions.insert(handle);
        }
        debug!(count = self.subscriptions.len(), "Attached to map engine");
    }

    /// Release every engine subscription and drop pending work. Also runs
    /// on drop.
    pub fn teardown(&mut self) {
        let handles = self.subscriptions.drain();
        let released = handles.len();
        for (_, handle) in handles {
            self.engine.unsubscribe(handle);
        }
        self.dispatcher.cancel();
        self.overlay.reset();
        self.store.clear_observers();
        if released > 0 {
            debug!(released, "Detached from map engine");
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Feed one engine notification to the controller.
    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        self.extractor.on_event(&event);
        match event {
            EngineEvent::MoveStart => self.on_move_start(now),
            EngineEvent::MoveEnd => self.on_move_end(Trigger::MoveEnd, now),
            EngineEvent::ZoomEnd => self.on_move_end(Trigger::ZoomEnd, now),
            EngineEvent::StyleLoading => debug!("Engine style loading"),
            EngineEvent::StyleReady => debug!("Engine style ready"),
            EngineEvent::Idle => self.on_idle(now),
            EngineEvent::Error { message } => self.on_engine_error(message, now),
        }
    }

    pub(crate) fn on_move_start(&mut self, now: Instant) {
        if let Notified::CheckSelection = self.dispatcher.notify(Trigger::MoveStart, now) {
            self.check_selection_bounds();
        }
    }

    pub(crate) fn on_move_end(&mut self, trigger: Trigger, now: Instant) {
        self.sync_from_engine();
        self.selection.end_centering();
        self.check_selection_bounds();
        self.dispatcher.notify(trigger, now);
    }

    fn on_idle(&mut self, now: Instant) {
        self.selection.end_centering();
        match self.extractor.extract(&self.engine) {
            Ok(snapshot) => self.store.record_bounds(snapshot),
            Err(_) => return,
        }
        self.resilience.on_healthy_idle(&mut self.signals);
        if !self.initial_search_done {
            self.initial_search_done = true;
            info!("Map engine ready, running initial search");
            self.dispatcher.notify(Trigger::EngineReady, now);
        }
    }

    fn on_engine_error(&mut self, message: String, now: Instant) {
        if !self.resilience.on_error(&message, now, &mut self.signals) {
            return;
        }
        warn!("{}", ControllerError::TransformFault { message });
        if self.resilience.is_degraded()
            && self.auto_safe_mode
            && self.input_mode == InputMode::Native
        {
            info!("Switching to safe-mode input while the map is degraded");
            self.set_input_mode(InputMode::SafeMode);
        }
    }

    /// Clear the selection if its entity is outside the current bounds.
    /// Skipped when the bounds cannot be trusted.
    fn check_selection_bounds(&mut self) {
        if !self.selection.is_active() {
            return;
        }
        let degraded = self.resilience.is_degraded();
        if let Some(snapshot) =
            current_bounds(&self.extractor, &self.engine, &mut self.store, degraded)
        {
            self.selection.on_bounds_changed(
                &snapshot.bounds,
                self.reconciler.results(),
                &mut self.signals,
            );
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select an entity from the current results and center on it.
    pub fn select(&mut self, id: impl Into<EntityId>, source: SelectionSource) {
        let id = id.into();
        let target = self.selection.select(
            &id,
            source,
            self.reconciler.results(),
            &mut self.signals,
        );
        if let Some(pos) = target {
            let candidate = self.store.current().recentered(pos);
            if self.try_set_viewport(candidate).is_err() {
                self.selection.end_centering();
            }
        }
    }

    /// Drop the selection. Returns `false` if nothing was selected.
    pub fn clear(&mut self) -> bool {
        self.selection.clear(&mut self.signals)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.store.current()
    }

    pub fn results(&self) -> &ResultSet {
        self.reconciler.results()
    }

    pub fn reconciler(&self) -> &ResultReconciler {
        &self.reconciler
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// Take every signal raised since the last call, oldest first.
    pub fn drain_signals(&mut self) -> Vec<ControllerSignal> {
        std::mem::take(&mut self.signals)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn is_degraded(&self) -> bool {
        self.resilience.is_degraded()
    }

    /// Bounds of the last successful extraction.
    pub fn last_known_bounds(&self) -> Option<BoundsSnapshot> {
        self.store.last_bounds()
    }

    pub fn rejected_viewports(&self) -> u64 {
        self.store.rejected_count()
    }

    /// Run `observer` after every accepted viewport change.
    pub fn observe_viewport(&mut self, observer: impl FnMut(&Viewport) + 'static) -> SubscriptionId {
        self.store.observe(observer)
    }

    pub fn unobserve_viewport(&mut self, id: SubscriptionId) -> bool {
        self.store.unobserve(id)
    }
}

/// Bounds to search in or check the selection against.
///
/// A successful extraction is recorded on the store. When extraction fails
/// on a degraded map, the last recorded bounds stand in; otherwise there are
/// no bounds and the caller skips its work.
pub(crate) fn current_bounds<E: MapEngine>(
    extractor: &BoundsExtractor,
    engine: &E,
    store: &mut ViewportStore,
    degraded: bool,
) -> Option<BoundsSnapshot> {
    match extractor.extract(engine) {
        Ok(snapshot) => {
            store.record_bounds(snapshot);
            Some(snapshot)
        }
        Err(e) if degraded => {
            let fallback = store.last_bounds();
            debug!(
                has_fallback = fallback.is_some(),
                "Map degraded, using last-known bounds: {e}"
            );
            fallback
        }
        Err(e) => {
            debug!("Bounds extraction failed: {e}");
            None
        }
    }
}

impl<E: MapEngine, T: SearchTransport> Drop for MapController<E, T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
