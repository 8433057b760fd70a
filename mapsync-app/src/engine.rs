use serde::{Deserialize, Serialize};

use mapsync_core::{BoundingBox, LngLat, ScreenPoint, Viewport};

/// Notification kinds the controller subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineEventKind {
    MoveStart,
    MoveEnd,
    ZoomEnd,
    StyleLoading,
    StyleReady,
    Idle,
    Error,
}

impl EngineEventKind {
    pub const ALL: [EngineEventKind; 7] = [
        Self::MoveStart,
        Self::MoveEnd,
        Self::ZoomEnd,
        Self::StyleLoading,
        Self::StyleReady,
        Self::Idle,
        Self::Error,
    ];
}

/// A notification delivered by the map engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    MoveStart,
    MoveEnd,
    ZoomEnd,
    /// A style reload began; assets and transforms are in flux.
    StyleLoading,
    StyleReady,
    Idle,
    Error { message: String },
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            Self::MoveStart => EngineEventKind::MoveStart,
            Self::MoveEnd => EngineEventKind::MoveEnd,
            Self::ZoomEnd => EngineEventKind::ZoomEnd,
            Self::StyleLoading => EngineEventKind::StyleLoading,
            Self::StyleReady => EngineEventKind::StyleReady,
            Self::Idle => EngineEventKind::Idle,
            Self::Error { .. } => EngineEventKind::Error,
        }
    }
}

/// Handle for one engine-side subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineSubscription(pub u64);

/// The embedded map rendering engine, as seen by the controller.
///
/// Reads may return garbage (non-finite or inverted values) while the
/// engine's transform is invalid; callers validate everything they read.
/// Nothing here should be trusted before `style-ready` and `idle` have both
/// been observed.
pub trait MapEngine {
    fn set_view(&mut self, viewport: &Viewport);

    fn center(&self) -> LngLat;

    fn zoom(&self) -> f64;

    fn bearing(&self) -> f64 {
        0.0
    }

    fn pitch(&self) -> f64 {
        0.0
    }

    fn bounds(&self) -> BoundingBox;

    fn project(&self, pos: LngLat) -> ScreenPoint;

    fn unproject(&self, point: ScreenPoint) -> LngLat;

    /// Whether the style and its assets have finished loading.
    fn is_style_loaded(&self) -> bool;

    /// Force the rendering surface to re-measure and rebuild its transform.
    fn relayout(&mut self);

    /// Enable or suspend the engine's own pointer and wheel handlers.
    fn set_native_input(&mut self, enabled: bool);

    fn subscribe(&mut self, kind: EngineEventKind) -> EngineSubscription;

    fn unsubscribe(&mut self, subscription: EngineSubscription);
}
