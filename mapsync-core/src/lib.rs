pub mod bounds;
pub mod entity;
pub mod error;
pub mod geo;
pub mod store;
pub mod subscription;
pub mod viewport;

// Re-export primary types for convenience.
pub use bounds::{BoundingBox, BoundsSnapshot};
pub use entity::{Entity, EntityId};
pub use error::CoreError;
pub use geo::{LngLat, ScreenPoint};
pub use store::{ViewportObserver, ViewportStore};
pub use subscription::{SubscriptionId, Subscriptions};
pub use viewport::{Viewport, MAX_PITCH, MAX_ZOOM, MIN_ZOOM};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
