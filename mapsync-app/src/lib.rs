pub mod app_dir;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod gesture;
pub mod input;
pub mod navigation;
pub mod resilience;
pub mod script;
pub mod search_bridge;
pub mod selection;
pub mod signal;
pub mod sim;

pub use config::{ControllerConfig, InputMode};
pub use controller::MapController;
pub use engine::{EngineEvent, EngineEventKind, EngineSubscription, MapEngine};
pub use error::ControllerError;
pub use extractor::BoundsExtractor;
pub use gesture::{GestureOutcome, GestureOverlay};
pub use resilience::{ResilienceConfig, ResilienceLayer};
pub use script::{Replayer, ScriptStep, SessionScript};
pub use selection::{SelectionCoordinator, SelectionSource, SelectionState};
pub use signal::ControllerSignal;
pub use sim::SimulatedEngine;

/// Convenience result type for the app crate.
pub type Result<T> = std::result::Result<T, ControllerError>;
