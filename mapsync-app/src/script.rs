//! JSON session scripts replayed against the simulated engine.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mapsync_core::{EntityId, ScreenPoint, Viewport};
use mapsync_search::SearchTransport;

use crate::config::InputMode;
use crate::controller::MapController;
use crate::engine::EngineEvent;
use crate::error::ControllerError;
use crate::selection::SelectionSource;
use crate::signal::ControllerSignal;
use crate::sim::SimulatedEngine;

/// Longest single `wait` a script may ask for.
const MAX_WAIT_MS: u64 = 60_000;
/// Upper bound on engine notification rounds handled after one step.
const MAX_PUMP_ROUNDS: usize = 16;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum ScriptStep {
    /// Let time pass, running every timer that falls due.
    Wait { ms: u64 },
    /// Deliver a notification as if the engine raised it.
    Engine { event: EngineEvent },
    /// Move the engine camera natively, behind the controller's back.
    JumpTo {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        zoom: Option<f64>,
    },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    Wheel { delta_y: f64 },
    Select {
        id: EntityId,
        #[serde(default)]
        source: SelectionSource,
    },
    Clear,
    Query { text: String },
    Geolocate { latitude: f64, longitude: f64 },
    /// Make the engine's projections return NaN. A persistent break
    /// survives re-layouts.
    BreakTransform {
        #[serde(default)]
        persistent: bool,
    },
    HealTransform,
    InputMode { mode: InputMode },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let script: SessionScript = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let json = fs::read_to_string(path)?;
        let script = Self::from_json(&json)?;
        info!("Loaded {} script steps from {}", script.steps.len(), path.display());
        Ok(script)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.steps.is_empty() {
            return Err(ControllerError::Script("script has no steps".into()));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if let ScriptStep::Wait { ms } = step {
                if *ms > MAX_WAIT_MS {
                    return Err(ControllerError::Script(format!(
                        "step {i}: wait of {ms} ms exceeds {MAX_WAIT_MS} ms"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Built-in session: initial search, a query, a marker selection that is
    /// panned away, a geolocation fix, a persistent transform fault that
    /// ends in safe mode, and a few overlay gestures.
    pub fn demo() -> Self {
        use ScriptStep::*;

        let error = || Engine {
            event: EngineEvent::Error {
                message: "Failed to invert transform matrix".into(),
            },
        };
        let mut steps = vec![
            Engine {
                event: EngineEvent::StyleReady,
            },
            Engine {
                event: EngineEvent::Idle,
            },
            Wait { ms: 400 },
            Query {
                text: "business 22".into(),
            },
            Wait { ms: 400 },
            Select {
                id: EntityId::new("biz-220"),
                source: SelectionSource::Marker,
            },
            Wait { ms: 400 },
            JumpTo {
                latitude: 40.9,
                longitude: -74.006,
                zoom: None,
            },
            Wait { ms: 400 },
            Query { text: String::new() },
            Geolocate {
                latitude: 40.7128,
                longitude: -74.006,
            },
            Wait { ms: 400 },
            BreakTransform { persistent: true },
        ];
        for _ in 0..4 {
            steps.push(error());
            steps.push(Wait { ms: 300 });
        }
        steps.extend([
            HealTransform,
            Engine {
                event: EngineEvent::Idle,
            },
            PointerDown { x: 640.0, y: 360.0 },
            PointerMove { x: 700.0, y: 400.0 },
            PointerMove { x: 760.0, y: 420.0 },
            PointerUp,
            Wait { ms: 400 },
            Wheel { delta_y: -1.0 },
            Wait { ms: 400 },
        ]);
        Self { steps }
    }
}

/// Drives a controller through a script on a virtual clock.
///
/// Timers fire at their exact deadlines. Search responses come back from a
/// real transport, so after timed work the replayer briefly waits (in real
/// time) for in-flight searches to be answered.
#[derive(Debug)]
pub struct Replayer {
    now: Instant,
    realtime: bool,
    settle_timeout: Duration,
}

impl Replayer {
    pub fn new(realtime: bool) -> Self {
        Self {
            now: Instant::now(),
            realtime,
            settle_timeout: Duration::from_millis(500),
        }
    }

    /// Virtual time reached so far.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Replay `script`, returning every signal the controller raised.
    pub fn run<T: SearchTransport>(
        &mut self,
        controller: &mut MapController<SimulatedEngine, T>,
        script: &SessionScript,
    ) -> crate::Result<Vec<ControllerSignal>> {
        script.validate()?;
        let mut signals = Vec::new();
        for (i, step) in script.steps.iter().enumerate() {
            debug!(step = i, ?step, "Replaying");
            self.apply(controller, step);
            self.pump(controller);
            signals.extend(controller.drain_signals());
        }
        Ok(signals)
    }

    fn apply<T: SearchTransport>(
        &mut self,
        c: &mut MapController<SimulatedEngine, T>,
        step: &ScriptStep,
    ) {
        let now = self.now;
        match step {
            ScriptStep::Wait { ms } => self.advance(c, Duration::from_millis(*ms)),
            ScriptStep::Engine { event } => c.handle_engine_event(event.clone(), now),
            ScriptStep::JumpTo {
                latitude,
                longitude,
                zoom,
            } => {
                let view = c.engine().view();
                let target = Viewport {
                    latitude: *latitude,
                    longitude: *longitude,
                    zoom: zoom.unwrap_or(view.zoom),
                    ..view
                };
                c.engine_mut().jump_to(target);
            }
            ScriptStep::PointerDown { x, y } => {
                c.pointer_down(ScreenPoint::new(*x, *y), now);
            }
            ScriptStep::PointerMove { x, y } => {
                c.pointer_move(ScreenPoint::new(*x, *y));
            }
            ScriptStep::PointerUp => {
                c.pointer_up(now);
            }
            ScriptStep::PointerLeave => {
                c.pointer_leave(now);
            }
            ScriptStep::Wheel { delta_y } => {
                c.wheel(*delta_y, now);
            }
            ScriptStep::Select { id, source } => c.select(id.clone(), *source),
            ScriptStep::Clear => {
                c.clear();
            }
            ScriptStep::Query { text } => c.set_query(text.clone(), now),
            ScriptStep::Geolocate {
                latitude,
                longitude,
            } => {
                c.apply_geolocation(*latitude, *longitude);
            }
            ScriptStep::BreakTransform { persistent } => {
                let engine = c.engine_mut();
                engine.set_heal_on_relayout(!persistent);
                engine.break_transform();
            }
            ScriptStep::HealTransform => {
                let engine = c.engine_mut();
                engine.set_heal_on_relayout(true);
                engine.heal_transform();
            }
            ScriptStep::InputMode { mode } => c.set_input_mode(*mode),
        }
    }

    /// Deliver queued engine notifications, then run due timers.
    fn pump<T: SearchTransport>(&mut self, c: &mut MapController<SimulatedEngine, T>) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let events = c.engine_mut().drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                c.handle_engine_event(event, self.now);
            }
        }
        c.tick(self.now);
    }

    fn advance<T: SearchTransport>(
        &mut self,
        c: &mut MapController<SimulatedEngine, T>,
        by: Duration,
    ) {
        let target = self.now + by;
        while let Some(deadline) = c.next_deadline().filter(|d| *d <= target) {
            self.sleep_until(deadline);
            self.now = self.now.max(deadline);
            self.pump(c);
            self.settle(c);
        }
        self.sleep_until(target);
        self.now = target;
        self.pump(c);
        self.settle(c);
    }

    /// Give in-flight searches a moment to be answered.
    fn settle<T: SearchTransport>(&mut self, c: &mut MapController<SimulatedEngine, T>) {
        let started = Instant::now();
        while c.is_awaiting_results() && started.elapsed() < self.settle_timeout {
            thread::sleep(Duration::from_millis(1));
            c.tick(self.now);
        }
    }

    fn sleep_until(&self, deadline: Instant) {
        if !self.realtime {
            return;
        }
        let wall = Instant::now();
        if deadline > wall {
            thread::sleep(deadline - wall);
        }
    }
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new(false)
    }
}
