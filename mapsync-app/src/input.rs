use std::time::Instant;

use tracing::info;

use mapsync_core::ScreenPoint;
use mapsync_search::{SearchTransport, Trigger};

use crate::config::InputMode;
use crate::controller::MapController;
use crate::engine::MapEngine;
use crate::gesture::GestureOutcome;

// ---------------------------------------------------------------------------
// Safe-mode input: the capture overlay stands in for the engine's handlers
// and the controller raises the move notifications the engine would have.
// ---------------------------------------------------------------------------

impl<E: MapEngine, T: SearchTransport> MapController<E, T> {
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.engine.set_native_input(mode == InputMode::Native);
        if mode == self.input_mode {
            return;
        }
        self.input_mode = mode;
        self.overlay.reset();
        info!(?mode, "Input mode changed");
    }

    fn safe_mode(&self) -> bool {
        self.input_mode == InputMode::SafeMode
    }

    pub fn pointer_down(&mut self, at: ScreenPoint, now: Instant) -> GestureOutcome {
        if !self.safe_mode() {
            return GestureOutcome::Ignored;
        }
        let outcome = self.overlay.pointer_down(at);
        if outcome == GestureOutcome::Started {
            self.on_move_start(now);
        }
        outcome
    }

    pub fn pointer_move(&mut self, at: ScreenPoint) -> GestureOutcome {
        if !self.safe_mode() {
            return GestureOutcome::Ignored;
        }
        let outcome = self.overlay.pointer_move(at, &mut self.store);
        if let GestureOutcome::Moved(vp) = outcome {
            self.engine.set_view(&vp);
        }
        outcome
    }

    pub fn pointer_up(&mut self, now: Instant) -> GestureOutcome {
        let outcome = self.overlay.pointer_up();
        self.finish_drag(outcome, now)
    }

    pub fn pointer_leave(&mut self, now: Instant) -> GestureOutcome {
        let outcome = self.overlay.pointer_leave();
        self.finish_drag(outcome, now)
    }

    fn finish_drag(&mut self, outcome: GestureOutcome, now: Instant) -> GestureOutcome {
        if outcome == GestureOutcome::Ended {
            self.on_move_end(Trigger::MoveEnd, now);
        }
        outcome
    }

    /// One wheel notch on the capture surface.
    pub fn wheel(&mut self, delta_y: f64, now: Instant) -> GestureOutcome {
        if !self.safe_mode() {
            return GestureOutcome::Ignored;
        }
        let outcome = self.overlay.wheel(delta_y, &mut self.store);
        if let GestureOutcome::Zoomed(vp) = outcome {
            self.on_move_start(now);
            self.engine.set_view(&vp);
            self.on_move_end(Trigger::ZoomEnd, now);
        }
        outcome
    }
}
