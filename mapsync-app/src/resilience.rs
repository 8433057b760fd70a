use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::engine::MapEngine;
use crate::signal::ControllerSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Wait between a transform fault and the forced re-layout.
    pub relayout_delay: Duration,
    /// Re-layouts allowed without an intervening healthy idle.
    pub max_recoveries: u32,
    /// Lowercase substrings identifying a transform fault.
    pub signatures: Vec<String>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            relayout_delay: Duration::from_millis(250),
            max_recoveries: 3,
            signatures: ["transform", "matrix", "projection", "invalid lnglat", "nan"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Watches engine errors and nudges the engine back into shape.
///
/// Only ever calls [`MapEngine::relayout`]. One re-layout is scheduled per
/// burst of faults; further faults are absorbed until it has run. When the
/// re-layouts stop helping the map is reported degraded, once, and is
/// reported recovered at the next healthy idle.
#[derive(Debug)]
pub struct ResilienceLayer {
    config: ResilienceConfig,
    scheduled: Option<Instant>,
    consecutive: u32,
    degraded: bool,
    absorbed: u64,
}

impl ResilienceLayer {
    pub fn new(mut config: ResilienceConfig) -> Self {
        for s in &mut config.signatures {
            *s = s.to_lowercase();
        }
        config.signatures.retain(|s| !s.is_empty());
        Self {
            config,
            scheduled: None,
            consecutive: 0,
            degraded: false,
            absorbed: 0,
        }
    }

    pub fn is_transform_fault(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.config
            .signatures
            .iter()
            .any(|s| message.contains(s.as_str()))
    }

    /// Handle an engine error notification. Returns whether it was a
    /// transform fault.
    pub fn on_error(
        &mut self,
        message: &str,
        now: Instant,
        signals: &mut Vec<ControllerSignal>,
    ) -> bool {
        if !self.is_transform_fault(message) {
            debug!(error = message, "Engine error is not a transform fault, ignoring");
            return false;
        }
        self.absorbed += 1;

        if self.scheduled.is_some() {
            debug!(error = message, "Re-layout already scheduled, absorbing fault");
            return true;
        }
        if self.degraded {
            debug!(error = message, "Map degraded, no further re-layouts until healthy");
            return true;
        }

        self.consecutive += 1;
        if self.consecutive > self.config.max_recoveries {
            warn!(
                attempts = self.config.max_recoveries,
                error = message,
                "Transform faults persist after re-layouts, map degraded"
            );
            self.degraded = true;
            signals.push(ControllerSignal::MapDegraded);
            return true;
        }

        let due = now + self.config.relayout_delay;
        debug!(error = message, attempt = self.consecutive, "Transform fault, scheduling re-layout");
        self.scheduled = Some(due);
        true
    }

    /// Run the scheduled re-layout if its delay has elapsed. Returns whether
    /// it ran.
    pub fn poll<E: MapEngine + ?Sized>(&mut self, now: Instant, engine: &mut E) -> bool {
        match self.scheduled {
            Some(due) if now >= due => {
                engine.relayout();
                self.scheduled = None;
                debug!(attempt = self.consecutive, "Forced re-layout done");
                true
            }
            _ => false,
        }
    }

    /// The engine went idle with a trustworthy transform.
    pub fn on_healthy_idle(&mut self, signals: &mut Vec<ControllerSignal>) {
        self.consecutive = 0;
        if self.degraded {
            info!("Map transform healthy again");
            self.degraded = false;
            signals.push(ControllerSignal::MapRecovered);
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduled
    }

    /// Transform faults seen so far, including absorbed ones.
    pub fn fault_count(&self) -> u64 {
        self.absorbed
    }
}

impl Default for ResilienceLayer {
    fn default() -> Self {
        Self::new(ResilienceConfig::default())
    }
}
