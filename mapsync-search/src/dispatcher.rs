use std::time::{Duration, Instant};

use tracing::debug;

use mapsync_core::BoundsSnapshot;

use crate::request::{SearchRequest, Trigger};

/// Timing knobs for the dispatcher. None of the values carry a correctness
/// contract; they only shape how eagerly queries go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Quiescence required after the last trigger before a query fires.
    pub debounce: Duration,
    /// Wait before the single retry after an unready extraction.
    pub retry_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            retry_backoff: Duration::from_millis(150),
        }
    }
}

/// What the caller must do after [`QueryDispatcher::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notified {
    /// A move is starting: check the active selection against the current
    /// bounds right now, before anything else happens.
    CheckSelection,
    /// A query is pending and will be due at `due`.
    Scheduled { due: Instant },
    /// Nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Instant,
    trigger: Trigger,
    retried: bool,
}

/// Coalesces viewport notifications into sequenced search requests.
///
/// Only the latest schedule survives: a trigger arriving inside the debounce
/// window replaces the pending one instead of queueing behind it. Nothing
/// here is ever cancelled at the transport level; superseded responses are
/// filtered out later by the reconciler.
#[derive(Debug)]
pub struct QueryDispatcher {
    config: DispatcherConfig,
    pending: Option<Pending>,
    last_sequence: u64,
    query: String,
}

impl QueryDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            pending: None,
            last_sequence: 0,
            query: String::new(),
        }
    }

    pub fn notify(&mut self, trigger: Trigger, now: Instant) -> Notified {
        match trigger {
            Trigger::MoveStart => Notified::CheckSelection,
            _ => self.schedule(trigger, now),
        }
    }

    /// Replace the free-text query. A changed query schedules a search.
    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) -> Notified {
        let query = query.into();
        if query == self.query {
            return Notified::Ignored;
        }
        self.query = query;
        self.schedule(Trigger::QueryChanged, now)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn schedule(&mut self, trigger: Trigger, now: Instant) -> Notified {
        let due = now + self.config.debounce;
        let replaced = self.pending.replace(Pending {
            due,
            trigger,
            retried: false,
        });
        if let Some(old) = replaced {
            debug!(replaced = %old.trigger, %trigger, "Debounce window restarted");
        }
        Notified::Scheduled { due }
    }

    /// Fire the pending query if its window has elapsed.
    ///
    /// `extract` is only called once the window is over. When it yields no
    /// snapshot the query is retried once after the backoff, then dropped
    /// silently; the next gesture schedules afresh.
    pub fn poll(
        &mut self,
        now: Instant,
        extract: impl FnOnce() -> Option<BoundsSnapshot>,
    ) -> Option<SearchRequest> {
        let pending = match self.pending {
            Some(p) if now >= p.due => p,
            _ => return None,
        };
        self.pending = None;

        match extract() {
            Some(snapshot) => {
                self.last_sequence += 1;
                debug!(
                    sequence = self.last_sequence,
                    trigger = %pending.trigger,
                    zoom = snapshot.zoom,
                    "Dispatching search"
                );
                Some(SearchRequest {
                    sequence: self.last_sequence,
                    bounds: snapshot.bounds,
                    zoom: snapshot.zoom,
                    query: self.query.clone(),
                })
            }
            None if !pending.retried => {
                debug!(trigger = %pending.trigger, "Engine not ready, retrying once");
                self.pending = Some(Pending {
                    due: now + self.config.retry_backoff,
                    retried: true,
                    ..pending
                });
                None
            }
            None => {
                debug!(trigger = %pending.trigger, "Engine still not ready, skipping query");
                None
            }
        }
    }

    /// Drop the pending schedule, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    /// Sequence number of the most recent request built, 0 before the first.
    pub fn latest_sequence(&self) -> u64 {
        self.last_sequence
    }
}

#[cfg(test)]
mod tests {
    use mapsync_core::{BoundingBox, LngLat};

    use super::*;

    fn snapshot(lat: f64, zoom: f64) -> Option<BoundsSnapshot> {
        Some(BoundsSnapshot {
            bounds: BoundingBox::around(LngLat::new(-74.0, lat), 0.05, 0.1).unwrap(),
            zoom,
        })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn move_start_asks_for_selection_check() {
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        assert_eq!(d.notify(Trigger::MoveStart, Instant::now()), Notified::CheckSelection);
        assert!(!d.is_pending());
    }

    #[test]
    fn nothing_fires_inside_the_window() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        d.notify(Trigger::MoveEnd, t0);
        let fired = d.poll(t0 + ms(299), || panic!("extract called too early"));
        assert!(fired.is_none());
        assert!(d.is_pending());
    }

    #[test]
    fn burst_coalesces_into_one_request_from_the_last_trigger() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        d.notify(Trigger::MoveEnd, t0);
        d.notify(Trigger::MoveEnd, t0 + ms(100));
        d.notify(Trigger::ZoomEnd, t0 + ms(200));

        // The first trigger's deadline has passed, but it was replaced.
        assert!(d.poll(t0 + ms(350), || snapshot(40.0, 12.0)).is_none());

        let req = d.poll(t0 + ms(500), || snapshot(40.5, 14.0)).unwrap();
        assert_eq!(req.sequence, 1);
        assert_eq!(req.zoom, 14.0);
        assert!(d.poll(t0 + ms(2000), || snapshot(40.5, 14.0)).is_none());
    }

    #[test]
    fn sequence_strictly_increases() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        let mut seen = Vec::new();
        for i in 0..3 {
            let t = t0 + ms(i * 1000);
            d.notify(Trigger::MoveEnd, t);
            seen.push(d.poll(t + ms(300), || snapshot(40.0, 12.0)).unwrap().sequence);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(d.latest_sequence(), 3);
    }

    #[test]
    fn unready_retries_once_then_gives_up() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        d.notify(Trigger::MoveEnd, t0);

        assert!(d.poll(t0 + ms(300), || None).is_none());
        assert_eq!(d.next_deadline(), Some(t0 + ms(450)));

        assert!(d.poll(t0 + ms(450), || None).is_none());
        assert!(!d.is_pending());
        assert_eq!(d.latest_sequence(), 0);
    }

    #[test]
    fn retry_can_succeed() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        d.notify(Trigger::ZoomEnd, t0);
        assert!(d.poll(t0 + ms(300), || None).is_none());
        let req = d.poll(t0 + ms(460), || snapshot(40.0, 10.0)).unwrap();
        assert_eq!(req.sequence, 1);
    }

    #[test]
    fn query_change_schedules_and_is_carried() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        assert!(matches!(d.set_query("pizza", t0), Notified::Scheduled { .. }));
        assert_eq!(d.set_query("pizza", t0), Notified::Ignored);
        let req = d.poll(t0 + ms(300), || snapshot(40.0, 12.0)).unwrap();
        assert_eq!(req.query, "pizza");
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut d = QueryDispatcher::new(DispatcherConfig::default());
        d.notify(Trigger::MoveEnd, t0);
        d.cancel();
        assert!(d.poll(t0 + ms(1000), || snapshot(40.0, 12.0)).is_none());
    }
}
