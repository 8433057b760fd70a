use std::fmt;

use tracing::{debug, warn};

use crate::bounds::BoundsSnapshot;
use crate::subscription::{SubscriptionId, Subscriptions};
use crate::viewport::Viewport;

/// Callback run after every accepted viewport.
pub type ViewportObserver = Box<dyn FnMut(&Viewport)>;

/// Sole owner of the current viewport and the last-known bounding box.
///
/// Every candidate goes through [`Viewport::validated`]. A rejected candidate
/// leaves the stored value untouched, and observers only run for accepted
/// ones: exactly once per `set`, in registration order.
///
/// Observers are for embedders. A controller owning the store runs its own
/// reactions (bounds extraction, the selection check) on the engine's
/// move-start and move-end notifications, after `set` has returned and before
/// any query is scheduled.
pub struct ViewportStore {
    current: Viewport,
    last_bounds: Option<BoundsSnapshot>,
    observers: Subscriptions<ViewportObserver>,
    rejected: u64,
}

impl ViewportStore {
    /// Create a store holding `initial`, or the default view if `initial` is invalid.
    pub fn new(initial: Viewport) -> Self {
        let current = match initial.validated() {
            Ok(vp) => vp,
            Err(e) => {
                warn!("Initial viewport rejected, using default: {e}");
                Viewport::default()
            }
        };
        Self {
            current,
            last_bounds: None,
            observers: Subscriptions::new(),
            rejected: 0,
        }
    }

    pub fn current(&self) -> Viewport {
        self.current
    }

    /// Offer a candidate viewport and return whatever the store now holds.
    pub fn set(&mut self, candidate: Viewport) -> Viewport {
        // A rejection is already logged by `try_set`.
        let _ = self.try_set(candidate);
        self.current
    }

    /// Like [`set`](Self::set), but reports why a candidate was rejected.
    pub fn try_set(&mut self, candidate: Viewport) -> crate::Result<Viewport> {
        match candidate.validated() {
            Ok(vp) => {
                self.current = vp;
                for (_, observer) in self.observers.iter_mut() {
                    observer(&vp);
                }
                Ok(vp)
            }
            Err(e) => {
                self.rejected += 1;
                debug!(
                    lat = candidate.latitude,
                    lng = candidate.longitude,
                    zoom = candidate.zoom,
                    "Viewport candidate rejected: {e}"
                );
                Err(e)
            }
        }
    }

    /// Remember bounds that passed extraction. Does not notify observers.
    pub fn record_bounds(&mut self, snapshot: BoundsSnapshot) {
        self.last_bounds = Some(snapshot);
    }

    /// The most recent bounds recorded with [`record_bounds`](Self::record_bounds).
    pub fn last_bounds(&self) -> Option<BoundsSnapshot> {
        self.last_bounds
    }

    pub fn observe(&mut self, observer: impl FnMut(&Viewport) + 'static) -> SubscriptionId {
        self.observers.insert(Box::new(observer))
    }

    pub fn unobserve(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Drop every observer.
    pub fn clear_observers(&mut self) {
        self.observers.drain();
    }

    /// How many candidates have been rejected since creation.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

impl fmt::Debug for ViewportStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportStore")
            .field("current", &self.current)
            .field("last_bounds", &self.last_bounds)
            .field("observers", &self.observers.len())
            .field("rejected", &self.rejected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::bounds::BoundingBox;

    fn nyc() -> Viewport {
        Viewport::new(40.0, -74.0, 12.0).unwrap()
    }

    #[test]
    fn accepted_candidate_replaces_value() {
        let mut store = ViewportStore::new(nyc());
        let next = Viewport::new(40.5, -74.0, 12.0).unwrap();
        assert_eq!(store.set(next), next);
        assert_eq!(store.current(), next);
    }

    #[test]
    fn rejected_candidate_keeps_previous_value() {
        let mut store = ViewportStore::new(nyc());
        let bad = Viewport::from_parts(95.0, -74.0, 12.0);
        assert_eq!(store.set(bad), nyc());
        assert_eq!(store.current(), nyc());
        assert_eq!(store.rejected_count(), 1);
    }

    #[test]
    fn invalid_initial_value_falls_back_to_default() {
        let store = ViewportStore::new(Viewport::from_parts(f64::NAN, 0.0, 5.0));
        assert_eq!(store.current(), Viewport::default());
    }

    #[test]
    fn observers_run_once_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = ViewportStore::new(nyc());
        let l1 = Rc::clone(&log);
        store.observe(move |vp| l1.borrow_mut().push(("first", vp.zoom)));
        let l2 = Rc::clone(&log);
        store.observe(move |vp| l2.borrow_mut().push(("second", vp.zoom)));

        store.set(nyc().with_zoom(13.0));
        assert_eq!(*log.borrow(), vec![("first", 13.0), ("second", 13.0)]);
    }

    #[test]
    fn observers_skip_rejected_candidates() {
        let count = Rc::new(RefCell::new(0));
        let mut store = ViewportStore::new(nyc());
        let c = Rc::clone(&count);
        store.observe(move |_| *c.borrow_mut() += 1);

        store.set(nyc().with_zoom(25.0));
        store.set(nyc().with_zoom(f64::NAN));
        assert_eq!(*count.borrow(), 0);
        store.set(nyc());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unobserve_stops_notifications() {
        let count = Rc::new(RefCell::new(0));
        let mut store = ViewportStore::new(nyc());
        let c = Rc::clone(&count);
        let id = store.observe(move |_| *c.borrow_mut() += 1);
        assert!(store.unobserve(id));
        assert!(!store.unobserve(id));
        store.set(nyc().with_zoom(14.0));
        assert_eq!(*count.borrow(), 0);
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn last_bounds_survive_viewport_changes() {
        let mut store = ViewportStore::new(nyc());
        assert_eq!(store.last_bounds(), None);

        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        store.observe(move |_| *c.borrow_mut() += 1);

        let snapshot = BoundsSnapshot {
            bounds: BoundingBox::new(40.1, 39.9, -73.9, -74.1).unwrap(),
            zoom: 12.0,
        };
        store.record_bounds(snapshot);
        assert_eq!(*count.borrow(), 0);
        store.set(nyc().with_zoom(14.0));
        store.set(nyc().with_zoom(f64::NAN));
        assert_eq!(store.last_bounds(), Some(snapshot));
    }
}
