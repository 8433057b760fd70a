use mapsync_core::{Viewport, ViewportStore, MAX_ZOOM, MIN_ZOOM};

/// A spread of candidates mixing valid, out-of-range and non-finite values.
fn candidates() -> Vec<Viewport> {
    let lats = [-120.0, -90.0, -45.5, 0.0, 40.7, 90.0, 90.01, f64::NAN];
    let lngs = [-200.0, -180.0, -74.0, 0.0, 179.9, 180.0, f64::INFINITY];
    let zooms = [0.0, MIN_ZOOM, 7.25, 12.0, MAX_ZOOM, 21.0, f64::NEG_INFINITY];

    let mut out = Vec::new();
    for &lat in &lats {
        for &lng in &lngs {
            for &zoom in &zooms {
                out.push(Viewport::from_parts(lat, lng, zoom));
            }
        }
    }
    out
}

fn in_range(vp: &Viewport) -> bool {
    (-90.0..=90.0).contains(&vp.latitude)
        && (-180.0..=180.0).contains(&vp.longitude)
        && (MIN_ZOOM..=MAX_ZOOM).contains(&vp.zoom)
}

#[test]
fn set_either_applies_or_leaves_store_unchanged() {
    let mut store = ViewportStore::new(Viewport::new(40.0, -74.0, 12.0).unwrap());

    for candidate in candidates() {
        let before = store.current();
        let after = store.set(candidate);

        if in_range(&candidate) {
            assert_eq!(after, candidate, "valid candidate must be stored as-is");
        } else {
            assert_eq!(after, before, "invalid candidate must not change the store");
        }
        assert!(in_range(&store.current()), "stored value left the invariant range");
    }
}

#[test]
fn stored_value_is_always_in_range() {
    let mut store = ViewportStore::new(Viewport::default());
    for candidate in candidates().into_iter().rev() {
        store.set(candidate);
        assert!(in_range(&store.current()));
    }
    assert!(store.rejected_count() > 0);
}
