//! Arena of live subscriptions.
//!
//! Every `observe`/`subscribe` call hands back a [`SubscriptionId`]; the
//! owner keeps the entries here and releases them all at teardown.
//! Iteration follows registration order.

/// Handle for one registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct Subscriptions<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, T)>,
}

impl<T> Default for Subscriptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subscriptions<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, value));
        id
    }

    /// Remove one entry, keeping the order of the rest.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<T> {
        let pos = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|(eid, _)| *eid == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubscriptionId, &T)> + '_ {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SubscriptionId, &mut T)> + '_ {
        self.entries.iter_mut().map(|(id, v)| (*id, v))
    }

    /// Take every entry out, oldest first.
    pub fn drain(&mut self) -> Vec<(SubscriptionId, T)> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::Subscriptions;

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut subs = Subscriptions::new();
        let a = subs.insert("a");
        let b = subs.insert("b");
        assert!(a < b);
        let got: Vec<_> = subs.iter().map(|(_, v)| *v).collect();
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn remove_keeps_registration_order() {
        let mut subs = Subscriptions::new();
        let a = subs.insert(1);
        let b = subs.insert(2);
        let _c = subs.insert(3);
        assert_eq!(subs.remove(b), Some(2));
        assert_eq!(subs.remove(b), None);
        assert!(subs.contains(a));
        let got: Vec<_> = subs.iter().map(|(_, v)| *v).collect();
        assert_eq!(got, vec![1, 3]);
    }

    #[test]
    fn ids_are_not_reused_after_drain() {
        let mut subs = Subscriptions::new();
        let a = subs.insert(());
        assert_eq!(subs.drain().len(), 1);
        assert!(subs.is_empty());
        let b = subs.insert(());
        assert_ne!(a, b);
    }
}
