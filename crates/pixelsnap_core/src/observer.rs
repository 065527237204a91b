//! # Observer Lists
//!
//! Explicit, ordered callback lists for the registry-wide "positions updated"
//! broadcast and the per-entity "position updated" notification.
//!
//! Observers run in subscription order. An empty list simply notifies no one.

/// Identifier returned by [`ObserverList::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

type Observer<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Ordered list of observers for events of type `E`.
///
/// Callbacks take `&E` and must not re-enter whatever owns the list.
pub struct ObserverList<E: ?Sized> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer<E>)>,
}

impl<E: ?Sized> ObserverList<E> {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    /// Creates an empty list with room for `capacity` observers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: 0,
            observers: Vec::with_capacity(capacity),
        }
    }

    /// Appends an observer and returns its id.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer, keeping the order of the rest.
    ///
    /// Returns false if the id was unknown or already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.observers.iter().position(|(sub, _)| *sub == id) {
            Some(index) => {
                drop(self.observers.remove(index));
                true
            }
            None => false,
        }
    }

    /// Invokes every observer in subscription order.
    pub fn notify(&self, event: &E) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }

    /// Number of subscribed observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<E: ?Sized> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> std::fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_notify_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list: ObserverList<u32> = ObserverList::new();

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            list.subscribe(move |v: &u32| log.lock().push(format!("{tag}{v}")));
        }
        list.notify(&7);

        assert_eq!(*log.lock(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_unsubscribe_keeps_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list: ObserverList<u32> = ObserverList::new();

        let ids: Vec<_> = (0..3)
            .map(|i| {
                let log = Arc::clone(&log);
                list.subscribe(move |_: &u32| log.lock().push(i))
            })
            .collect();

        assert!(list.unsubscribe(ids[1]));
        assert!(!list.unsubscribe(ids[1]));
        list.notify(&0);

        assert_eq!(*log.lock(), vec![0, 2]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_list_notifies_nobody() {
        let list: ObserverList<str> = ObserverList::default();
        assert!(list.is_empty());
        list.notify("nothing happens");
    }

    #[test]
    fn test_unsubscribe_releases_captures() {
        let shared = Arc::new(0_u32);
        let mut list: ObserverList<u32> = ObserverList::new();
        let captured = Arc::clone(&shared);
        let id = list.subscribe(move |_: &u32| {
            let _ = *captured;
        });
        assert_eq!(Arc::strong_count(&shared), 2);

        assert!(list.unsubscribe(id));
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut list: ObserverList<u8> = ObserverList::new();
        let a = list.subscribe(|_| {});
        list.unsubscribe(a);
        let b = list.subscribe(|_| {});
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
