// SPDX-License-Identifier: MIT
//! Per-document dependency index and change subscriptions
//!
//! A DefineBits payload is not decodable on its own: it needs the table
//! bytes owned by the document's single JPEGTables record. The
//! [`DependencyIndex`] resolves that lookup. Each document owns one index;
//! within it, tag kind maps to the shared state of the authoritative
//! record of that kind.
//!
//! Registration uses an atomic insert-or-fetch so that concurrent decodes
//! of the same document can never register the singular table twice: the
//! first registration wins and every later one observes it.
//!
//! Image tags subscribe to the resolved table. Mutating the table payload
//! notifies every live subscriber synchronously, before the mutating call
//! returns, so a subsequent decode by any subscriber observes the change.
//! Listeners are held weakly; a dropped subscriber is pruned on the next
//! fan-out.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Receives dependency-changed notifications.
///
/// Callbacks run synchronously inside the mutating call and must not
/// subscribe or unsubscribe from within.
pub trait InvalidationListener: Send + Sync {
    fn dependency_changed(&self);
}

struct Subscriber {
    token: u64,
    listener: Weak<dyn InvalidationListener>,
}

/// Shared interior state of an authoritative table record.
///
/// The owning record and the [`DependencyIndex`] both hold an `Arc` to this
/// state; the index never owns the record itself.
pub struct SharedTableState {
    payload: RwLock<Vec<u8>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_token: AtomicU64,
}

impl SharedTableState {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: RwLock::new(payload),
            subscribers: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current payload bytes.
    pub fn payload(&self) -> Vec<u8> {
        self.payload.read().clone()
    }

    /// Whether the payload is currently empty.
    pub fn is_empty(&self) -> bool {
        self.payload.read().is_empty()
    }

    /// Replace the payload and synchronously notify every live subscriber
    /// before returning.
    pub fn set_payload(&self, payload: Vec<u8>) {
        *self.payload.write() = payload;
        self.notify_changed();
    }

    fn notify_changed(&self) {
        // Snapshot the live listeners outside the lock so a callback can
        // never contend with the subscription table.
        let listeners: Vec<Arc<dyn InvalidationListener>> = {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|s| s.listener.strong_count() > 0);
            subscribers
                .iter()
                .filter_map(|s| s.listener.upgrade())
                .collect()
        };

        for listener in listeners {
            listener.dependency_changed();
        }
    }

    /// Register a listener for payload changes.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: Weak<dyn InvalidationListener>,
    ) -> SubscriptionHandle {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber { token, listener });
        SubscriptionHandle {
            state: Arc::downgrade(self),
            token,
        }
    }

    fn unsubscribe(&self, token: u64) {
        self.subscribers.lock().retain(|s| s.token != token);
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl std::fmt::Debug for SharedTableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTableState")
            .field("payload_len", &self.payload.read().len())
            .finish()
    }
}

/// Active subscription to a table record. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    state: Weak<SharedTableState>,
    token: u64,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.unsubscribe(self.token);
        }
    }
}

/// Per-document registry mapping tag kind to the authoritative shared
/// record state of that kind.
#[derive(Default)]
pub struct DependencyIndex {
    entries: Mutex<HashMap<u16, Arc<SharedTableState>>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the authoritative record state for a kind, if registered.
    pub fn lookup(&self, kind: u16) -> Option<Arc<SharedTableState>> {
        self.entries.lock().get(&kind).cloned()
    }

    /// Register `state` for `kind` unless a registration already exists.
    ///
    /// Returns the winning state and whether this call inserted it. The
    /// check and insert happen under one lock, so concurrent callers agree
    /// on a single winner.
    pub fn insert_or_fetch(
        &self,
        kind: u16,
        state: Arc<SharedTableState>,
    ) -> (Arc<SharedTableState>, bool) {
        let mut entries = self.entries.lock();
        match entries.entry(kind) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                (Arc::clone(existing.get()), false)
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&state));
                (state, true)
            }
        }
    }

    /// Subscribe a listener to the authoritative record of `kind`.
    ///
    /// Returns `None` when no record of that kind is registered.
    pub fn subscribe(
        &self,
        kind: u16,
        listener: Weak<dyn InvalidationListener>,
    ) -> Option<SubscriptionHandle> {
        self.lookup(kind).map(|state| state.subscribe(listener))
    }
}

impl std::fmt::Debug for DependencyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyIndex")
            .field("kinds", &self.entries.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::JPEG_TABLES;
    use std::sync::atomic::AtomicUsize;

    struct CountingListener {
        notified: AtomicUsize,
    }

    impl CountingListener {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                notified: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.notified.load(Ordering::SeqCst)
        }
    }

    impl InvalidationListener for CountingListener {
        fn dependency_changed(&self) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_lookup_empty() {
        let index = DependencyIndex::new();
        assert!(index.lookup(JPEG_TABLES).is_none());
    }

    #[test]
    fn test_insert_or_fetch_first_wins() {
        let index = DependencyIndex::new();
        let first = Arc::new(SharedTableState::new(vec![1]));
        let second = Arc::new(SharedTableState::new(vec![2]));

        let (winner, inserted) = index.insert_or_fetch(JPEG_TABLES, Arc::clone(&first));
        assert!(inserted);
        assert!(Arc::ptr_eq(&winner, &first));

        let (winner, inserted) = index.insert_or_fetch(JPEG_TABLES, second);
        assert!(!inserted);
        assert!(Arc::ptr_eq(&winner, &first));

        assert_eq!(index.lookup(JPEG_TABLES).unwrap().payload(), vec![1]);
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        let index = Arc::new(DependencyIndex::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let index = Arc::clone(&index);
            handles.push(std::thread::spawn(move || {
                let state = Arc::new(SharedTableState::new(vec![i]));
                index.insert_or_fetch(JPEG_TABLES, state)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let inserted: Vec<_> = results.iter().filter(|(_, i)| *i).collect();
        assert_eq!(inserted.len(), 1);

        let winner = &inserted[0].0;
        for (state, _) in &results {
            assert!(Arc::ptr_eq(state, winner));
        }
    }

    #[test]
    fn test_set_payload_notifies_synchronously() {
        let state = Arc::new(SharedTableState::new(vec![1]));
        let listener = CountingListener::new();
        let _handle = state.subscribe(Arc::downgrade(&listener) as Weak<dyn InvalidationListener>);

        state.set_payload(vec![2]);
        // Fan-out completed before set_payload returned
        assert_eq!(listener.count(), 1);
        assert_eq!(state.payload(), vec![2]);
    }

    #[test]
    fn test_dropped_listener_pruned() {
        let state = Arc::new(SharedTableState::new(Vec::new()));
        let listener = CountingListener::new();
        let _handle = state.subscribe(Arc::downgrade(&listener) as Weak<dyn InvalidationListener>);

        drop(listener);
        state.set_payload(vec![1]);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[test]
    fn test_handle_drop_unsubscribes() {
        let state = Arc::new(SharedTableState::new(Vec::new()));
        let listener = CountingListener::new();
        let handle = state.subscribe(Arc::downgrade(&listener) as Weak<dyn InvalidationListener>);

        assert_eq!(state.subscriber_count(), 1);
        drop(handle);
        assert_eq!(state.subscriber_count(), 0);

        state.set_payload(vec![1]);
        assert_eq!(listener.count(), 0);
    }

    #[test]
    fn test_index_subscribe_requires_registration() {
        let index = DependencyIndex::new();
        let listener = CountingListener::new();
        let weak = Arc::downgrade(&listener) as Weak<dyn InvalidationListener>;
        assert!(index.subscribe(JPEG_TABLES, weak.clone()).is_none());

        let state = Arc::new(SharedTableState::new(vec![1]));
        index.insert_or_fetch(JPEG_TABLES, state);
        assert!(index.subscribe(JPEG_TABLES, weak).is_some());
    }
}
