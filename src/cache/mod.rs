//! Coalescing cache store
//!
//! A sharded concurrent map from key to a single-assignment resolution cell.
//! The first caller for a key claims it and owns the pending entry; every
//! later caller joins the same cell until it completes. Failed cells are
//! evicted before their failure is published, so a key never stays wedged.

use crate::error::{LookupResult, ResolveError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::future::IntoFuture;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

type Slot<V> = Option<LookupResult<V>>;

/// Single-assignment cell shared by every waiter on one key
struct Cell<V> {
    tx: watch::Sender<Slot<V>>,
}

impl<V> Cell<V> {
    fn pending() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    fn resolved(value: V) -> Self {
        let (tx, _) = watch::channel(Some(Ok(value)));
        Self { tx }
    }

    /// Store the outcome unless one is already present
    fn set(&self, result: LookupResult<V>) -> bool {
        self.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(result);
            true
        })
    }

    fn handle(&self) -> Resolution<V> {
        Resolution {
            rx: self.tx.subscribe(),
        }
    }
}

/// Handle to a pending or completed resolution.
///
/// Cloning is cheap and every clone observes the same single outcome.
/// Await it directly, or [`peek`](Self::peek) without blocking.
#[derive(Clone)]
pub struct Resolution<V> {
    rx: watch::Receiver<Slot<V>>,
}

impl<V: Clone> Resolution<V> {
    /// Current state: `None` while pending
    pub fn peek(&self) -> Option<LookupResult<V>> {
        self.rx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.rx.borrow().is_none()
    }

    /// Wait for the outcome
    pub async fn wait(mut self) -> LookupResult<V> {
        let outcome = match self.rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(ResolveError::transport(
                "player identity",
                "resolution abandoned",
            ))
        })
    }
}

impl<V> IntoFuture for Resolution<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = LookupResult<V>;
    type IntoFuture = BoxFuture<'static, LookupResult<V>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// Outcome of claiming a key
pub enum Claim<K: Eq + Hash, V> {
    /// Another caller already owns the resolution (pending or complete)
    Joined(Resolution<V>),
    /// This caller installed the pending entry and must complete it
    Leader(PendingEntry<K, V>),
}

/// Ownership of a freshly installed pending entry.
///
/// Completing it publishes the outcome to every waiter. Dropping it without
/// completing evicts the entry and fails the waiters, so a lost resolution
/// task can never leave a key pending forever.
pub struct PendingEntry<K: Eq + Hash, V> {
    key: K,
    cell: Arc<Cell<V>>,
    entries: Arc<DashMap<K, Arc<Cell<V>>>>,
    label: &'static str,
    completed: bool,
}

impl<K: Eq + Hash, V> PendingEntry<K, V> {
    pub fn handle(&self) -> Resolution<V> {
        self.cell.handle()
    }

    /// Whether this entry still owns its key and has no outcome yet.
    ///
    /// False once the entry has been displaced, e.g. by a populate.
    pub fn is_current(&self) -> bool {
        if self.cell.tx.borrow().is_some() {
            return false;
        }
        self.entries
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current.value(), &self.cell))
    }

    /// Publish the outcome. Failures are evicted first so the next lookup retries.
    ///
    /// Returns false when the cell already held an outcome, in which case
    /// `result` is dropped.
    pub fn complete(mut self, result: LookupResult<V>) -> bool {
        self.completed = true;
        if result.is_err() {
            self.evict();
        }
        let published = self.cell.set(result);
        if !published {
            debug!(cache = self.label, "Dropped outcome of displaced entry");
        }
        published
    }

    /// Remove the entry, unless something else has replaced it meanwhile
    fn evict(&self) {
        let removed = self
            .entries
            .remove_if(&self.key, |_, current| Arc::ptr_eq(current, &self.cell));
        if removed.is_some() {
            debug!(cache = self.label, "Evicted failed entry");
        }
    }
}

impl<K: Eq + Hash, V> Drop for PendingEntry<K, V> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        self.evict();
        self.cell.set(Err(ResolveError::transport(
            self.label,
            "resolution abandoned",
        )));
    }
}

/// One direction of the identity cache: key -> single-assignment result
pub struct CoalescingCache<K: Eq + Hash, V> {
    label: &'static str,
    entries: Arc<DashMap<K, Arc<Cell<V>>>>,
}

impl<K, V> CoalescingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Atomically join the existing entry for `key` or install a pending one.
    ///
    /// Only the shard holding `key` is locked, and only for the check and insert.
    pub fn claim(&self, key: K) -> Claim<K, V> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(existing) => Claim::Joined(existing.get().handle()),
            Entry::Vacant(vacant) => {
                let cell = Arc::new(Cell::pending());
                vacant.insert(Arc::clone(&cell));
                Claim::Leader(PendingEntry {
                    key,
                    cell,
                    entries: Arc::clone(&self.entries),
                    label: self.label,
                    completed: false,
                })
            }
        }
    }

    /// Install an already resolved entry, replacing whatever was there.
    ///
    /// A displaced pending entry is completed with `value` so its waiters
    /// are not left behind.
    pub fn insert_resolved(&self, key: K, value: V) {
        let cell = Arc::new(Cell::resolved(value.clone()));
        if let Some(previous) = self.entries.insert(key, cell) {
            previous.set(Ok(value));
        }
    }

    /// Handle for `key` if an entry exists; never starts a resolution
    pub fn get(&self, key: &K) -> Option<Resolution<V>> {
        self.entries.get(key).map(|cell| cell.handle())
    }

    /// Resolved value for `key`, if any
    pub fn resolved(&self, key: &K) -> Option<V> {
        let cell = self.entries.get(key)?;
        let slot = cell.tx.borrow();
        match &*slot {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(claim: Claim<u32, String>) -> PendingEntry<u32, String> {
        match claim {
            Claim::Leader(pending) => pending,
            Claim::Joined(_) => panic!("expected to lead the resolution"),
        }
    }

    fn joined(claim: Claim<u32, String>) -> Resolution<String> {
        match claim {
            Claim::Joined(handle) => handle,
            Claim::Leader(_) => panic!("expected to join an existing resolution"),
        }
    }

    #[tokio::test]
    async fn test_second_claim_joins_pending_entry() {
        let cache = CoalescingCache::<u32, String>::new("test");

        let pending = leader(cache.claim(7));
        let first = pending.handle();
        let second = joined(cache.claim(7));
        assert!(second.is_pending());

        assert!(pending.complete(Ok("Steve".to_string())));

        assert_eq!(first.await, Ok("Steve".to_string()));
        assert_eq!(second.await, Ok("Steve".to_string()));
        assert_eq!(cache.resolved(&7), Some("Steve".to_string()));
    }

    #[tokio::test]
    async fn test_failure_evicts_entry() {
        let cache = CoalescingCache::<u32, String>::new("test");

        let pending = leader(cache.claim(1));
        let handle = pending.handle();
        pending.complete(Err(ResolveError::not_found("1")));

        assert_eq!(handle.await, Err(ResolveError::not_found("1")));
        assert!(cache.is_empty());
        // next caller leads a fresh attempt
        leader(cache.claim(1)).complete(Ok("Alex".to_string()));
        assert_eq!(cache.resolved(&1), Some("Alex".to_string()));
    }

    #[tokio::test]
    async fn test_insert_resolved_completes_displaced_pending_entry() {
        let cache = CoalescingCache::<u32, String>::new("test");

        let pending = leader(cache.claim(3));
        let waiter = pending.handle();
        assert!(pending.is_current());

        cache.insert_resolved(3, "Herobrine".to_string());
        assert_eq!(waiter.peek(), Some(Ok("Herobrine".to_string())));
        assert!(!pending.is_current());

        // late backend failure must not evict the populated entry
        assert!(!pending.complete(Err(ResolveError::transport("3", "timeout"))));
        assert_eq!(cache.resolved(&3), Some("Herobrine".to_string()));
        assert_eq!(waiter.await, Ok("Herobrine".to_string()));
    }

    #[tokio::test]
    async fn test_insert_resolved_overwrites_resolved_entry() {
        let cache = CoalescingCache::<u32, String>::new("test");
        cache.insert_resolved(4, "Old".to_string());
        cache.insert_resolved(4, "New".to_string());

        assert_eq!(cache.resolved(&4), Some("New".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_pending_entry_fails_waiters_and_evicts() {
        let cache = CoalescingCache::<u32, String>::new("test");

        let pending = leader(cache.claim(5));
        let waiter = pending.handle();
        drop(pending);

        let err = waiter.await.unwrap_err();
        assert!(err.is_transient());
        assert!(cache.get(&5).is_none());
    }

    #[test]
    fn test_resolved_ignores_pending_entries() {
        let cache = CoalescingCache::<u32, String>::new("test");
        let _pending = leader(cache.claim(9));

        assert!(cache.get(&9).is_some());
        assert_eq!(cache.resolved(&9), None);
    }
}
