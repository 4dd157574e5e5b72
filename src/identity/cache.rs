//! Identity cache - bidirectional, coalescing id <-> name resolution
use crate::{
    cache::{Claim, CoalescingCache, Resolution},
    identity::{NameKey, ObservableName, PlayerId, PlayerName, TieredResolver},
    metrics,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

const ID_TO_NAME: &str = "id_to_name";
const NAME_TO_ID: &str = "name_to_id";

/// Process-lifetime identity cache.
///
/// Holds one coalescing map per direction. Every successful resolution is
/// mirrored into the opposite map before its handle completes, so a caller
/// that sees `id -> name` can immediately look up `name -> id` without a
/// backend call. Failed entries are evicted; nothing else ever expires.
#[derive(Clone)]
pub struct IdentityCache {
    names: Arc<CoalescingCache<PlayerId, PlayerName>>,
    ids: Arc<CoalescingCache<NameKey, PlayerId>>,
    /// Held while a pair is written to both maps
    publishing: Arc<Mutex<()>>,
    resolver: TieredResolver,
    runtime: Handle,
}

impl IdentityCache {
    /// Create a cache that runs backend calls on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`with_runtime`](Self::with_runtime) from plain threads.
    pub fn new(resolver: TieredResolver) -> Self {
        Self::with_runtime(resolver, Handle::current())
    }

    /// Create a cache that runs backend calls on `runtime`
    pub fn with_runtime(resolver: TieredResolver, runtime: Handle) -> Self {
        info!("Identity cache initialized");
        Self {
            names: Arc::new(CoalescingCache::new(ID_TO_NAME)),
            ids: Arc::new(CoalescingCache::new(NAME_TO_ID)),
            publishing: Arc::new(Mutex::new(())),
            resolver,
            runtime,
        }
    }

    /// Resolve the display name of `id`.
    ///
    /// Returns immediately. Concurrent and later callers share one handle
    /// until the resolution fails.
    pub fn resolve_name(&self, id: PlayerId) -> Resolution<PlayerName> {
        let pending = match self.names.claim(id) {
            Claim::Joined(handle) => {
                metrics::record_lookup(ID_TO_NAME, true);
                debug!(%id, "Name lookup joined existing entry");
                return handle;
            }
            Claim::Leader(pending) => pending,
        };

        metrics::record_lookup(ID_TO_NAME, false);
        debug!(%id, "Name lookup started");

        let handle = pending.handle();
        let ids = Arc::clone(&self.ids);
        let publishing = Arc::clone(&self.publishing);
        let resolver = self.resolver.clone();
        self.runtime.spawn(async move {
            let result = resolver.name_for_id(id).await;

            // a displaced lookup must not write half a pair
            let _publishing = publishing.lock();
            if let Ok(name) = &result {
                if pending.is_current() {
                    ids.insert_resolved(name.key(), id);
                } else {
                    debug!(%id, %name, "Name lookup displaced, skipping mirror");
                }
            }
            pending.complete(result);
        });

        handle
    }

    /// Resolve the id currently holding `name` (any casing).
    pub fn resolve_id(&self, name: &str) -> Resolution<PlayerId> {
        let key = NameKey::new(name);
        let pending = match self.ids.claim(key.clone()) {
            Claim::Joined(handle) => {
                metrics::record_lookup(NAME_TO_ID, true);
                debug!(name = %key, "Id lookup joined existing entry");
                return handle;
            }
            Claim::Leader(pending) => pending,
        };

        metrics::record_lookup(NAME_TO_ID, false);
        debug!(name = %key, "Id lookup started");

        let handle = pending.handle();
        let names = Arc::clone(&self.names);
        let publishing = Arc::clone(&self.publishing);
        let resolver = self.resolver.clone();
        self.runtime.spawn(async move {
            let result = resolver.id_for_name(&key).await;

            let _publishing = publishing.lock();
            let result = result.map(|(id, canonical)| {
                if pending.is_current() {
                    names.insert_resolved(id, canonical);
                } else {
                    debug!(%id, name = %key, "Id lookup displaced, skipping mirror");
                }
                id
            });
            pending.complete(result);
        });

        handle
    }

    /// Seed both directions with a pair learned outside of a lookup.
    ///
    /// Overwrites existing entries and completes any displaced pending
    /// lookups with this pair. Never calls a backend.
    pub fn populate(&self, name: impl Into<PlayerName>, id: PlayerId) {
        let name = name.into();
        metrics::record_populate();
        debug!(%id, %name, "Populating identity pair");

        let _publishing = self.publishing.lock();
        self.names.insert_resolved(id, name.clone());
        self.ids.insert_resolved(name.key(), id);
    }

    /// Live view of the name of `id`, showing `placeholder` until it resolves
    pub fn observable_name(
        &self,
        id: PlayerId,
        placeholder: impl Into<PlayerName>,
    ) -> ObservableName {
        ObservableName::new(self.resolve_name(id), placeholder.into(), &self.runtime)
    }

    /// [`observable_name`](Self::observable_name) with an empty placeholder
    pub fn observable_name_default(&self, id: PlayerId) -> ObservableName {
        self.observable_name(id, PlayerName::default())
    }

    /// Resolved name of `id`, if already known; never starts a lookup
    pub fn cached_name(&self, id: PlayerId) -> Option<PlayerName> {
        self.names.resolved(&id)
    }

    /// Resolved id for `name`, if already known; never starts a lookup
    pub fn cached_id(&self, name: &str) -> Option<PlayerId> {
        self.ids.resolved(&NameKey::new(name))
    }

    /// Number of entries (pending or resolved) as `(id_to_name, name_to_id)`
    pub fn len(&self) -> (usize, usize) {
        (self.names.len(), self.ids.len())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.ids.is_empty()
    }
}
