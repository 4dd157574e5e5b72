//! Push-updated view of a single id -> name resolution
use crate::{cache::Resolution, identity::PlayerName};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

/// Observable display name.
///
/// Starts at the placeholder and is set at most once, when the underlying
/// resolution succeeds. It is never refreshed afterwards; on failure the
/// placeholder stays. Each instance shares the cache's resolution handle.
#[derive(Debug, Clone)]
pub struct ObservableName {
    rx: watch::Receiver<PlayerName>,
}

impl ObservableName {
    pub(crate) fn new(
        resolution: Resolution<PlayerName>,
        placeholder: PlayerName,
        runtime: &Handle,
    ) -> Self {
        let (tx, rx) = watch::channel(placeholder);

        runtime.spawn(async move {
            match resolution.await {
                Ok(name) => {
                    // no observers left is fine
                    let _ = tx.send(name);
                }
                Err(e) => debug!(error = %e, "Keeping placeholder name"),
            }
        });

        Self { rx }
    }

    /// Current value
    pub fn get(&self) -> PlayerName {
        self.rx.borrow().clone()
    }

    /// Wait for the resolved name.
    ///
    /// Returns `false` once no further update can arrive, either because the
    /// name was already delivered or because resolution failed.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Raw receiver for presentation layers that drive their own loop
    pub fn subscribe(&self) -> watch::Receiver<PlayerName> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Claim, CoalescingCache, PendingEntry};
    use crate::error::ResolveError;
    use crate::identity::PlayerId;

    fn pending(
        cache: &CoalescingCache<PlayerId, PlayerName>,
        id: PlayerId,
    ) -> PendingEntry<PlayerId, PlayerName> {
        match cache.claim(id) {
            Claim::Leader(pending) => pending,
            Claim::Joined(_) => panic!("entry already present"),
        }
    }

    fn steve() -> PlayerId {
        "8667ba71b85a4004af54457a9734eed7".parse().unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_then_single_push() {
        let cache = CoalescingCache::new("test");
        let entry = pending(&cache, steve());
        let mut observable = ObservableName::new(
            entry.handle(),
            PlayerName::from("..."),
            &Handle::current(),
        );

        assert_eq!(observable.get().as_str(), "...");

        entry.complete(Ok(PlayerName::from("Steve")));
        assert!(observable.changed().await);
        assert_eq!(observable.get().as_str(), "Steve");

        // the pushing task is gone; nothing else can arrive
        assert!(!observable.changed().await);
        assert_eq!(observable.get().as_str(), "Steve");
    }

    #[tokio::test]
    async fn test_failure_keeps_placeholder() {
        let cache = CoalescingCache::new("test");
        let entry = pending(&cache, steve());
        let mut observable = ObservableName::new(
            entry.handle(),
            PlayerName::default(),
            &Handle::current(),
        );

        entry.complete(Err(ResolveError::not_found("steve")));

        assert!(!observable.changed().await);
        assert_eq!(observable.get().as_str(), "");
    }

    #[tokio::test]
    async fn test_subscribers_see_the_push() {
        let cache = CoalescingCache::new("test");
        let entry = pending(&cache, steve());
        let observable = ObservableName::new(
            entry.handle(),
            PlayerName::default(),
            &Handle::current(),
        );
        let mut rx = observable.subscribe();

        entry.complete(Ok(PlayerName::from("Steve")));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_str(), "Steve");
    }
}
