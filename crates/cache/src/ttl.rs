use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, SystemTime},
};

use thiserror::Error;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::trace;

use crate::metrics::{self, Operation};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("not found")]
    NotFound,
}

type Callback<V> = Arc<dyn Fn(&str, &V, SystemTime) + Send + Sync>;

struct Item<V> {
    value: V,
    expires_at: SystemTime,
    invincible: bool,
}

struct Inner<V> {
    items: HashMap<String, Item<V>>,
    added_callbacks: Vec<Callback<V>>,
    deleted_callbacks: Vec<Callback<V>>,
}

/// A bounded map from string keys to values with a per-entry expiry.
///
/// When an `add` would push the map past `max_items`, exactly one
/// non-invincible entry is evicted first: the one with the earliest
/// `expires_at`. Ties are broken by whichever minimal entry the underlying
/// `HashMap` iteration visits first, which is arbitrary but stable within a
/// single pass. Invincible entries are exempt from both capacity eviction and
/// the expiry sweep, so the map may temporarily exceed `max_items` when
/// everything else is pinned.
pub struct TtlCache<V> {
    name: String,
    max_items: usize,
    inner: RwLock<Inner<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_items: usize, name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_items,
            inner: RwLock::new(Inner {
                items: HashMap::with_capacity(max_items),
                added_callbacks: Vec::new(),
                deleted_callbacks: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a callback invoked on a fresh task whenever an item is added.
    pub fn on_item_added<F>(&self, callback: F)
    where
        F: Fn(&str, &V, SystemTime) + Send + Sync + 'static,
    {
        self.inner
            .write()
            .expect("cache lock poisoned")
            .added_callbacks
            .push(Arc::new(callback));
    }

    /// Registers a callback invoked on a fresh task whenever an item is
    /// deleted, expired or evicted.
    pub fn on_item_deleted<F>(&self, callback: F)
    where
        F: Fn(&str, &V, SystemTime) + Send + Sync + 'static,
    {
        self.inner
            .write()
            .expect("cache lock poisoned")
            .deleted_callbacks
            .push(Arc::new(callback));
    }

    pub fn add(&self, key: &str, value: V, expires_at: SystemTime, invincible: bool) {
        let mut inner = self.inner.write().expect("cache lock poisoned");

        if !inner.items.contains_key(key) && inner.items.len() >= self.max_items {
            self.evict_closest_to_expiry(&mut inner);
        }

        inner.items.insert(
            key.to_string(),
            Item {
                value: value.clone(),
                expires_at,
                invincible,
            },
        );

        metrics::observe_operation(&self.name, Operation::Add);
        metrics::observe_len(&self.name, inner.items.len());

        Self::fire(&inner.added_callbacks, key, &value, expires_at);
    }

    pub fn get(&self, key: &str) -> Result<(V, SystemTime), CacheError> {
        let inner = self.inner.read().expect("cache lock poisoned");

        metrics::observe_operation(&self.name, Operation::Get);

        match inner.items.get(key) {
            Some(item) => {
                metrics::observe_hit(&self.name);

                Ok((item.value.clone(), item.expires_at))
            }
            None => {
                metrics::observe_miss(&self.name);

                Err(CacheError::NotFound)
            }
        }
    }

    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.write().expect("cache lock poisoned");

        self.remove(&mut inner, key, Operation::Delete);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("cache lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the expiry sweep once per second until shutdown is signalled.
    pub fn start_sweeper(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep(SystemTime::now()),
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn sweep(&self, now: SystemTime) {
        let mut inner = self.inner.write().expect("cache lock poisoned");

        let expired = inner
            .items
            .iter()
            .filter(|(_, item)| !item.invincible && item.expires_at < now)
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();

        for key in expired {
            trace!(cache = %self.name, key = %key, "Expiring item");

            self.remove(&mut inner, &key, Operation::Delete);
        }
    }

    fn evict_closest_to_expiry(&self, inner: &mut Inner<V>) {
        let candidate = inner
            .items
            .iter()
            .filter(|(_, item)| !item.invincible)
            .min_by_key(|(_, item)| item.expires_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = candidate {
            trace!(cache = %self.name, key = %key, "Evicting item");

            self.remove(inner, &key, Operation::Evict);
        }
    }

    fn remove(&self, inner: &mut Inner<V>, key: &str, operation: Operation) {
        if let Some(item) = inner.items.remove(key) {
            metrics::observe_operation(&self.name, operation);
            metrics::observe_len(&self.name, inner.items.len());

            Self::fire(&inner.deleted_callbacks, key, &item.value, item.expires_at);
        }
    }

    fn fire(callbacks: &[Callback<V>], key: &str, value: &V, expires_at: SystemTime) {
        for callback in callbacks {
            let callback = Arc::clone(callback);
            let key = key.to_string();
            let value = value.clone();

            tokio::spawn(async move {
                callback(&key, &value, expires_at);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    fn far_future() -> SystemTime {
        SystemTime::now() + Duration::from_secs(3600)
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let cache = TtlCache::new(10, "test_add_and_get");
        let expires_at = far_future();

        cache.add("a", 1u64, expires_at, false);

        let (value, expiry) = cache.get("a").expect("item should exist");
        assert_eq!(value, 1);
        assert_eq!(expiry, expires_at);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache: TtlCache<u64> = TtlCache::new(10, "test_get_missing_key");

        assert_eq!(cache.get("missing"), Err(CacheError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = TtlCache::new(10, "test_delete");

        cache.add("a", 1u64, far_future(), false);
        cache.delete("a");

        assert_eq!(cache.get("a"), Err(CacheError::NotFound));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_add_replaces_existing_key() {
        let cache = TtlCache::new(10, "test_add_replaces_existing_key");

        cache.add("a", 1u64, far_future(), false);
        cache.add("a", 2u64, far_future(), false);

        let (value, _) = cache.get("a").expect("item should exist");
        assert_eq!(value, 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_eviction_picks_earliest_expiry() {
        let cache = TtlCache::new(3, "test_eviction_picks_earliest_expiry");
        let now = SystemTime::now();

        cache.add("a", 1u64, now + Duration::from_secs(300), false);
        cache.add("b", 2u64, now + Duration::from_secs(100), false);
        cache.add("c", 3u64, now + Duration::from_secs(200), false);

        // Fourth add evicts "b", the entry closest to expiry.
        cache.add("d", 4u64, now + Duration::from_secs(400), false);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("b"), Err(CacheError::NotFound));
        assert!(cache.get("a").is_ok());
        assert!(cache.get("c").is_ok());
        assert!(cache.get("d").is_ok());
    }

    #[tokio::test]
    async fn test_eviction_skips_invincible_items() {
        let cache = TtlCache::new(3, "test_eviction_skips_invincible_items");
        let now = SystemTime::now();

        // The invincible entry expires first but must never be chosen.
        cache.add("genesis", 0u64, now + Duration::from_secs(1), true);
        cache.add("a", 1u64, now + Duration::from_secs(500), false);
        cache.add("b", 2u64, now + Duration::from_secs(100), false);

        cache.add("c", 3u64, now + Duration::from_secs(400), false);

        assert!(cache.get("genesis").is_ok());
        assert_eq!(cache.get("b"), Err(CacheError::NotFound));
    }

    #[tokio::test]
    async fn test_add_succeeds_when_everything_is_invincible() {
        let cache = TtlCache::new(2, "test_add_succeeds_when_everything_is_invincible");

        cache.add("a", 1u64, far_future(), true);
        cache.add("b", 2u64, far_future(), true);
        cache.add("c", 3u64, far_future(), false);

        // No eviction candidate existed, so the cache overflows its cap.
        assert_eq!(cache.len(), 3);
        assert!(cache.get("a").is_ok());
        assert!(cache.get("b").is_ok());
        assert!(cache.get("c").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_items() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let cache = Arc::new(TtlCache::new(10, "test_sweeper_removes_expired_items"));

        cache.add("short", 1u64, SystemTime::now(), false);
        cache.add("long", 2u64, far_future(), false);
        cache.add("pinned", 3u64, SystemTime::now(), true);

        Arc::clone(&cache).start_sweeper(shutdown_rx);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.get("short"), Err(CacheError::NotFound));
        assert!(cache.get("long").is_ok());
        assert!(cache.get("pinned").is_ok(), "invincible items never expire");
    }

    #[tokio::test]
    async fn test_deleted_callback_fires_on_eviction() {
        let cache = TtlCache::new(1, "test_deleted_callback_fires_on_eviction");
        let (sender, mut receiver) = mpsc::unbounded_channel();

        cache.on_item_deleted(move |key, value: &u64, _| {
            let _ = sender.send((key.to_string(), *value));
        });

        cache.add("a", 1u64, far_future(), false);
        cache.add("b", 2u64, far_future(), false);

        let (key, value) = receiver.recv().await.expect("callback should fire");
        assert_eq!(key, "a");
        assert_eq!(value, 1);
    }
}
