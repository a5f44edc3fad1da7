// ── Keyed resource cache ──
//
// One cache per resource kind. Each key owns an entry holding the last
// server snapshot in a `watch` channel, a sequence counter for "last
// request wins", the shared in-flight fetch, and its subscriber count.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::ResourceKind;
use super::subscription::Subscription;
use crate::error::CoreError;

type Fetcher<T> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
type SharedFetch<T> = Shared<BoxFuture<'static, Resource<T>>>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Point-in-time view of one cached key.
///
/// `data` is the empty value until the first successful fetch and is
/// never cleared by a failed one; `error` describes the latest failure.
#[derive(Debug)]
pub struct Resource<T> {
    pub data: Arc<T>,
    pub error: Option<CoreError>,
    pub is_loading: bool,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            error: self.error.clone(),
            is_loading: self.is_loading,
        }
    }
}

impl<T: Default> Default for Resource<T> {
    fn default() -> Self {
        Self {
            data: Arc::new(T::default()),
            error: None,
            is_loading: false,
        }
    }
}

impl<T> Resource<T> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(CoreError::display_message)
    }
}

// ── Entry ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Serve the cached value when fresh, else join or start a fetch.
    Cached,
    /// Join an in-flight fetch, else start one.
    Refresh,
    /// Always start a new fetch, superseding any in flight.
    Force,
}

struct Inflight<T> {
    seq: u64,
    fetch: SharedFetch<T>,
}

#[derive(Default)]
struct Lifecycle {
    subscribers: usize,
    poller: Option<CancellationToken>,
}

pub(crate) struct CacheEntry<T> {
    state: watch::Sender<Resource<T>>,
    /// Sequence number of the most recently issued fetch.
    issued: AtomicU64,
    /// Holds a successful result for the current invalidation window.
    fresh: AtomicBool,
    inflight: Mutex<Option<Inflight<T>>>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T: Default> CacheEntry<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(Resource::default());
        Self {
            state,
            issued: AtomicU64::new(0),
            fresh: AtomicBool::new(false),
            inflight: Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }
}

impl<T: Default + Send + Sync + 'static> CacheEntry<T> {
    pub(crate) fn snapshot(&self) -> Resource<T> {
        self.state.borrow().clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Resource<T>> {
        self.state.subscribe()
    }

    /// Apply a fetch result if `seq` is still the latest issued request.
    fn settle(
        &self,
        kind: ResourceKind,
        key: &str,
        seq: u64,
        result: Result<T, CoreError>,
    ) -> Resource<T> {
        let applied = self.state.send_if_modified(|resource| {
            if self.issued.load(Ordering::SeqCst) != seq {
                return false;
            }
            resource.is_loading = false;
            match result {
                Ok(data) => {
                    resource.data = Arc::new(data);
                    resource.error = None;
                    self.fresh.store(true, Ordering::SeqCst);
                }
                Err(err) => {
                    warn!(%kind, key, error = %err, "fetch failed; keeping previous value");
                    resource.error = Some(err);
                }
            }
            true
        });

        if applied {
            let mut slot = lock(&self.inflight);
            if slot.as_ref().is_some_and(|inflight| inflight.seq == seq) {
                *slot = None;
            }
        } else {
            trace!(%kind, key, seq, "discarding superseded fetch result");
        }
        self.snapshot()
    }

    /// Reset to the empty value and ignore anything in flight.
    fn reset(&self) {
        self.state.send_modify(|resource| {
            self.issued.fetch_add(1, Ordering::SeqCst);
            resource.data = Arc::new(T::default());
            resource.error = None;
            resource.is_loading = false;
        });
        self.fresh.store(false, Ordering::SeqCst);
        *lock(&self.inflight) = None;
    }

    /// Ignore anything in flight without touching the value.
    fn abandon(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
        *lock(&self.inflight) = None;
    }
}

// ── Cache ────────────────────────────────────────────────────────────

pub(crate) struct CacheInner<T> {
    kind: ResourceKind,
    poll: Option<Duration>,
    fetcher: Fetcher<T>,
    entries: DashMap<String, Arc<CacheEntry<T>>>,
}

/// A keyed, deduplicating, revalidating cache for one resource kind.
///
/// Cheap to clone; clones share the same entries.
pub struct ResourceCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Send + Sync + 'static> ResourceCache<T> {
    /// Build a cache around `fetcher`. With `poll` set, every subscribed
    /// key is refreshed on that period while it has subscribers.
    pub fn new<F, Fut>(kind: ResourceKind, poll: Option<Duration>, fetcher: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(CacheInner {
                kind,
                poll: poll.filter(|p| !p.is_zero()),
                fetcher: Arc::new(move |key| fetcher(key).boxed()),
                entries: DashMap::new(),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.inner.poll
    }

    /// Current snapshot for `key` without fetching.
    pub fn peek(&self, key: Option<&str>) -> Resource<T> {
        key.and_then(|k| self.inner.entries.get(k).map(|e| e.snapshot()))
            .unwrap_or_default()
    }

    /// Whether `key` currently has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Keys with a live entry.
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Return the cached value, or fetch it once for all concurrent callers.
    ///
    /// A `None` key is gated: no network call, empty value. Without a
    /// subscriber the entry only lives until the fetch settles.
    pub async fn fetch(&self, key: Option<&str>) -> Resource<T> {
        let Some(key) = key else {
            return Resource::default();
        };
        let entry = self.inner.entry(key);
        self.inner.run(&entry, key, FetchMode::Cached).await
    }

    /// Force a fresh fetch for `key`; the newest request's result wins.
    pub async fn revalidate(&self, key: Option<&str>) -> Resource<T> {
        let Some(key) = key else {
            return Resource::default();
        };
        let entry = self.inner.entry(key);
        self.inner.run(&entry, key, FetchMode::Force).await
    }

    /// Revalidate `key` only if it already has an entry.
    pub async fn revalidate_existing(&self, key: &str) -> Option<Resource<T>> {
        let entry = self.inner.entries.get(key).map(|e| Arc::clone(e.value()))?;
        Some(self.inner.run(&entry, key, FetchMode::Force).await)
    }

    /// Revalidate every key that currently has an entry.
    pub async fn revalidate_all(&self) {
        let keys = self.keys();
        futures_util::future::join_all(keys.iter().map(|k| self.revalidate_existing(k))).await;
    }

    /// Reset `key` to the empty value and ignore its in-flight fetch.
    /// The entry itself is dropped if nobody is subscribed.
    pub fn discard(&self, key: &str) {
        let Some(entry) = self.inner.entries.get(key).map(|e| Arc::clone(e.value())) else {
            return;
        };
        entry.reset();
        self.inner
            .entries
            .remove_if(key, |_, current| lock(&current.lifecycle).subscribers == 0);
        debug!(kind = %self.inner.kind, key, "discarded cache entry");
    }

    /// Subscribe to `key`. A `None` key yields a detached, permanently
    /// empty subscription. Polling kinds start their timer on the first
    /// subscriber; the last one to drop stops it and evicts the entry.
    pub fn subscribe(&self, key: Option<&str>) -> Subscription<T> {
        match key {
            Some(key) => {
                let entry = self.inner.acquire(key);
                Subscription::attached(Arc::clone(&self.inner), key.to_owned(), entry)
            }
            None => Subscription::detached(),
        }
    }

    /// Subscribe to `id` under this kind's keying rule.
    pub fn subscribe_for(&self, id: &str) -> Subscription<T> {
        self.subscribe(self.inner.kind.key(id))
    }
}

impl<T: Default + Send + Sync + 'static> CacheInner<T> {
    fn entry(&self, key: &str) -> Arc<CacheEntry<T>> {
        Arc::clone(
            self.entries
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(CacheEntry::new()))
                .value(),
        )
    }

    async fn run(
        &self,
        entry: &Arc<CacheEntry<T>>,
        key: &str,
        mode: FetchMode,
    ) -> Resource<T> {
        let resource = match self.join_or_start(entry, key, mode) {
            Some(fetch) => fetch.await,
            None => entry.snapshot(),
        };
        self.evict_if_idle(key, entry);
        resource
    }

    /// Drop `entry` once nobody subscribes to it and nothing is in flight.
    fn evict_if_idle(&self, key: &str, entry: &Arc<CacheEntry<T>>) {
        let evicted = self.entries.remove_if(key, |_, current| {
            Arc::ptr_eq(current, entry)
                && lock(&current.lifecycle).subscribers == 0
                && lock(&current.inflight).is_none()
        });
        if evicted.is_some() {
            trace!(kind = %self.kind, key, "dropped unsubscribed cache entry");
        }
    }

    pub(crate) async fn fetch_entry(&self, entry: &Arc<CacheEntry<T>>, key: &str) -> Resource<T> {
        self.run(entry, key, FetchMode::Cached).await
    }

    pub(crate) async fn revalidate_entry(
        &self,
        entry: &Arc<CacheEntry<T>>,
        key: &str,
    ) -> Resource<T> {
        self.run(entry, key, FetchMode::Force).await
    }

    fn join_or_start(
        &self,
        entry: &Arc<CacheEntry<T>>,
        key: &str,
        mode: FetchMode,
    ) -> Option<SharedFetch<T>> {
        let mut slot = lock(&entry.inflight);

        if mode != FetchMode::Force {
            if let Some(inflight) = slot.as_ref() {
                trace!(kind = %self.kind, key, seq = inflight.seq, "joining in-flight fetch");
                return Some(inflight.fetch.clone());
            }
            if mode == FetchMode::Cached && entry.fresh.load(Ordering::SeqCst) {
                return None;
            }
        }

        let mut seq = 0;
        entry.state.send_modify(|resource| {
            seq = entry.issued.fetch_add(1, Ordering::SeqCst) + 1;
            resource.is_loading = true;
        });
        debug!(kind = %self.kind, key, seq, "fetching");

        let request = (self.fetcher)(key.to_owned());
        let target = Arc::clone(entry);
        let kind = self.kind;
        let owned_key = key.to_owned();
        let fetch = async move {
            let result = request.await;
            target.settle(kind, &owned_key, seq, result)
        }
        .boxed()
        .shared();

        *slot = Some(Inflight {
            seq,
            fetch: fetch.clone(),
        });
        Some(fetch)
    }

    fn acquire(self: &Arc<Self>, key: &str) -> Arc<CacheEntry<T>> {
        let slot = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(CacheEntry::new()));
        let entry = Arc::clone(slot.value());

        let mut life = lock(&entry.lifecycle);
        life.subscribers += 1;
        if life.subscribers == 1 {
            if let Some(period) = self.poll {
                life.poller = self.spawn_poller(&entry, key, period);
            }
        }
        drop(life);
        drop(slot);
        entry
    }

    pub(crate) fn release(&self, key: &str, entry: &Arc<CacheEntry<T>>) {
        let idle = {
            let mut life = lock(&entry.lifecycle);
            life.subscribers = life.subscribers.saturating_sub(1);
            if life.subscribers == 0 {
                if let Some(poller) = life.poller.take() {
                    poller.cancel();
                }
                true
            } else {
                false
            }
        };
        if !idle {
            return;
        }

        let evicted = self.entries.remove_if(key, |_, current| {
            Arc::ptr_eq(current, entry) && lock(&current.lifecycle).subscribers == 0
        });
        if evicted.is_some() {
            entry.abandon();
            debug!(kind = %self.kind, key, "evicted idle cache entry");
        }
    }

    fn spawn_poller(
        self: &Arc<Self>,
        entry: &Arc<CacheEntry<T>>,
        key: &str,
        period: Duration,
    ) -> Option<CancellationToken> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(kind = %self.kind, key, "no tokio runtime; polling disabled");
            return None;
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let cache = Arc::clone(self);
        let entry = Arc::clone(entry);
        debug!(kind = %self.kind, key, ?period, "poller started");
        let key = key.to_owned();

        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.run(&entry, &key, FetchMode::Refresh).await;
                    }
                }
            }
            debug!(kind = %cache.kind, key, "poller stopped");
        });

        Some(cancel)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;

    /// Fetcher returning `"{key}#{n}"` where `n` counts calls.
    fn counting_cache(poll: Option<Duration>) -> (ResourceCache<Vec<String>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ResourceCache::new(ResourceKind::PeerRoutes, poll, move |key: String| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(vec![format!("{key}#{n}")]) }
        });
        (cache, calls)
    }

    #[tokio::test]
    async fn gated_key_makes_no_call() {
        let (cache, calls) = counting_cache(None);
        let resource = cache.fetch(None).await;
        assert!(resource.data.is_empty());
        assert!(resource.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_value_is_reused_until_revalidated() {
        let (cache, calls) = counting_cache(None);
        let _sub = cache.subscribe(Some("p1"));
        assert_eq!(*cache.fetch(Some("p1")).await.data, vec!["p1#1"]);
        assert_eq!(*cache.fetch(Some("p1")).await.data, vec!["p1#1"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(*cache.revalidate(Some("p1")).await.data, vec!["p1#2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_request() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&gate), Arc::clone(&calls));
        let cache = ResourceCache::new(ResourceKind::Interfaces, None, move |_key: String| {
            c.fetch_add(1, Ordering::SeqCst);
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                Ok(vec!["wg0".to_owned()])
            }
        });

        let a = cache.fetch(Some("global"));
        let b = cache.fetch(Some("global"));
        let release = async {
            tokio::task::yield_now().await;
            gate.notify_one();
        };
        let (a, b, ()) = tokio::join!(a, b, release);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.data, &b.data));
    }

    #[tokio::test]
    async fn failed_revalidation_keeps_previous_value() {
        let fail = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fail);
        let cache = ResourceCache::new(ResourceKind::FirewallRules, None, move |_key: String| {
            let fail = f.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err(CoreError::Rpc {
                        code: "unavailable".into(),
                        message: "backend down".into(),
                    })
                } else {
                    Ok("-A FORWARD -j ACCEPT".to_owned())
                }
            }
        });

        let _sub = cache.subscribe(Some("global"));
        cache.fetch(Some("global")).await;
        fail.store(true, Ordering::SeqCst);
        let after = cache.revalidate(Some("global")).await;

        assert_eq!(*after.data, "-A FORWARD -j ACCEPT");
        assert_eq!(after.error_message().as_deref(), Some("backend down"));
        assert!(!after.is_loading);
    }

    #[tokio::test]
    async fn last_issued_request_wins() {
        // First request blocks until released; second answers immediately.
        let first_gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&first_gate), Arc::clone(&calls));
        let cache = ResourceCache::new(ResourceKind::Peers, None, move |_key: String| {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            let g = Arc::clone(&g);
            async move {
                if n == 1 {
                    g.notified().await;
                    Ok(vec!["stale".to_owned()])
                } else {
                    Ok(vec!["fresh".to_owned()])
                }
            }
        });

        let _sub = cache.subscribe(Some(""));
        let slow = cache.revalidate(Some(""));
        let late = async {
            tokio::task::yield_now().await;
            let fresh = cache.revalidate(Some("")).await;
            first_gate.notify_one();
            fresh
        };
        let (_, fresh) = tokio::join!(slow, late);

        assert_eq!(*fresh.data, vec!["fresh"]);
        assert_eq!(*cache.peek(Some("")).data, vec!["fresh"]);
    }

    #[tokio::test]
    async fn unsubscribed_fetch_leaves_no_entry() {
        let (cache, calls) = counting_cache(None);
        for key in ["a", "b", "c"] {
            assert_eq!(cache.fetch(Some(key)).await.data.len(), 1);
        }
        cache.revalidate(Some("d")).await;
        assert!(cache.keys().is_empty());

        // Nothing left behind for a global revalidation to refetch.
        cache.revalidate_all().await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn last_unsubscribe_evicts_entry() {
        let (cache, _) = counting_cache(None);
        let first = cache.subscribe(Some("p1"));
        let second = cache.subscribe(Some("p1"));
        first.fetch().await;
        assert!(cache.contains("p1"));

        drop(first);
        assert!(cache.contains("p1"));
        drop(second);
        assert!(!cache.contains("p1"));
        assert!(cache.peek(Some("p1")).data.is_empty());
    }

    #[tokio::test]
    async fn detached_subscription_stays_empty() {
        let (cache, calls) = counting_cache(None);
        let sub = cache.subscribe(None);
        assert!(sub.fetch().await.data.is_empty());
        assert!(sub.key().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discard_resets_subscribed_entry() {
        let (cache, _) = counting_cache(None);
        let sub = cache.subscribe(Some("wg0"));
        sub.fetch().await;
        assert_eq!(sub.latest().data.len(), 1);

        cache.discard("wg0");
        assert!(sub.latest().data.is_empty());
        assert!(cache.contains("wg0"));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_runs_only_while_subscribed() {
        let (cache, calls) = counting_cache(Some(Duration::from_secs(5)));
        let sub = cache.subscribe(Some("global"));
        sub.fetch().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(sub);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_timer_across_subscribers() {
        let (cache, calls) = counting_cache(Some(Duration::from_secs(10)));
        let a = cache.subscribe(Some("alice@example.com"));
        let b = cache.subscribe(Some("alice@example.com"));

        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(a);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(b);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
