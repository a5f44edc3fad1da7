// ── Cache subscriptions ──
//
// RAII handles vended by `ResourceCache::subscribe`. While any handle for
// a key is alive the entry stays cached and, for polling kinds, its timer
// keeps running.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::watch;
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;

use super::cache::{CacheEntry, CacheInner, Resource};

struct Binding<T: Default + Send + Sync + 'static> {
    cache: Arc<CacheInner<T>>,
    key: String,
    entry: Arc<CacheEntry<T>>,
}

impl<T: Default + Send + Sync + 'static> Drop for Binding<T> {
    fn drop(&mut self) {
        self.cache.release(&self.key, &self.entry);
    }
}

/// A live view of one cache key: `{data, error, is_loading}` plus
/// `fetch()` / `revalidate()`.
pub struct Subscription<T: Default + Send + Sync + 'static> {
    current: Resource<T>,
    receiver: watch::Receiver<Resource<T>>,
    binding: Option<Binding<T>>,
    /// Keeps a detached receiver open so `changed()` simply never fires.
    keepalive: Option<watch::Sender<Resource<T>>>,
}

impl<T: Default + Send + Sync + 'static> Subscription<T> {
    pub(crate) fn attached(cache: Arc<CacheInner<T>>, key: String, entry: Arc<CacheEntry<T>>) -> Self {
        let receiver = entry.watch();
        let current = receiver.borrow().clone();
        Self {
            current,
            receiver,
            binding: Some(Binding { cache, key, entry }),
            keepalive: None,
        }
    }

    pub(crate) fn detached() -> Self {
        let (sender, receiver) = watch::channel(Resource::default());
        Self {
            current: Resource::default(),
            receiver,
            binding: None,
            keepalive: Some(sender),
        }
    }

    /// The subscribed key; `None` for a gated subscription.
    pub fn key(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.key.as_str())
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &Resource<T> {
        &self.current
    }

    /// Latest snapshot (may have changed since `current()`).
    pub fn latest(&self) -> Resource<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Arc<T> {
        Arc::clone(&self.receiver.borrow().data)
    }

    /// Wait for the next change. Never resolves for a gated subscription.
    pub async fn changed(&mut self) -> Option<Resource<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Cached value, fetched once if needed.
    pub async fn fetch(&self) -> Resource<T> {
        match &self.binding {
            Some(b) => b.cache.fetch_entry(&b.entry, &b.key).await,
            None => Resource::default(),
        }
    }

    /// Force a fresh fetch.
    pub async fn revalidate(&self) -> Resource<T> {
        match &self.binding {
            Some(b) => b.cache.revalidate_entry(&b.entry, &b.key).await,
            None => Resource::default(),
        }
    }

    /// Convert into a `Stream` of snapshots. The stream holds the
    /// subscription open until dropped.
    pub fn into_stream(mut self) -> ResourceStream<T> {
        let binding = self.binding.take();
        let keepalive = self.keepalive.take();
        ResourceStream {
            inner: WatchStream::new(self.receiver.clone()),
            _binding: binding,
            _keepalive: keepalive,
        }
    }
}

/// `Stream` adapter over a subscription's snapshots.
///
/// Yields the current snapshot first, then one per change.
pub struct ResourceStream<T: Default + Send + Sync + 'static> {
    inner: WatchStream<Resource<T>>,
    _binding: Option<Binding<T>>,
    _keepalive: Option<watch::Sender<Resource<T>>>,
}

impl<T: Default + Send + Sync + 'static> Stream for ResourceStream<T> {
    type Item = Resource<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
