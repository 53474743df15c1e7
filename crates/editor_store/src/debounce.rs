//! Keyed trailing-edge debouncing of persistence writes.
//!
//! Scheduling a job under a key that already has one pending cancels the old
//! job, so a burst of edits to one entity produces a single write carrying the
//! last value. Jobs under different keys never affect each other.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::task::AbortHandle;
use uuid::Uuid;

/// What a pending write is for. Position and size writes of an element are
/// tracked separately from its content writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebounceKey {
    Section(Uuid),
    Element(Uuid),
    ElementPosition(Uuid),
    ElementSize(Uuid),
}

impl DebounceKey {
    pub fn entity_id(&self) -> Uuid {
        match *self {
            DebounceKey::Section(id)
            | DebounceKey::Element(id)
            | DebounceKey::ElementPosition(id)
            | DebounceKey::ElementSize(id) => id,
        }
    }
}

struct Pending {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct Inner {
    next_generation: u64,
    pending: HashMap<DebounceKey, Pending>,
}

/// Must be used from within a Tokio runtime.
pub struct Debouncer {
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `job` after the quiet period unless another job is scheduled
    /// under `key` first.
    pub fn schedule(&self, key: DebounceKey, job: BoxFuture<'static, ()>) {
        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;

        let delay = self.delay;
        let shared = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Deregister before running so a reschedule from inside the job
            // is not removed afterwards.
            {
                let mut inner = shared.lock();
                if inner.pending.get(&key).map(|p| p.generation) == Some(generation) {
                    inner.pending.remove(&key);
                }
            }
            job.await;
        });

        if let Some(old) = inner.pending.insert(
            key,
            Pending {
                generation,
                handle: task.abort_handle(),
            },
        ) {
            old.handle.abort();
            tracing::trace!(?key, "debounced write replaced");
        }
    }

    pub fn cancel(&self, key: DebounceKey) -> bool {
        match self.inner.lock().pending.remove(&key) {
            Some(p) => {
                p.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending write touching `id`.
    pub fn cancel_entity(&self, id: Uuid) -> usize {
        let mut inner = self.inner.lock();
        let keys: Vec<DebounceKey> = inner
            .pending
            .keys()
            .filter(|k| k.entity_id() == id)
            .copied()
            .collect();
        for key in &keys {
            if let Some(p) = inner.pending.remove(key) {
                p.handle.abort();
            }
        }
        keys.len()
    }

    pub fn cancel_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let n = inner.pending.len();
        for (_, p) in inner.pending.drain() {
            p.handle.abort();
        }
        n
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_pending(&self, key: DebounceKey) -> bool {
        self.inner.lock().pending.contains_key(&key)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let n = self.cancel_all();
        if n > 0 {
            tracing::debug!(cancelled = n, "debouncer dropped with pending writes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_job(counter: &Arc<AtomicUsize>, value: usize) -> BoxFuture<'static, ()> {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(value, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_job() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));
        let key = DebounceKey::Section(Uuid::nil());

        for v in [1, 10, 100] {
            debouncer.schedule(key, counter_job(&counter, v));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_do_not_coalesce() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));
        let id = Uuid::new_v4();

        debouncer.schedule(DebounceKey::Element(id), counter_job(&counter, 1));
        debouncer.schedule(DebounceKey::ElementPosition(id), counter_job(&counter, 10));
        debouncer.schedule(DebounceKey::ElementSize(id), counter_job(&counter, 100));
        assert_eq!(debouncer.pending(), 3);

        tokio::time::sleep(Duration::from_millis(501)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 111);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_prevents_writes() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(DebounceKey::Section(Uuid::new_v4()), counter_job(&counter, 1));
        debouncer.schedule(DebounceKey::Section(Uuid::new_v4()), counter_job(&counter, 1));
        assert_eq!(debouncer.cancel_all(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_entity_only_touches_that_entity() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let counter = Arc::new(AtomicUsize::new(0));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        debouncer.schedule(DebounceKey::Element(a), counter_job(&counter, 1));
        debouncer.schedule(DebounceKey::ElementSize(a), counter_job(&counter, 1));
        debouncer.schedule(DebounceKey::Element(b), counter_job(&counter, 10));
        assert_eq!(debouncer.cancel_entity(a), 2);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let debouncer = Debouncer::new(Duration::from_millis(50));
            debouncer.schedule(DebounceKey::Section(Uuid::nil()), counter_job(&counter, 1));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
