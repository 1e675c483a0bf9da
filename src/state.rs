//! Snapshot store for fetch cycles.
//!
//! Every refresh produces an entirely new [`Snapshot`]; nothing is mutated in
//! place. Cycles are tagged with a generation taken from an atomic counter at
//! the moment they start, and a finished cycle only becomes the current
//! snapshot if no newer cycle published first. A slow in-flight fetch that
//! loses the race is simply discarded (last fetch wins), so rapid repeated
//! refreshes can never roll the dashboard back to stale data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::models::{DistributorView, IotReading, Payment};

// ---

/// One complete, immutable fetch cycle result.
#[derive(Debug)]
pub struct Snapshot {
    // ---
    pub distributors: Vec<DistributorView>,
    pub readings: Vec<IotReading>,
    pub payments: Vec<Payment>,
    pub refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    /// The pre-first-fetch snapshot: empty lists, dated at the epoch so any
    /// positive TTL treats it as stale.
    pub fn empty() -> Self {
        // ---
        Snapshot {
            distributors: Vec::new(),
            readings: Vec::new(),
            payments: Vec::new(),
            refreshed_at: DateTime::UNIX_EPOCH,
        }
    }
}

struct Inner {
    generation: u64,
    snapshot: Arc<Snapshot>,
}

/// Shared holder of the current snapshot plus the generation counter.
pub struct SnapshotStore {
    // ---
    next_generation: AtomicU64,
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        // ---
        SnapshotStore {
            next_generation: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                generation: 0,
                snapshot: Arc::new(Snapshot::empty()),
            }),
        }
    }

    /// Start a fetch cycle; the returned generation must be handed back to
    /// [`publish`](Self::publish) when the cycle completes.
    pub fn begin(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a finished cycle. Applies only if `generation` is newer than
    /// the last applied one; either way the freshest snapshot is returned, so
    /// the caller of a losing cycle serves the winner's data.
    pub async fn publish(&self, generation: u64, snapshot: Snapshot) -> Arc<Snapshot> {
        // ---
        let mut inner = self.inner.write().await;
        if generation > inner.generation {
            inner.generation = generation;
            inner.snapshot = Arc::new(snapshot);
        } else {
            tracing::debug!(
                generation,
                current = inner.generation,
                "Discarding stale fetch cycle"
            );
        }
        Arc::clone(&inner.snapshot)
    }

    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().await.snapshot)
    }

    /// The current snapshot, but only if it was published within `ttl_secs`.
    /// A TTL of zero always reports stale, forcing a cycle per request.
    pub async fn fresh_within(&self, ttl_secs: u32) -> Option<Arc<Snapshot>> {
        // ---
        let inner = self.inner.read().await;
        if inner.generation == 0 {
            return None;
        }
        let age = Utc::now() - inner.snapshot.refreshed_at;
        if ttl_secs > 0 && age <= Duration::seconds(i64::from(ttl_secs)) {
            Some(Arc::clone(&inner.snapshot))
        } else {
            None
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
