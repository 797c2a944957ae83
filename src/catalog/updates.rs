//! Enrichment update system.
//!
//! Provider completions are expressed as a closed set of typed partial
//! updates and flow through an in-memory FIFO queue consumed by the engine.
//! Providers never mutate catalog state directly; the queue is the only path
//! in, which serializes repeated completions for the same target.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::lock::mutex_lock;
use crate::domain::entries::{Category, Contributor, PersonProfile, VideoMeta};

const SOURCE: &str = "catalog::updates";
const METRIC_QUEUE_LEN: &str = "perf_tooling_update_queue_len";

/// Monotonic epoch for ordering updates within this process.
pub type Epoch = u64;

/// Stable address of one entry: lists are never reordered after load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub category: Category,
    pub index: usize,
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.category, self.index)
    }
}

/// The closed set of partial updates providers can produce.
///
/// Each variant carries its explicit target; each targets exactly one field
/// group, so two different variants can never clobber each other's fields on
/// the same entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// One star count for one link field of one entry.
    Stars {
        target: EntryKey,
        field: String,
        count: u64,
    },
    /// Full video metadata group for one entry.
    VideoMeta { target: EntryKey, meta: VideoMeta },
    /// A person profile, published under its normalized handle.
    Profile {
        handle: String,
        profile: PersonProfile,
    },
    /// The process-wide contributor list.
    Contributors { list: Vec<Contributor> },
}

impl Update {
    pub fn kind(&self) -> &'static str {
        match self {
            Update::Stars { .. } => "stars",
            Update::VideoMeta { .. } => "video_meta",
            Update::Profile { .. } => "profile",
            Update::Contributors { .. } => "contributors",
        }
    }
}

/// One queued update with idempotency and ordering metadata.
#[derive(Debug, Clone)]
pub struct QueuedUpdate {
    pub id: Uuid,
    pub epoch: Epoch,
    pub update: Update,
    pub queued_at: OffsetDateTime,
}

impl QueuedUpdate {
    fn new(update: Update, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            update,
            queued_at: OffsetDateTime::now_utc(),
        }
    }
}

/// In-memory FIFO queue between providers and the engine.
///
/// A mutex-guarded deque is enough here: producers are a handful of
/// enrichment tasks and the single consumer drains in batches.
pub struct UpdateQueue {
    queue: Mutex<VecDeque<QueuedUpdate>>,
    epoch_counter: AtomicU64,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Enqueue one update.
    pub fn publish(&self, update: Update) {
        let epoch = self.next_epoch();
        let queued = QueuedUpdate::new(update, epoch);

        debug!(
            update_id = %queued.id,
            update_epoch = queued.epoch,
            update_kind = queued.update.kind(),
            "Enrichment update enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(queued);
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` updates in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<QueuedUpdate> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let drained = queue.drain(..count).collect();
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
        drained
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}
