//! # Snapshot Buffer Pool
//!
//! Reusable entity maps for frame storage.
//!
//! A buffer is handed out by [`BufferPool::acquire`], filled by the frame
//! collector, travels through the queue inside a [`Frame`](crate::Frame),
//! and comes back through [`BufferPool::release`] once playback moves past
//! it. [`EntityBuffer`] is not `Clone`, so every buffer has exactly one
//! owner at a time and can only be released once.
//!
//! ```text
//! acquire ──► collector ──► queue ──► current frame ──► release
//!    ▲                                                     │
//!    └─────────────────────── free list ◄──────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Caller-assigned identifier of an entity, unique within one frame.
pub type EntityId = u32;

/// Entity snapshots for one frame, keyed by entity id.
///
/// Move-only. Obtained from a [`BufferPool`], never constructed directly.
#[derive(Debug)]
pub struct EntityBuffer<T> {
    entities: HashMap<EntityId, T>,
}

impl<T> EntityBuffer<T> {
    fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    /// Number of snapshots held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the buffer holds no snapshots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Slots available without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Snapshot for `id`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Iterates over all snapshots in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().map(|(&id, snapshot)| (id, snapshot))
    }

    /// Inserts a snapshot unless `id` is taken, in which case it is handed back.
    pub(crate) fn try_insert(&mut self, id: EntityId, snapshot: T) -> Result<(), T> {
        use std::collections::hash_map::Entry;

        match self.entities.entry(id) {
            Entry::Occupied(_) => Err(snapshot),
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
                Ok(())
            }
        }
    }

    /// Drops all snapshots, keeping the allocation.
    fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Counters describing pool behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total buffers handed out.
    pub acquired: u64,
    /// Handed-out buffers that came from the free list instead of a fresh allocation.
    pub reused: u64,
    /// Buffers returned to the pool.
    pub released: u64,
    /// Returned buffers dropped because the free list was full.
    pub discarded: u64,
}

/// Free list of [`EntityBuffer`]s.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use [`SharedBufferPool`] when the producer
/// and consumer run on different threads.
#[derive(Debug)]
pub struct BufferPool<T> {
    /// Cleared buffers ready for reuse.
    free_list: Vec<EntityBuffer<T>>,
    /// Maximum length of the free list.
    capacity: usize,
    /// Usage counters.
    stats: PoolStats,
}

impl<T> BufferPool<T> {
    /// Creates an empty pool that retains at most `capacity` spare buffers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free_list: Vec::with_capacity(capacity),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Fills the free list up to capacity so early frames do not allocate maps.
    pub fn prewarm(&mut self) {
        while self.free_list.len() < self.capacity {
            self.free_list.push(EntityBuffer::new());
        }
    }

    /// Maximum number of spare buffers retained.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Spare buffers currently available.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Usage counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Hands out an empty buffer, reusing a spare one when available.
    pub fn acquire(&mut self) -> EntityBuffer<T> {
        self.stats.acquired += 1;
        match self.free_list.pop() {
            Some(buffer) => {
                self.stats.reused += 1;
                buffer
            }
            None => EntityBuffer::new(),
        }
    }

    /// Takes a buffer back. Its snapshots are dropped immediately.
    pub fn release(&mut self, mut buffer: EntityBuffer<T>) {
        buffer.clear();
        self.recycle(buffer);
    }

    /// Files an already cleared buffer.
    fn recycle(&mut self, buffer: EntityBuffer<T>) {
        debug_assert!(buffer.is_empty());
        self.stats.released += 1;
        if self.free_list.len() < self.capacity {
            self.free_list.push(buffer);
        } else {
            self.stats.discarded += 1;
        }
    }
}

/// A [`BufferPool`] shared between the producer and consumer threads.
///
/// The lock is only held for a single push or pop.
#[derive(Debug)]
pub struct SharedBufferPool<T> {
    inner: Arc<Mutex<BufferPool<T>>>,
}

impl<T> Clone for SharedBufferPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedBufferPool<T> {
    /// Creates a shared pool retaining at most `capacity` spare buffers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BufferPool::new(capacity))),
        }
    }

    /// See [`BufferPool::prewarm`].
    pub fn prewarm(&self) {
        self.inner.lock().prewarm();
    }

    /// See [`BufferPool::acquire`].
    pub fn acquire(&self) -> EntityBuffer<T> {
        self.inner.lock().acquire()
    }

    /// See [`BufferPool::release`].
    ///
    /// The buffer is cleared before the lock is taken.
    pub fn release(&self, mut buffer: EntityBuffer<T>) {
        buffer.clear();
        self.inner.lock().recycle(buffer);
    }

    /// See [`BufferPool::free_count`].
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.inner.lock().free_count()
    }

    /// See [`BufferPool::stats`].
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }
}
