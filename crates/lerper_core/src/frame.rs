//! # Frames and Frame Collection
//!
//! The simulation fills a [`FrameCollector`] with one snapshot per entity,
//! then finalizes it into an immutable [`Frame`] carrying the time the frame
//! should take on screen.

use crate::error::{LerpError, LerpResult};
use crate::pool::{EntityBuffer, EntityId, SharedBufferPool};

/// A finalized set of entity snapshots plus its playback duration.
///
/// Immutable once created. Owned by exactly one of the queue or the
/// consumer's current-frame slot until its buffer goes back to the pool.
#[derive(Debug)]
pub struct Frame<T> {
    entities: EntityBuffer<T>,
    duration: f32,
}

impl<T> Frame<T> {
    /// Zero-length frame with no entities, used as the initial "from" state.
    pub(crate) fn empty(entities: EntityBuffer<T>) -> Self {
        Self {
            entities,
            duration: 0.0,
        }
    }

    /// Seconds this frame takes relative to the previous one.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Number of entities in the frame.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the frame holds no entities.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshot of entity `id`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(id)
    }

    /// Iterates over all snapshots in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter()
    }

    /// Gives up the frame, returning its buffer for release to the pool.
    #[must_use]
    pub fn into_buffer(self) -> EntityBuffer<T> {
        self.entities
    }
}

/// The single in-progress frame on the producer side.
#[derive(Debug)]
pub struct FrameCollector<T> {
    entities: EntityBuffer<T>,
}

impl<T> FrameCollector<T> {
    /// Starts collecting into `buffer`.
    #[must_use]
    pub fn new(buffer: EntityBuffer<T>) -> Self {
        Self { entities: buffer }
    }

    /// Adds one entity snapshot to the frame being collected.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::DuplicateEntity`] if `id` was already added this
    /// cycle. The collector is left untouched and `snapshot` is dropped.
    pub fn add_entity(&mut self, id: EntityId, snapshot: T) -> LerpResult<()> {
        self.entities
            .try_insert(id, snapshot)
            .map_err(|_| LerpError::DuplicateEntity { id })
    }

    /// Entities collected so far this cycle.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing has been collected this cycle.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Finalizes the collected snapshots into a [`Frame`] and starts a new
    /// cycle on a buffer taken from `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidDuration`] if `duration` is negative or not
    /// finite. Nothing is acquired and the collection cycle continues.
    pub fn finish(&mut self, duration: f32, pool: &SharedBufferPool<T>) -> LerpResult<Frame<T>> {
        let duration = require_duration(duration)?;
        let entities = std::mem::replace(&mut self.entities, pool.acquire());
        Ok(Frame { entities, duration })
    }
}

/// Accepts finite, non-negative durations.
pub(crate) fn require_duration(seconds: f32) -> LerpResult<f32> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(LerpError::InvalidDuration(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(pool: &SharedBufferPool<&'static str>) -> FrameCollector<&'static str> {
        FrameCollector::new(pool.acquire())
    }

    #[test]
    fn test_collect_and_finish() {
        let pool = SharedBufferPool::new(4);
        let mut collector = collector(&pool);

        collector.add_entity(1, "a").unwrap();
        collector.add_entity(2, "b").unwrap();
        assert_eq!(collector.len(), 2);

        let frame = collector.finish(0.25, &pool).unwrap();
        assert_eq!(frame.duration(), 0.25);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(2), Some(&"b"));

        // A fresh cycle starts immediately
        assert!(collector.is_empty());
        collector.add_entity(1, "c").unwrap();
    }

    #[test]
    fn test_duplicate_leaves_state_unchanged() {
        let pool = SharedBufferPool::new(4);
        let mut collector = collector(&pool);

        collector.add_entity(1, "a").unwrap();
        let err = collector.add_entity(1, "a").unwrap_err();
        assert_eq!(err, LerpError::DuplicateEntity { id: 1 });
        assert_eq!(collector.len(), 1);

        let frame = collector.finish(1.0, &pool).unwrap();
        assert_eq!(frame.get(1), Some(&"a"));
    }

    #[test]
    fn test_invalid_duration_keeps_cycle() {
        let pool = SharedBufferPool::new(4);
        let mut collector = collector(&pool);
        collector.add_entity(5, "x").unwrap();
        let acquired = pool.stats().acquired;

        for bad in [-0.1, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                collector.finish(bad, &pool),
                Err(LerpError::InvalidDuration(_))
            ));
        }

        assert_eq!(collector.len(), 1);
        assert_eq!(pool.stats().acquired, acquired);
    }

    #[test]
    fn test_zero_duration_allowed() {
        let pool = SharedBufferPool::new(4);
        let mut collector = collector(&pool);
        let frame = collector.finish(0.0, &pool).unwrap();
        assert_eq!(frame.duration(), 0.0);
        assert!(frame.is_empty());
    }
}
