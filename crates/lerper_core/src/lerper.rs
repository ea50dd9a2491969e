//! # Producer / Consumer Facade
//!
//! ```text
//!   SIMULATION THREAD                      RENDER THREAD
//!   ┌───────────────────┐                  ┌─────────────────────────────┐
//!   │ FrameProducer     │   frame channel  │ FrameConsumer               │
//!   │  add_entity(..)   │ ═══════════════► │  draw(delta)                │
//!   │  end_frame(dur)   │                  │   ├─ drain channel → queue  │
//!   └─────────┬─────────┘                  │   ├─ PlaybackClock::advance │
//!             │ acquire                    │   └─ dispatch → callback    │
//!             ▼                            └──────────────┬──────────────┘
//!        SharedBufferPool ◄──────────── release ──────────┘
//! ```
//!
//! Use [`split`] to get the two halves for a two-thread setup, or [`Lerper`]
//! when one owner drives both sides.

use crate::clock::PlaybackClock;
use crate::config::LerperConfig;
use crate::dispatch::{dispatch, EntityDraw};
use crate::error::{LerpError, LerpResult};
use crate::frame::{require_duration, Frame, FrameCollector};
use crate::pool::{EntityId, PoolStats, SharedBufferPool};
use crate::queue::{frame_channel, FrameQueue, FrameReceiver, FrameSender};

/// Boxed per-entity draw callback stored by a [`FrameConsumer`].
pub type DrawCallback<T> = Box<dyn EntityDraw<T> + Send>;

/// Creates a connected producer/consumer pair sharing one buffer pool.
///
/// # Errors
///
/// Returns [`LerpError::InvalidConfig`] if `config` does not validate.
pub fn split<T>(config: &LerperConfig) -> LerpResult<(FrameProducer<T>, FrameConsumer<T>)> {
    let clock = PlaybackClock::new(config)?;

    let pool = SharedBufferPool::new(config.pool_capacity);
    pool.prewarm();
    let (sender, receiver) = frame_channel();

    let producer = FrameProducer {
        collector: FrameCollector::new(pool.acquire()),
        sender,
        pool: pool.clone(),
        frames_produced: 0,
    };
    let consumer = FrameConsumer {
        receiver,
        queue: FrameQueue::new(),
        current: Frame::empty(pool.acquire()),
        clock,
        pool,
        on_entity_draw: None,
        frames_consumed: 0,
    };

    tracing::debug!(
        window_half_life = config.window_half_life,
        target_queue_depth = config.target_queue_depth,
        pool_capacity = config.pool_capacity,
        "lerper created"
    );
    Ok((producer, consumer))
}

/// Simulation side: collects entity snapshots and publishes finished frames.
pub struct FrameProducer<T> {
    collector: FrameCollector<T>,
    sender: FrameSender<T>,
    pool: SharedBufferPool<T>,
    frames_produced: u64,
}

impl<T> FrameProducer<T> {
    /// Records an entity's state for the frame being produced.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::DuplicateEntity`] if `id` was already added since
    /// the last [`end_frame`](Self::end_frame). Nothing changes on error.
    pub fn add_entity(&mut self, id: EntityId, snapshot: T) -> LerpResult<()> {
        self.collector.add_entity(id, snapshot)
    }

    /// Finishes the frame being produced and queues it for playback.
    ///
    /// `duration` is how long the frame should take on screen, normally the
    /// simulation step that produced it. A new, empty frame starts right away.
    ///
    /// # Errors
    ///
    /// - [`LerpError::InvalidDuration`] if `duration` is negative or not
    ///   finite. The frame keeps collecting.
    /// - [`LerpError::ConsumerDisconnected`] if the consumer was dropped. The
    ///   frame is discarded and a new one started.
    pub fn end_frame(&mut self, duration: f32) -> LerpResult<()> {
        let frame = self.collector.finish(duration, &self.pool)?;

        if let Err(frame) = self.sender.send(frame) {
            tracing::warn!(frames_produced = self.frames_produced, "frame consumer disconnected");
            self.pool.release(frame.into_buffer());
            return Err(LerpError::ConsumerDisconnected);
        }

        self.frames_produced += 1;
        Ok(())
    }

    /// Entities added to the frame being produced.
    #[inline]
    #[must_use]
    pub fn pending_entities(&self) -> usize {
        self.collector.len()
    }

    /// Frames successfully handed to the consumer.
    #[inline]
    #[must_use]
    pub const fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    /// Counters of the shared buffer pool.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

/// Playback statistics for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackStats {
    /// Frames that have become the current frame so far.
    pub frames_consumed: u64,
    /// Frames queued ahead of the current one.
    pub queue_len: usize,
    /// Decayed average of the queue length.
    pub average_queue_depth: f32,
    /// Speed coefficient of the last draw.
    pub last_speed: f32,
    /// Seconds of playback into the head frame.
    pub cursor: f32,
}

/// Renderer side: plays back frames and emits interpolated draw calls.
pub struct FrameConsumer<T> {
    receiver: FrameReceiver<T>,
    queue: FrameQueue<T>,
    /// The frame being interpolated from.
    current: Frame<T>,
    clock: PlaybackClock,
    pool: SharedBufferPool<T>,
    on_entity_draw: Option<DrawCallback<T>>,
    frames_consumed: u64,
}

impl<T> FrameConsumer<T> {
    /// Registers the callback used by [`draw`](Self::draw), replacing any previous one.
    pub fn set_draw_callback<D>(&mut self, callback: D)
    where
        D: EntityDraw<T> + Send + 'static,
    {
        self.on_entity_draw = Some(Box::new(callback));
    }

    /// Removes the registered callback. Draws then only advance playback.
    pub fn clear_draw_callback(&mut self) {
        self.on_entity_draw = None;
    }

    /// Whether a draw callback is registered.
    #[inline]
    #[must_use]
    pub fn has_draw_callback(&self) -> bool {
        self.on_entity_draw.is_some()
    }

    /// Advances playback by `delta` seconds and draws through the registered
    /// callback. Without a callback only playback advances.
    ///
    /// Returns the number of entity draw calls made.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidDuration`] if `delta` is negative or not
    /// finite. Nothing changes on error.
    pub fn draw(&mut self, delta: f32) -> LerpResult<usize> {
        let fraction = self.advance(delta)?;
        let Some(sink) = self.on_entity_draw.as_mut() else {
            return Ok(0);
        };

        Ok(dispatch(
            &self.current,
            self.queue.peek_front(),
            fraction.unwrap_or(0.0),
            sink.as_mut(),
        ))
    }

    /// Like [`draw`](Self::draw), but draws through `sink` instead of the
    /// registered callback.
    ///
    /// # Errors
    ///
    /// Same as [`draw`](Self::draw).
    pub fn draw_with<D>(&mut self, delta: f32, sink: &mut D) -> LerpResult<usize>
    where
        D: EntityDraw<T> + ?Sized,
    {
        let fraction = self.advance(delta)?;
        Ok(dispatch(
            &self.current,
            self.queue.peek_front(),
            fraction.unwrap_or(0.0),
            sink,
        ))
    }

    fn advance(&mut self, delta: f32) -> LerpResult<Option<f32>> {
        let delta = require_duration(delta)?;
        self.receiver.drain_into(&mut self.queue);

        let pool = &self.pool;
        let consumed = &mut self.frames_consumed;
        Ok(self
            .clock
            .advance(delta, &mut self.queue, &mut self.current, |buffer| {
                *consumed += 1;
                pool.release(buffer);
            }))
    }

    /// The frame playback is interpolating from.
    #[inline]
    #[must_use]
    pub fn current_frame(&self) -> &Frame<T> {
        &self.current
    }

    /// Frames queued ahead of the current one, as of the last draw.
    #[inline]
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Frames published by the producer but not yet picked up by a draw.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.receiver.in_flight()
    }

    /// See [`PlaybackClock::window_half_life`].
    #[must_use]
    pub fn window_half_life(&self) -> f32 {
        self.clock.window_half_life()
    }

    /// Changes the half-life of the queue-depth average.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`] unless `seconds` is finite and positive.
    pub fn set_window_half_life(&mut self, seconds: f32) -> LerpResult<()> {
        self.clock.set_window_half_life(seconds)?;
        tracing::debug!(window_half_life = seconds, "playback window changed");
        Ok(())
    }

    /// See [`PlaybackClock::target_queue_depth`].
    #[must_use]
    pub const fn target_queue_depth(&self) -> f32 {
        self.clock.target_queue_depth()
    }

    /// Changes the queue length playback steers towards.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`] unless `frames` is finite and positive.
    pub fn set_target_queue_depth(&mut self, frames: f32) -> LerpResult<()> {
        self.clock.set_target_queue_depth(frames)?;
        tracing::debug!(target_queue_depth = frames, "playback target changed");
        Ok(())
    }

    /// See [`PlaybackClock::max_speed`].
    #[must_use]
    pub const fn max_speed(&self) -> Option<f32> {
        self.clock.max_speed()
    }

    /// Sets or removes the speed clamp.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`] if the limit is not finite and positive.
    pub fn set_max_speed(&mut self, max_speed: Option<f32>) -> LerpResult<()> {
        self.clock.set_max_speed(max_speed)?;
        tracing::debug!(?max_speed, "playback speed clamp changed");
        Ok(())
    }

    /// Overwrites the queue-depth average, e.g. to start playback at full
    /// speed instead of ramping up from rest.
    pub fn seed_average(&mut self, average: f32, count: usize) {
        self.clock.seed_average(average, count);
    }

    /// Playback diagnostics.
    #[must_use]
    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            frames_consumed: self.frames_consumed,
            queue_len: self.queue.len(),
            average_queue_depth: self.clock.average_queue_depth(),
            last_speed: self.clock.last_speed(),
            cursor: self.clock.cursor(),
        }
    }

    /// Counters of the shared buffer pool.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

/// Both halves under one owner, for when simulation and rendering share a
/// thread or are already serialized.
///
/// ## Usage
///
/// ```rust,ignore
/// let mut lerper = Lerper::new(&LerperConfig::default())?;
/// lerper.set_draw_callback(|prev: &Pose, next: &Pose, t: f32| {
///     draw_pose(prev.lerp(next, t));
/// });
///
/// // Simulation step
/// for entity in &entities {
///     lerper.add_entity(entity.id, entity.pose)?;
/// }
/// lerper.end_frame(SIMULATION_DELTA)?;
///
/// // Render step
/// lerper.draw(render_delta)?;
/// ```
pub struct Lerper<T> {
    producer: FrameProducer<T>,
    consumer: FrameConsumer<T>,
}

impl<T> Lerper<T> {
    /// Creates a lerper.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: &LerperConfig) -> LerpResult<Self> {
        let (producer, consumer) = split(config)?;
        Ok(Self { producer, consumer })
    }

    /// See [`FrameProducer::add_entity`].
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::DuplicateEntity`] on a repeated id.
    pub fn add_entity(&mut self, id: EntityId, snapshot: T) -> LerpResult<()> {
        self.producer.add_entity(id, snapshot)
    }

    /// See [`FrameProducer::end_frame`].
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidDuration`] on a bad duration.
    pub fn end_frame(&mut self, duration: f32) -> LerpResult<()> {
        self.producer.end_frame(duration)
    }

    /// See [`FrameConsumer::draw`].
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidDuration`] on a bad delta.
    pub fn draw(&mut self, delta: f32) -> LerpResult<usize> {
        self.consumer.draw(delta)
    }

    /// See [`FrameConsumer::draw_with`].
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidDuration`] on a bad delta.
    pub fn draw_with<D>(&mut self, delta: f32, sink: &mut D) -> LerpResult<usize>
    where
        D: EntityDraw<T> + ?Sized,
    {
        self.consumer.draw_with(delta, sink)
    }

    /// See [`FrameConsumer::set_draw_callback`].
    pub fn set_draw_callback<D>(&mut self, callback: D)
    where
        D: EntityDraw<T> + Send + 'static,
    {
        self.consumer.set_draw_callback(callback);
    }

    /// The simulation half.
    #[must_use]
    pub fn producer(&self) -> &FrameProducer<T> {
        &self.producer
    }

    /// The renderer half.
    #[must_use]
    pub fn consumer(&self) -> &FrameConsumer<T> {
        &self.consumer
    }

    /// The renderer half, for configuration changes.
    pub fn consumer_mut(&mut self) -> &mut FrameConsumer<T> {
        &mut self.consumer
    }

    /// Separates the halves, e.g. to move them onto their own threads.
    #[must_use]
    pub fn into_split(self) -> (FrameProducer<T>, FrameConsumer<T>) {
        (self.producer, self.consumer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LerperConfig {
        LerperConfig::default()
            .with_window_half_life(0.5)
            .with_target_queue_depth(1.0)
    }

    #[test]
    fn test_draw_without_callback_advances() {
        let mut lerper: Lerper<f32> = Lerper::new(&config()).unwrap();
        lerper.consumer_mut().seed_average(1.0, 1);
        lerper.add_entity(1, 0.0).unwrap();
        lerper.end_frame(1.0).unwrap();

        assert!(!lerper.consumer().has_draw_callback());
        assert_eq!(lerper.draw(1.0).unwrap(), 0);
        assert_eq!(lerper.consumer().stats().frames_consumed, 1);
        assert_eq!(lerper.consumer().current_frame().get(1), Some(&0.0));
    }

    #[test]
    fn test_registered_callback_receives_pairs() {
        use std::sync::{Arc, Mutex};

        let mut lerper: Lerper<f32> = Lerper::new(&config()).unwrap();
        lerper.consumer_mut().seed_average(1.0, 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        lerper.set_draw_callback(move |a: &f32, b: &f32, t: f32| {
            sink.lock().unwrap().push((*a, *b, t));
        });

        lerper.add_entity(1, 0.0).unwrap();
        lerper.end_frame(1.0).unwrap();
        lerper.add_entity(1, 10.0).unwrap();
        lerper.end_frame(1.0).unwrap();

        // Moves onto the first frame, heading towards the second
        assert_eq!(lerper.draw(1.0).unwrap(), 1);
        let calls = seen.lock().unwrap().clone();
        assert_eq!(calls, vec![(0.0, 10.0, 0.0)]);

        lerper.consumer_mut().clear_draw_callback();
        assert_eq!(lerper.draw(0.1).unwrap(), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_bad_delta() {
        let mut lerper: Lerper<u8> = Lerper::new(&config()).unwrap();
        lerper.end_frame(1.0).unwrap();
        for bad in [-1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(lerper.draw(bad), Err(LerpError::InvalidDuration(_))));
        }
        assert_eq!(lerper.consumer().stats(), PlaybackStats::default());
        assert_eq!(lerper.consumer().in_flight(), 1);
    }

    #[test]
    fn test_into_split_keeps_queued_frames() {
        let mut lerper: Lerper<u8> = Lerper::new(&config()).unwrap();
        lerper.add_entity(4, 4).unwrap();
        lerper.end_frame(0.5).unwrap();

        let (producer, mut consumer) = lerper.into_split();
        assert_eq!(producer.frames_produced(), 1);
        consumer.draw(0.0).unwrap();
        assert_eq!(consumer.queue_len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = LerperConfig::default().with_target_queue_depth(f32::NAN);
        assert!(matches!(split::<u8>(&bad), Err(LerpError::InvalidConfig(_))));
    }

    #[test]
    fn test_disconnected_consumer() {
        let (mut producer, consumer) = split::<u32>(&config()).unwrap();
        drop(consumer);

        producer.add_entity(1, 1).unwrap();
        assert_eq!(producer.end_frame(0.1), Err(LerpError::ConsumerDisconnected));
        assert_eq!(producer.frames_produced(), 0);
        assert_eq!(producer.pending_entities(), 0);
    }

    #[test]
    fn test_buffers_recycled_once_per_frame() {
        let mut lerper: Lerper<u32> = Lerper::new(&config().with_pool_capacity(4)).unwrap();
        lerper.consumer_mut().seed_average(1.0, 1);

        for tick in 0..32 {
            lerper.add_entity(0, tick).unwrap();
            lerper.end_frame(0.5).unwrap();
            lerper.draw(0.5).unwrap();
        }

        let consumed = lerper.consumer().stats().frames_consumed;
        let stats = lerper.producer().pool_stats();
        assert!(consumed > 0);
        assert_eq!(stats.released, consumed);
        // Collector + current + queued frames are the only live buffers
        let live = 2 + lerper.consumer().queue_len() as u64;
        assert_eq!(stats.acquired - stats.released, live);
    }
}
