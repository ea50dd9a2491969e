//! # Playback Clock
//!
//! Advances the playback cursor through the queued frames at a speed derived
//! from how many frames are waiting.
//!
//! ## Speed Control
//!
//! ```text
//! queue depth ──► decayed moving average ──► speed = average / target
//!                                                 │
//! cursor += delta * speed ◄───────────────────────┘
//! ```
//!
//! A deep queue plays faster and drains, a shallow one plays slower and
//! refills. An empty queue drives the average (and the speed) towards zero,
//! so playback stalls on the last real frame rather than running ahead.
//!
//! ## Moving Average
//!
//! Observations decay continuously with `decay_base = 2^(1 / half_life)` per
//! second. For a draw `delta` seconds after the previous one:
//!
//! ```text
//! weight  = decay_base ^ delta
//! average = (previous_average + previous_count * (weight - 1)) / weight
//! ```
//!
//! This is exact for irregular draw intervals, so the estimate does not
//! depend on the frame rate of the renderer. It is evaluated as
//!
//! ```text
//! gain    = 1 - 2^(-delta / half_life)          (via exp_m1)
//! average = previous_average + (previous_count - previous_average) * gain
//! ```
//!
//! which never forms `decay_base` itself: that overflows `f32` for half-lives
//! of a few milliseconds and rounds to exactly 1 for very long ones.

use crate::config::{require_positive_finite, LerperConfig};
use crate::error::LerpResult;
use crate::frame::Frame;
use crate::pool::EntityBuffer;
use crate::queue::FrameQueue;

/// Time-decayed average of the frame queue length.
#[derive(Clone, Debug, PartialEq)]
pub struct MovingAverage {
    /// Seconds for an observation to lose half its weight.
    half_life: f32,
    /// Average after the last sample.
    previous_average: f32,
    /// Queue length recorded by the last sample.
    previous_count: usize,
}

impl MovingAverage {
    /// Creates an average that starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`](crate::LerpError::InvalidConfig)
    /// unless `half_life` is finite and positive.
    pub fn new(half_life: f32) -> LerpResult<Self> {
        Ok(Self {
            half_life: require_positive_finite("window_half_life", half_life)?,
            previous_average: 0.0,
            previous_count: 0,
        })
    }

    /// Seconds over which past observations lose half their weight.
    #[inline]
    #[must_use]
    pub const fn half_life(&self) -> f32 {
        self.half_life
    }

    /// Changes the half-life, keeping the accumulated average.
    ///
    /// # Errors
    ///
    /// Same as [`MovingAverage::new`]. State is untouched on error.
    pub fn set_half_life(&mut self, half_life: f32) -> LerpResult<()> {
        self.half_life = require_positive_finite("window_half_life", half_life)?;
        Ok(())
    }

    /// Current average.
    #[inline]
    #[must_use]
    pub const fn average(&self) -> f32 {
        self.previous_average
    }

    /// Queue length recorded by the last sample.
    #[inline]
    #[must_use]
    pub const fn previous_count(&self) -> usize {
        self.previous_count
    }

    /// Overwrites the state, e.g. to warm-start playback at full speed.
    pub fn seed(&mut self, average: f32, count: usize) {
        self.previous_average = average;
        self.previous_count = count;
    }

    /// Folds in the count recorded last time, records `count` for next time,
    /// and returns the updated average.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&mut self, delta: f32, count: usize) -> f32 {
        let observed = std::mem::replace(&mut self.previous_count, count) as f32;

        // 1 - 2^(-delta / half_life); saturates at 1 after a long stall
        let gain = -(-delta / self.half_life * std::f32::consts::LN_2).exp_m1();
        self.previous_average += (observed - self.previous_average) * gain;
        self.previous_average
    }
}

/// Cursor into the queued frames plus the adaptive speed controller.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    average: MovingAverage,
    target_queue_depth: f32,
    max_speed: Option<f32>,
    /// Seconds of playback into the frame at the head of the queue.
    cursor: f32,
    last_speed: f32,
}

impl PlaybackClock {
    /// Creates a clock at rest.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`](crate::LerpError::InvalidConfig)
    /// if the config does not validate.
    pub fn new(config: &LerperConfig) -> LerpResult<Self> {
        config.validate()?;
        Ok(Self {
            average: MovingAverage::new(config.window_half_life)?,
            target_queue_depth: config.target_queue_depth,
            max_speed: config.max_speed,
            cursor: 0.0,
            last_speed: 0.0,
        })
    }

    /// Seconds over which the queue-depth average forgets half its history.
    #[must_use]
    pub fn window_half_life(&self) -> f32 {
        self.average.half_life()
    }

    /// See [`MovingAverage::set_half_life`].
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`](crate::LerpError::InvalidConfig) on a bad value.
    pub fn set_window_half_life(&mut self, seconds: f32) -> LerpResult<()> {
        self.average.set_half_life(seconds)
    }

    /// Queue length the clock steers towards.
    #[inline]
    #[must_use]
    pub const fn target_queue_depth(&self) -> f32 {
        self.target_queue_depth
    }

    /// Changes the target queue length.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`](crate::LerpError::InvalidConfig) on a bad value.
    pub fn set_target_queue_depth(&mut self, frames: f32) -> LerpResult<()> {
        self.target_queue_depth = require_positive_finite("target_queue_depth", frames)?;
        Ok(())
    }

    /// Upper bound on the speed coefficient, if any.
    #[inline]
    #[must_use]
    pub const fn max_speed(&self) -> Option<f32> {
        self.max_speed
    }

    /// Sets or removes the speed clamp.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`](crate::LerpError::InvalidConfig) on a bad value.
    pub fn set_max_speed(&mut self, max_speed: Option<f32>) -> LerpResult<()> {
        self.max_speed = match max_speed {
            Some(limit) => Some(require_positive_finite("max_speed", limit)?),
            None => None,
        };
        Ok(())
    }

    /// Seeds the queue-depth average. See [`MovingAverage::seed`].
    pub fn seed_average(&mut self, average: f32, count: usize) {
        self.average.seed(average, count);
    }

    /// Current queue-depth average.
    #[inline]
    #[must_use]
    pub const fn average_queue_depth(&self) -> f32 {
        self.average.average()
    }

    /// Speed coefficient computed by the last draw.
    #[inline]
    #[must_use]
    pub const fn last_speed(&self) -> f32 {
        self.last_speed
    }

    /// Seconds of playback into the head frame.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Samples the queue length and returns the speed coefficient for this draw.
    pub fn speed(&mut self, delta: f32, queue_len: usize) -> f32 {
        let average = self.average.sample(delta, queue_len);
        let mut speed = average / self.target_queue_depth;
        if let Some(limit) = self.max_speed {
            speed = speed.min(limit);
        }

        tracing::trace!(delta, queue_len, average, speed, "playback speed sampled");
        self.last_speed = speed;
        speed
    }

    /// Moves playback forward by `delta` real seconds.
    ///
    /// Every queued frame the cursor passes becomes the new `current` frame;
    /// the frame it replaces is handed to `retire`. Frames with zero duration
    /// are passed instantly. The cursor moves even when the queue is empty,
    /// so frames that arrive late are played out of that banked time.
    ///
    /// Returns the interpolation fraction towards the frame now at the head
    /// of the queue, or `None` when the queue is empty and there is nothing
    /// to interpolate towards.
    pub fn advance<T, F>(
        &mut self,
        delta: f32,
        queue: &mut FrameQueue<T>,
        current: &mut Frame<T>,
        mut retire: F,
    ) -> Option<f32>
    where
        F: FnMut(EntityBuffer<T>),
    {
        let speed = self.speed(delta, queue.len());
        self.cursor += delta * speed;

        while let Some(duration) = queue.peek_front().map(Frame::duration) {
            if self.cursor < duration {
                // duration > 0 here, cursor >= 0
                return Some(self.cursor / duration);
            }

            self.cursor -= duration;
            if let Some(next) = queue.pop_front() {
                let retired = std::mem::replace(current, next);
                retire(retired.into_buffer());
                tracing::debug!(duration, queued = queue.len(), "frame retired");
            }
        }

        None
    }
}
