//! # Lerper Configuration
//!
//! Tuning for the playback clock and the buffer pool. Usually set once at
//! startup, either in code or from a TOML file:
//!
//! ```toml
//! window_half_life = 0.05
//! target_queue_depth = 1.5
//! max_speed = 3.0
//! pool_capacity = 8
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LerpError, LerpResult};

/// Default half-life of the queue-depth moving average, in seconds.
pub const DEFAULT_WINDOW_HALF_LIFE: f32 = 0.05;

/// Default number of frames the clock tries to keep queued.
pub const DEFAULT_TARGET_QUEUE_DEPTH: f32 = 1.5;

/// Default number of spare snapshot buffers kept by the pool.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

/// Configuration for a producer/consumer pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LerperConfig {
    /// Seconds after which a queue-depth observation has lost half its weight.
    pub window_half_life: f32,
    /// Queue length the adaptive speed steers towards.
    pub target_queue_depth: f32,
    /// Upper bound on the playback speed coefficient. `None` leaves it unbounded.
    pub max_speed: Option<f32>,
    /// Spare buffers retained by the pool. Extra released buffers are dropped.
    pub pool_capacity: usize,
}

impl Default for LerperConfig {
    fn default() -> Self {
        Self {
            window_half_life: DEFAULT_WINDOW_HALF_LIFE,
            target_queue_depth: DEFAULT_TARGET_QUEUE_DEPTH,
            max_speed: None,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl LerperConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::ConfigParse`] for malformed TOML or unknown keys,
    /// [`LerpError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> LerpResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| LerpError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field is in range.
    ///
    /// # Errors
    ///
    /// Returns [`LerpError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> LerpResult<()> {
        require_positive_finite("window_half_life", self.window_half_life)?;
        require_positive_finite("target_queue_depth", self.target_queue_depth)?;
        if let Some(max_speed) = self.max_speed {
            require_positive_finite("max_speed", max_speed)?;
        }
        Ok(())
    }

    /// Sets the moving-average half-life.
    #[must_use]
    pub const fn with_window_half_life(mut self, seconds: f32) -> Self {
        self.window_half_life = seconds;
        self
    }

    /// Sets the target queue depth.
    #[must_use]
    pub const fn with_target_queue_depth(mut self, frames: f32) -> Self {
        self.target_queue_depth = frames;
        self
    }

    /// Sets the speed clamp.
    #[must_use]
    pub const fn with_max_speed(mut self, max_speed: Option<f32>) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Sets how many spare buffers the pool retains.
    #[must_use]
    pub const fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

/// Rejects NaN, infinities, zero and negative values.
pub(crate) fn require_positive_finite(field: &str, value: f32) -> LerpResult<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LerpError::InvalidConfig(format!(
            "{field} must be a positive real number, got {value}"
        )))
    }
}
