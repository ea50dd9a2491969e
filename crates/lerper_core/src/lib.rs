//! # LERPER Core
//!
//! Decouples the rate at which a simulation produces entity snapshots from
//! the rate at which a renderer draws them.
//!
//! - The simulation adds one snapshot per entity, then ends the frame with
//!   the time it should take on screen.
//! - The renderer draws with its own elapsed time and receives, per entity,
//!   the snapshot it is leaving, the one it is heading to, and a blend
//!   fraction in `[0, 1]`.
//!
//! Playback speed follows the queue: a decayed moving average of how many
//! frames are waiting is compared with a target depth, so the renderer
//! neither runs dry nor builds up latency when the two rates drift.
//!
//! ## Architecture Rules
//!
//! 1. **One handoff** - the frame channel is the only state the simulation
//!    and render threads share (plus the buffer pool's short lock)
//! 2. **Move-only buffers** - every snapshot map has one owner and goes back
//!    to the pool exactly once
//! 3. **Never blocks** - `add_entity`, `end_frame` and `draw` cost is bounded
//!    by the entities they touch
//!
//! ## Example
//!
//! ```rust,ignore
//! use lerper_core::{split, LerperConfig};
//!
//! let (mut producer, mut consumer) = split::<Pose>(&LerperConfig::default())?;
//!
//! // Simulation thread
//! producer.add_entity(42, pose)?;
//! producer.end_frame(1.0 / 20.0)?;
//!
//! // Render thread
//! consumer.draw_with(1.0 / 60.0, &mut |prev: &Pose, next: &Pose, t: f32| {
//!     render(prev.lerp(next, t));
//! })?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod lerper;
pub mod pool;
pub mod queue;

pub use clock::{MovingAverage, PlaybackClock};
pub use config::{LerperConfig, DEFAULT_POOL_CAPACITY, DEFAULT_TARGET_QUEUE_DEPTH, DEFAULT_WINDOW_HALF_LIFE};
pub use dispatch::{dispatch, EntityDraw};
pub use error::{LerpError, LerpResult};
pub use frame::{Frame, FrameCollector};
pub use lerper::{split, DrawCallback, FrameConsumer, FrameProducer, Lerper, PlaybackStats};
pub use pool::{BufferPool, EntityBuffer, EntityId, PoolStats, SharedBufferPool};
pub use queue::{frame_channel, FrameQueue, FrameReceiver, FrameSender};
