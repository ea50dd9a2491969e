//! # Lerper Error Types
//!
//! All errors that can occur while producing or playing back frames.

use thiserror::Error;

use crate::pool::EntityId;

/// Errors that can occur in the interpolation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LerpError {
    /// The same entity was added twice to the frame being collected.
    #[error("entity {id} already added to the frame being collected")]
    DuplicateEntity {
        /// The offending identifier.
        id: EntityId,
    },

    /// A frame duration or draw delta was negative, NaN or infinite.
    #[error("invalid duration: {0} (must be finite and >= 0)")]
    InvalidDuration(f32),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The renderer side was dropped; finalized frames have nowhere to go.
    #[error("frame consumer disconnected")]
    ConsumerDisconnected,
}

/// Result type for lerper operations.
pub type LerpResult<T> = Result<T, LerpError>;
