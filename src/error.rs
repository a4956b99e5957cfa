//! Error taxonomy for the visualization path.
//!
//! None of these errors ever reach the audio output: callers log them and fall
//! back to an empty visualization area.

use thiserror::Error;

use crate::playback::SourceId;

/// Visualization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VizError {
    /// The media element cannot provide a real-time processing context
    #[error("audio processing unavailable: {0}")]
    CapabilityUnavailable(String),

    /// A tap is already attached to this media element
    #[error("media element {0} is already bound to an audio graph")]
    GraphAlreadyBound(SourceId),
}

/// Result type for visualization operations
pub type Result<T> = std::result::Result<T, VizError>;
