//! Error types for the jitter buffer crate

use thiserror::Error;

/// Errors that can occur while constructing or reconfiguring a [`crate::jitter::JitterBuffer`].
///
/// Per-frame outcomes (too-late, duplicate, oversized, discarded-on-the-way-out,
/// empty, prefetching) are *not* errors — they are ordinary enum values
/// (`PutOutcome`, `GetOutcome`, `FrameType`) returned to the caller. Only
/// construction and reconfiguration can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid capacity: frame_size={frame_size}, max_count={max_count}")]
    InvalidCapacity { frame_size: usize, max_count: usize },

    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

/// Result type alias for the jitter buffer crate
pub type Result<T> = std::result::Result<T, Error>;
