//! # jitterbuf
//!
//! Adaptive jitter buffer for real-time media streams.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         JitterBuffer                             │
//! │                  (parking_lot::Mutex<Inner>)                     │
//! │                                                                   │
//! │   put(seq, payload) ──┐                        ┌── get()          │
//! │                       ▼                        ▼                 │
//! │                 ┌───────────┐            ┌───────────┐          │
//! │                 │ FrameList │◄──remove────┤ Prefetch  │          │
//! │                 │  (ring)   │   head      │ Controller│          │
//! │                 └─────┬─────┘            └─────┬─────┘          │
//! │                       │                         │                │
//! │                       ▼                         ▼                │
//! │                 ┌───────────┐            ┌───────────┐          │
//! │                 │  Level    │───push────▶│  (gates   │          │
//! │                 │ Estimator │  eff_level │  prefetch)│          │
//! │                 └─────┬─────┘            └───────────┘          │
//! │                       │                                          │
//! │                       ▼                                          │
//! │                 ┌───────────┐                                    │
//! │                 │  Discard  │  Static | Progressive | None       │
//! │                 │  Engine   │                                    │
//! │                 └───────────┘                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core state machine (`jitter` module) is deliberately silent — no
//! logging, no allocation beyond construction — since it is meant to sit on
//! a latency-sensitive audio thread. Construction, reconfiguration, and the
//! optional [`config`] loading layer use `tracing` the way the rest of this
//! codebase instruments its orchestration code.

pub mod config;
pub mod error;
pub mod jitter;

pub use error::{Error, Result};
pub use jitter::{DiscardAlgo, FrameType, GetResult, JitterBuffer, JitterBufferState, PutOutcome};

/// Crate-wide constants.
pub mod constants {
    /// Default per-frame payload size in bytes (20ms @ 48kHz mono, 16-bit PCM).
    pub const DEFAULT_FRAME_SIZE: usize = 1920;

    /// Default frame cadence in milliseconds.
    pub const DEFAULT_PTIME_MS: u32 = 20;

    /// Default ring capacity, in frames (2 seconds of audio at 20ms ptime).
    pub const DEFAULT_MAX_COUNT: usize = 100;

    /// `MAX_MISORDER` from the reference implementation: a sequence this far
    /// behind the window is rejected as too-late rather than treated as a
    /// restart.
    pub const MAX_MISORDER: i64 = 100;

    /// `MAX_DROPOUT` from the reference implementation: a sequence jump
    /// beyond this far ahead of the window triggers a full reset.
    pub const MAX_DROPOUT: i64 = 3000;
}
