//! Shared enums for the jitter buffer state machine.

/// Type of frame returned by the jitter buffer on `get`/`peek`.
///
/// The numeric values are part of the observable contract (a consumer on
/// the other side of an FFI boundary, or simply logging code, may depend
/// on them being stable) and mirror the reference implementation's
/// `jb_frame_type_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// No frame because it's missing (a gap in the sequence, or a
    /// discarded slot collapsed on its way out — see `JitterBuffer::get`).
    Missing = 0,
    /// A real frame is being returned.
    Normal = 1,
    /// Zero frame returned because the buffer is still prefetching.
    ZeroPrefetch = 2,
    /// Zero frame returned because the buffer is empty and not prefetching.
    ZeroEmpty = 3,
}

/// Discard algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiscardAlgo {
    /// Never discard proactively; only evict on overflow to make room.
    #[default]
    None,
    /// Discard at most one frame per `min_shrink_gap_frames` window once
    /// latency has roughly doubled the current burst level.
    Static,
    /// Smear latency pay-down over a time window sized by burstiness.
    Progressive,
}

/// Outcome of a `FrameList::put_at` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The frame was stored.
    Accepted,
    /// `seq` is older than the window by less than `MAX_MISORDER`.
    TooLate,
    /// The slot at `seq` is already occupied.
    Duplicate,
    /// `payload.len() > frame_size`.
    Oversized,
    /// `seq` is beyond `max_count` ahead of `origin` but within `MAX_DROPOUT`;
    /// caller should evict head frames and retry.
    Overflow,
}

/// Outcome of a `FrameList::get` call.
#[derive(Debug, Clone, PartialEq)]
pub enum GetOutcome {
    /// The list was empty; nothing to return.
    Empty,
    /// A frame (real or a collapsed-discard placeholder) was returned.
    Present {
        frame_type: FrameType,
        payload: Vec<u8>,
        bit_info: u32,
        ts: u32,
        seq: i64,
    },
}

/// Last operation performed against the buffer, used to detect direction
/// switches for burst-level estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Init,
    Put,
    Get,
}

/// Initialization status of the jitter buffer's level estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Still accumulating OP-switch cycles before burst calculation begins.
    Initializing,
    /// Burst level and discard policies are active.
    Processing,
}
