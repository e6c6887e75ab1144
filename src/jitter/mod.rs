//! Adaptive jitter buffer for real-time media streams.
//!
//! The public [`JitterBuffer`] handle wraps a single [`parking_lot::Mutex`]
//! guarding a [`FrameList`], [`LevelEstimator`], [`PrefetchController`] and
//! [`DiscardEngine`]. Grounded on the orchestration functions
//! `jbuf_put_frame3`/`jbuf_get_frame3`/`jbuf_update` in the reference
//! `jtbuf.c`; the lock choice mirrors this codebase's `parking_lot` usage
//! elsewhere in its guarded shared state.

mod discard;
mod frame_list;
mod level;
mod prefetch;
mod types;

pub use types::{DiscardAlgo, FrameType, PutOutcome};

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use discard::DiscardEngine;
use frame_list::FrameList;
use level::LevelEstimator;
use prefetch::PrefetchController;
use types::{GetOutcome, Op, Status};

/// A single GET's observable outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResult {
    pub frame_type: FrameType,
    pub payload: Vec<u8>,
    pub bit_info: u32,
    pub ts: u32,
    pub seq: Option<i64>,
}

impl GetResult {
    fn zero(frame_type: FrameType) -> Self {
        Self { frame_type, payload: Vec::new(), bit_info: 0, ts: 0, seq: None }
    }
}

/// Read-only snapshot of buffer settings, current estimator state, and
/// cumulative counters. The Rust analogue of the reference implementation's
/// `jb_state_t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitterBufferState {
    pub frame_size: usize,
    pub ptime_ms: u32,
    pub max_count: usize,
    pub min_prefetch: u32,
    pub max_prefetch: u32,
    pub prefetch: u32,
    pub prefetching: bool,
    pub discard_algo: DiscardAlgo,
    pub level: u32,
    pub eff_level: u32,
    /// The discard engine's current reference sequence: for `Static`, the
    /// origin checkpoint the next shrink is measured from; for
    /// `Progressive`, the sequence most recently marked `Discarded`. `None`
    /// if the policy hasn't fired yet or is disabled.
    pub discard_ref: Option<i64>,
    /// The discard engine's currently scheduled gap, in frames, between
    /// `Progressive` discards (`0` for `Static`/`None`, or while balanced).
    pub discard_dist: u32,
    pub size: usize,
    pub eff_size: usize,
    pub frames_put: u64,
    pub frames_gotten: u64,
    pub frames_discarded: u64,
    pub empty_get_count: u64,
    pub lost_at_reset: u64,
}

struct Inner {
    frame_size: usize,
    ptime_ms: u32,
    max_count: usize,
    min_shrink_gap_frames: u32,

    fl: FrameList,
    level: LevelEstimator,
    prefetch: PrefetchController,
    discard: DiscardEngine,

    frames_put: u64,
    frames_gotten: u64,
    frames_discarded: u64,
    empty_get_count: u64,
    lost_at_reset: u64,
}

impl Inner {
    fn update(&mut self, op: Op) {
        let upd = self.level.update(op);
        if upd.eff_level_changed {
            self.prefetch.on_level_update(self.level.eff_level());
        }
        if self.level.status() == Status::Processing {
            self.discard.run(op, &mut self.fl, self.level.eff_level(), self.level.level());
        }
    }

    fn put(&mut self, seq: i64, payload: &[u8], bit_info: u32, ts: u32) -> bool {
        let old_eff_size = self.fl.eff_size();

        let mut result = self.fl.put_at(seq, payload, bit_info, ts);
        while result == PutOutcome::Overflow {
            let origin = match self.fl.origin() {
                Some(o) => o,
                None => break,
            };
            let distance = ((seq - origin) - self.max_count as i64 + 1).max(1) as usize;
            if self.fl.remove_head(distance) == 0 {
                break;
            }
            result = self.fl.put_at(seq, payload, bit_info, ts);
        }

        let discarded = result != PutOutcome::Accepted;

        if result == PutOutcome::Accepted {
            let new_eff_size = self.fl.eff_size();
            self.prefetch.on_put_success(new_eff_size);
            self.level.add_put(old_eff_size, new_eff_size);
            self.update(Op::Put);
            self.frames_put += 1;
        } else {
            self.frames_discarded += 1;
        }

        discarded
    }

    fn get(&mut self) -> GetResult {
        if self.prefetch.is_prefetching() {
            self.empty_get_count += 1;
            return GetResult::zero(FrameType::ZeroPrefetch);
        }

        let result = match self.fl.get() {
            GetOutcome::Present { frame_type, payload, bit_info, ts, seq } => {
                self.frames_gotten += 1;
                GetResult { frame_type, payload, bit_info, ts, seq: Some(seq) }
            }
            GetOutcome::Empty => {
                self.prefetch.on_get_empty();
                self.empty_get_count += 1;
                GetResult::zero(FrameType::ZeroEmpty)
            }
        };

        self.level.add_get();
        self.update(Op::Get);

        result
    }

    fn peek(&self, offset: usize) -> Option<GetResult> {
        self.fl.peek(offset).map(|(frame_type, payload, bit_info, ts, seq)| GetResult {
            frame_type,
            payload,
            bit_info,
            ts,
            seq: Some(seq),
        })
    }

    fn remove(&mut self, n: usize) -> usize {
        let mut effective = 0;
        while effective < n {
            if self.fl.size() == 0 {
                break;
            }
            let before = self.fl.discarded_num();
            if self.fl.remove_head(1) == 0 {
                break;
            }
            if self.fl.discarded_num() == before {
                effective += 1;
            }
        }
        effective
    }

    fn reset(&mut self) {
        self.lost_at_reset += self.fl.eff_size() as u64;
        self.fl.reset();
        self.level.reset(self.prefetch.init_prefetch());
        self.prefetch.reset();
        self.discard.reset();
    }

    fn state(&self) -> JitterBufferState {
        JitterBufferState {
            frame_size: self.frame_size,
            ptime_ms: self.ptime_ms,
            max_count: self.max_count,
            min_prefetch: self.prefetch.min_prefetch(),
            max_prefetch: self.prefetch.max_prefetch(),
            prefetch: self.prefetch.prefetch(),
            prefetching: self.prefetch.is_prefetching(),
            discard_algo: self.discard.algo(),
            level: self.level.level(),
            eff_level: self.level.eff_level(),
            discard_ref: self.discard.discard_ref(),
            discard_dist: self.discard.discard_dist(),
            size: self.fl.size(),
            eff_size: self.fl.eff_size(),
            frames_put: self.frames_put,
            frames_gotten: self.frames_gotten,
            frames_discarded: self.frames_discarded,
            empty_get_count: self.empty_get_count,
            lost_at_reset: self.lost_at_reset,
        }
    }
}

/// An adaptive jitter buffer.
///
/// Cheaply `Clone`-able (an `Arc` around the single internal mutex); all
/// clones observe and mutate the same underlying buffer.
#[derive(Clone)]
pub struct JitterBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl JitterBuffer {
    /// Create a new buffer. Fails only if the requested capacity cannot be
    /// represented (`max_count == 0`, or `frame_size * max_count` would
    /// overflow `usize`) — the allocation-failure path from the reference
    /// implementation, expressed as a checked error instead of an abort.
    pub fn new(frame_size: usize, ptime_ms: u32, max_count: usize) -> Result<Self> {
        if max_count == 0 || frame_size.checked_mul(max_count).is_none() {
            return Err(Error::InvalidCapacity { frame_size, max_count });
        }

        let init_prefetch = 15u32.min((max_count * 4 / 5) as u32);
        let min_prefetch = 0u32;
        let max_prefetch = (max_count * 4 / 5) as u32;
        let min_shrink_gap_frames = (200u32 / ptime_ms.max(1)).max(1);
        let max_burst = (1000u32 / ptime_ms.max(1)).max((max_count * 3 / 4) as u32);

        debug!(frame_size, ptime_ms, max_count, init_prefetch, max_prefetch, "jitter buffer created");

        let inner = Inner {
            frame_size,
            ptime_ms,
            max_count,
            min_shrink_gap_frames,
            fl: FrameList::new(frame_size, max_count),
            level: LevelEstimator::new(init_prefetch, max_burst, max_count),
            prefetch: PrefetchController::new(init_prefetch, min_prefetch, max_prefetch),
            discard: DiscardEngine::new(DiscardAlgo::Progressive, min_shrink_gap_frames, ptime_ms),
            frames_put: 0,
            frames_gotten: 0,
            frames_discarded: 0,
            empty_get_count: 0,
            lost_at_reset: 0,
        };

        Ok(Self { inner: Arc::new(Mutex::new(inner)) })
    }

    /// Return the buffer to its post-construction observable state without
    /// reallocating.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Collapse to a fixed prefetch depth and disable proactive discard.
    pub fn set_fixed(&self, prefetch: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        if prefetch as usize > inner.max_count {
            warn!(prefetch, max_count = inner.max_count, "rejected set_fixed: prefetch exceeds capacity");
            return Err(Error::ConfigurationInvalid(format!(
                "prefetch {prefetch} exceeds max_count {}",
                inner.max_count
            )));
        }
        inner.prefetch.set_fixed(prefetch);
        inner.discard.set_algo(DiscardAlgo::None);
        Ok(())
    }

    /// Enable adaptive prefetch within `[min, max]`, seeded at `init`.
    pub fn set_adaptive(&self, init: u32, min: u32, max: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        let max_count = inner.max_count;
        inner.prefetch.set_adaptive(init, min, max, max_count).map_err(|e| {
            warn!(init, min, max, max_count, "rejected set_adaptive");
            e
        })
    }

    /// Change the active discard policy.
    pub fn set_discard(&self, algo: DiscardAlgo) -> Result<()> {
        let mut inner = self.inner.lock();
        let gap = inner.min_shrink_gap_frames;
        let ptime_ms = inner.ptime_ms;
        inner.discard = DiscardEngine::new(algo, gap, ptime_ms);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock().fl.is_full()
    }

    /// Insert a frame. Returns `true` if the frame was rejected/discarded
    /// rather than accepted (duplicate, too-late, oversized, or evicted to
    /// make room).
    pub fn put(&self, seq: i64, payload: &[u8], bit_info: u32, ts: u32) -> bool {
        self.inner.lock().put(seq, payload, bit_info, ts)
    }

    /// Retrieve the next frame.
    ///
    /// When a run of `Discarded` slots sits at the head, this call
    /// silently consumes them and reports `FrameType::Missing` for the
    /// *next* slot too (even if that slot held real payload) — an
    /// intentional PLC-triggering quirk inherited from the reference
    /// implementation. See `DESIGN.md`, Open Question 1.
    pub fn get(&self) -> GetResult {
        self.inner.lock().get()
    }

    /// View the frame that would be the `offset`-th GET, without consuming
    /// it. Returns `None` if `offset` is beyond the effective window.
    pub fn peek(&self, offset: usize) -> Option<GetResult> {
        self.inner.lock().peek(offset)
    }

    /// Drop up to `n` effective frames from the head (discarded frames
    /// among them don't count against `n`).
    pub fn remove(&self, n: usize) -> usize {
        self.inner.lock().remove(n)
    }

    /// Read-only snapshot of settings, estimator state, and counters.
    pub fn state(&self) -> JitterBufferState {
        self.inner.lock().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_zero_capacity() {
        assert!(JitterBuffer::new(160, 20, 0).is_err());
    }

    #[test]
    fn fixed_prefetch_gates_until_target_then_drains_in_order() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(3).unwrap();

        assert_eq!(jb.get().frame_type, FrameType::ZeroPrefetch);
        jb.put(1, &[1], 0, 0);
        assert_eq!(jb.get().frame_type, FrameType::ZeroPrefetch);
        jb.put(2, &[2], 0, 0);
        jb.put(3, &[3], 0, 0);

        let r = jb.get();
        assert_eq!(r.frame_type, FrameType::Normal);
        assert_eq!(r.seq, Some(1));
        assert_eq!(r.payload, vec![1]);
    }

    #[test]
    fn duplicate_put_is_reported_discarded_and_keeps_original_payload() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(1).unwrap();
        assert!(!jb.put(1, &[9], 0, 0));
        assert!(jb.put(1, &[42], 0, 0));

        let r = jb.get();
        assert_eq!(r.payload, vec![9]);
    }

    #[test]
    fn drain_to_empty_reenters_prefetching() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(1).unwrap();
        jb.put(1, &[1], 0, 0);
        let r = jb.get();
        assert_eq!(r.frame_type, FrameType::Normal);

        let r2 = jb.get();
        assert_eq!(r2.frame_type, FrameType::ZeroEmpty);
        let r3 = jb.get();
        assert_eq!(r3.frame_type, FrameType::ZeroPrefetch);
    }

    #[test]
    fn reset_restores_origin_semantics() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(1).unwrap();
        jb.put(1, &[1], 0, 0);
        jb.put(2, &[2], 0, 0);
        jb.reset();

        jb.put(100, &[7], 0, 0);
        let r = jb.get();
        assert_eq!(r.seq, Some(100));
    }

    #[test]
    fn missing_gap_reported_between_two_accepted_puts() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(1).unwrap();
        jb.put(1, &[1], 0, 0);
        jb.put(3, &[3], 0, 0);

        assert_eq!(jb.get().seq, Some(1));
        let gap = jb.get();
        assert_eq!(gap.seq, Some(2));
        assert_eq!(gap.frame_type, FrameType::Missing);
        assert_eq!(jb.get().seq, Some(3));
    }

    #[test]
    fn state_snapshot_tracks_counters() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        jb.set_fixed(1).unwrap();
        jb.put(1, &[1], 0, 0);
        jb.get();
        let st = jb.state();
        assert_eq!(st.frames_put, 1);
        assert_eq!(st.frames_gotten, 1);
        assert_eq!(st.max_count, 50);
    }

    #[test]
    fn adaptive_setter_rejects_out_of_range_capacity() {
        let jb = JitterBuffer::new(160, 20, 50).unwrap();
        assert!(jb.set_adaptive(10, 0, 200).is_err());
    }
}
