//! Synthetic PUT/GET harness.
//!
//! Drives a [`jitterbuf::JitterBuffer`] at a fixed ptime cadence with
//! injected reordering and loss, printing periodic state snapshots. Useful
//! for eyeballing how the adaptive prefetch and discard policies react to a
//! chosen jitter profile without wiring up real network I/O.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jitterbuf::{constants::*, DiscardAlgo, FrameType, JitterBuffer};

/// Small deterministic xorshift generator — good enough for synthetic
/// jitter injection, no need to pull in a dependency for it.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo) as f64) as i64
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting jitter buffer simulation");

    let max_count = DEFAULT_MAX_COUNT;
    let jb = JitterBuffer::new(DEFAULT_FRAME_SIZE, DEFAULT_PTIME_MS, max_count)?;
    jb.set_adaptive(15, 0, (max_count * 4 / 5) as u32)?;
    jb.set_discard(DiscardAlgo::Progressive)?;

    tracing::info!(max_count, ptime_ms = DEFAULT_PTIME_MS, "buffer configured");

    let mut rng = Rng(0x9E3779B97F4A7C15);

    // Simulate a producer sending frames with reordering and occasional
    // loss, while a consumer pulls at a fixed cadence. Both loops are
    // driven lock-step here (no real time involved) so the harness runs
    // instantly instead of sleeping for the simulated duration.
    let total_frames = 2_000i64;
    let reorder_window = 8i64;
    let loss_rate = 0.02;

    let mut pending: Vec<i64> = Vec::new();
    let mut next_produce = 0i64;
    let mut gets = 0u64;

    while next_produce < total_frames || !pending.is_empty() {
        // Top up the reorder window with newly "arrived" sequences.
        while next_produce < total_frames && (pending.len() as i64) < reorder_window {
            pending.push(next_produce);
            next_produce += 1;
        }

        if !pending.is_empty() {
            let idx = rng.range(0, pending.len() as i64) as usize;
            let seq = pending.remove(idx);

            if rng.next_f64() >= loss_rate {
                let payload = vec![0u8; DEFAULT_FRAME_SIZE];
                let ts = (seq * DEFAULT_PTIME_MS as i64) as u32;
                let discarded = jb.put(seq, &payload, 0, ts);
                if discarded {
                    tracing::debug!(seq, "put rejected or evicted");
                }
            }
        }

        let result = jb.get();
        gets += 1;
        match result.frame_type {
            FrameType::ZeroPrefetch | FrameType::ZeroEmpty => {}
            FrameType::Missing => tracing::debug!(seq = ?result.seq, "missing frame (PLC hook)"),
            FrameType::Normal => {}
        }

        if gets % 200 == 0 {
            let st = jb.state();
            tracing::info!(
                gets,
                level = st.level,
                eff_level = st.eff_level,
                prefetch = st.prefetch,
                prefetching = st.prefetching,
                size = st.size,
                eff_size = st.eff_size,
                frames_put = st.frames_put,
                frames_discarded = st.frames_discarded,
                "state snapshot"
            );
        }
    }

    let st = jb.state();
    tracing::info!(
        frames_put = st.frames_put,
        frames_gotten = st.frames_gotten,
        frames_discarded = st.frames_discarded,
        empty_get_count = st.empty_get_count,
        "simulation complete"
    );

    Ok(())
}
