//! Discard policies: static shrink and progressive latency pay-down.
//!
//! Grounded on `jbuf_discard_static`/`jbuf_discard_progressive` in the
//! reference `jtbuf.c`.

use super::frame_list::FrameList;
use super::types::{DiscardAlgo, Op};

const STA_DISC_SAFE_SHRINKING_DIFF: i64 = 1;

pub struct DiscardEngine {
    algo: DiscardAlgo,
    min_shrink_gap_frames: u32,
    ptime_ms: u32,
    discard_ref: Option<i64>,
    discard_dist: u32,
}

impl DiscardEngine {
    pub fn new(algo: DiscardAlgo, min_shrink_gap_frames: u32, ptime_ms: u32) -> Self {
        Self {
            algo,
            min_shrink_gap_frames,
            ptime_ms,
            discard_ref: None,
            discard_dist: 0,
        }
    }

    pub fn algo(&self) -> DiscardAlgo {
        self.algo
    }

    pub fn set_algo(&mut self, algo: DiscardAlgo) {
        self.algo = algo;
        self.discard_ref = None;
        self.discard_dist = 0;
    }

    pub fn reset(&mut self) {
        self.discard_ref = None;
        self.discard_dist = 0;
    }

    pub fn discard_dist(&self) -> u32 {
        self.discard_dist
    }

    /// The sequence number of the most recent discard decision's reference
    /// point: for `Static`, the origin checkpoint the next shrink is
    /// measured from; for `Progressive`, the sequence that was last marked
    /// `Discarded` (or the window's tail if no discard has fired yet).
    pub fn discard_ref(&self) -> Option<i64> {
        self.discard_ref
    }

    /// Run the active policy, if any, against the current state.
    pub fn run(&mut self, op: Op, fl: &mut FrameList, eff_level: u32, level: u32) {
        match self.algo {
            DiscardAlgo::None => {}
            DiscardAlgo::Static => self.run_static(fl, eff_level, level),
            DiscardAlgo::Progressive => {
                if op == Op::Put {
                    self.run_progressive(fl, eff_level, level);
                }
            }
        }
    }

    fn run_static(&mut self, fl: &mut FrameList, eff_level: u32, level: u32) {
        let burst = eff_level.max(level) as i64;
        let diff = fl.eff_size() as i64 - 2 * burst;
        if diff < STA_DISC_SAFE_SHRINKING_DIFF {
            return;
        }

        let origin = match fl.origin() {
            Some(o) => o,
            None => return,
        };

        let dref = match self.discard_ref {
            Some(r) if r <= origin => r,
            _ => origin,
        };
        self.discard_ref = Some(dref);

        if origin - dref >= self.min_shrink_gap_frames as i64 {
            fl.remove_head(1);
            self.discard_ref = Some(origin);
        }
    }

    fn run_progressive(&mut self, fl: &mut FrameList, eff_level: u32, level: u32) {
        let cur = fl.eff_size() as i64;
        let burst = eff_level.max(level) as i64;

        if cur <= burst {
            self.discard_dist = 0;
            return;
        }

        let origin = match fl.origin() {
            Some(o) => o,
            None => return,
        };

        let t_ms = progressive_window_ms(burst);
        let overflow = (cur - burst).max(1);
        let new_dist =
            ((t_ms / overflow as f64 / self.ptime_ms as f64).round() as i64).max(0) as u32;

        let size = fl.size() as i64;
        let last_seq = origin + size - 1;

        let no_prior_schedule = self.discard_dist == 0;
        if no_prior_schedule {
            self.discard_ref = Some(last_seq);
        } else if let Some(dref) = self.discard_ref {
            if last_seq < dref {
                self.discard_ref = Some(last_seq);
            }
        }

        self.discard_dist = new_dist.max(self.min_shrink_gap_frames);

        if let Some(dref) = self.discard_ref {
            if last_seq >= dref + self.discard_dist as i64 {
                let discard_seq = (dref + self.discard_dist as i64).max(origin);
                if fl.discard(discard_seq) {
                    self.discard_ref = Some(discard_seq);
                }
            }
        }
    }
}

/// Piecewise-linear latency pay-down window, in milliseconds, as a
/// function of burst level.
fn progressive_window_ms(burst: i64) -> f64 {
    const T_MIN: f64 = 2000.0;
    const T_MAX: f64 = 10000.0;
    if burst <= 1 {
        T_MIN
    } else if burst >= 100 {
        T_MAX
    } else {
        let frac = (burst - 1) as f64 / 99.0;
        T_MIN + frac * (T_MAX - T_MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(max_count: usize, frame_size: usize, n: i64) -> FrameList {
        let mut fl = FrameList::new(frame_size, max_count);
        for s in 0..n {
            fl.put_at(s, &[0u8; 4], 0, 0);
        }
        fl
    }

    #[test]
    fn static_no_op_when_not_overflowing() {
        let mut fl = filled(50, 16, 5);
        let mut de = DiscardEngine::new(DiscardAlgo::Static, 1, 20);
        de.run_static(&mut fl, 10, 0);
        assert_eq!(fl.size(), 5);
    }

    #[test]
    fn static_shrinks_one_frame_once_origin_advances_past_gap() {
        let mut fl = filled(50, 16, 40);
        let mut de = DiscardEngine::new(DiscardAlgo::Static, 1, 20);

        // First call only checkpoints discard_ref at the current origin;
        // the gap hasn't opened up yet so nothing shrinks.
        de.run_static(&mut fl, 1, 0);
        assert_eq!(fl.size(), 40);

        // Consumption (simulated via remove_head, as GET would do) advances
        // origin past the checkpoint by the shrink gap; next call shrinks.
        fl.remove_head(2);
        de.run_static(&mut fl, 1, 0);
        assert_eq!(fl.size(), 37);
    }

    #[test]
    fn progressive_idle_when_balanced() {
        let mut fl = filled(50, 16, 5);
        let mut de = DiscardEngine::new(DiscardAlgo::Progressive, 1, 20);
        de.run_progressive(&mut fl, 10, 0);
        assert_eq!(de.discard_dist(), 0);
        assert_eq!(fl.discarded_num(), 0);
    }

    #[test]
    fn progressive_schedules_discard_under_sustained_overflow() {
        let mut fl = filled(200, 16, 150);
        let mut de = DiscardEngine::new(DiscardAlgo::Progressive, 1, 20);
        de.run_progressive(&mut fl, 1, 0);
        assert!(de.discard_dist() >= 1);
    }
}
