//! Prefetch clamping and the prefetching gate.
//!
//! Grounded on `jbuf_set_fixed`/`jbuf_set_adaptive` and the prefetch bits of
//! `jbuf_put_frame3`/`jbuf_get_frame3` in the reference `jtbuf.c`.

use crate::error::Error;

pub struct PrefetchController {
    min_prefetch: u32,
    max_prefetch: u32,
    prefetch: u32,
    init_prefetch: u32,
    prefetching: bool,
}

impl PrefetchController {
    pub fn new(init_prefetch: u32, min_prefetch: u32, max_prefetch: u32) -> Self {
        Self {
            min_prefetch,
            max_prefetch,
            prefetch: init_prefetch.clamp(min_prefetch, max_prefetch),
            init_prefetch,
            prefetching: init_prefetch > 0,
        }
    }

    pub fn reset(&mut self) {
        self.prefetch = self.init_prefetch.clamp(self.min_prefetch, self.max_prefetch);
        self.prefetching = self.init_prefetch > 0;
    }

    pub fn prefetch(&self) -> u32 {
        self.prefetch
    }

    pub fn is_prefetching(&self) -> bool {
        self.prefetching
    }

    pub fn init_prefetch(&self) -> u32 {
        self.init_prefetch
    }

    pub fn min_prefetch(&self) -> u32 {
        self.min_prefetch
    }

    pub fn max_prefetch(&self) -> u32 {
        self.max_prefetch
    }

    /// Collapse to a fixed prefetch depth; the caller is responsible for
    /// disabling the discard engine.
    pub fn set_fixed(&mut self, p: u32) {
        self.min_prefetch = p;
        self.max_prefetch = p;
        self.prefetch = p;
        self.init_prefetch = p;
        self.prefetching = p > 0;
    }

    pub fn set_adaptive(&mut self, init: u32, min: u32, max: u32, max_count: usize) -> Result<(), Error> {
        if min > max || init > max || max as usize > max_count {
            return Err(Error::ConfigurationInvalid(format!(
                "prefetch bounds invalid: init={init}, min={min}, max={max}, max_count={max_count}"
            )));
        }
        self.min_prefetch = min;
        self.max_prefetch = max;
        self.init_prefetch = init;
        self.prefetch = init.clamp(min, max);
        Ok(())
    }

    /// Called when the level estimator pushes a new `eff_level`.
    pub fn on_level_update(&mut self, eff_level: u32) {
        if self.init_prefetch != 0 {
            self.prefetch = eff_level.clamp(self.min_prefetch, self.max_prefetch);
        }
    }

    /// Called after a successful PUT.
    pub fn on_put_success(&mut self, eff_size: usize) {
        if self.prefetching && eff_size as u32 >= self.prefetch {
            self.prefetching = false;
        }
    }

    /// Called when GET finds the underlying list empty.
    pub fn on_get_empty(&mut self) {
        if self.prefetch > 0 {
            self.prefetching = true;
        }
    }
}
