//! Circular sequence-indexed frame store.
//!
//! Grounded on `jb_framelist_*` in the reference `jtbuf.c`, restructured as
//! a `Vec<FrameSlot>` of small records rather than the reference's five
//! parallel arrays (content/frame_type/content_len/bit_info/ts) — the
//! reference implementation's own comment allows this when cache-locality
//! measurements don't justify the split, and nothing here calls for it.

use super::types::{GetOutcome, FrameType, PutOutcome};
use crate::constants::{MAX_DROPOUT, MAX_MISORDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Missing,
    Normal,
    Discarded,
}

#[derive(Debug, Clone)]
struct FrameSlot {
    state: SlotState,
    payload: Vec<u8>,
    len: usize,
    bit_info: u32,
    ts: u32,
}

impl FrameSlot {
    fn empty(frame_size: usize) -> Self {
        Self {
            state: SlotState::Missing,
            payload: vec![0u8; frame_size],
            len: 0,
            bit_info: 0,
            ts: 0,
        }
    }

    fn clear(&mut self) {
        self.state = SlotState::Missing;
        self.len = 0;
        self.bit_info = 0;
        self.ts = 0;
    }
}

/// The circular, sequence-addressed frame store described in §4.1.
pub struct FrameList {
    frame_size: usize,
    max_count: usize,
    slots: Vec<FrameSlot>,
    head: usize,
    size: usize,
    discarded_num: usize,
    origin: Option<i64>,
}

impl FrameList {
    pub fn new(frame_size: usize, max_count: usize) -> Self {
        let slots = (0..max_count).map(|_| FrameSlot::empty(frame_size)).collect();
        Self {
            frame_size,
            max_count,
            slots,
            head: 0,
            size: 0,
            discarded_num: 0,
            origin: None,
        }
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.origin = None;
        self.size = 0;
        self.discarded_num = 0;
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn discarded_num(&self) -> usize {
        self.discarded_num
    }

    /// `size - discarded_num`: frames a consumer can still receive.
    pub fn eff_size(&self) -> usize {
        self.size - self.discarded_num
    }

    pub fn origin(&self) -> Option<i64> {
        self.origin
    }

    pub fn is_full(&self) -> bool {
        self.size == self.max_count
    }

    fn slot_index(&self, offset: usize) -> usize {
        (self.head + offset) % self.max_count
    }

    /// Place a frame at its sequence-addressed slot. See §4.1.
    pub fn put_at(&mut self, seq: i64, payload: &[u8], bit_info: u32, ts: u32) -> PutOutcome {
        if payload.len() > self.frame_size {
            return PutOutcome::Oversized;
        }

        let mut origin = match self.origin {
            Some(o) => o,
            None => {
                // List is empty: the incoming frame defines the window origin.
                self.origin = Some(seq);
                seq
            }
        };

        if seq < origin {
            if origin - seq < MAX_MISORDER {
                return PutOutcome::TooLate;
            }
            // Sequence restart: rebase the window around the new sequence.
            origin = seq - self.size as i64;
            self.origin = Some(origin);
        }

        let mut distance = seq - origin;

        if distance >= self.max_count as i64 {
            if distance > MAX_DROPOUT {
                self.reset();
                self.origin = Some(seq);
                origin = seq;
                distance = 0;
            } else {
                return PutOutcome::Overflow;
            }
        }

        let pos = self.slot_index(distance as usize);
        if self.slots[pos].state != SlotState::Missing {
            return PutOutcome::Duplicate;
        }

        self.slots[pos].state = SlotState::Normal;
        self.slots[pos].len = payload.len();
        self.slots[pos].bit_info = bit_info;
        self.slots[pos].ts = ts;
        self.slots[pos].payload[..payload.len()].copy_from_slice(payload);

        if origin + self.size as i64 <= seq {
            self.size = distance as usize + 1;
        }

        PutOutcome::Accepted
    }

    /// Mark the slot at `seq` as discarded. Rejects sequences outside the
    /// current window.
    pub fn discard(&mut self, seq: i64) -> bool {
        let origin = match self.origin {
            Some(o) => o,
            None => return false,
        };
        if seq < origin || seq >= origin + self.size as i64 {
            return false;
        }
        let pos = self.slot_index((seq - origin) as usize);
        if self.slots[pos].state == SlotState::Discarded {
            return false;
        }
        self.slots[pos].state = SlotState::Discarded;
        self.discarded_num += 1;
        true
    }

    /// Drop up to `count` oldest slots. Returns the number actually removed.
    pub fn remove_head(&mut self, count: usize) -> usize {
        let count = count.min(self.size);
        for _ in 0..count {
            let idx = self.head;
            if self.slots[idx].state == SlotState::Discarded {
                self.discarded_num -= 1;
            }
            self.slots[idx].clear();
            self.head = (self.head + 1) % self.max_count;
        }
        if let Some(origin) = self.origin.as_mut() {
            *origin += count as i64;
        }
        self.size -= count;
        count
    }

    /// Return the head frame, skipping and removing any leading Discarded
    /// slots first. If a discard was skipped, the *next* real/missing frame
    /// is still reported as `FrameType::Missing` on this call — intentional
    /// PLC-triggering behavior preserved from the reference implementation
    /// (see `DESIGN.md`, Open Question 1).
    pub fn get(&mut self) -> GetOutcome {
        if self.size == 0 {
            return GetOutcome::Empty;
        }

        let mut skipped_discard = false;
        while self.size > 0 && self.slots[self.head].state == SlotState::Discarded {
            self.remove_head(1);
            skipped_discard = true;
        }

        if self.size == 0 {
            return GetOutcome::Empty;
        }

        let idx = self.head;
        let origin = self.origin.expect("non-empty list has an origin");

        let (frame_type, payload, bit_info, ts) = if skipped_discard {
            (FrameType::Missing, Vec::new(), 0, 0)
        } else {
            let slot = &self.slots[idx];
            match slot.state {
                SlotState::Normal => (
                    FrameType::Normal,
                    slot.payload[..slot.len].to_vec(),
                    slot.bit_info,
                    slot.ts,
                ),
                SlotState::Missing | SlotState::Discarded => (FrameType::Missing, Vec::new(), 0, 0),
            }
        };

        let seq = origin;
        self.remove_head(1);

        GetOutcome::Present {
            frame_type,
            payload,
            bit_info,
            ts,
            seq,
        }
    }

    /// Return a view of the frame that would be the `offset`-th GET
    /// (skipping Discarded slots), without mutating state.
    pub fn peek(&self, offset: usize) -> Option<(FrameType, Vec<u8>, u32, u32, i64)> {
        if offset >= self.eff_size() {
            return None;
        }

        let origin = self.origin?;
        let mut pos = self.head;
        let mut idx = offset;
        loop {
            if self.slots[pos].state != SlotState::Discarded {
                if idx == 0 {
                    break;
                }
                idx -= 1;
            }
            pos = (pos + 1) % self.max_count;
        }

        let slot = &self.slots[pos];
        let frame_type = match slot.state {
            SlotState::Normal => FrameType::Normal,
            _ => FrameType::Missing,
        };
        Some((
            frame_type,
            slot.payload[..slot.len].to_vec(),
            slot.bit_info,
            slot.ts,
            origin + offset as i64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(fl: &mut FrameList, seq: i64, payload: &[u8]) -> PutOutcome {
        fl.put_at(seq, payload, 0, 0)
    }

    #[test]
    fn fresh_list_is_empty() {
        let fl = FrameList::new(640, 10);
        assert_eq!(fl.size(), 0);
        assert_eq!(fl.eff_size(), 0);
        assert_eq!(fl.origin(), None);
    }

    #[test]
    fn put_sets_origin_and_size() {
        let mut fl = FrameList::new(640, 10);
        assert_eq!(accepted(&mut fl, 5, &[1, 2, 3]), PutOutcome::Accepted);
        assert_eq!(fl.origin(), Some(5));
        assert_eq!(fl.size(), 1);
    }

    #[test]
    fn duplicate_is_rejected_and_slot_unchanged() {
        let mut fl = FrameList::new(640, 10);
        assert_eq!(accepted(&mut fl, 5, &[1, 2, 3]), PutOutcome::Accepted);
        assert_eq!(accepted(&mut fl, 5, &[9, 9, 9]), PutOutcome::Duplicate);

        match fl.get() {
            GetOutcome::Present { payload, seq, .. } => {
                assert_eq!(seq, 5);
                assert_eq!(payload, vec![1, 2, 3]);
            }
            GetOutcome::Empty => panic!("expected a frame"),
        }
    }

    #[test]
    fn too_late_within_misorder_is_rejected() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 100, &[1]);
        assert_eq!(accepted(&mut fl, 50, &[2]), PutOutcome::TooLate);
    }

    #[test]
    fn far_below_origin_triggers_restart() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 1000, &[1]);
        let result = accepted(&mut fl, 1000 - MAX_MISORDER - 1, &[2]);
        assert_eq!(result, PutOutcome::Accepted);
        assert_eq!(fl.origin(), Some(1000 - MAX_MISORDER - 1));
    }

    #[test]
    fn missing_middle_returns_missing_type() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 1, &[1]);
        accepted(&mut fl, 3, &[3]);

        match fl.get() {
            GetOutcome::Present { seq, frame_type, .. } => {
                assert_eq!(seq, 1);
                assert_eq!(frame_type, FrameType::Normal);
            }
            GetOutcome::Empty => panic!(),
        }
        match fl.get() {
            GetOutcome::Present { seq, frame_type, .. } => {
                assert_eq!(seq, 2);
                assert_eq!(frame_type, FrameType::Missing);
            }
            GetOutcome::Empty => panic!(),
        }
        match fl.get() {
            GetOutcome::Present { seq, frame_type, .. } => {
                assert_eq!(seq, 3);
                assert_eq!(frame_type, FrameType::Normal);
            }
            GetOutcome::Empty => panic!(),
        }
    }

    #[test]
    fn far_jump_beyond_dropout_resets() {
        let mut fl = FrameList::new(640, 4);
        for s in 1..=4 {
            accepted(&mut fl, s, &[s as u8]);
        }
        assert!(fl.is_full());

        let result = accepted(&mut fl, 5000, &[9]);
        assert_eq!(result, PutOutcome::Accepted);
        assert_eq!(fl.origin(), Some(5000));
        assert_eq!(fl.size(), 1);
    }

    #[test]
    fn overflow_signals_caller_to_evict() {
        let mut fl = FrameList::new(640, 4);
        for s in 1..=4 {
            accepted(&mut fl, s, &[s as u8]);
        }
        // seq=5 is one past max_count ahead of origin=1: distance=4 >= max_count=4
        assert_eq!(accepted(&mut fl, 5, &[5]), PutOutcome::Overflow);
        fl.remove_head(1);
        assert_eq!(accepted(&mut fl, 5, &[5]), PutOutcome::Accepted);
    }

    #[test]
    fn discard_then_get_collapses_to_missing() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 1, &[1]);
        accepted(&mut fl, 2, &[2]);
        assert!(fl.discard(1));
        assert_eq!(fl.discarded_num(), 1);

        match fl.get() {
            GetOutcome::Present { frame_type, seq, .. } => {
                assert_eq!(frame_type, FrameType::Missing);
                assert_eq!(seq, 2);
            }
            GetOutcome::Empty => panic!(),
        }
    }

    #[test]
    fn peek_does_not_mutate() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 1, &[1]);
        accepted(&mut fl, 2, &[2]);

        let (ft, _, _, _, seq) = fl.peek(1).unwrap();
        assert_eq!(ft, FrameType::Normal);
        assert_eq!(seq, 2);
        assert_eq!(fl.size(), 2);

        assert!(fl.peek(2).is_none());
    }

    #[test]
    fn remove_head_shrinks_discarded_count() {
        let mut fl = FrameList::new(640, 10);
        accepted(&mut fl, 1, &[1]);
        accepted(&mut fl, 2, &[2]);
        fl.discard(1);
        assert_eq!(fl.remove_head(1), 1);
        assert_eq!(fl.discarded_num(), 0);
        assert_eq!(fl.size(), 1);
    }
}
