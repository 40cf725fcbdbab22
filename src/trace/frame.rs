//! Fixed-width time frames
//!
//! Frames quantize trace time into buckets of one sampling period. The scene
//! layer uses them to group items into columns; the replay cursor uses them
//! to decide how far a single step advances through a simulation burst.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::trace::time::TraceTime;

/// Default sampling period of the traced runtime, in microseconds.
pub const DEFAULT_SAMPLE_PERIOD_US: u64 = 100_000;

/// Fixed-width time bucket; frame 0 starts at the time reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(u64);

impl FrameId {
    pub fn index(&self) -> u64 {
        self.0
    }
}

/// Visual row a kind's items are laid out in within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutLane {
    Models,
    Composites,
    Predictions,
    Simulations,
    Io,
}

/// Quantizes time into frames and hands out per-lane layout offsets.
///
/// Slot state is purely derived from the replay walk, never authoritative:
/// all lanes reset as soon as a slot is requested for a new frame.
#[derive(Debug, Clone)]
pub struct FrameAllocator {
    period_us: u64,
    current: Option<FrameId>,
    slots: HashMap<LayoutLane, u32>,
}

impl FrameAllocator {
    pub fn new(period_us: u64) -> Self {
        Self {
            period_us: period_us.max(1),
            current: None,
            slots: HashMap::new(),
        }
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    pub fn frame_for(&self, time: TraceTime) -> FrameId {
        FrameId(time.as_micros() / self.period_us)
    }

    /// Next free offset in `lane`, monotonically increasing per
    /// `(frame, lane)` pair.
    pub fn next_layout_slot(&mut self, frame: FrameId, lane: LayoutLane) -> u32 {
        if self.current != Some(frame) {
            self.current = Some(frame);
            self.slots.clear();
        }
        let slot = self.slots.entry(lane).or_insert(0);
        let taken = *slot;
        *slot += 1;
        taken
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_PERIOD_US)
    }
}
