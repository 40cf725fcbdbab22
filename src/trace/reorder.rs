//! Delayed-release buffer for events declared ahead of their effective time
//!
//! Inject lines carry their own `ijt`; the event they declare must not enter
//! the timeline until the scan clock reaches that time. The buffer never
//! reorders among itself: release is strictly insertion order.

use std::collections::VecDeque;

use crate::trace::event::Event;
use crate::trace::time::TraceTime;

#[derive(Debug, Default)]
pub struct PendingReorderBuffer {
    pending: VecDeque<Event>,
}

impl PendingReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push(&mut self, event: Event) {
        self.pending.push_back(event);
    }

    /// Release every buffered event whose effective time is `<= now`, in
    /// insertion order. Entries are not sorted by time, so the whole queue
    /// is walked; an early not-yet-due entry does not hold back a later due
    /// one.
    pub fn flush_due(&mut self, now: TraceTime) -> Vec<Event> {
        let mut due = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for event in self.pending.drain(..) {
            if event.time <= now {
                due.push(event);
            } else {
                kept.push_back(event);
            }
        }
        self.pending = kept;
        due
    }

    /// End of scan: everything still pending comes out, insertion order.
    pub fn drain_remaining(&mut self) -> Vec<Event> {
        self.pending.drain(..).collect()
    }
}
