//! Playback driver
//!
//! Owns a cursor plus a play clock. An external fixed-interval timer calls
//! `tick`; each tick applies everything due at the current play time, then
//! advances the clock by one frame period. Single-step commands bypass the
//! clock with permissive bounds.

use crate::replay::cursor::ReplayCursor;
use crate::replay::sink::SceneSink;
use crate::store::ObjectStore;
use crate::trace::time::TraceTime;

/// What a tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The play clock advanced; more of the timeline remains.
    Advanced,
    /// Every event has been applied.
    Finished,
}

pub struct Player {
    cursor: ReplayCursor,
    play_time: TraceTime,
}

impl Player {
    pub fn new(cursor: ReplayCursor) -> Self {
        Self {
            cursor,
            play_time: TraceTime::ZERO,
        }
    }

    pub fn play_time(&self) -> TraceTime {
        self.play_time
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    pub fn tick(&mut self, store: &mut ObjectStore, sink: &mut dyn SceneSink) -> TickOutcome {
        while self.cursor.step(self.play_time, store, sink).is_some() {}
        if self.cursor.at_end() {
            return TickOutcome::Finished;
        }
        self.play_time = self.play_time.advanced_by(self.cursor.frame_period_us());
        TickOutcome::Advanced
    }

    /// Apply the next event regardless of the play clock, then drag the
    /// clock forward to it.
    pub fn step_once(
        &mut self,
        store: &mut ObjectStore,
        sink: &mut dyn SceneSink,
    ) -> Option<TraceTime> {
        let stepped = self.cursor.step(TraceTime::MAX, store, sink);
        if let Some(time) = stepped {
            self.play_time = self.play_time.max(time);
        }
        stepped
    }

    /// Revert the latest applied event and pull the clock back to whatever
    /// is now current.
    pub fn unstep_once(
        &mut self,
        store: &mut ObjectStore,
        sink: &mut dyn SceneSink,
    ) -> Option<TraceTime> {
        let now = self.cursor.unstep(TraceTime::ZERO, store, sink);
        if let Some(time) = now {
            self.play_time = time;
        }
        now
    }
}
