//! Forward/backward replay state machine
//!
//! The cursor is a single index into the timeline; stepping applies an
//! event's effects against the scene sink and the object store, unstepping
//! reverts them exactly. Both directions are explicit bounded loops; there
//! is no recursion, so long marker runs cannot blow the stack and there is
//! no re-entrant retry path.

use crate::store::ObjectStore;
use crate::trace::classes::Classification;
use crate::trace::event::{CounterSnapshot, EventBody, EventIdx};
use crate::trace::frame::{FrameAllocator, FrameId, LayoutLane};
use crate::trace::time::TraceTime;
use crate::trace::timeline::Timeline;

use crate::replay::sink::SceneSink;

/// Which visual rows the caller currently wants shown. Consulted when a
/// creation is applied; the sink gets the resulting flag.
#[derive(Debug, Clone, Copy)]
pub struct ViewFilters {
    pub show_simulations: bool,
    pub show_io: bool,
    pub show_predictions: bool,
}

impl ViewFilters {
    pub fn visible(&self, lane: LayoutLane) -> bool {
        match lane {
            LayoutLane::Simulations => self.show_simulations,
            LayoutLane::Io => self.show_io,
            LayoutLane::Predictions => self.show_predictions,
            LayoutLane::Models | LayoutLane::Composites => true,
        }
    }
}

impl Default for ViewFilters {
    fn default() -> Self {
        Self {
            show_simulations: true,
            show_io: true,
            show_predictions: true,
        }
    }
}

/// Cursor position is in `[0, len]`; 0 means nothing applied, `len` means
/// everything applied. The cursor and the lazy snapshots inside mutation
/// events are the only mutable replay state.
pub struct ReplayCursor {
    timeline: Timeline,
    classes: Classification,
    frames: FrameAllocator,
    filters: ViewFilters,
    cursor: usize,
}

impl ReplayCursor {
    pub fn new(
        timeline: Timeline,
        classes: Classification,
        frames: FrameAllocator,
        filters: ViewFilters,
    ) -> Self {
        Self {
            timeline,
            classes,
            frames,
            filters,
            cursor: 0,
        }
    }

    pub fn with_defaults(timeline: Timeline) -> Self {
        Self::new(
            timeline,
            Classification::standard(),
            FrameAllocator::default(),
            ViewFilters::default(),
        )
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn at_start(&self) -> bool {
        self.cursor == 0
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.timeline.len()
    }

    pub fn frame_period_us(&self) -> u64 {
        self.frames.period_us()
    }

    /// Apply events forward until the next one would exceed `max_time`.
    ///
    /// Returns the time of the last event applied, or `None` if nothing
    /// visible was applied (exhausted, or the next event is beyond
    /// `max_time`). One call applies exactly one creation or mutation --
    /// except for frame-grouped kinds, where it consumes the whole
    /// consecutive same-frame run, and markers, which are passed over
    /// silently within the bound.
    pub fn step(
        &mut self,
        max_time: TraceTime,
        store: &mut ObjectStore,
        sink: &mut dyn SceneSink,
    ) -> Option<TraceTime> {
        let mut applied = None;
        let mut burst_frame: Option<FrameId> = None;

        loop {
            if self.cursor == self.timeline.len() {
                return applied;
            }
            let (time, kind) = {
                let ev = &self.timeline.events()[self.cursor];
                (ev.time, ev.kind())
            };
            if time > max_time {
                return applied;
            }
            if let Some(frame) = burst_frame {
                // the burst ends at the first event that is not frame-grouped
                // or falls outside the frame of the first stepped event
                if !self.classes.is_frame_grouped(kind) || self.frames.frame_for(time) != frame {
                    return applied;
                }
            }

            let index = self.cursor;

            if self.classes.is_marker(kind) {
                self.cursor += 1;
                continue;
            }

            if self.classes.is_mutation(kind) {
                self.apply_mutation(index, store);
                sink.update(index, &self.timeline.events()[index]);
                self.cursor += 1;
                return Some(time);
            }

            self.apply_creation(index, sink);
            self.cursor += 1;

            if self.classes.is_frame_grouped(kind) {
                if burst_frame.is_none() {
                    burst_frame = Some(self.frames.frame_for(time));
                }
                applied = Some(time);
                continue;
            }
            return Some(time);
        }
    }

    /// Revert events backward while the previous event's time is still
    /// `>= min_time`.
    ///
    /// Reverts exactly one creation or mutation (markers are passed over),
    /// then returns the time now current: the event before the cursor, or
    /// the reference time when everything has been reverted. `None` when
    /// nothing within bounds was left to revert.
    pub fn unstep(
        &mut self,
        min_time: TraceTime,
        store: &mut ObjectStore,
        sink: &mut dyn SceneSink,
    ) -> Option<TraceTime> {
        loop {
            if self.cursor == 0 {
                return None;
            }
            let (time, kind) = {
                let ev = &self.timeline.events()[self.cursor - 1];
                (ev.time, ev.kind())
            };
            if time < min_time {
                return None;
            }

            self.cursor -= 1;
            let index = self.cursor;

            if self.classes.is_marker(kind) {
                continue;
            }

            if self.classes.is_mutation(kind) {
                self.revert_mutation(index, store);
                sink.update(index, &self.timeline.events()[index]);
            } else {
                sink.remove(index, &self.timeline.events()[index]);
            }

            return Some(if self.cursor > 0 {
                self.timeline.events()[self.cursor - 1].time
            } else {
                TraceTime::ZERO
            });
        }
    }

    fn apply_creation(&mut self, index: EventIdx, sink: &mut dyn SceneSink) {
        let ev = &self.timeline.events()[index];
        sink.create(index, ev);
        if let Some(source) = ev.causal_source() {
            sink.link(source, index);
        }
        let visible = self.filters.visible(self.classes.lane(ev.kind()));
        sink.set_visible(index, visible);
    }

    fn apply_mutation(&mut self, index: EventIdx, store: &mut ObjectStore) {
        let ev = &mut self.timeline.events_mut()[index];
        let subject = ev.subject;
        match &mut ev.body {
            EventBody::CountersSet {
                count,
                success_rate,
                prior,
                ..
            } => {
                if prior.is_none() {
                    if let Some(object) = store.get(subject) {
                        *prior = Some(CounterSnapshot {
                            count: object.count,
                            success_rate: object.success_rate,
                        });
                    }
                }
                if let Some(object) = store.get_mut(subject) {
                    object.count = *count;
                    object.success_rate = *success_rate;
                }
            }
            EventBody::ModelDeleted { prior } => {
                if prior.is_none() {
                    if let Some(object) = store.get(subject) {
                        *prior = Some(object.alive);
                    }
                }
                if let Some(object) = store.get_mut(subject) {
                    object.alive = false;
                }
            }
            _ => {}
        }
    }

    fn revert_mutation(&self, index: EventIdx, store: &mut ObjectStore) {
        let ev = &self.timeline.events()[index];
        let subject = ev.subject;
        match &ev.body {
            EventBody::CountersSet { prior, .. } => {
                if let (Some(snapshot), Some(object)) = (*prior, store.get_mut(subject)) {
                    object.count = snapshot.count;
                    object.success_rate = snapshot.success_rate;
                }
            }
            EventBody::ModelDeleted { prior } => {
                if let (Some(alive), Some(object)) = (*prior, store.get_mut(subject)) {
                    object.alive = alive;
                }
            }
            _ => {}
        }
    }
}
