//! The time-ordered event store produced by one scan

use crate::store::DomainHandle;
use crate::trace::event::{Event, EventIdx, EventKind};
use crate::trace::time::{TimeReference, TraceTime};

/// Append-only sequence of resolved events; `time` is non-decreasing across
/// indices, ties broken by append order. Immutable after the scan except for
/// the lazy snapshot slots inside mutation events.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    reference: TimeReference,
    events: Vec<Event>,
}

impl Timeline {
    pub fn new(reference: TimeReference) -> Self {
        Self {
            reference,
            events: Vec::new(),
        }
    }

    pub fn reference(&self) -> TimeReference {
        self.reference
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: EventIdx) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn last_time(&self) -> Option<TraceTime> {
        self.events.last().map(|ev| ev.time)
    }

    /// Nearest preceding event (largest index) among `kinds` whose subject is
    /// `subject`. Plain backward linear scan: traces are processed offline
    /// and once, so O(history) per resolution is fine; this is the place to
    /// hang a per-subject index if trace sizes ever grow.
    pub fn rfind_subject(&self, kinds: &[EventKind], subject: DomainHandle) -> Option<EventIdx> {
        self.events
            .iter()
            .enumerate()
            .rev()
            .find(|(_, ev)| ev.subject == subject && kinds.contains(&ev.kind()))
            .map(|(index, _)| index)
    }

    pub(crate) fn push(&mut self, event: Event) -> EventIdx {
        self.events.push(event);
        self.events.len() - 1
    }

    pub(crate) fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }
}
