//! Scene sink interface
//!
//! The replay cursor drives an injected observer instead of a toolkit
//! signal/slot graph; the GUI layer implements this trait, and tests use
//! the recording double.

use crate::trace::event::{Event, EventIdx};

/// Receives create/update/remove/link/visibility notifications as the
/// cursor walks the timeline. Calls are strictly sequential; the caller
/// must not re-enter the cursor from inside a notification.
pub trait SceneSink {
    fn create(&mut self, index: EventIdx, event: &Event);

    fn update(&mut self, index: EventIdx, event: &Event);

    fn remove(&mut self, index: EventIdx, event: &Event);

    fn link(&mut self, from: EventIdx, to: EventIdx);

    fn set_visible(&mut self, index: EventIdx, visible: bool);
}

/// Sink that ignores every notification.
#[derive(Debug, Default)]
pub struct NullSink;

impl SceneSink for NullSink {
    fn create(&mut self, _index: EventIdx, _event: &Event) {}
    fn update(&mut self, _index: EventIdx, _event: &Event) {}
    fn remove(&mut self, _index: EventIdx, _event: &Event) {}
    fn link(&mut self, _from: EventIdx, _to: EventIdx) {}
    fn set_visible(&mut self, _index: EventIdx, _visible: bool) {}
}

/// One recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Create(EventIdx),
    Update(EventIdx),
    Remove(EventIdx),
    Link { from: EventIdx, to: EventIdx },
    Visible { index: EventIdx, visible: bool },
}

/// Records every notification in order, for tests and the CLI printer.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl SceneSink for RecordingSink {
    fn create(&mut self, index: EventIdx, _event: &Event) {
        self.calls.push(SinkCall::Create(index));
    }

    fn update(&mut self, index: EventIdx, _event: &Event) {
        self.calls.push(SinkCall::Update(index));
    }

    fn remove(&mut self, index: EventIdx, _event: &Event) {
        self.calls.push(SinkCall::Remove(index));
    }

    fn link(&mut self, from: EventIdx, to: EventIdx) {
        self.calls.push(SinkCall::Link { from, to });
    }

    fn set_visible(&mut self, index: EventIdx, visible: bool) {
        self.calls.push(SinkCall::Visible { index, visible });
    }
}
