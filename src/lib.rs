pub mod config;
pub mod replay;
pub mod store;
pub mod trace;

pub use config::Config;
pub use replay::{
    NullSink, Player, RecordingSink, ReplayCursor, SceneSink, SinkCall, TickOutcome, ViewFilters,
};
pub use store::{DomainHandle, DomainObject, HandleLookup, ObjectStore};
pub use trace::{
    CancelToken, Classification, Event, EventBody, EventIdx, EventKind, FrameAllocator, FrameId,
    LayoutLane, LineGrammar, PendingReorderBuffer, RawRecord, ScanError, ScanOutcome,
    TimeReference, Timeline, TraceScanner, TraceTime,
};
