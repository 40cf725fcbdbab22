pub mod archive;
pub mod classes;
pub mod event;
pub mod frame;
pub mod grammar;
pub mod reorder;
pub mod resolver;
pub mod scanner;
pub mod time;
pub mod timeline;

pub use archive::{ArchiveError, TIMELINE_ARCHIVE_SCHEMA_VERSION};
pub use classes::Classification;
pub use event::{CounterSnapshot, Event, EventBody, EventIdx, EventKind};
pub use frame::{FrameAllocator, FrameId, LayoutLane, DEFAULT_SAMPLE_PERIOD_US};
pub use grammar::{LineGrammar, RawRecord};
pub use reorder::PendingReorderBuffer;
pub use resolver::EventResolver;
pub use scanner::{CancelToken, ScanError, ScanOutcome, TraceScanner};
pub use time::{TimeReference, TraceTime};
pub use timeline::Timeline;
