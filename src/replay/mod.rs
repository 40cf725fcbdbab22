pub mod cursor;
pub mod player;
pub mod sink;

pub use cursor::{ReplayCursor, ViewFilters};
pub use player::{Player, TickOutcome};
pub use sink::{NullSink, RecordingSink, SceneSink, SinkCall};
