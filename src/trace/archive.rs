//! Timeline JSONL archive
//!
//! A scan is expensive for big traces; the archive lets it be done once and
//! reloaded. One header line (schema version + time reference), then one
//! line per event, in timeline order.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trace::event::Event;
use crate::trace::time::TimeReference;
use crate::trace::timeline::Timeline;

pub const TIMELINE_ARCHIVE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive io: {0}")]
    Io(#[from] io::Error),

    #[error("archive encoding: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("malformed archive: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ArchiveLine {
    Header {
        schema_version: u32,
        reference: TimeReference,
    },
    Event {
        event: Event,
    },
}

impl Timeline {
    pub fn write_jsonl_to_path(&self, path: &Path) -> Result<(), ArchiveError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = ArchiveLine::Header {
            schema_version: TIMELINE_ARCHIVE_SCHEMA_VERSION,
            reference: self.reference(),
        };
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;
        for event in self.iter() {
            let line = ArchiveLine::Event {
                event: event.clone(),
            };
            writeln!(writer, "{}", serde_json::to_string(&line)?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Timeline, ArchiveError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut timeline: Option<Timeline> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ArchiveLine>(&line)? {
                ArchiveLine::Header {
                    schema_version,
                    reference,
                } => {
                    if index != 0 {
                        return Err(ArchiveError::Format(
                            "archive header must be the first line".into(),
                        ));
                    }
                    if schema_version != TIMELINE_ARCHIVE_SCHEMA_VERSION {
                        return Err(ArchiveError::Format(format!(
                            "unsupported archive schema version {schema_version}"
                        )));
                    }
                    timeline = Some(Timeline::new(reference));
                }
                ArchiveLine::Event { event } => {
                    let timeline = timeline
                        .as_mut()
                        .ok_or_else(|| ArchiveError::Format("missing archive header".into()))?;
                    timeline.push(event);
                }
            }
        }

        timeline.ok_or_else(|| ArchiveError::Format("missing archive header".into()))
    }
}
