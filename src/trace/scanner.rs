//! Scan driver
//!
//! One synchronous pass: line in, grammar, resolver, then either a direct
//! timeline append or a detour through the reorder buffer. The pass is
//! cancellable between lines so a long scan can be aborted cleanly, and
//! cancellation is not an error.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::store::HandleLookup;
use crate::trace::classes::Classification;
use crate::trace::grammar::LineGrammar;
use crate::trace::reorder::PendingReorderBuffer;
use crate::trace::resolver::EventResolver;
use crate::trace::time::TimeReference;
use crate::trace::timeline::Timeline;

/// Shared cancellation flag, checked between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Only an unreadable source is a true failure; everything else the scan can
/// meet (unparseable lines, dangling references, cancellation) is not.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("trace source unavailable: {0}")]
    Source(#[from] io::Error),
}

/// How the scan ended.
#[derive(Debug)]
pub enum ScanOutcome {
    Complete(Timeline),
    /// The caller pulled the cancel token; distinct from failure so callers
    /// do not present it as one.
    Cancelled,
}

impl ScanOutcome {
    pub fn timeline(self) -> Option<Timeline> {
        match self {
            ScanOutcome::Complete(timeline) => Some(timeline),
            ScanOutcome::Cancelled => None,
        }
    }
}

pub struct TraceScanner {
    grammar: LineGrammar,
    resolver: EventResolver,
    classes: Classification,
}

impl TraceScanner {
    pub fn new(classes: Classification) -> Self {
        Self {
            grammar: LineGrammar::new(),
            resolver: EventResolver::new(),
            classes,
        }
    }

    pub fn scan_path(
        &self,
        path: &Path,
        reference: TimeReference,
        store: &mut dyn HandleLookup,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome, ScanError> {
        let file = File::open(path)?;
        self.scan_reader(BufReader::new(file), reference, store, cancel)
    }

    pub fn scan_reader<R: BufRead>(
        &self,
        reader: R,
        reference: TimeReference,
        store: &mut dyn HandleLookup,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome, ScanError> {
        let mut timeline = Timeline::new(reference);
        let mut pending = PendingReorderBuffer::new();
        let mut skipped = 0usize;
        let mut dropped = 0usize;

        for line in reader.lines() {
            if cancel.is_cancelled() {
                tracing::info!("trace scan cancelled");
                return Ok(ScanOutcome::Cancelled);
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let Some(record) = self.grammar.parse(&line) else {
                skipped += 1;
                continue;
            };

            // release everything due before this line takes its turn
            if let Some(now) = record.time() {
                for event in pending.flush_due(now) {
                    timeline.push(event);
                }
            }

            let Some(event) = self.resolver.resolve(record, store, &timeline) else {
                dropped += 1;
                continue;
            };

            if self.classes.is_deferred(event.kind()) {
                pending.push(event);
            } else {
                timeline.push(event);
            }
        }

        for event in pending.drain_remaining() {
            timeline.push(event);
        }

        tracing::info!(
            events = timeline.len(),
            skipped,
            dropped,
            "trace scan complete"
        );
        Ok(ScanOutcome::Complete(timeline))
    }
}

impl Default for TraceScanner {
    fn default() -> Self {
        Self::new(Classification::standard())
    }
}
