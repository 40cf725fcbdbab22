//! Cross-reference resolution
//!
//! Turns a raw parsed record into a typed event: identifiers introduced by
//! the record are registered with the object store, referenced identifiers
//! are looked up, and causal back-references are filled in by a backward
//! search over the timeline built so far. A record referencing anything the
//! store does not know is dropped whole; that is expected trace noise, not
//! an error.

use crate::store::{DomainHandle, HandleLookup};
use crate::trace::event::{Event, EventBody, EventIdx, EventKind};
use crate::trace::grammar::RawRecord;
use crate::trace::time::TraceTime;
use crate::trace::timeline::Timeline;

/// Kinds whose subject can be referenced as a prediction fact.
const PREDICTION_KINDS: [EventKind; 3] = [
    EventKind::ImdlPrediction,
    EventKind::SimulatedPrediction,
    EventKind::ValuePrediction,
];

/// Kinds whose subject can be referenced as a reduction.
const REDUCTION_KINDS: [EventKind; 3] = [
    EventKind::ImdlPrediction,
    EventKind::ValuePrediction,
    EventKind::GoalReduced,
];

/// Kinds that carry the counter state of a model.
const COUNTER_KINDS: [EventKind; 3] = [
    EventKind::CountersSet,
    EventKind::ModelCreated,
    EventKind::ModelLoaded,
];

#[derive(Debug, Default)]
pub struct EventResolver;

impl EventResolver {
    pub fn new() -> Self {
        Self
    }

    /// `None` means the record was dropped (unknown reference), never an
    /// error.
    pub fn resolve(
        &self,
        record: RawRecord,
        store: &mut dyn HandleLookup,
        timeline: &Timeline,
    ) -> Option<Event> {
        match record {
            RawRecord::StartupModel {
                oid,
                debug_id,
                count,
                success_rate,
            } => {
                let subject = store.register(&oid, Some(debug_id));
                store.seed_counters(subject, count, success_rate);
                Some(Event {
                    time: TraceTime::ZERO,
                    subject,
                    body: EventBody::ModelLoaded {
                        count,
                        success_rate,
                    },
                })
            }

            RawRecord::StartupComposite { oid, debug_id } => {
                let subject = store.register(&oid, Some(debug_id));
                Some(Event {
                    time: TraceTime::ZERO,
                    subject,
                    body: EventBody::CompositeLoaded,
                })
            }

            RawRecord::ModelCreated {
                time,
                oid,
                debug_id,
            } => {
                let subject = store.register(&oid, Some(debug_id));
                Some(Event {
                    time,
                    subject,
                    body: EventBody::ModelCreated {
                        count: 1,
                        success_rate: 1.0,
                    },
                })
            }

            RawRecord::CountersSet {
                time,
                oid,
                count,
                success_rate,
            } => {
                let subject = require(store, &oid)?;
                let count_increased = count > previous_count(timeline, subject);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::CountersSet {
                        count,
                        success_rate,
                        count_increased,
                        prior: None,
                    },
                })
            }

            RawRecord::ModelDeleted { time, oid } => {
                let subject = require(store, &oid)?;
                Some(Event {
                    time,
                    subject,
                    body: EventBody::ModelDeleted { prior: None },
                })
            }

            RawRecord::CompositeCreated {
                time,
                oid,
                debug_id,
            } => {
                let subject = store.register(&oid, Some(debug_id));
                Some(Event {
                    time,
                    subject,
                    body: EventBody::CompositeCreated,
                })
            }

            RawRecord::AutoFocus {
                time,
                oid,
                target,
                mode,
            } => {
                let subject = require(store, &oid)?;
                let target = require(store, &target)?;
                Some(Event {
                    time,
                    subject,
                    body: EventBody::AutoFocus { target, mode },
                })
            }

            RawRecord::ImdlPrediction {
                time,
                model,
                reduction,
            } => {
                let model = require(store, &model)?;
                let subject = store.register(&reduction, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::ImdlPrediction { model },
                })
            }

            RawRecord::SimulatedPrediction {
                time,
                model,
                input,
                output,
            } => {
                let model = require(store, &model)?;
                let input = require(store, &input)?;
                let requirement = timeline.rfind_subject(&PREDICTION_KINDS, input);
                let subject = store.register(&output, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::SimulatedPrediction {
                        model,
                        input,
                        requirement,
                    },
                })
            }

            RawRecord::ValuePrediction {
                time,
                model,
                reduction,
            } => {
                let model = require(store, &model)?;
                let subject = store.register(&reduction, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::ValuePrediction { model },
                })
            }

            RawRecord::GoalReduced {
                time,
                model,
                reduction,
            } => {
                let model = require(store, &model)?;
                let subject = store.register(&reduction, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::GoalReduced { model },
                })
            }

            RawRecord::CompositeInstantiated {
                time,
                fact,
                composite,
                inputs,
            } => {
                let composite = require(store, &composite)?;
                // one unresolvable input fails the whole event
                let inputs = inputs
                    .iter()
                    .map(|input| require(store, input))
                    .collect::<Option<Vec<DomainHandle>>>()?;
                let subject = store.register(&fact, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::CompositeInstantiated { composite, inputs },
                })
            }

            RawRecord::PredictionSuccess {
                time,
                input,
                outcome,
                prediction,
            } => {
                let input = require(store, &input)?;
                let prediction = require(store, &prediction)?;
                let prediction_source = timeline.rfind_subject(&PREDICTION_KINDS, prediction);
                let subject = store.register(&outcome, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::PredictionOutcome {
                        prediction,
                        input: Some(input),
                        success: true,
                        prediction_source,
                    },
                })
            }

            RawRecord::PredictionFailure {
                time,
                outcome,
                prediction,
            } => {
                let prediction = require(store, &prediction)?;
                let prediction_source = timeline.rfind_subject(&PREDICTION_KINDS, prediction);
                let subject = store.register(&outcome, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::PredictionOutcome {
                        prediction,
                        input: None,
                        success: false,
                        prediction_source,
                    },
                })
            }

            RawRecord::DeviceInjected {
                oid, inject_time, ..
            } => {
                let subject = store.register(&oid, None);
                Some(Event {
                    // effective at its ijt, not at the declaring line
                    time: inject_time,
                    subject,
                    body: EventBody::DeviceInjected,
                })
            }

            RawRecord::DeviceEjected {
                time,
                oid,
                reduction,
            } => {
                let reduction = match reduction {
                    Some(rdx) => Some(require(store, &rdx)?),
                    None => None,
                };
                let reduction_source =
                    reduction.and_then(|rdx| timeline.rfind_subject(&REDUCTION_KINDS, rdx));
                let subject = store.register(&oid, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::DeviceEjected {
                        reduction,
                        reduction_source,
                    },
                })
            }

            RawRecord::DriveInjected {
                oid, inject_time, ..
            } => {
                let subject = store.register(&oid, None);
                Some(Event {
                    time: inject_time,
                    subject,
                    body: EventBody::DriveInjected,
                })
            }

            RawRecord::SimCommit {
                time,
                prediction,
                goal,
            } => {
                let prediction = require(store, &prediction)?;
                let prediction_source =
                    timeline.rfind_subject(&[EventKind::SimulatedPrediction], prediction);
                let subject = store.register(&goal, None);
                Some(Event {
                    time,
                    subject,
                    body: EventBody::SimCommit {
                        prediction,
                        prediction_source,
                    },
                })
            }
        }
    }
}

fn require(store: &dyn HandleLookup, name: &str) -> Option<DomainHandle> {
    let handle = store.lookup(name);
    if handle.is_none() {
        tracing::debug!(name, "unknown object reference, dropping line");
    }
    handle
}

/// Counter state of `subject` as of the timeline built so far; new objects
/// start at 1.
fn previous_count(timeline: &Timeline, subject: DomainHandle) -> i64 {
    match timeline
        .rfind_subject(&COUNTER_KINDS, subject)
        .and_then(|index: EventIdx| timeline.get(index))
        .map(|ev| &ev.body)
    {
        Some(EventBody::CountersSet { count, .. })
        | Some(EventBody::ModelCreated { count, .. })
        | Some(EventBody::ModelLoaded { count, .. }) => *count,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectStore;
    use crate::trace::grammar::LineGrammar;
    use crate::trace::time::TimeReference;

    fn resolve_lines(lines: &[&str]) -> (Timeline, ObjectStore) {
        let grammar = LineGrammar::new();
        let resolver = EventResolver::new();
        let mut store = ObjectStore::new();
        let mut timeline = Timeline::new(TimeReference::default());
        for line in lines {
            let record = grammar.parse(line).expect("fixture line must parse");
            if let Some(event) = resolver.resolve(record, &mut store, &timeline) {
                timeline.push(event);
            }
        }
        (timeline, store)
    }

    #[test]
    fn unknown_reference_drops_the_whole_event() {
        let grammar = LineGrammar::new();
        let resolver = EventResolver::new();
        let mut store = ObjectStore::new();
        let timeline = Timeline::new(TimeReference::default());

        let record = grammar.parse("0s:300ms:0us mdl 99 cnt:2 sr:1").unwrap();
        assert!(resolver.resolve(record, &mut store, &timeline).is_none());
    }

    #[test]
    fn one_missing_composite_input_fails_the_event() {
        let (timeline, _) = resolve_lines(&[
            "0s:150ms:0us -> cst 54, Ctrl(390)",
            "0s:200ms:0us -> mdl 60, Ctrl(391)",
            // input 61 was never introduced
            "0s:450ms:0us fact 73 icst[54][ 60 61]",
        ]);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn backward_search_prefers_the_nearer_event() {
        let (timeline, _) = resolve_lines(&[
            "0s:100ms:0us -> mdl 53, Ctrl(389)",
            "0s:200ms:0us mdl 53 predict imdl -> mk.rdx 70",
            "0s:300ms:0us mdl 53 predict imdl -> mk.rdx 70",
            "0s:400ms:0us mdl 53: fact (70) pred fact imdl -> fact 71 simulated pred",
        ]);
        assert_eq!(timeline.len(), 4);
        match &timeline.get(3).unwrap().body {
            EventBody::SimulatedPrediction { requirement, .. } => {
                // two candidates share the subject; the larger index wins
                assert_eq!(*requirement, Some(2));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn count_increase_is_derived_from_the_nearest_counter_state() {
        let (timeline, _) = resolve_lines(&[
            "0s:100ms:0us -> mdl 53, Ctrl(389)",
            "0s:300ms:0us mdl 53 cnt:2 sr:1",
            "0s:300ms:0us mdl 53 cnt:3 sr:1",
            "0s:400ms:0us mdl 53 cnt:3 sr:0.9",
        ]);
        let increased: Vec<bool> = timeline
            .iter()
            .filter_map(|ev| match &ev.body {
                EventBody::CountersSet {
                    count_increased, ..
                } => Some(*count_increased),
                _ => None,
            })
            .collect();
        // created at cnt 1: 2 > 1, 3 > 2, 3 == 3
        assert_eq!(increased, vec![true, true, false]);
    }

    #[test]
    fn startup_model_seeds_store_counters() {
        let (_, store) = resolve_lines(&["load mdl 37, Ctrl(113) cnt:2 sr:0.8"]);
        let handle = store.lookup("37").unwrap();
        let object = store.get(handle).unwrap();
        assert_eq!(object.count, 2);
        assert_eq!(object.success_rate, 0.8);
        assert_eq!(object.debug_id, Some(113));
    }

    #[test]
    fn inject_records_take_their_ijt_as_event_time() {
        let (timeline, _) = resolve_lines(&["0s:200ms:0us I/O device inject 60, ijt 0s:250ms:0us"]);
        assert_eq!(timeline.get(0).unwrap().time, TraceTime::from_parts(0, 250, 0));
    }

    #[test]
    fn eject_links_back_to_its_reduction() {
        let (timeline, _) = resolve_lines(&[
            "0s:100ms:0us -> mdl 37, Ctrl(113)",
            "0s:400ms:0us mdl 37 abduce -> mk.rdx 72",
            "0s:550ms:0us mk.rdx(72): I/O device eject 75",
        ]);
        match &timeline.get(2).unwrap().body {
            EventBody::DeviceEjected {
                reduction_source, ..
            } => assert_eq!(*reduction_source, Some(1)),
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
