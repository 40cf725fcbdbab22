//! Typed timeline events
//!
//! One closed tagged union over every meaningful line shape in the trace.
//! Dispatch is exhaustive pattern matching; there is no downcasting anywhere
//! in the replay path.

use serde::{Deserialize, Serialize};

use crate::store::DomainHandle;
use crate::trace::time::TraceTime;

/// Index of an event inside its timeline.
pub type EventIdx = usize;

/// Scalar values captured from a subject the first time a counter mutation is
/// applied, restored bit-for-bit on unstep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub count: i64,
    pub success_rate: f64,
}

/// One occurrence extracted from the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Effective time. For inject kinds this is the `ijt` operand, not the
    /// scan position of the line that declared it.
    pub time: TraceTime,
    /// The object this event is about (the produced object for reductions).
    pub subject: DomainHandle,
    pub body: EventBody,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match &self.body {
            EventBody::ModelLoaded { .. } => EventKind::ModelLoaded,
            EventBody::CompositeLoaded => EventKind::CompositeLoaded,
            EventBody::ModelCreated { .. } => EventKind::ModelCreated,
            EventBody::CountersSet { .. } => EventKind::CountersSet,
            EventBody::ModelDeleted { .. } => EventKind::ModelDeleted,
            EventBody::CompositeCreated => EventKind::CompositeCreated,
            EventBody::AutoFocus { .. } => EventKind::AutoFocus,
            EventBody::ImdlPrediction { .. } => EventKind::ImdlPrediction,
            EventBody::SimulatedPrediction { .. } => EventKind::SimulatedPrediction,
            EventBody::ValuePrediction { .. } => EventKind::ValuePrediction,
            EventBody::GoalReduced { .. } => EventKind::GoalReduced,
            EventBody::CompositeInstantiated { .. } => EventKind::CompositeInstantiated,
            EventBody::PredictionOutcome { .. } => EventKind::PredictionOutcome,
            EventBody::DeviceInjected => EventKind::DeviceInjected,
            EventBody::DeviceEjected { .. } => EventKind::DeviceEjected,
            EventBody::DriveInjected => EventKind::DriveInjected,
            EventBody::SimCommit { .. } => EventKind::SimCommit,
        }
    }

    /// Back-reference into the timeline for kinds that express a causal
    /// dependency, filled in by the resolver's backward search.
    pub fn causal_source(&self) -> Option<EventIdx> {
        match &self.body {
            EventBody::SimulatedPrediction { requirement, .. } => *requirement,
            EventBody::PredictionOutcome { prediction_source, .. } => *prediction_source,
            EventBody::DeviceEjected { reduction_source, .. } => *reduction_source,
            EventBody::SimCommit { prediction_source, .. } => *prediction_source,
            _ => None,
        }
    }
}

/// Kind-specific payload, one variant per line shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventBody {
    /// Model present before the first timestamped line, counters seeded.
    ModelLoaded { count: i64, success_rate: f64 },

    /// Composite state present before the first timestamped line.
    CompositeLoaded,

    /// Model built by the runtime mid-run; counters start at their defaults.
    ModelCreated { count: i64, success_rate: f64 },

    /// Counter mutation on an existing model.
    CountersSet {
        count: i64,
        success_rate: f64,
        /// Whether `count` exceeds the nearest preceding counter state for
        /// the same subject.
        count_increased: bool,
        /// Lazily captured the first time this event is applied.
        prior: Option<CounterSnapshot>,
    },

    /// Model removed by the runtime.
    ModelDeleted {
        /// The subject's `alive` flag before this delete was applied.
        prior: Option<bool>,
    },

    CompositeCreated,

    /// Attention shift; no visual of its own.
    AutoFocus { target: DomainHandle, mode: String },

    /// Requirement prediction reduction; subject is the produced `mk.rdx`.
    ImdlPrediction { model: DomainHandle },

    /// Simulated prediction produced from a requirement.
    SimulatedPrediction {
        model: DomainHandle,
        input: DomainHandle,
        requirement: Option<EventIdx>,
    },

    /// Value prediction reduction; subject is the produced `mk.rdx`.
    ValuePrediction { model: DomainHandle },

    /// Goal produced by abduction; subject is the produced `mk.rdx`.
    GoalReduced { model: DomainHandle },

    /// Instantiated composite state; subject is the produced fact.
    CompositeInstantiated {
        composite: DomainHandle,
        inputs: Vec<DomainHandle>,
    },

    /// Prediction confirmed or contradicted; subject is the outcome fact.
    PredictionOutcome {
        prediction: DomainHandle,
        input: Option<DomainHandle>,
        success: bool,
        prediction_source: Option<EventIdx>,
    },

    /// Object injected by an I/O device; effective at its `ijt`.
    DeviceInjected,

    /// Command ejected to an I/O device.
    DeviceEjected {
        reduction: Option<DomainHandle>,
        reduction_source: Option<EventIdx>,
    },

    /// Drive injected; effective at its `ijt`.
    DriveInjected,

    /// Simulation committed to a goal; subject is the produced goal fact.
    SimCommit {
        prediction: DomainHandle,
        prediction_source: Option<EventIdx>,
    },
}

/// Fieldless mirror of [`EventBody`] used for classification tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ModelLoaded,
    CompositeLoaded,
    ModelCreated,
    CountersSet,
    ModelDeleted,
    CompositeCreated,
    AutoFocus,
    ImdlPrediction,
    SimulatedPrediction,
    ValuePrediction,
    GoalReduced,
    CompositeInstantiated,
    PredictionOutcome,
    DeviceInjected,
    DeviceEjected,
    DriveInjected,
    SimCommit,
}

impl EventKind {
    /// Human-readable kind name for display.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ModelLoaded => "ModelLoaded",
            EventKind::CompositeLoaded => "CompositeLoaded",
            EventKind::ModelCreated => "ModelCreated",
            EventKind::CountersSet => "CountersSet",
            EventKind::ModelDeleted => "ModelDeleted",
            EventKind::CompositeCreated => "CompositeCreated",
            EventKind::AutoFocus => "AutoFocus",
            EventKind::ImdlPrediction => "ImdlPrediction",
            EventKind::SimulatedPrediction => "SimulatedPrediction",
            EventKind::ValuePrediction => "ValuePrediction",
            EventKind::GoalReduced => "GoalReduced",
            EventKind::CompositeInstantiated => "CompositeInstantiated",
            EventKind::PredictionOutcome => "PredictionOutcome",
            EventKind::DeviceInjected => "DeviceInjected",
            EventKind::DeviceEjected => "DeviceEjected",
            EventKind::DriveInjected => "DriveInjected",
            EventKind::SimCommit => "SimCommit",
        }
    }
}
