//! Trace line grammar
//!
//! An ordered table of pattern rules tried top to bottom; the first
//! structural match wins. Order matters: some tail shapes are textual
//! prefixes of others (`predict imdl ->` vs `predict ->`).
//!
//! Two rule families:
//! - startup rules (`load mdl …`, `load cst …`) carry no timestamp and only
//!   appear before the first timestamped line;
//! - timestamped rules share the `"<s>s:<ms>ms:<us>us "` prefix, then the
//!   tail is matched against the shape sub-table.
//!
//! A line matching no rule is discarded, never an error.

use regex::{Captures, Regex};

use crate::trace::time::TraceTime;

/// Captured fields of one successfully matched line, before any handle
/// resolution has happened. Object identifiers stay as strings here.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    StartupModel {
        oid: String,
        debug_id: u64,
        count: i64,
        success_rate: f64,
    },
    StartupComposite {
        oid: String,
        debug_id: u64,
    },
    ModelCreated {
        time: TraceTime,
        oid: String,
        debug_id: u64,
    },
    CountersSet {
        time: TraceTime,
        oid: String,
        count: i64,
        success_rate: f64,
    },
    ModelDeleted {
        time: TraceTime,
        oid: String,
    },
    CompositeCreated {
        time: TraceTime,
        oid: String,
        debug_id: u64,
    },
    AutoFocus {
        time: TraceTime,
        oid: String,
        target: String,
        mode: String,
    },
    ImdlPrediction {
        time: TraceTime,
        model: String,
        reduction: String,
    },
    SimulatedPrediction {
        time: TraceTime,
        model: String,
        input: String,
        output: String,
    },
    ValuePrediction {
        time: TraceTime,
        model: String,
        reduction: String,
    },
    GoalReduced {
        time: TraceTime,
        model: String,
        reduction: String,
    },
    CompositeInstantiated {
        time: TraceTime,
        fact: String,
        composite: String,
        inputs: Vec<String>,
    },
    PredictionSuccess {
        time: TraceTime,
        input: String,
        outcome: String,
        prediction: String,
    },
    PredictionFailure {
        time: TraceTime,
        outcome: String,
        prediction: String,
    },
    DeviceInjected {
        time: TraceTime,
        oid: String,
        inject_time: TraceTime,
    },
    DeviceEjected {
        time: TraceTime,
        oid: String,
        reduction: Option<String>,
    },
    DriveInjected {
        time: TraceTime,
        oid: String,
        inject_time: TraceTime,
    },
    SimCommit {
        time: TraceTime,
        prediction: String,
        goal: String,
    },
}

impl RawRecord {
    /// Scan-position timestamp of the line this record came from.
    /// `None` for the startup family.
    pub fn time(&self) -> Option<TraceTime> {
        match self {
            RawRecord::StartupModel { .. } | RawRecord::StartupComposite { .. } => None,
            RawRecord::ModelCreated { time, .. }
            | RawRecord::CountersSet { time, .. }
            | RawRecord::ModelDeleted { time, .. }
            | RawRecord::CompositeCreated { time, .. }
            | RawRecord::AutoFocus { time, .. }
            | RawRecord::ImdlPrediction { time, .. }
            | RawRecord::SimulatedPrediction { time, .. }
            | RawRecord::ValuePrediction { time, .. }
            | RawRecord::GoalReduced { time, .. }
            | RawRecord::CompositeInstantiated { time, .. }
            | RawRecord::PredictionSuccess { time, .. }
            | RawRecord::PredictionFailure { time, .. }
            | RawRecord::DeviceInjected { time, .. }
            | RawRecord::DeviceEjected { time, .. }
            | RawRecord::DriveInjected { time, .. }
            | RawRecord::SimCommit { time, .. } => Some(*time),
        }
    }
}

type StartupBuild = fn(&Captures) -> Option<RawRecord>;
type TailBuild = fn(TraceTime, &Captures) -> Option<RawRecord>;

struct StartupRule {
    pattern: Regex,
    build: StartupBuild,
}

struct TailRule {
    pattern: Regex,
    build: TailBuild,
}

pub struct LineGrammar {
    startup: Vec<StartupRule>,
    stamp: Option<Regex>,
    tails: Vec<TailRule>,
}

impl LineGrammar {
    pub fn new() -> Self {
        let startup: Vec<StartupRule> = [
            (
                r"^load mdl (\d+), Ctrl\((\d+)\) cnt:(\d+) sr:([0-9]*\.?[0-9]+)$",
                build_startup_model as StartupBuild,
            ),
            (
                r"^load cst (\d+), Ctrl\((\d+)\)$",
                build_startup_composite as StartupBuild,
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, build)| {
            Regex::new(pattern).ok().map(|pattern| StartupRule { pattern, build })
        })
        .collect();

        // `predict imdl ->` must come before `predict ->`, and the reduction
        // eject shape before the bare eject shape.
        let tails: Vec<TailRule> = [
            (r"^-> mdl (\d+), Ctrl\((\d+)\)$", build_model_created as TailBuild),
            (
                r"^mdl (\d+) cnt:(\d+) sr:([0-9]*\.?[0-9]+)$",
                build_counters_set as TailBuild,
            ),
            (r"^mdl (\d+) deleted$", build_model_deleted as TailBuild),
            (r"^-> cst (\d+), Ctrl\((\d+)\)$", build_composite_created as TailBuild),
            (r"^A/F -> (\d+)\|(\d+) \(([^)]*)\)$", build_auto_focus as TailBuild),
            (
                r"^mdl (\d+) predict imdl -> mk\.rdx (\d+)$",
                build_imdl_prediction as TailBuild,
            ),
            (
                r"^mdl (\d+): fact \((\d+)\) pred fact imdl -> fact (\d+) simulated pred$",
                build_simulated_prediction as TailBuild,
            ),
            (
                r"^mdl (\d+) predict -> mk\.rdx (\d+)$",
                build_value_prediction as TailBuild,
            ),
            (
                r"^mdl (\d+) abduce -> mk\.rdx (\d+)$",
                build_goal_reduced as TailBuild,
            ),
            (
                r"^fact (\d+) icst\[(\d+)\]\[([0-9 ]*)\]$",
                build_composite_instantiated as TailBuild,
            ),
            (
                r"^fact (\d+) -> fact (\d+) success fact (\d+) pred$",
                build_prediction_success as TailBuild,
            ),
            (
                r"^\|fact (\d+) fact (\d+) pred failure$",
                build_prediction_failure as TailBuild,
            ),
            (
                r"^I/O device inject (\d+), ijt (\d+)s:(\d+)ms:(\d+)us$",
                build_device_injected as TailBuild,
            ),
            (
                r"^mk\.rdx\((\d+)\): I/O device eject (\d+)$",
                build_device_ejected_rdx as TailBuild,
            ),
            (r"^I/O device eject (\d+)$", build_device_ejected as TailBuild),
            (
                r"^-> drive (\d+), ijt (\d+)s:(\d+)ms:(\d+)us$",
                build_drive_injected as TailBuild,
            ),
            (
                r"^sim commit: fact (\d+) pred fact success -> fact \((\d+)\) goal$",
                build_sim_commit as TailBuild,
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, build)| {
            Regex::new(pattern).ok().map(|pattern| TailRule { pattern, build })
        })
        .collect();

        let stamp = Regex::new(r"^(\d+)s:(\d+)ms:(\d+)us\s+(.+)$").ok();

        Self { startup, stamp, tails }
    }

    /// First matching rule wins; `None` means the line carries nothing the
    /// timeline cares about.
    pub fn parse(&self, line: &str) -> Option<RawRecord> {
        let line = line.trim_end();
        if line.is_empty() {
            return None;
        }

        for rule in &self.startup {
            if let Some(caps) = rule.pattern.captures(line) {
                return (rule.build)(&caps);
            }
        }

        let Some(caps) = self.stamp.as_ref().and_then(|stamp| stamp.captures(line)) else {
            tracing::trace!(line, "line matches no grammar rule");
            return None;
        };
        let time = TraceTime::from_parts(uint(&caps, 1)?, uint(&caps, 2)?, uint(&caps, 3)?);
        let tail = field(&caps, 4);

        for rule in &self.tails {
            if let Some(caps) = rule.pattern.captures(tail) {
                return (rule.build)(time, &caps);
            }
        }

        tracing::trace!(line, "timestamped line matches no tail rule");
        None
    }
}

impl Default for LineGrammar {
    fn default() -> Self {
        Self::new()
    }
}

fn field<'a>(caps: &'a Captures, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn uint(caps: &Captures, index: usize) -> Option<u64> {
    field(caps, index).parse().ok()
}

fn int(caps: &Captures, index: usize) -> Option<i64> {
    field(caps, index).parse().ok()
}

fn float(caps: &Captures, index: usize) -> Option<f64> {
    field(caps, index).parse().ok()
}

fn name(caps: &Captures, index: usize) -> String {
    field(caps, index).to_string()
}

fn ijt(caps: &Captures, first: usize) -> Option<TraceTime> {
    Some(TraceTime::from_parts(
        uint(caps, first)?,
        uint(caps, first + 1)?,
        uint(caps, first + 2)?,
    ))
}

fn build_startup_model(caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::StartupModel {
        oid: name(caps, 1),
        debug_id: uint(caps, 2)?,
        count: int(caps, 3)?,
        success_rate: float(caps, 4)?,
    })
}

fn build_startup_composite(caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::StartupComposite {
        oid: name(caps, 1),
        debug_id: uint(caps, 2)?,
    })
}

fn build_model_created(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::ModelCreated {
        time,
        oid: name(caps, 1),
        debug_id: uint(caps, 2)?,
    })
}

fn build_counters_set(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::CountersSet {
        time,
        oid: name(caps, 1),
        count: int(caps, 2)?,
        success_rate: float(caps, 3)?,
    })
}

fn build_model_deleted(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::ModelDeleted {
        time,
        oid: name(caps, 1),
    })
}

fn build_composite_created(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::CompositeCreated {
        time,
        oid: name(caps, 1),
        debug_id: uint(caps, 2)?,
    })
}

fn build_auto_focus(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::AutoFocus {
        time,
        oid: name(caps, 1),
        target: name(caps, 2),
        mode: name(caps, 3),
    })
}

fn build_imdl_prediction(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::ImdlPrediction {
        time,
        model: name(caps, 1),
        reduction: name(caps, 2),
    })
}

fn build_simulated_prediction(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::SimulatedPrediction {
        time,
        model: name(caps, 1),
        input: name(caps, 2),
        output: name(caps, 3),
    })
}

fn build_value_prediction(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::ValuePrediction {
        time,
        model: name(caps, 1),
        reduction: name(caps, 2),
    })
}

fn build_goal_reduced(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::GoalReduced {
        time,
        model: name(caps, 1),
        reduction: name(caps, 2),
    })
}

fn build_composite_instantiated(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    let inputs = field(caps, 3)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Some(RawRecord::CompositeInstantiated {
        time,
        fact: name(caps, 1),
        composite: name(caps, 2),
        inputs,
    })
}

fn build_prediction_success(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::PredictionSuccess {
        time,
        input: name(caps, 1),
        outcome: name(caps, 2),
        prediction: name(caps, 3),
    })
}

fn build_prediction_failure(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::PredictionFailure {
        time,
        outcome: name(caps, 1),
        prediction: name(caps, 2),
    })
}

fn build_device_injected(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::DeviceInjected {
        time,
        oid: name(caps, 1),
        inject_time: ijt(caps, 2)?,
    })
}

fn build_device_ejected_rdx(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::DeviceEjected {
        time,
        oid: name(caps, 2),
        reduction: Some(name(caps, 1)),
    })
}

fn build_device_ejected(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::DeviceEjected {
        time,
        oid: name(caps, 1),
        reduction: None,
    })
}

fn build_drive_injected(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::DriveInjected {
        time,
        oid: name(caps, 1),
        inject_time: ijt(caps, 2)?,
    })
}

fn build_sim_commit(time: TraceTime, caps: &Captures) -> Option<RawRecord> {
    Some(RawRecord::SimCommit {
        time,
        prediction: name(caps, 1),
        goal: name(caps, 2),
    })
}
