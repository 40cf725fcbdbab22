//! Event kind classification
//!
//! Which kinds step as a frame burst, which defer through the reorder
//! buffer, which are invisible markers, which mutate counters. Built once
//! and passed into the scanner and cursor; nothing here is ambient state.

use std::collections::HashSet;

use crate::trace::event::EventKind;
use crate::trace::frame::LayoutLane;

#[derive(Debug, Clone)]
pub struct Classification {
    frame_grouped: HashSet<EventKind>,
    deferred: HashSet<EventKind>,
    markers: HashSet<EventKind>,
    mutations: HashSet<EventKind>,
}

impl Classification {
    /// The canonical table for the runtime's trace vocabulary.
    pub fn standard() -> Self {
        use EventKind::*;
        Self {
            frame_grouped: [SimulatedPrediction, GoalReduced, SimCommit]
                .into_iter()
                .collect(),
            deferred: [DeviceInjected, DriveInjected].into_iter().collect(),
            markers: [AutoFocus].into_iter().collect(),
            mutations: [CountersSet, ModelDeleted].into_iter().collect(),
        }
    }

    /// A single step consumes a whole same-frame run of these kinds.
    pub fn is_frame_grouped(&self, kind: EventKind) -> bool {
        self.frame_grouped.contains(&kind)
    }

    /// Effective time is carried by the line itself (`ijt`); the event waits
    /// in the reorder buffer until the scan clock reaches it.
    pub fn is_deferred(&self, kind: EventKind) -> bool {
        self.deferred.contains(&kind)
    }

    /// No visual effect; the cursor steps over these without yielding.
    pub fn is_marker(&self, kind: EventKind) -> bool {
        self.markers.contains(&kind)
    }

    /// Applies counter/liveness changes under the snapshot protocol.
    pub fn is_mutation(&self, kind: EventKind) -> bool {
        self.mutations.contains(&kind)
    }

    /// Everything that is neither a marker nor a mutation creates scene state.
    pub fn is_creation(&self, kind: EventKind) -> bool {
        !self.is_marker(kind) && !self.is_mutation(kind)
    }

    pub fn lane(&self, kind: EventKind) -> LayoutLane {
        use EventKind::*;
        match kind {
            ModelLoaded | ModelCreated | CountersSet | ModelDeleted => LayoutLane::Models,
            CompositeLoaded | CompositeCreated | CompositeInstantiated => LayoutLane::Composites,
            ImdlPrediction | ValuePrediction | PredictionOutcome | AutoFocus => {
                LayoutLane::Predictions
            }
            SimulatedPrediction | GoalReduced | SimCommit => LayoutLane::Simulations,
            DeviceInjected | DeviceEjected | DriveInjected => LayoutLane::Io,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::standard()
    }
}
