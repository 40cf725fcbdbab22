//! Replay state machine tests: forward/backward walks over the scene sink

use proptest::prelude::*;

use retrace::{
    HandleLookup, ObjectStore, RecordingSink, ReplayCursor, SinkCall, TraceTime,
};

use super::common::fixtures::{scan_sample, scan_str};

fn sample_cursor() -> (ReplayCursor, ObjectStore) {
    let (timeline, store) = scan_sample();
    (ReplayCursor::with_defaults(timeline), store)
}

#[test]
fn full_forward_then_backward_mirrors_the_sink_calls() {
    let (mut cursor, mut store) = sample_cursor();
    let mut sink = RecordingSink::new();

    while cursor.step(TraceTime::MAX, &mut store, &mut sink).is_some() {}
    assert!(cursor.at_end());

    let forward: Vec<SinkCall> = sink.calls.clone();
    let created: Vec<usize> = forward
        .iter()
        .filter_map(|call| match call {
            SinkCall::Create(index) => Some(*index),
            _ => None,
        })
        .collect();
    let updated: Vec<usize> = forward
        .iter()
        .filter_map(|call| match call {
            SinkCall::Update(index) => Some(*index),
            _ => None,
        })
        .collect();

    sink.clear();
    while cursor.unstep(TraceTime::ZERO, &mut store, &mut sink).is_some() {}
    assert!(cursor.at_start());

    let removed: Vec<usize> = sink
        .calls
        .iter()
        .filter_map(|call| match call {
            SinkCall::Remove(index) => Some(*index),
            _ => None,
        })
        .collect();
    let reverted: Vec<usize> = sink
        .calls
        .iter()
        .filter_map(|call| match call {
            SinkCall::Update(index) => Some(*index),
            _ => None,
        })
        .collect();

    // every create has its remove, in exact reverse order; every apply-side
    // update has its restore-side update, likewise reversed
    let mut expected_removed = created;
    expected_removed.reverse();
    assert_eq!(removed, expected_removed);

    let mut expected_reverted = updated;
    expected_reverted.reverse();
    assert_eq!(reverted, expected_reverted);

    // nothing backward creates or links
    assert!(sink
        .calls
        .iter()
        .all(|call| matches!(call, SinkCall::Remove(_) | SinkCall::Update(_))));
}

#[test]
fn full_round_trip_restores_every_scalar() {
    let (mut cursor, mut store) = sample_cursor();
    let pristine = store.clone();
    let mut sink = RecordingSink::new();

    while cursor.step(TraceTime::MAX, &mut store, &mut sink).is_some() {}

    // the walk really did change things
    let deleted = store.lookup("37").unwrap();
    assert!(!store.get(deleted).unwrap().alive);
    let churned = store.lookup("53").unwrap();
    assert_eq!(store.get(churned).unwrap().count, 3);

    while cursor.unstep(TraceTime::ZERO, &mut store, &mut sink).is_some() {}

    assert_eq!(store, pristine);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn step_before_the_first_event_is_a_no_op() {
    let (timeline, mut store) = scan_str("0s:100ms:0us -> mdl 53, Ctrl(389)\n");
    let mut cursor = ReplayCursor::with_defaults(timeline);
    let mut sink = RecordingSink::new();

    assert_eq!(
        cursor.step(TraceTime::from_parts(0, 50, 0), &mut store, &mut sink),
        None
    );
    assert_eq!(cursor.position(), 0);
    assert!(sink.calls.is_empty());
}

proptest! {
    /// Any walk of step/unstep operations, followed by unwinding to the
    /// start, leaves the store exactly as scanned and the cursor at zero.
    #[test]
    fn random_walks_unwind_cleanly(ops in prop::collection::vec(any::<bool>(), 0..48)) {
        let (timeline, mut store) = scan_sample();
        let pristine = store.clone();
        let mut cursor = ReplayCursor::with_defaults(timeline);
        let mut sink = RecordingSink::new();

        for forward in ops {
            if forward {
                let _ = cursor.step(TraceTime::MAX, &mut store, &mut sink);
            } else {
                let _ = cursor.unstep(TraceTime::ZERO, &mut store, &mut sink);
            }
        }

        while cursor.unstep(TraceTime::ZERO, &mut store, &mut sink).is_some() {}

        prop_assert_eq!(cursor.position(), 0);
        prop_assert_eq!(&store, &pristine);
    }

    /// A step immediately followed by an unstep restores the scalar state
    /// that was in place before the step, from any reachable position.
    #[test]
    fn step_then_unstep_restores_scalars(prefix in 0usize..18) {
        let (timeline, mut store) = scan_sample();
        let mut cursor = ReplayCursor::with_defaults(timeline);
        let mut sink = RecordingSink::new();

        for _ in 0..prefix {
            let _ = cursor.step(TraceTime::MAX, &mut store, &mut sink);
        }
        let snapshot = store.clone();

        if cursor.step(TraceTime::MAX, &mut store, &mut sink).is_some() {
            let _ = cursor.unstep(TraceTime::ZERO, &mut store, &mut sink);
            prop_assert_eq!(&store, &snapshot);
        }
    }
}

/// With no markers or bursts in play, step/unstep invert the cursor
/// position itself, not just the scalar state.
#[test]
fn step_then_unstep_restores_position_on_plain_traces() {
    let (timeline, mut store) = scan_str(
        "0s:100ms:0us -> mdl 53, Ctrl(389)\n\
         0s:300ms:0us mdl 53 cnt:2 sr:0.9\n\
         0s:400ms:0us mdl 53 cnt:3 sr:0.95\n",
    );
    let mut cursor = ReplayCursor::with_defaults(timeline);
    let mut sink = RecordingSink::new();

    for start in 0..3 {
        let snapshot = store.clone();
        assert!(cursor.step(TraceTime::MAX, &mut store, &mut sink).is_some());
        assert!(cursor.unstep(TraceTime::ZERO, &mut store, &mut sink).is_some());
        assert_eq!(cursor.position(), start);
        assert_eq!(store, snapshot);
        let _ = cursor.step(TraceTime::MAX, &mut store, &mut sink);
    }
}
