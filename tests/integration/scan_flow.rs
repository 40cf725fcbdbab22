//! Scan pipeline tests: grammar, resolution, reordering, archiving

use std::io::Cursor;

use tempfile::tempdir;

use retrace::{
    CancelToken, EventBody, EventKind, HandleLookup, ScanOutcome, TimeReference, Timeline,
    TraceScanner, TraceTime,
};

use super::common::fixtures::{scan_sample, scan_str, SAMPLE_TRACE};

#[test]
fn scanning_is_deterministic() {
    let (first, _) = scan_sample();
    let (second, _) = scan_sample();
    assert_eq!(first, second);
}

#[test]
fn timeline_time_is_non_decreasing() {
    let (timeline, _) = scan_sample();
    for pair in timeline.events().windows(2) {
        assert!(
            pair[0].time <= pair[1].time,
            "{} > {} at kinds {:?}/{:?}",
            pair[0].time,
            pair[1].time,
            pair[0].kind(),
            pair[1].kind()
        );
    }
}

#[test]
fn sample_reconstructs_the_expected_sequence() {
    let (timeline, store) = scan_sample();
    let kinds: Vec<EventKind> = timeline.iter().map(|ev| ev.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ModelLoaded,
            EventKind::CompositeLoaded,
            EventKind::ModelCreated,
            EventKind::CompositeCreated,
            EventKind::DeviceInjected,
            EventKind::DeviceInjected,
            EventKind::AutoFocus,
            EventKind::DriveInjected,
            EventKind::CountersSet,
            EventKind::CountersSet,
            EventKind::ImdlPrediction,
            EventKind::SimulatedPrediction,
            EventKind::GoalReduced,
            EventKind::CompositeInstantiated,
            EventKind::PredictionOutcome,
            EventKind::DeviceEjected,
            EventKind::SimCommit,
            EventKind::ModelDeleted,
        ]
    );

    // the dangling "mdl 99" line was dropped without registering anything
    assert!(store.lookup("99").is_none());
    assert_eq!(store.len(), 14);
}

#[test]
fn buffered_injects_land_between_their_time_neighbours() {
    let (timeline, _) = scan_sample();

    // declared at scan position 200ms with ijt 250ms; they must sit after
    // everything at <= 250ms and before the first later-scanned event at
    // >= 250ms (the auto-focus at 260ms)
    assert_eq!(timeline.get(4).unwrap().kind(), EventKind::DeviceInjected);
    assert_eq!(timeline.get(4).unwrap().time, TraceTime::from_parts(0, 250, 0));
    assert_eq!(timeline.get(5).unwrap().kind(), EventKind::DeviceInjected);
    assert_eq!(timeline.get(6).unwrap().kind(), EventKind::AutoFocus);
    assert_eq!(timeline.get(3).unwrap().time, TraceTime::from_parts(0, 150, 0));

    // the drive waited for the 300ms line
    assert_eq!(timeline.get(7).unwrap().kind(), EventKind::DriveInjected);
    assert_eq!(timeline.get(7).unwrap().time, TraceTime::from_parts(0, 300, 0));
}

#[test]
fn causal_back_references_point_at_the_nearest_producers() {
    let (timeline, _) = scan_sample();

    match &timeline.get(11).unwrap().body {
        EventBody::SimulatedPrediction { requirement, .. } => assert_eq!(*requirement, Some(10)),
        other => panic!("unexpected body: {other:?}"),
    }
    match &timeline.get(14).unwrap().body {
        EventBody::PredictionOutcome {
            prediction_source,
            success,
            ..
        } => {
            assert_eq!(*prediction_source, Some(11));
            assert!(*success);
        }
        other => panic!("unexpected body: {other:?}"),
    }
    match &timeline.get(15).unwrap().body {
        EventBody::DeviceEjected {
            reduction_source, ..
        } => assert_eq!(*reduction_source, Some(12)),
        other => panic!("unexpected body: {other:?}"),
    }
    match &timeline.get(16).unwrap().body {
        EventBody::SimCommit {
            prediction_source, ..
        } => assert_eq!(*prediction_source, Some(11)),
        other => panic!("unexpected body: {other:?}"),
    }
}

#[test]
fn startup_then_creation_matches_the_reference_scenario() {
    let (timeline, store) = scan_str(
        "load mdl 37, Ctrl(113) cnt:2 sr:1.0\n\
         0s:200ms:0us -> mdl 53, Ctrl(389)\n",
    );

    assert_eq!(timeline.len(), 2);

    let loaded = timeline.get(0).unwrap();
    assert_eq!(loaded.time, TraceTime::ZERO);
    assert_eq!(loaded.subject, store.lookup("37").unwrap());
    assert_eq!(
        loaded.body,
        EventBody::ModelLoaded {
            count: 2,
            success_rate: 1.0
        }
    );

    let created = timeline.get(1).unwrap();
    assert_eq!(created.time, TraceTime::from_parts(0, 200, 0));
    assert_eq!(created.subject, store.lookup("53").unwrap());
    assert_eq!(
        created.body,
        EventBody::ModelCreated {
            count: 1,
            success_rate: 1.0
        }
    );
}

#[test]
fn equal_time_counter_updates_keep_encounter_order() {
    let (timeline, _) = scan_str(
        "0s:100ms:0us -> mdl 53, Ctrl(389)\n\
         0s:300ms:0us mdl 53 cnt:2 sr:1\n\
         0s:300ms:0us mdl 53 cnt:3 sr:1\n",
    );

    let counters: Vec<(i64, bool)> = timeline
        .iter()
        .filter_map(|ev| match &ev.body {
            EventBody::CountersSet {
                count,
                count_increased,
                ..
            } => Some((*count, *count_increased)),
            _ => None,
        })
        .collect();
    assert_eq!(counters, vec![(2, true), (3, true)]);
    assert_eq!(timeline.get(1).unwrap().time, timeline.get(2).unwrap().time);
}

#[test]
fn cancellation_is_not_reported_as_failure() {
    let scanner = TraceScanner::default();
    let mut store = retrace::ObjectStore::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = scanner
        .scan_reader(
            Cursor::new(SAMPLE_TRACE.as_str()),
            TimeReference::default(),
            &mut store,
            &cancel,
        )
        .expect("cancellation must not surface as an error");
    assert!(matches!(outcome, ScanOutcome::Cancelled));
}

#[test]
fn archive_round_trips_a_scanned_timeline() {
    let (timeline, _) = scan_sample();
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.jsonl");

    timeline.write_jsonl_to_path(&path).unwrap();
    let read = Timeline::read_jsonl_from_path(&path).unwrap();

    assert_eq!(read, timeline);
}
