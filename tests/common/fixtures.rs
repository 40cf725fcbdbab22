//! Shared trace fixtures
//!
//! One small but complete session: startup loads, mid-run creations,
//! buffered injections, an attention marker, counter churn, a simulation
//! burst, a composite instantiation, a prediction outcome, an eject, a
//! commit, and a delete, plus lines the engine must ignore.

use std::io::Cursor;

use once_cell::sync::Lazy;

use retrace::{CancelToken, ObjectStore, TimeReference, Timeline, TraceScanner};

pub static SAMPLE_TRACE: Lazy<String> = Lazy::new(|| {
    [
        "load mdl 37, Ctrl(113) cnt:2 sr:0.8",
        "load cst 38, Ctrl(114)",
        "0s:100ms:0us -> mdl 53, Ctrl(389)",
        "0s:150ms:0us -> cst 54, Ctrl(390)",
        "0s:200ms:0us I/O device inject 60, ijt 0s:250ms:0us",
        "0s:200ms:0us I/O device inject 62, ijt 0s:250ms:0us",
        "0s:200ms:0us -> drive 61, ijt 0s:300ms:0us",
        "runtime chatter the grammar does not know",
        "0s:260ms:0us A/F -> 60|62 (PASS_THROUGH)",
        "0s:300ms:0us mdl 53 cnt:2 sr:0.9",
        "0s:300ms:0us mdl 53 cnt:3 sr:0.95",
        "0s:400ms:0us mdl 53 predict imdl -> mk.rdx 70",
        "0s:400ms:0us mdl 53: fact (70) pred fact imdl -> fact 71 simulated pred",
        "0s:410ms:0us mdl 37 abduce -> mk.rdx 72",
        "0s:450ms:0us fact 73 icst[54][ 60 62]",
        "0s:500ms:0us fact 60 -> fact 74 success fact 71 pred",
        "0s:550ms:0us mk.rdx(72): I/O device eject 75",
        "0s:600ms:0us sim commit: fact 71 pred fact success -> fact (76) goal",
        "0s:650ms:0us mdl 99 cnt:5 sr:1",
        "0s:700ms:0us mdl 37 deleted",
    ]
    .join("\n")
});

pub fn scan_str(lines: &str) -> (Timeline, ObjectStore) {
    let scanner = TraceScanner::default();
    let mut store = ObjectStore::new();
    let timeline = scanner
        .scan_reader(
            Cursor::new(lines),
            TimeReference::default(),
            &mut store,
            &CancelToken::new(),
        )
        .expect("in-memory scan cannot fail")
        .timeline()
        .expect("not cancelled");
    (timeline, store)
}

pub fn scan_sample() -> (Timeline, ObjectStore) {
    scan_str(&SAMPLE_TRACE)
}
