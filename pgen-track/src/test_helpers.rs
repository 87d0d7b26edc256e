// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Capture log output in tests.
//!
//! A [`TestTracker`] records every enabled message as a
//! `"<id>:<LEVEL>: <message>"` line which tests then match with
//! [`check_and_clear`].

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use crate::{Id, Track};

/// A tracker that keeps its messages in memory.
pub struct TestTracker {
    lines: Mutex<Vec<String>>,
    next_id: AtomicU64,
    level: log::Level,
}

impl TestTracker {
    /// Record every message, handing out ids from `first_id`.
    #[must_use]
    pub fn new(first_id: u64) -> Self {
        Self::with_level(first_id, log::Level::Trace)
    }

    /// Only record messages at `level` or more severe.
    #[must_use]
    pub fn with_level(first_id: u64, level: log::Level) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(first_id),
            level,
        }
    }

    /// The lines recorded since the last clear.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    fn take(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }
}

impl Track for TestTracker {
    fn unique_id(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn is_entity_enabled(&self, _id: Id, level: log::Level) -> bool {
        level <= self.level
    }

    fn add_entity(&self, _id: Id, _entity_name: &str) {}

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        let line = format!("{id}:{level}: {msg}");
        println!("{line}");
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    fn shutdown(&self) {}
}

/// Create a [`TestTracker`] and the same object as a
/// [`Tracker`](crate::Tracker), with ids starting at `$first_id`.
///
/// ```
/// use pgen_track::entity::toplevel;
/// use pgen_track::test_helpers::check_and_clear;
///
/// let (test_tracker, tracker) = pgen_track::test_init!(10);
/// let top = toplevel(&tracker, "resources");
/// pgen_track::info!(top ; "{} cores", 4);
/// check_and_clear(&test_tracker, &["^10:INFO: 4 cores$"]);
/// ```
#[macro_export]
macro_rules! test_init {
    ($first_id:expr) => {{
        let test_tracker = std::sync::Arc::new($crate::test_helpers::TestTracker::new($first_id));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Assert that the lines recorded since the last check match `expected`,
/// one regular expression per line, then forget them.
///
/// # Panics
///
/// If the number of lines differs, a line does not match or an expression
/// is not a valid regular expression.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let lines = tracker.take();
    assert_eq!(
        lines.len(),
        expected.len(),
        "expected {expected:?}, got {lines:?}"
    );

    for (line, pattern) in lines.iter().zip(expected) {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(line), "{line:?} does not match {pattern:?}");
    }
}

/// Forget the recorded lines without checking them.
pub fn clear(tracker: &TestTracker) {
    tracker.take();
}
