// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Helpers for checking what entities log in tests.

use std::cell::RefCell;
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;

use regex::Regex;

use crate::tracker::{LevelFilter, Registry, TextTracker, dev_null_tracker};
use crate::{Id, Track, Tracker, Writer};

/// A tracker that keeps every message in memory as `"<path> <LEVEL>: <msg>"`.
pub struct TestTracker {
    registry: Registry,
    events: RefCell<Vec<String>>,
}

impl TestTracker {
    /// Create a [`TestTracker`] with every entity enabled at all levels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_filter(LevelFilter::new(log::Level::Trace))
    }

    /// Create a [`TestTracker`] that only keeps what `filter` lets through.
    #[must_use]
    pub fn with_filter(filter: LevelFilter) -> Self {
        Self {
            registry: Registry::new(filter),
            events: RefCell::new(Vec::new()),
        }
    }
}

impl Default for TestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Track for TestTracker {
    fn register(&self, path: &str) -> Id {
        self.registry.register(path)
    }

    fn max_level(&self, id: Id) -> Option<log::Level> {
        self.registry.level(id)
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        let event = format!("{} {level}: {msg}", &*self.registry.path(id));
        println!("{event}");
        self.events.borrow_mut().push(event);
    }

    fn set_time(&self, _set_by: Id, time_ns: f64) {
        self.registry.set_time_ns(time_ns);
    }

    fn shutdown(&self) {}
}

/// Initialise a [`TestTracker`] for a test
///
/// Returns both the concrete tracker (for use with [`check_and_clear`]) and the
/// shared [`Tracker`](crate::Tracker) to give to entities.
///
/// # Examples
///
/// ```
/// use syncsim_track::{info, test_helpers};
///
/// let (test_tracker, tracker) = syncsim_track::test_init!();
/// let top = syncsim_track::entity::toplevel(&tracker, "top");
/// info!(top ; "hello");
/// test_helpers::check_and_clear(&test_tracker, &["top INFO: hello"]);
/// ```
///
/// A [`LevelFilter`] can be given to only keep some entities or levels.
#[macro_export]
macro_rules! test_init {
    () => {
        $crate::test_init!($crate::tracker::LevelFilter::new($crate::log::Level::Trace))
    };
    ($filter:expr) => {{
        let test_tracker = std::rc::Rc::new($crate::test_helpers::TestTracker::with_filter($filter));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Assert that the messages logged since the last check match the `expected`
/// regular expressions, in order, then forget them.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let mut events = tracker.events.borrow_mut();
    println!("Checking {expected:?} matches {:?}", *events);
    assert_eq!(expected.len(), events.len());

    for (pattern, actual) in expected.iter().zip(events.iter()) {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(actual), "{actual:?} does not match {pattern:?}");
    }
    events.clear();
}

/// Create a tracker for a test file.
///
/// If the `SYNCSIM_TEST_TRACE` environment variable is set then all `Debug`
/// output of the test is written to `traces/<test file>.log`, otherwise all
/// output is suppressed.
#[must_use]
pub fn create_tracker(full_filepath: &str) -> Tracker {
    if std::env::var_os("SYNCSIM_TEST_TRACE").is_none() {
        return dev_null_tracker();
    }

    const FOLDER: &str = "traces";
    fs::create_dir_all(FOLDER).unwrap();

    let stem = Path::new(full_filepath)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap();
    let writer: Writer = Box::new(BufWriter::new(
        fs::File::create(format!("{FOLDER}/{stem}.log")).unwrap(),
    ));
    Rc::new(TextTracker::new(LevelFilter::new(log::Level::Debug), writer))
}
