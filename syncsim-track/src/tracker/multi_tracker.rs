// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::fmt;

use crate::Id;
use crate::tracker::{Track, Tracker};

/// Sends every message to several [`Tracker`]s.
///
/// Each contained tracker gives an entity its own id; this tracker keeps the
/// mapping from its id to theirs. All trackers must be added before any
/// entity is registered.
#[derive(Default)]
pub struct MultiTracker {
    trackers: Vec<Tracker>,
    inner_ids: RefCell<Vec<Vec<Id>>>,
}

impl MultiTracker {
    /// Add a new tracker
    pub fn add_tracker(&mut self, tracker: Tracker) {
        self.trackers.push(tracker);
    }

    fn each<F>(&self, id: Id, mut f: F)
    where
        F: FnMut(&Tracker, Id),
    {
        if let Some(inner) = self.inner_ids.borrow().get(id.0 as usize) {
            for (tracker, inner_id) in self.trackers.iter().zip(inner) {
                f(tracker, *inner_id);
            }
        }
    }
}

impl Track for MultiTracker {
    fn register(&self, path: &str) -> Id {
        let inner: Vec<Id> = self.trackers.iter().map(|t| t.register(path)).collect();
        let mut inner_ids = self.inner_ids.borrow_mut();
        inner_ids.push(inner);
        Id(inner_ids.len() as u64 - 1)
    }

    fn max_level(&self, id: Id) -> Option<log::Level> {
        let mut max = None;
        self.each(id, |tracker, inner_id| {
            max = max.max(tracker.max_level(inner_id));
        });
        max
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        self.each(id, |tracker, inner_id| {
            if tracker.is_enabled(inner_id, level) {
                tracker.log(inner_id, level, msg);
            }
        });
    }

    fn set_time(&self, set_by: Id, time_ns: f64) {
        self.each(set_by, |tracker, inner_id| tracker.set_time(inner_id, time_ns));
    }

    fn shutdown(&self) {
        for tracker in &self.trackers {
            tracker.shutdown();
        }
    }
}
