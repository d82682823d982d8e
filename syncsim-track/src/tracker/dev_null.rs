// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::Id;
use crate::tracker::Track;

/// Drops every message. Used for parameter sweeps and quiet tests.
pub struct DevNullTracker;

impl Track for DevNullTracker {
    fn register(&self, _path: &str) -> Id {
        Id::default()
    }

    fn max_level(&self, _id: Id) -> Option<log::Level> {
        None
    }

    fn log(&self, _id: Id, _level: log::Level, _msg: fmt::Arguments) {}

    fn set_time(&self, _set_by: Id, _time_ns: f64) {}

    fn shutdown(&self) {}
}
