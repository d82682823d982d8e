// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;

use crate::tracker::{LevelFilter, Registry, Track};
use crate::{Id, Writer};

/// Writes one line per message: the simulated time, the entity path, the
/// level and the message.
pub struct TextTracker {
    registry: Registry,
    writer: RefCell<Writer>,
}

impl TextTracker {
    /// Create a new [`TextTracker`] writing to `writer`.
    pub fn new(filter: LevelFilter, writer: Writer) -> Self {
        Self {
            registry: Registry::new(filter),
            writer: RefCell::new(writer),
        }
    }
}

impl Track for TextTracker {
    fn register(&self, path: &str) -> Id {
        self.registry.register(path)
    }

    fn max_level(&self, id: Id) -> Option<log::Level> {
        self.registry.level(id)
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        let time_ns = self.registry.time_ns();
        let path = self.registry.path(id);
        // Logging must never abort a simulation, so write errors are dropped.
        let _ = writeln!(
            self.writer.borrow_mut(),
            "{time_ns:.0}ns {path} {level}: {msg}"
        );
    }

    fn set_time(&self, _set_by: Id, time_ns: f64) {
        self.registry.set_time_ns(time_ns);
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}
