// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The [`Track`] trait and the trackers that implement it.

/// A tracker that drops everything.
pub mod dev_null;
/// Fan-out to several trackers.
pub mod multi_tracker;
/// Line-per-message text output.
pub mod text;

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::io;
use std::rc::Rc;

pub use dev_null::DevNullTracker;
pub use multi_tracker::MultiTracker;
use regex::Regex;
pub use text::TextTracker;

use crate::Id;

/// Error used to return configuration errors
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracker configuration error: {}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// This is the interface that is supported by all [`Tracker`]s.
pub trait Track {
    /// Register an entity by its path and return the id it logs with.
    fn register(&self, path: &str) -> Id;

    /// The most verbose level enabled for an entity, or `None` if it logs
    /// nothing.
    fn max_level(&self, id: Id) -> Option<log::Level>;

    /// Whether messages of `level` from entity `id` are kept.
    fn is_enabled(&self, id: Id, level: log::Level) -> bool {
        self.max_level(id).is_some_and(|max| level <= max)
    }

    /// Record a log message of the given level.
    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments);

    /// Set the simulated time stamped on later messages. A new simulation
    /// sharing the tracker starts again from its own time.
    fn set_time(&self, set_by: Id, time_ns: f64);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Rc<dyn Track>;

/// Create a [`Tracker`] that prints everything at `level` or above to
/// `stdout`.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let stdout_writer = Box::new(io::BufWriter::new(io::stdout()));
    Rc::new(TextTracker::new(LevelFilter::new(level), stdout_writer))
}

/// Create a [`Tracker`] that drops everything.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    Rc::new(DevNullTracker)
}

/// Chooses the level of an entity from its path.
///
/// Rules are regular expressions tried in the order they were added; the
/// first match gives the level. Paths matching no rule get the default.
#[derive(Clone, Debug)]
pub struct LevelFilter {
    default_level: log::Level,
    rules: Vec<(Regex, log::Level)>,
}

impl LevelFilter {
    /// A filter giving every entity `default_level`.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            rules: Vec::new(),
        }
    }

    /// Add a rule giving `level` to entities whose path matches `regex_str`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use syncsim_track::tracker::LevelFilter;
    ///
    /// let filter = LevelFilter::new(log::Level::Warn)
    ///     .with_rule(".*::schedule", log::Level::Trace)
    ///     .unwrap();
    /// assert_eq!(filter.level_for("top::dtp::schedule"), log::Level::Trace);
    /// assert_eq!(filter.level_for("top::dtp"), log::Level::Warn);
    /// ```
    pub fn with_rule(
        mut self,
        regex_str: &str,
        level: log::Level,
    ) -> Result<Self, TrackConfigError> {
        let regex = Regex::new(regex_str).map_err(|e| {
            TrackConfigError(format!("Failed to parse regex {regex_str}:\n{e}\n"))
        })?;
        self.rules.push((regex, level));
        Ok(self)
    }

    /// The level for the entity at `path`.
    #[must_use]
    pub fn level_for(&self, path: &str) -> log::Level {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(path))
            .map_or(self.default_level, |(_, level)| *level)
    }
}

struct Registered {
    path: String,
    level: log::Level,
}

/// The entities known to one tracker, and the time last set.
///
/// Ids are handed out densely from zero, so an id is an index.
pub(crate) struct Registry {
    filter: LevelFilter,
    entities: RefCell<Vec<Registered>>,
    time_ns: Cell<f64>,
}

impl Registry {
    pub(crate) fn new(filter: LevelFilter) -> Self {
        Self {
            filter,
            entities: RefCell::new(Vec::new()),
            time_ns: Cell::new(0.0),
        }
    }

    pub(crate) fn register(&self, path: &str) -> Id {
        let mut entities = self.entities.borrow_mut();
        let id = Id(entities.len() as u64);
        entities.push(Registered {
            path: path.to_string(),
            level: self.filter.level_for(path),
        });
        id
    }

    pub(crate) fn level(&self, id: Id) -> Option<log::Level> {
        self.entities
            .borrow()
            .get(id.0 as usize)
            .map(|entity| entity.level)
    }

    pub(crate) fn path(&self, id: Id) -> Ref<'_, str> {
        Ref::map(self.entities.borrow(), |entities| {
            entities
                .get(id.0 as usize)
                .map_or("<unregistered>", |entity| entity.path.as_str())
        })
    }

    pub(crate) fn time_ns(&self) -> f64 {
        self.time_ns.get()
    }

    pub(crate) fn set_time_ns(&self, time_ns: f64) {
        self.time_ns.set(time_ns);
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    const PATHS: [&str; 4] = [
        "top",
        "top::syncwise",
        "top::syncwise::schedule",
        "top::firefly",
    ];

    fn levels(filter: &LevelFilter) -> Vec<Level> {
        PATHS.iter().map(|p| filter.level_for(p)).collect()
    }

    #[test]
    fn default_only() {
        let filter = LevelFilter::new(Level::Error);
        assert_eq!(levels(&filter), vec![Level::Error; 4]);
    }

    #[test]
    fn first_rule_wins() {
        let filter = LevelFilter::new(Level::Error)
            .with_rule(r".*schedule", Level::Warn)
            .unwrap()
            .with_rule(r".*syncwise.*", Level::Info)
            .unwrap();
        assert_eq!(
            levels(&filter),
            vec![Level::Error, Level::Info, Level::Warn, Level::Error]
        );
    }

    #[test]
    fn bad_regex() {
        let err = LevelFilter::new(Level::Error)
            .with_rule(r"(unclosed", Level::Warn)
            .unwrap_err();
        assert!(err.0.contains("Failed to parse regex (unclosed"));
    }

    #[test]
    fn registry_ids_index_paths() {
        let filter = LevelFilter::new(Level::Info)
            .with_rule("dtp", Level::Trace)
            .unwrap();
        let registry = Registry::new(filter);
        let top = registry.register("top");
        let dtp = registry.register("top::dtp");
        assert_eq!((top, dtp), (Id(0), Id(1)));
        assert_eq!(&*registry.path(dtp), "top::dtp");
        assert_eq!(registry.level(top), Some(Level::Info));
        assert_eq!(registry.level(dtp), Some(Level::Trace));
        assert_eq!(registry.level(Id(7)), None);
        assert_eq!(&*registry.path(Id(7)), "<unregistered>");
    }

    #[test]
    fn time_is_the_last_set() {
        let registry = Registry::new(LevelFilter::new(Level::Error));
        assert_eq!(registry.time_ns(), 0.0);
        registry.set_time_ns(25.5);
        assert_eq!(registry.time_ns(), 25.5);
        registry.set_time_ns(0.0);
        assert_eq!(registry.time_ns(), 0.0);
    }
}
