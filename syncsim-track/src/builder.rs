// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build the trackers chosen on the command line.

use std::io::BufWriter;
use std::rc::Rc;
use std::{fs, io};

use crate::tracker::{LevelFilter, MultiTracker, TextTracker, TrackConfigError, stdout_tracker};
use crate::{Tracker, Writer};

/// Settings of one text tracker.
pub struct TrackerConfig<'a> {
    /// Whether the tracker is built at all.
    pub enable: bool,

    /// Most verbose level kept.
    pub level: log::Level,

    /// Only entities whose path matches get `level`; empty matches all.
    pub filter_regex: &'a str,

    /// File to write to. Output goes to `stdout` when this is `None`.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

/// Settings of the console and log file trackers.
pub struct TrackersConfig<'a> {
    /// Console output.
    pub stdout: TrackerConfig<'a>,

    /// Log file output.
    pub log_file: TrackerConfig<'a>,
}

/// The level filter for one tracker.
///
/// With a filter regular expression only matching entities log at the chosen
/// level; everything else is limited to errors.
fn level_filter(config: &TrackerConfig) -> Result<LevelFilter, TrackConfigError> {
    if config.filter_regex.is_empty() {
        Ok(LevelFilter::new(config.level))
    } else {
        LevelFilter::new(log::Level::Error).with_rule(config.filter_regex, config.level)
    }
}

fn open_writer(config: &TrackerConfig) -> Result<Writer, TrackConfigError> {
    match config.file {
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
        Some(filename) => {
            let file = fs::File::create(filename)
                .map_err(|e| TrackConfigError(format!("Unable to create {filename}: {e}")))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

fn build_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    let filter = level_filter(config)?;
    Ok(Rc::new(TextTracker::new(filter, open_writer(config)?)))
}

/// Set up the stdout and log file trackers.
///
/// A log file tracker without a file name is an error. With both trackers
/// disabled, warnings still reach `stdout`.
pub fn setup_trackers(config: &TrackersConfig) -> Result<Tracker, TrackConfigError> {
    if config.log_file.enable && config.log_file.file.is_none() {
        return Err(TrackConfigError(
            "No filename given for the log file tracker".to_string(),
        ));
    }
    match (config.stdout.enable, config.log_file.enable) {
        (true, true) => {
            let mut tracker = MultiTracker::default();
            tracker.add_tracker(build_tracker(&config.stdout)?);
            tracker.add_tracker(build_tracker(&config.log_file)?);
            Ok(Rc::new(tracker))
        }
        (true, false) => build_tracker(&config.stdout),
        (false, true) => build_tracker(&config.log_file),
        (false, false) => Ok(stdout_tracker(log::Level::Warn)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, toplevel};
    use crate::info;

    #[test]
    fn file_tracker_writes_filtered_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let path_str = path.to_str().unwrap();

        let config = TrackersConfig {
            stdout: TrackerConfig {
                enable: false,
                ..Default::default()
            },
            log_file: TrackerConfig {
                enable: true,
                level: log::Level::Info,
                filter_regex: ".*dtp.*",
                file: Some(path_str),
            },
        };
        let tracker = setup_trackers(&config).unwrap();
        let top = toplevel(&tracker, "top");
        let sim = Rc::new(Entity::new(&top, "dtp"));
        info!(top ; "not shown");
        info!(sim ; "shown");
        tracker.shutdown();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with("top::dtp INFO: shown\n"));
    }

    #[test]
    fn bad_filter_is_reported() {
        let config = TrackersConfig {
            stdout: TrackerConfig {
                enable: true,
                level: log::Level::Info,
                filter_regex: "[",
                file: None,
            },
            log_file: TrackerConfig {
                enable: false,
                ..Default::default()
            },
        };
        assert!(setup_trackers(&config).is_err());
    }

    #[test]
    fn log_file_needs_a_name() {
        let config = TrackersConfig {
            stdout: TrackerConfig {
                enable: false,
                ..Default::default()
            },
            log_file: TrackerConfig::default(),
        };
        let err = setup_trackers(&config).err().unwrap();
        assert!(err.to_string().contains("No filename"));
    }
}
