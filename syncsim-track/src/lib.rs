// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Logging for the clock synchronisation simulator.
//!
//! Every message is emitted on behalf of an [`Entity`](crate::entity::Entity).
//! Entities form a hierarchy named by path (`top::syncwise::schedule`) and
//! the level at which each one logs is chosen by matching regular expressions
//! against its path when it is registered with a [`Tracker`].
//!
//! Messages are stamped with the simulated time, which the simulator advances
//! once per synchronisation round with [`set_time!`].
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use syncsim_track::entity::{Entity, toplevel};
//! use syncsim_track::tracker::dev_null_tracker;
//! use syncsim_track::{debug, set_time};
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let drift = Rc::new(Entity::new(&top, "drift"));
//! set_time!(drift ; 100_000.0);
//! debug!(drift ; "node {} drifts {:.2}ppm", 3, 12.5);
//! ```

#![warn(missing_docs)]

use std::{fmt, io};

pub use log;

pub mod builder;
pub mod entity;
pub mod test_helpers;

pub mod tracker;
pub use tracker::{Track, Tracker};

/// Where a [`TextTracker`](tracker::TextTracker) writes its lines.
pub type Writer = Box<dyn io::Write>;

/// Identifier a [`Tracker`] gives to each registered
/// [`Entity`](crate::entity::Entity).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Advance the simulated time (ns) seen by the entity's tracker.
#[macro_export]
macro_rules! set_time {
    ($ent:expr ; $now_ns:expr) => {
        $ent.tracker.set_time($ent.id, $now_ns)
    };
}

/// Log at an explicit level. The arguments are only formatted when the
/// tracker keeps messages of that level from this entity.
#[macro_export]
macro_rules! log_at {
    ($ent:expr ; $level:expr, $($fmt:tt)+) => {
        if $ent.tracker.is_enabled($ent.id, $level) {
            $ent.tracker.log($ent.id, $level, format_args!($($fmt)+));
        }
    };
}

/// Log at [`log::Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($ent:expr ; $($fmt:tt)+) => {
        $crate::log_at!($ent ; $crate::log::Level::Trace, $($fmt)+)
    };
}

/// Log at [`log::Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($ent:expr ; $($fmt:tt)+) => {
        $crate::log_at!($ent ; $crate::log::Level::Debug, $($fmt)+)
    };
}

/// Log at [`log::Level::Info`].
#[macro_export]
macro_rules! info {
    ($ent:expr ; $($fmt:tt)+) => {
        $crate::log_at!($ent ; $crate::log::Level::Info, $($fmt)+)
    };
}

/// Log at [`log::Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($ent:expr ; $($fmt:tt)+) => {
        $crate::log_at!($ent ; $crate::log::Level::Warn, $($fmt)+)
    };
}

/// Log at [`log::Level::Error`].
#[macro_export]
macro_rules! error {
    ($ent:expr ; $($fmt:tt)+) => {
        $crate::log_at!($ent ; $crate::log::Level::Error, $($fmt)+)
    };
}
