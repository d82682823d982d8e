// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! Round-based simulation of clock synchronisation in reconfigurable
//! networks.
//!
//! A [`Simulator`](crate::simulator::Simulator) advances simulated time in
//! fixed synchronisation rounds. Each round the
//! [topology schedule](crate::topology) decides which links exist, a
//! [synchronisation algorithm](crate::algorithms) updates every node's clock
//! error and error bound, and the [drift model](crate::drift) makes the clocks
//! wander apart again. The state after every round is kept so that error
//! distributions of different algorithms can be compared on identical inputs.
//!
//! # Simple Application
//!
//! ```rust
//! use syncsim_engine::algorithms::SyncAlgorithmKind;
//! use syncsim_engine::config::{RunLength, SimulatorConfig};
//! use syncsim_engine::simulator::Simulator;
//! use syncsim_engine::summary::RunSummary;
//! use syncsim_track::entity::toplevel;
//! use syncsim_track::tracker::dev_null_tracker;
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let config = SimulatorConfig {
//!     sync_algorithm: SyncAlgorithmKind::Syncwise,
//!     node_count: 16,
//!     link_count: 2,
//!     ..SimulatorConfig::default()
//! };
//! let mut sim = Simulator::new(&top, config).expect("config should be valid");
//! sim.run(RunLength::Rounds(32)).expect("run should succeed");
//!
//! assert_eq!(sim.get_clock_errors(0).len(), 32);
//! let summary = RunSummary::from_simulator(&sim, 16).expect("rounds were recorded");
//! assert!(summary.bound_max >= summary.bound_p99);
//! ```

pub mod algorithms;
pub mod config;
pub mod drift;
pub mod failure;
pub mod simulator;
pub mod state;
pub mod summary;
pub mod test_helpers;
pub mod topology;
pub mod types;
