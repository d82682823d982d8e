// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The family of clock synchronisation algorithms.
//!
//! Every algorithm takes the clock state at the end of the previous round and
//! the topology slice in use, and returns a freshly built state for the next
//! round together with the number of synchronisation events that took place.
//! The previous state is never modified.
//!
//! Algorithms fall into two groups:
//!  - _tree-style_ algorithms ([`Syncwise`], [`SpanningTree`], [`Graham`])
//!    synchronise to the reference clock on node 0 and track a bound.
//!  - _consensus_ algorithms ([`Dtp`], [`Firefly`], [`FireflyOptimized`]) have
//!    no reference and recenter the population to zero mean instead.
//!
//! A node without any neighbour in the current slice keeps its previous state.

use std::fmt;
use std::rc::Rc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use syncsim_track::entity::{Entity, GetEntity};

use crate::drift::{DEFAULT_HOP_ERROR_BOUND_NS, DEFAULT_PATH_ASYMMETRY_BOUND_NS};
use crate::state::{ClockState, PathLengths};
use crate::topology::TopologySlice;
use crate::types::{SimError, SimRng};

pub mod dtp;
pub mod firefly;
pub mod graham;
pub mod spanning_tree;
pub mod syncwise;

pub use dtp::Dtp;
pub use firefly::{Firefly, FireflyOptimized};
pub use graham::Graham;
pub use spanning_tree::SpanningTree;
pub use syncwise::Syncwise;

/// Noise parameters shared by all algorithms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncParams {
    /// Bound (ns) of the measurement error of one hop.
    pub hop_error_bound: f64,

    /// Bound (ns) of the asymmetry of a multi-hop path.
    pub path_asymmetry_bound: f64,

    /// Degree of node 0 in the slice before failures were applied. `None`
    /// when the slice given to the algorithm is unfiltered.
    pub base_root_degree: Option<usize>,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self {
            hop_error_bound: DEFAULT_HOP_ERROR_BOUND_NS,
            path_asymmetry_bound: DEFAULT_PATH_ASYMMETRY_BOUND_NS,
            base_root_degree: None,
        }
    }
}

/// The result of one synchronisation round.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOutcome {
    pub state: ClockState,
    pub sync_count: usize,
}

/// A clock synchronisation algorithm.
pub trait SyncAlgorithm: GetEntity {
    /// Which algorithm this is.
    fn kind(&self) -> SyncAlgorithmKind;

    /// Compute the state after one synchronisation round.
    ///
    /// `paths` is only updated by algorithms that propagate along a tree; the
    /// others ignore it.
    fn sync(
        &self,
        rng: &mut SimRng,
        state: &ClockState,
        slice: &TopologySlice,
        params: &SyncParams,
        paths: Option<&mut PathLengths>,
    ) -> Result<SyncOutcome, SimError>;
}

/// The algorithms that can be selected by name.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAlgorithmKind {
    /// Every node adopts the neighbour with the best bound if it improves its
    /// own.
    #[default]
    Syncwise,

    /// Propagate from node 0 along a breadth-first spanning tree (PTP style).
    #[value(alias = "ptp")]
    #[serde(alias = "ptp")]
    SpanningTree,

    /// Every node follows the fastest neighbour; recentered each round.
    Dtp,

    /// Only direct neighbours of node 0 synchronise.
    Graham,

    /// Average over randomly chosen peers reached over multiple hops.
    Firefly,

    /// Average over direct neighbours only.
    FireflyOptimized,
}

impl fmt::Display for SyncAlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncAlgorithmKind::Syncwise => "syncwise",
            SyncAlgorithmKind::SpanningTree => "spanning-tree",
            SyncAlgorithmKind::Dtp => "dtp",
            SyncAlgorithmKind::Graham => "graham",
            SyncAlgorithmKind::Firefly => "firefly",
            SyncAlgorithmKind::FireflyOptimized => "firefly-optimized",
        };
        write!(f, "{name}")
    }
}

impl SyncAlgorithmKind {
    /// Create the algorithm as a child entity of `parent`.
    #[must_use]
    pub fn build(&self, parent: &Rc<Entity>) -> Box<dyn SyncAlgorithm> {
        let name = self.to_string();
        match self {
            SyncAlgorithmKind::Syncwise => Box::new(Syncwise::new(parent, &name)),
            SyncAlgorithmKind::SpanningTree => Box::new(SpanningTree::new(parent, &name)),
            SyncAlgorithmKind::Dtp => Box::new(Dtp::new(parent, &name)),
            SyncAlgorithmKind::Graham => Box::new(Graham::new(parent, &name)),
            SyncAlgorithmKind::Firefly => Box::new(Firefly::new(parent, &name)),
            SyncAlgorithmKind::FireflyOptimized => Box::new(FireflyOptimized::new(parent, &name)),
        }
    }

    /// Consensus algorithms have no reference clock and keep the population
    /// centred on zero instead.
    #[must_use]
    pub fn is_consensus(&self) -> bool {
        matches!(
            self,
            SyncAlgorithmKind::Dtp
                | SyncAlgorithmKind::Firefly
                | SyncAlgorithmKind::FireflyOptimized
        )
    }

    /// Whether the algorithm relies on node 0 being present.
    #[must_use]
    pub fn uses_root(&self) -> bool {
        !self.is_consensus()
    }

    /// Whether the algorithm keeps hop-count bookkeeping.
    #[must_use]
    pub fn tracks_paths(&self) -> bool {
        matches!(
            self,
            SyncAlgorithmKind::Syncwise | SyncAlgorithmKind::SpanningTree
        )
    }

    /// Whether drift variance should be biased towards the top of the tree.
    #[must_use]
    pub fn tree_biased_variance(&self) -> bool {
        matches!(self, SyncAlgorithmKind::SpanningTree)
    }
}
