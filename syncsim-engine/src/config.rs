// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Configuration of a single simulation.
//!
//! [`SimulatorConfig`] is the complete set of options a
//! [`Simulator`](crate::simulator::Simulator) is built from. Every field has a
//! default so that partial configurations (for example a TOML file setting
//! only a few options) can be layered on top of [`SimulatorConfig::default`].

use serde::{Deserialize, Serialize};

use crate::algorithms::{SyncAlgorithmKind, SyncParams};
use crate::config_error;
use crate::drift::{
    DEFAULT_DRIFT_BOUND_PPM, DEFAULT_DRIFT_VARIANCE_BOUND_PPM, DEFAULT_HOP_ERROR_BOUND_NS,
    DEFAULT_PATH_ASYMMETRY_BOUND_NS,
};
use crate::topology::generators::TopologyKind;
use crate::types::{NodeId, ROOT_NODE, SimResult};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Name of the run, used in logs and summaries.
    pub name: String,

    pub sync_algorithm: SyncAlgorithmKind,

    /// Number of nodes. Node 0 is the reference clock.
    pub node_count: usize,

    /// Links per node (the branching factor for trees and the number of
    /// dimensions for shale).
    pub link_count: usize,

    pub topology_generator: TopologyKind,

    /// Bound of the static drift rate (ppm).
    pub drift_bound: f64,

    /// Bound of the drift variance (ppm).
    pub drift_variance_bound: f64,

    /// Bound of the measurement error of one hop (ns).
    pub hop_error_bound: f64,

    /// Bound of the asymmetry of a multi-hop path (ns).
    pub path_asymmetry_bound: f64,

    /// Simulated time between synchronisation rounds (ns).
    pub sync_interval_ns: u64,

    /// Duration of one topology slice (ns).
    pub slice_duration_ns: u64,

    /// Only apply drift variance (`true`) rather than the full drift rate.
    pub offset_drift: bool,

    /// Nodes removed from every slice.
    pub failed_nodes: Vec<NodeId>,

    /// Links removed from every slice.
    pub failed_links: Vec<(NodeId, NodeId)>,

    /// Number of links to pick at random (spread over all slices) and remove.
    pub random_failed_links: usize,

    /// Round at which the schedule is rebuilt with the second skew ratio.
    pub topology_update_round: Option<u64>,

    /// Skew ratios `(initial, after update)` for generators that take one.
    pub topology_args: Option<(usize, usize)>,

    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            name: "syncsim".to_string(),
            sync_algorithm: SyncAlgorithmKind::default(),
            node_count: 8,
            link_count: 2,
            topology_generator: TopologyKind::default(),
            drift_bound: DEFAULT_DRIFT_BOUND_PPM,
            drift_variance_bound: DEFAULT_DRIFT_VARIANCE_BOUND_PPM,
            hop_error_bound: DEFAULT_HOP_ERROR_BOUND_NS,
            path_asymmetry_bound: DEFAULT_PATH_ASYMMETRY_BOUND_NS,
            sync_interval_ns: 100_000,
            slice_duration_ns: 100_000,
            offset_drift: true,
            failed_nodes: Vec::new(),
            failed_links: Vec::new(),
            random_failed_links: 0,
            topology_update_round: None,
            topology_args: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulatorConfig {
    #[must_use]
    pub fn sync_params(&self) -> SyncParams {
        SyncParams {
            hop_error_bound: self.hop_error_bound,
            path_asymmetry_bound: self.path_asymmetry_bound,
            base_root_degree: None,
        }
    }

    /// Check that the options can be used together.
    pub fn validate(&self) -> SimResult {
        let link_failures = !self.failed_links.is_empty() || self.random_failed_links > 0;
        if !self.failed_nodes.is_empty() && link_failures {
            return config_error!("only one type of failure can be set at a time");
        }
        if self.node_count == 0 {
            return config_error!("at least one node is needed");
        }
        if self.sync_interval_ns == 0 {
            return config_error!("the sync interval must be non-zero");
        }
        if self.slice_duration_ns == 0 {
            return config_error!("the slice duration must be non-zero");
        }

        for (name, bound) in [
            ("drift_bound", self.drift_bound),
            ("drift_variance_bound", self.drift_variance_bound),
            ("hop_error_bound", self.hop_error_bound),
            ("path_asymmetry_bound", self.path_asymmetry_bound),
        ] {
            if !bound.is_finite() || bound < 0.0 {
                return config_error!("{name} must be finite and non-negative, got {bound}");
            }
        }

        if let Some(node) = self.failed_nodes.iter().find(|n| **n >= self.node_count) {
            return config_error!("failed node {node} is not in 0..{}", self.node_count);
        }
        if let Some((a, b)) = self
            .failed_links
            .iter()
            .find(|(a, b)| *a >= self.node_count || *b >= self.node_count)
        {
            return config_error!("failed link ({a}, {b}) is not in 0..{}", self.node_count);
        }
        if self.sync_algorithm.uses_root() && self.failed_nodes.contains(&ROOT_NODE) {
            return config_error!(
                "{} synchronises to node {ROOT_NODE} which cannot fail",
                self.sync_algorithm
            );
        }

        if self.topology_update_round.is_some() && self.topology_args.is_none() {
            return config_error!("a topology update needs topology args");
        }
        if self.topology_args.is_some() && !self.topology_generator.takes_skew() {
            return config_error!(
                "topology generator {} does not take topology args",
                self.topology_generator
            );
        }
        Ok(())
    }
}

/// How long to run for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunLength {
    /// A number of synchronisation rounds.
    Rounds(u64),

    /// A simulated duration (ns), rounded up to whole rounds.
    DurationNs(u64),
}

impl RunLength {
    #[must_use]
    pub fn to_rounds(self, sync_interval_ns: u64) -> u64 {
        match self {
            RunLength::Rounds(rounds) => rounds,
            RunLength::DurationNs(duration) => duration.div_ceil(sync_interval_ns.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SimError;

    fn assert_config_error(config: &SimulatorConfig) {
        assert!(matches!(
            config.validate(),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn default_is_valid() {
        assert!(SimulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn one_failure_type() {
        let config = SimulatorConfig {
            failed_nodes: vec![1],
            failed_links: vec![(2, 3)],
            ..SimulatorConfig::default()
        };
        assert_config_error(&config);

        let config = SimulatorConfig {
            failed_nodes: vec![1],
            random_failed_links: 4,
            ..SimulatorConfig::default()
        };
        assert_config_error(&config);
    }

    #[test]
    fn bad_values() {
        assert_config_error(&SimulatorConfig {
            node_count: 0,
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            sync_interval_ns: 0,
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            hop_error_bound: -1.0,
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            drift_bound: f64::INFINITY,
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            failed_nodes: vec![8],
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            failed_links: vec![(0, 9)],
            ..SimulatorConfig::default()
        });
    }

    #[test]
    fn root_failure_depends_on_algorithm() {
        let tree = SimulatorConfig {
            failed_nodes: vec![0],
            sync_algorithm: SyncAlgorithmKind::Graham,
            ..SimulatorConfig::default()
        };
        assert_config_error(&tree);

        let consensus = SimulatorConfig {
            sync_algorithm: SyncAlgorithmKind::Dtp,
            ..tree
        };
        assert!(consensus.validate().is_ok());
    }

    #[test]
    fn topology_args() {
        assert_config_error(&SimulatorConfig {
            topology_update_round: Some(10),
            topology_generator: TopologyKind::OperaSkew,
            ..SimulatorConfig::default()
        });
        assert_config_error(&SimulatorConfig {
            topology_args: Some((0, 1)),
            topology_generator: TopologyKind::Opera,
            ..SimulatorConfig::default()
        });
        let config = SimulatorConfig {
            topology_args: Some((0, 1)),
            topology_update_round: Some(10),
            topology_generator: TopologyKind::OperaSkew,
            ..SimulatorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn run_length() {
        assert_eq!(RunLength::Rounds(7).to_rounds(100), 7);
        assert_eq!(RunLength::DurationNs(1000).to_rounds(100), 10);
        assert_eq!(RunLength::DurationNs(1001).to_rounds(100), 11);
        assert_eq!(RunLength::DurationNs(0).to_rounds(100), 0);
    }
}
