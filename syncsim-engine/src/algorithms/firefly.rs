// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Firefly-style averaging.
//!
//! [`Firefly`] gossips with randomly chosen peers anywhere in the network and
//! pays for every hop on the way to them. [`FireflyOptimized`] only averages
//! over direct neighbours. Both recenter the population afterwards and leave
//! bounds untouched.

use std::rc::Rc;

use rand::seq::index;
use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::trace;

use super::{SyncAlgorithm, SyncAlgorithmKind, SyncOutcome, SyncParams};
use crate::drift::{hop_error, path_asymmetry};
use crate::state::{ClockState, PathLengths};
use crate::topology::TopologySlice;
use crate::types::{NodeId, ROOT_NODE, SimError, SimRng};

/// Averaging over `k` random peers, where `k` is the degree of node 0 before
/// any failures.
///
/// Every hop on the shortest path to a peer adds one hop error and one path
/// asymmetry sample to the estimate. Peers that cannot be reached add no
/// noise.
pub struct Firefly {
    pub entity: Rc<Entity>,
}

impl Firefly {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for Firefly {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl SyncAlgorithm for Firefly {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::Firefly
    }

    fn sync(
        &self,
        rng: &mut SimRng,
        state: &ClockState,
        slice: &TopologySlice,
        params: &SyncParams,
        _paths: Option<&mut PathLengths>,
    ) -> Result<SyncOutcome, SimError> {
        let mut next = state.clone();
        let nodes = slice.nodes();
        let fan_out = params
            .base_root_degree
            .unwrap_or_else(|| slice.degree(ROOT_NODE));

        for node in &nodes {
            let candidates: Vec<NodeId> = nodes.iter().copied().filter(|n| n != node).collect();
            let k = fan_out.min(candidates.len());
            if k == 0 {
                trace!(self.entity ; "node {node} has no peers");
                continue;
            }

            let peers: Vec<NodeId> = index::sample(rng, candidates.len(), k)
                .into_iter()
                .map(|i| candidates[i])
                .collect();
            let hops = slice.hop_distances_from(*node);

            let mut noise = 0.0;
            for peer in &peers {
                let Some(hop_count) = hops.get(peer) else {
                    continue;
                };
                for _ in 0..*hop_count {
                    noise += hop_error(rng, params.hop_error_bound)
                        + path_asymmetry(rng, params.path_asymmetry_bound);
                }
            }

            let peer_errors: f64 = peers.iter().map(|p| state.error[*p]).sum();
            next.error[*node] = (peer_errors + noise) / k as f64;
            trace!(self.entity ; "node {node} averaged over {peers:?}");
        }
        next.recenter_nodes(&nodes);

        Ok(SyncOutcome {
            state: next,
            sync_count: 0,
        })
    }
}

/// Averaging over direct neighbours, with one hop error per neighbour.
pub struct FireflyOptimized {
    pub entity: Rc<Entity>,
}

impl FireflyOptimized {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for FireflyOptimized {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl SyncAlgorithm for FireflyOptimized {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::FireflyOptimized
    }

    fn sync(
        &self,
        rng: &mut SimRng,
        state: &ClockState,
        slice: &TopologySlice,
        params: &SyncParams,
        _paths: Option<&mut PathLengths>,
    ) -> Result<SyncOutcome, SimError> {
        let mut next = state.clone();
        let nodes = slice.nodes();

        for node in &nodes {
            let neighbors = slice.neighbors(*node);
            if neighbors.is_empty() {
                trace!(self.entity ; "node {node} has no neighbours");
                continue;
            }
            let total: f64 = neighbors
                .iter()
                .map(|n| state.error[*n] + hop_error(rng, params.hop_error_bound))
                .sum();
            next.error[*node] = total / neighbors.len() as f64;
        }
        next.recenter_nodes(&nodes);

        Ok(SyncOutcome {
            state: next,
            sync_count: 0,
        })
    }
}
