// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! PTP-style propagation along a breadth-first spanning tree rooted at node 0.
//!
//! Parents are always synchronised before their children, so a child inherits
//! the bound and error its parent has just been given. With no hop noise every
//! node reachable from the root ends a round with the root's error.

use std::collections::VecDeque;
use std::rc::Rc;

use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::trace;

use super::{SyncAlgorithm, SyncAlgorithmKind, SyncOutcome, SyncParams};
use crate::drift::hop_error;
use crate::state::{ClockState, PathLengths};
use crate::structural_error;
use crate::topology::TopologySlice;
use crate::types::{NodeId, ROOT_NODE, SimError, SimRng};

pub struct SpanningTree {
    pub entity: Rc<Entity>,
}

impl SpanningTree {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for SpanningTree {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

/// The `(parent, child)` edges of the breadth-first tree from `root`, in the
/// order they are discovered. Neighbours are visited lowest id first.
pub fn bfs_tree_edges(
    slice: &TopologySlice,
    root: NodeId,
    node_count: usize,
) -> Vec<(NodeId, NodeId)> {
    let mut edges = Vec::new();
    if !slice.contains_node(root) {
        return edges;
    }

    let mut visited = vec![false; node_count];
    let mut queue = VecDeque::from([root]);
    visited[root] = true;
    while let Some(parent) = queue.pop_front() {
        for child in slice.neighbors(parent) {
            if !visited[child] {
                visited[child] = true;
                edges.push((parent, child));
                queue.push_back(child);
            }
        }
    }
    edges
}

impl SyncAlgorithm for SpanningTree {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::SpanningTree
    }

    fn sync(
        &self,
        rng: &mut SimRng,
        state: &ClockState,
        slice: &TopologySlice,
        params: &SyncParams,
        mut paths: Option<&mut PathLengths>,
    ) -> Result<SyncOutcome, SimError> {
        if !slice.contains_node(ROOT_NODE) {
            return structural_error!("spanning tree root {ROOT_NODE} is not in the topology");
        }

        let mut next = state.clone();
        let mut sync_count = 0;
        for (parent, child) in bfs_tree_edges(slice, ROOT_NODE, state.len()) {
            if child == ROOT_NODE {
                return structural_error!("root {ROOT_NODE} reached as a child of {parent}");
            }
            next.bound[child] = next.bound[parent] + params.hop_error_bound;
            next.error[child] = next.error[parent] + hop_error(rng, params.hop_error_bound);
            sync_count += 1;
            trace!(self.entity ; "{parent} -> {child}, bound {}", next.bound[child]);
            if let Some(paths) = paths.as_deref_mut() {
                paths.record(child, parent);
            }
        }

        Ok(SyncOutcome {
            state: next,
            sync_count,
        })
    }
}
