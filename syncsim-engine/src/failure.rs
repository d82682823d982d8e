// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Node and link failures.
//!
//! Failures never modify the shared schedule: each round the slice in use is
//! copied and the failed nodes or links removed from the copy.

use std::borrow::Cow;

use rand::Rng;

use crate::config_error;
use crate::topology::{TopologySchedule, TopologySlice};
use crate::types::{NodeId, SimError};

/// The failures applied to every slice. Only one kind can be active.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Failures {
    #[default]
    None,
    Nodes(Vec<NodeId>),
    Links(Vec<(NodeId, NodeId)>),
}

impl Failures {
    pub fn new(nodes: Vec<NodeId>, links: Vec<(NodeId, NodeId)>) -> Result<Self, SimError> {
        match (nodes.is_empty(), links.is_empty()) {
            (true, true) => Ok(Failures::None),
            (false, true) => Ok(Failures::Nodes(nodes)),
            (true, false) => Ok(Failures::Links(links)),
            (false, false) => config_error!("only one type of failure can be set at a time"),
        }
    }

    /// The failed nodes, if nodes have failed.
    #[must_use]
    pub fn failed_nodes(&self) -> &[NodeId] {
        match self {
            Failures::Nodes(nodes) => nodes,
            _ => &[],
        }
    }

    /// The slice as seen with these failures.
    #[must_use]
    pub fn apply<'a>(&self, slice: &'a TopologySlice) -> Cow<'a, TopologySlice> {
        match self {
            Failures::None => Cow::Borrowed(slice),
            Failures::Nodes(nodes) => Cow::Owned(slice.without_nodes(nodes)),
            Failures::Links(links) => Cow::Owned(slice.without_edges(links)),
        }
    }
}

/// Pick `count / slices` links at random from every slice of the schedule.
///
/// Links are drawn with replacement, so the same link can be picked more than
/// once.
pub fn sample_failed_links<R: Rng + ?Sized>(
    rng: &mut R,
    schedule: &TopologySchedule,
    count: usize,
) -> Vec<(NodeId, NodeId)> {
    let per_slice = count / schedule.len();
    let mut failed = Vec::with_capacity(per_slice * schedule.len());
    for slice in schedule.slices() {
        let edges = slice.edges();
        if edges.is_empty() {
            continue;
        }
        for _ in 0..per_slice {
            failed.push(edges[rng.random_range(0..edges.len())]);
        }
    }
    failed
}
