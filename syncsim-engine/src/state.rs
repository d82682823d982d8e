// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per-node clock state and hop bookkeeping.

use std::collections::BTreeMap;

use crate::structural_error;
use crate::types::{NodeId, ROOT_NODE, SimResult};

/// Error (in ns) of every non-reference node before the first round.
pub const INITIAL_OFFSET_NS: f64 = 1e3;

/// The clock error and the protocol's claimed error bound of every node.
///
/// `error[i]` is the signed deviation of node `i` from true time and
/// `bound[i]` the non-negative worst-case error the protocol believes node
/// `i` has. Both are in nanoseconds and always have the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct ClockState {
    pub error: Vec<f64>,
    pub bound: Vec<f64>,
}

impl ClockState {
    /// Create a state from explicit error and bound vectors.
    pub fn new(error: Vec<f64>, bound: Vec<f64>) -> Result<Self, crate::types::SimError> {
        if error.len() != bound.len() {
            return structural_error!(
                "{} errors given for {} bounds",
                error.len(),
                bound.len()
            );
        }
        if let Some(b) = bound.iter().find(|b| !(**b >= 0.0)) {
            return structural_error!("bound {b} is negative");
        }
        Ok(Self { error, bound })
    }

    /// The state every simulation starts from: the reference node is exact and
    /// all other nodes are [`INITIAL_OFFSET_NS`] out with a matching bound.
    #[must_use]
    pub fn initial(node_count: usize) -> Self {
        let mut error = vec![INITIAL_OFFSET_NS; node_count];
        if let Some(root) = error.first_mut() {
            *root = 0.0;
        }
        Self {
            bound: error.clone(),
            error,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.error.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.error.is_empty()
    }

    #[must_use]
    pub fn mean_error(&self) -> f64 {
        mean(&self.error)
    }

    /// Shift every error so that the population has zero mean.
    pub fn recenter(&mut self) {
        recenter(&mut self.error);
    }

    /// Shift the errors of the given nodes so that they have zero mean. Other
    /// nodes are left untouched.
    pub fn recenter_nodes(&mut self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        let avg = nodes.iter().map(|n| self.error[*n]).sum::<f64>() / nodes.len() as f64;
        for node in nodes {
            self.error[*node] -= avg;
        }
    }

    /// Force the reference node back to zero error and zero bound.
    pub fn pin_root(&mut self) {
        if !self.is_empty() {
            self.error[ROOT_NODE] = 0.0;
            self.bound[ROOT_NODE] = 0.0;
        }
    }

    /// Return a copy of this state with the given nodes left out.
    #[must_use]
    pub fn without_nodes(&self, excluded: &[NodeId]) -> Self {
        let keep = |(i, _): &(usize, &f64)| !excluded.contains(i);
        Self {
            error: self.error.iter().enumerate().filter(keep).map(|(_, v)| *v).collect(),
            bound: self.bound.iter().enumerate().filter(keep).map(|(_, v)| *v).collect(),
        }
    }

    pub(crate) fn check_invariants(&self, node_count: usize) -> SimResult {
        if self.error.len() != node_count || self.bound.len() != node_count {
            return structural_error!(
                "state has {} errors and {} bounds for {node_count} nodes",
                self.error.len(),
                self.bound.len()
            );
        }
        if let Some((node, b)) = self.bound.iter().enumerate().find(|(_, b)| !(**b >= 0.0)) {
            return structural_error!("node {node} has negative bound {b}");
        }
        Ok(())
    }
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Subtract the mean from every value.
pub fn recenter(values: &mut [f64]) {
    let avg = mean(values);
    for v in values.iter_mut() {
        *v -= avg;
    }
}

/// Hop bookkeeping for tree-propagating algorithms.
///
/// The tracker holds, per node, the hop count from the reference along the
/// path last used to synchronise it. The counter is a histogram of how many
/// synchronisation events happened at each hop count over the whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathLengths {
    tracker: Vec<usize>,
    counter: BTreeMap<usize, u64>,
}

impl PathLengths {
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            tracker: vec![0; node_count],
            counter: BTreeMap::new(),
        }
    }

    /// Record that `node` has just been synchronised from `via`.
    pub fn record(&mut self, node: NodeId, via: NodeId) {
        let hop_count = self.tracker[via] + 1;
        self.tracker[node] = hop_count;
        *self.counter.entry(hop_count).or_insert(0) += 1;
    }

    #[must_use]
    pub fn hop_count(&self, node: NodeId) -> usize {
        self.tracker[node]
    }

    #[must_use]
    pub fn tracker(&self) -> &[usize] {
        &self.tracker
    }

    #[must_use]
    pub fn counter(&self) -> &BTreeMap<usize, u64> {
        &self.counter
    }
}
