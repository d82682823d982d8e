// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Time-sliced network topologies.
//!
//! A reconfigurable network is described by a list of [`Circuit`]s, each of
//! which connects two nodes during one time slice. [`generate`] turns such a
//! list (or a single static graph) into a [`TopologySchedule`]: one
//! [`TopologySlice`] per time slice. The schedule loops, so the slice in use at
//! any time is found by reducing the slice index modulo the schedule length.
//!
//! The generators in [`generators`] produce circuit lists for common switching
//! patterns.

use std::collections::BTreeMap;
use std::fmt;

use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::config_error;
use crate::types::{NodeId, SimError};

pub mod generators;

/// Port numbers used by the two ends of a link.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ports {
    /// Port on the first node.
    pub a: usize,

    /// Port on the second node.
    pub b: usize,
}

impl Ports {
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    #[must_use]
    fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }
}

/// A single scheduled connection between two nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Circuit {
    pub slice: usize,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub port_a: usize,
    pub port_b: usize,
}

impl Circuit {
    #[must_use]
    pub fn new(slice: usize, node_a: NodeId, node_b: NodeId, port_a: usize, port_b: usize) -> Self {
        Self {
            slice,
            node_a,
            node_b,
            port_a,
            port_b,
        }
    }

    #[must_use]
    pub fn is_loop_back(&self) -> bool {
        self.node_a == self.node_b
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}(p{}) <-> {}(p{})",
            self.slice, self.node_a, self.port_a, self.node_b, self.port_b
        )
    }
}

/// The undirected graph of links that exist during one time slice.
///
/// Node ids are preserved when nodes are removed, so a slice with failed nodes
/// still uses the same numbering as the full network.
#[derive(Clone, Debug)]
pub struct TopologySlice {
    graph: StableUnGraph<(), Ports>,
}

impl TopologySlice {
    /// Create a slice containing `node_count` nodes and no links.
    #[must_use]
    pub fn edgeless(node_count: usize) -> Self {
        let mut graph = StableUnGraph::with_capacity(node_count, 0);
        for _ in 0..node_count {
            graph.add_node(());
        }
        Self { graph }
    }

    /// Create a slice from a list of links that all use port 0.
    pub fn from_edges(node_count: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, SimError> {
        let mut slice = Self::edgeless(node_count);
        for (a, b) in edges {
            slice.connect(*a, *b, Ports::default())?;
        }
        Ok(slice)
    }

    /// Add (or relabel) the link between `a` and `b`.
    pub fn connect(&mut self, a: NodeId, b: NodeId, ports: Ports) -> Result<(), SimError> {
        for node in [a, b] {
            if !self.contains_node(node) {
                return config_error!("node {node} is not part of this topology");
            }
        }
        self.graph
            .update_edge(NodeIndex::new(a), NodeIndex::new(b), ports);
        Ok(())
    }

    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(NodeIndex::new(node))
    }

    /// Number of nodes still present.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Ids of the nodes present, in ascending order.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.graph.node_indices().map(NodeIndex::index).collect();
        nodes.sort_unstable();
        nodes
    }

    /// Number of links, including loop-back links.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All links as `(low id, high id)` pairs in ascending order.
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b))
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// The other nodes linked to `node`, in ascending order.
    ///
    /// Loop-back links are not neighbours. A node that is not present has no
    /// neighbours.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        if !self.contains_node(node) {
            return Vec::new();
        }
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors(NodeIndex::new(node))
            .map(NodeIndex::index)
            .filter(|n| *n != node)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    #[must_use]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.contains_node(a)
            && self.contains_node(b)
            && self
                .graph
                .find_edge(NodeIndex::new(a), NodeIndex::new(b))
                .is_some()
    }

    /// The ports used by the link between `a` and `b`, as seen from `a`.
    #[must_use]
    pub fn ports(&self, a: NodeId, b: NodeId) -> Option<Ports> {
        if !self.has_edge(a, b) {
            return None;
        }
        let edge = self.graph.find_edge(NodeIndex::new(a), NodeIndex::new(b))?;
        let (source, _) = self.graph.edge_endpoints(edge)?;
        let ports = *self.graph.edge_weight(edge)?;
        if source.index() == a {
            Some(ports)
        } else {
            Some(ports.swapped())
        }
    }

    /// A copy of this slice with the given nodes (and their links) removed.
    #[must_use]
    pub fn without_nodes(&self, failed: &[NodeId]) -> Self {
        let mut slice = self.clone();
        for node in failed {
            slice.graph.remove_node(NodeIndex::new(*node));
        }
        slice
    }

    /// A copy of this slice with the given links removed.
    #[must_use]
    pub fn without_edges(&self, failed: &[(NodeId, NodeId)]) -> Self {
        let mut slice = self.clone();
        for (a, b) in failed {
            if !slice.has_edge(*a, *b) {
                continue;
            }
            if let Some(edge) = slice
                .graph
                .find_edge(NodeIndex::new(*a), NodeIndex::new(*b))
            {
                slice.graph.remove_edge(edge);
            }
        }
        slice
    }

    /// Number of hops from `source` to every node reachable from it.
    #[must_use]
    pub fn hop_distances_from(&self, source: NodeId) -> BTreeMap<NodeId, usize> {
        if !self.contains_node(source) {
            return BTreeMap::new();
        }
        dijkstra(&self.graph, NodeIndex::new(source), None, |_| 1_usize)
            .into_iter()
            .map(|(node, hops)| (node.index(), hops))
            .collect()
    }
}

/// Where a schedule comes from.
#[derive(Clone, Debug)]
pub enum TopologySource {
    /// A single graph that never changes.
    Static(TopologySlice),

    /// A list of circuits over a number of time slices.
    Circuits(Vec<Circuit>),
}

/// Map from time-slice index to the topology in use during that slice.
#[derive(Clone, Debug)]
pub struct TopologySchedule {
    node_count: usize,
    slices: Vec<TopologySlice>,
}

impl TopologySchedule {
    /// Number of time slices before the schedule repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// A schedule always has at least one slice.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Number of nodes the schedule was built for.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The slice with the given index, reduced modulo the schedule length.
    #[must_use]
    pub fn slice(&self, index: usize) -> &TopologySlice {
        &self.slices[index % self.slices.len()]
    }

    /// The slice index in use after `elapsed_ns` of simulated time.
    #[must_use]
    pub fn slice_index_at(&self, elapsed_ns: u64, slice_duration_ns: u64) -> usize {
        let slot = elapsed_ns / slice_duration_ns.max(1);
        (slot % self.slices.len() as u64) as usize
    }

    /// The slice in use after `elapsed_ns` of simulated time.
    #[must_use]
    pub fn slice_at(&self, elapsed_ns: u64, slice_duration_ns: u64) -> &TopologySlice {
        &self.slices[self.slice_index_at(elapsed_ns, slice_duration_ns)]
    }

    pub fn slices(&self) -> impl Iterator<Item = &TopologySlice> {
        self.slices.iter()
    }
}

/// Build the schedule for `node_count` nodes.
///
/// A static graph gives a one-slice schedule. Circuits fill slices `0` to the
/// highest slice index used; slices without circuits have no links. An empty
/// circuit list gives a single slice with no links.
pub fn generate(node_count: usize, source: TopologySource) -> Result<TopologySchedule, SimError> {
    match source {
        TopologySource::Static(slice) => {
            if slice.node_count() != node_count {
                return config_error!(
                    "static topology has {} nodes, expected {node_count}",
                    slice.node_count()
                );
            }
            Ok(TopologySchedule {
                node_count,
                slices: vec![slice],
            })
        }
        TopologySource::Circuits(circuits) => {
            let mut slices = vec![TopologySlice::edgeless(node_count); num_slices(&circuits)];
            for circuit in &circuits {
                if circuit.node_a >= node_count || circuit.node_b >= node_count {
                    return config_error!(
                        "circuit {circuit} uses a node outside 0..{node_count}"
                    );
                }
                slices[circuit.slice].connect(
                    circuit.node_a,
                    circuit.node_b,
                    Ports::new(circuit.port_a, circuit.port_b),
                )?;
            }
            Ok(TopologySchedule { node_count, slices })
        }
    }
}

/// Number of time slices covered by a circuit list.
#[must_use]
pub fn num_slices(circuits: &[Circuit]) -> usize {
    circuits.iter().map(|c| c.slice).max().unwrap_or(0) + 1
}

/// Number of links per node used by a circuit list.
#[must_use]
pub fn num_links(circuits: &[Circuit]) -> usize {
    circuits
        .iter()
        .map(|c| c.port_a.max(c.port_b))
        .max()
        .unwrap_or(0)
        + 1
}

/// Spread every circuit over `num_links` consecutive slices, offset by its
/// port, so that only one port of each node is reconfigured per slice.
///
/// Both ends of every circuit must use the same port.
pub fn port_offset(circuits: &[Circuit]) -> Result<Vec<Circuit>, SimError> {
    let slices = num_slices(circuits);
    let links = num_links(circuits);
    let period = slices * links;

    let mut offset = Vec::with_capacity(circuits.len() * links);
    for circuit in circuits {
        if circuit.port_a != circuit.port_b {
            return config_error!("port offset needs matching ports, got {circuit}");
        }
        let start = circuit.slice * links + circuit.port_a;
        for slice in start..start + links {
            offset.push(Circuit {
                slice: slice % period,
                ..*circuit
            });
        }
    }
    Ok(offset)
}

/// Fisher-Pearson skewness of how often each node pair is connected over the
/// whole schedule.
///
/// A schedule with no links, or one that serves every pair equally, has a
/// skewness of zero.
#[must_use]
pub fn skewness(schedule: &TopologySchedule) -> f64 {
    let mut pair_counts: BTreeMap<(NodeId, NodeId), u64> = BTreeMap::new();
    for slice in schedule.slices() {
        for pair in slice.edges() {
            *pair_counts.entry(pair).or_insert(0) += 1;
        }
    }

    if pair_counts.is_empty() {
        return 0.0;
    }
    let values: Vec<f64> = pair_counts.values().map(|v| *v as f64).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}
