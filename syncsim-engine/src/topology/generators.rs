// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Generators for common network topologies.
//!
//! Static generators return a [`TopologySlice`]; switching patterns return a
//! list of [`Circuit`]s that [`generate`](super::generate) turns into a
//! schedule.

use std::fmt;

use clap::ValueEnum;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{Circuit, Ports, TopologySlice, TopologySource, num_slices};
use crate::config_error;
use crate::types::{NodeId, SimError};

/// The topology generators that can be selected by name.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    /// Full tree where every node has `link_count` children.
    StaticTree,

    /// Node 0 linked to every other node.
    Star,

    /// Circle-method round robin, one link per node.
    RoundRobin,

    /// Shuffled round robin merged onto `link_count` links per node.
    #[default]
    Opera,

    /// Opera without shuffling, with the first half of the schedule repeated.
    OperaSkew,

    /// One round robin per dimension of a `link_count`-dimensional cube.
    Shale,
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopologyKind::StaticTree => "static-tree",
            TopologyKind::Star => "star",
            TopologyKind::RoundRobin => "round-robin",
            TopologyKind::Opera => "opera",
            TopologyKind::OperaSkew => "opera-skew",
            TopologyKind::Shale => "shale",
        };
        write!(f, "{name}")
    }
}

impl TopologyKind {
    /// Whether this generator takes a skew ratio.
    #[must_use]
    pub fn takes_skew(&self) -> bool {
        matches!(self, TopologyKind::OperaSkew)
    }

    /// Run the generator.
    ///
    /// `skew_ratio` is only used by [`TopologyKind::OperaSkew`], where it
    /// defaults to zero.
    pub fn build<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        node_count: usize,
        link_count: usize,
        skew_ratio: Option<usize>,
    ) -> Result<TopologySource, SimError> {
        let source = match self {
            TopologyKind::StaticTree => {
                TopologySource::Static(static_tree(node_count, link_count)?)
            }
            TopologyKind::Star => TopologySource::Static(star(node_count)?),
            TopologyKind::RoundRobin => {
                TopologySource::Circuits(round_robin(node_count, link_count)?)
            }
            TopologyKind::Opera => TopologySource::Circuits(opera(rng, node_count, link_count)?),
            TopologyKind::OperaSkew => TopologySource::Circuits(opera_skew(
                node_count,
                link_count,
                skew_ratio.unwrap_or(0),
            )?),
            TopologyKind::Shale => TopologySource::Circuits(shale(node_count, link_count)?),
        };
        Ok(source)
    }
}

/// A full tree in which node `i` is the parent of nodes
/// `branching * i + 1 ..= branching * i + branching`.
pub fn static_tree(node_count: usize, branching: usize) -> Result<TopologySlice, SimError> {
    if branching == 0 {
        return config_error!("a tree needs a branching factor of at least 1");
    }
    let mut tree = TopologySlice::edgeless(node_count);
    for child in 1..node_count {
        tree.connect((child - 1) / branching, child, Ports::default())?;
    }
    Ok(tree)
}

/// Node 0 linked to every other node.
pub fn star(node_count: usize) -> Result<TopologySlice, SimError> {
    if node_count < 2 {
        return config_error!("a star needs at least 2 nodes, got {node_count}");
    }
    let mut star = TopologySlice::edgeless(node_count);
    for leaf in 1..node_count {
        star.connect(0, leaf, Ports::default())?;
    }
    Ok(star)
}

/// Round robin over all nodes with one link per node.
///
/// Every pair of nodes is connected exactly once over `node_count - 1` slices
/// (`node_count` slices when the count is odd, one node sitting out each
/// slice).
pub fn round_robin(node_count: usize, link_count: usize) -> Result<Vec<Circuit>, SimError> {
    if link_count != 1 {
        return config_error!(
            "round robin only supports one link per node, got {link_count}; use opera for more"
        );
    }
    let nodes: Vec<NodeId> = (0..node_count).collect();
    Ok(round_robin_over(&nodes, 0, false))
}

/// The circle method over the given nodes.
///
/// An odd count is padded with a dummy node that is never connected. With
/// `loop_back` a final slice connects every node to itself.
fn round_robin_over(nodes: &[NodeId], port: usize, loop_back: bool) -> Vec<Circuit> {
    let mut ring: Vec<Option<NodeId>> = nodes.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let padded = ring.len();
    let rounds = padded.saturating_sub(1);

    let mut circuits = Vec::with_capacity(rounds * padded / 2 + padded);
    for slice in 0..rounds {
        for i in 0..padded / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[padded - 1 - i]) {
                circuits.push(Circuit::new(slice, a, b, port, port));
            }
        }
        // Keep the first node fixed and rotate the rest one place.
        if let Some(last) = ring.pop() {
            ring.insert(1, last);
        }
    }

    if loop_back {
        for node in ring.iter().flatten() {
            circuits.push(Circuit::new(rounds, *node, *node, port, port));
        }
    }
    circuits
}

fn check_link_count(link_count: usize) -> Result<(), SimError> {
    if link_count == 0 {
        return config_error!("at least one link per node is needed");
    }
    Ok(())
}

/// Merge every `link_count` consecutive slices into one, giving each merged
/// circuit the port `slice % link_count`.
fn merge_slices(circuits: &[Circuit], link_count: usize) -> Vec<Circuit> {
    circuits
        .iter()
        .map(|c| {
            let port = c.slice % link_count;
            Circuit::new(c.slice / link_count, c.node_a, c.node_b, port, port)
        })
        .collect()
}

/// Round robin (with its loop-back slice) whose slices are shuffled and then
/// merged so that every node has `link_count` links per slice.
pub fn opera<R: Rng + ?Sized>(
    rng: &mut R,
    node_count: usize,
    link_count: usize,
) -> Result<Vec<Circuit>, SimError> {
    check_link_count(link_count)?;
    let nodes: Vec<NodeId> = (0..node_count).collect();
    let base = round_robin_over(&nodes, 0, true);

    let mut shuffled: Vec<usize> = (0..num_slices(&base)).collect();
    shuffled.shuffle(rng);
    let mut randomized: Vec<Circuit> = base
        .iter()
        .map(|c| Circuit {
            slice: shuffled[c.slice],
            ..*c
        })
        .collect();
    randomized.sort_by_key(|c| c.slice);

    Ok(merge_slices(&randomized, link_count))
}

/// Opera without the shuffle, where every circuit in the first half of the
/// schedule is repeated `skew_ratio` more times, each copy offset by another
/// half schedule.
pub fn opera_skew(
    node_count: usize,
    link_count: usize,
    skew_ratio: usize,
) -> Result<Vec<Circuit>, SimError> {
    check_link_count(link_count)?;
    let nodes: Vec<NodeId> = (0..node_count).collect();
    let merged = merge_slices(&round_robin_over(&nodes, 0, true), link_count);
    if skew_ratio == 0 {
        return Ok(merged);
    }

    let half = num_slices(&merged) / 2;
    let mut skewed = Vec::with_capacity(merged.len() * (skew_ratio + 1));
    for circuit in &merged {
        skewed.push(*circuit);
        if circuit.slice < half {
            for i in 1..=skew_ratio {
                skewed.push(Circuit {
                    slice: circuit.slice + half * i,
                    ..*circuit
                });
            }
        }
    }
    if skewed.len() == merged.len() {
        return config_error!("{node_count} nodes give too few slices to skew");
    }
    skewed.sort_by_key(|c| c.slice);
    Ok(skewed)
}

/// Integer `d`-th root of `n`, if there is one.
fn exact_root(n: usize, dimensions: usize) -> Option<usize> {
    let exponent = u32::try_from(dimensions).ok()?;
    let guess = (n as f64).powf(1.0 / dimensions as f64).round() as usize;
    [guess.saturating_sub(1), guess, guess + 1]
        .into_iter()
        .find(|root| root.checked_pow(exponent) == Some(n))
}

/// Arrange the nodes as a `dimensions`-dimensional cube (last coordinate
/// varying fastest) and run a round robin along every line of the cube. Lines
/// along axis `k` use port `k`.
pub fn shale(node_count: usize, dimensions: usize) -> Result<Vec<Circuit>, SimError> {
    if dimensions == 0 {
        return config_error!("shale needs at least one dimension");
    }
    let Some(side) = exact_root(node_count, dimensions) else {
        return config_error!(
            "shale needs the node count to be a power of {dimensions}, got {node_count}"
        );
    };

    // Stride of each axis in the flattened cube.
    let strides: Vec<usize> = (0..dimensions)
        .map(|axis| side.pow((dimensions - 1 - axis) as u32))
        .collect();
    let lines_per_axis = side.pow((dimensions - 1) as u32);

    let mut circuits = Vec::new();
    for axis in 0..dimensions {
        let other_strides: Vec<usize> = (0..dimensions)
            .filter(|a| *a != axis)
            .map(|a| strides[a])
            .collect();
        for line in 0..lines_per_axis {
            // Decode the fixed coordinates, most significant first.
            let mut base = 0;
            let mut rest = line;
            for stride in other_strides.iter().rev() {
                base += (rest % side) * stride;
                rest /= side;
            }
            let nodes: Vec<NodeId> = (0..side).map(|i| base + i * strides[axis]).collect();
            circuits.extend(round_robin_over(&nodes, axis, false));
        }
    }
    Ok(circuits)
}
