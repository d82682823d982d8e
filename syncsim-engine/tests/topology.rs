// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::collections::BTreeSet;

use syncsim_engine::algorithms::spanning_tree::bfs_tree_edges;
use syncsim_engine::test_helpers::seeded_rng;
use syncsim_engine::topology::generators::{
    TopologyKind, opera, opera_skew, round_robin, shale, star, static_tree,
};
use syncsim_engine::topology::{
    TopologySlice, TopologySource, generate, num_slices, port_offset, skewness,
};
use syncsim_engine::types::{ROOT_NODE, SimError};

#[test]
fn round_robin_of_four() {
    let circuits = round_robin(4, 1).unwrap();
    let slices: BTreeSet<usize> = circuits.iter().map(|c| c.slice).collect();
    assert_eq!(slices, BTreeSet::from([0, 1, 2]));

    let schedule = generate(4, TopologySource::Circuits(circuits)).unwrap();
    for slice in schedule.slices() {
        assert_eq!(slice.edge_count(), 2);
        for node in 0..4 {
            assert_eq!(slice.degree(node), 1);
        }
    }
}

#[test]
fn opera_skew_circuit_counts() {
    for node_count in [6, 8, 16] {
        let plain = opera_skew(node_count, 2, 0).unwrap();
        assert_eq!(plain, opera_skew(node_count, 2, 0).unwrap());
        for ratio in 1..4 {
            assert!(opera_skew(node_count, 2, ratio).unwrap().len() > plain.len());
        }
    }
}

#[test]
fn opera_gives_every_node_its_links() {
    let circuits = opera(&mut seeded_rng(), 16, 4).unwrap();
    let schedule = generate(16, TopologySource::Circuits(circuits)).unwrap();
    assert_eq!(schedule.len(), 4);
    for slice in schedule.slices() {
        for node in 0..16 {
            // Four links per node, one of which may be a loop-back.
            assert!((3..=4).contains(&slice.degree(node)));
        }
    }
}

#[test]
fn spanning_tree_root_never_a_child() {
    let path_edges: Vec<(usize, usize)> = (1..10).map(|i| (i - 1, i)).collect();
    let slices = [
        star(10).unwrap(),
        TopologySlice::from_edges(10, &path_edges).unwrap(),
        static_tree(10, 3).unwrap(),
    ];
    for slice in &slices {
        let edges = bfs_tree_edges(slice, ROOT_NODE, 10);
        assert_eq!(edges.len(), 9);
        assert!(edges.iter().all(|(_, child)| *child != ROOT_NODE));
    }

    let circuits = opera(&mut seeded_rng(), 12, 3).unwrap();
    let schedule = generate(12, TopologySource::Circuits(circuits)).unwrap();
    for slice in schedule.slices() {
        let edges = bfs_tree_edges(slice, ROOT_NODE, 12);
        assert!(edges.iter().all(|(_, child)| *child != ROOT_NODE));
    }
}

#[test]
fn shale_rejects_non_powers() {
    assert!(matches!(shale(12, 2), Err(SimError::Configuration(_))));
    let circuits = shale(16, 2).unwrap();
    assert_eq!(num_slices(&circuits), 3);
}

#[test]
fn kinds_build_schedules() {
    let mut rng = seeded_rng();
    for kind in [
        TopologyKind::StaticTree,
        TopologyKind::Star,
        TopologyKind::Opera,
        TopologyKind::OperaSkew,
        TopologyKind::Shale,
    ] {
        let source = kind.build(&mut rng, 16, 2, Some(1)).unwrap();
        let schedule = generate(16, source).unwrap();
        assert!(!schedule.is_empty());
        assert_eq!(schedule.node_count(), 16);
    }
    assert!(TopologyKind::RoundRobin.build(&mut rng, 16, 2, None).is_err());
}

#[test]
fn port_offset_schedule() {
    let circuits = opera_skew(8, 2, 0).unwrap();
    let offset = port_offset(&circuits).unwrap();
    assert_eq!(offset.len(), circuits.len() * 2);
    assert_eq!(num_slices(&offset), num_slices(&circuits) * 2);
}

#[test]
fn skew_raises_skewness() {
    let plain = generate(8, TopologySource::Circuits(opera_skew(8, 1, 0).unwrap())).unwrap();
    let skewed = generate(8, TopologySource::Circuits(opera_skew(8, 1, 2).unwrap())).unwrap();
    assert!(skewness(&skewed) > skewness(&plain));
}
