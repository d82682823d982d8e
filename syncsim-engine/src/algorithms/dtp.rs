// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! DTP-style internal synchronisation: every node follows the most advanced
//! of its neighbours and the whole population is recentered afterwards.
//! Bounds are not tracked.

use std::rc::Rc;

use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::trace;

use super::{SyncAlgorithm, SyncAlgorithmKind, SyncOutcome, SyncParams};
use crate::drift::hop_error;
use crate::state::{ClockState, PathLengths};
use crate::topology::TopologySlice;
use crate::types::{SimError, SimRng};

pub struct Dtp {
    pub entity: Rc<Entity>,
}

impl Dtp {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for Dtp {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl SyncAlgorithm for Dtp {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::Dtp
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
            let fastest = slice
                .neighbors(*node)
                .into_iter()
                .map(|n| state.error[n])
                .reduce(f64::max);
            match fastest {
                Some(error) => {
                    next.error[*node] = error + hop_error(rng, params.hop_error_bound);
                }
                None => trace!(self.entity ; "node {node} has no neighbours"),
            }
        }
        next.recenter_nodes(&nodes);

        Ok(SyncOutcome {
            state: next,
            sync_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::algorithms::tests::quiet_params;
    use crate::test_helpers::{seeded_rng, start_test};

    fn run(state: &ClockState, slice: &TopologySlice, hop_error_bound: f64) -> SyncOutcome {
        let top = start_test(file!());
        Dtp::new(&top, "dtp")
            .sync(
                &mut seeded_rng(),
                state,
                slice,
                &quiet_params(hop_error_bound),
                None,
            )
            .unwrap()
    }

    #[test]
    fn follows_fastest_neighbour() {
        let slice = TopologySlice::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let state = ClockState::new(vec![0.0, 30.0, 90.0], vec![1.0, 2.0, 3.0]).unwrap();
        let outcome = run(&state, &slice, 0.0);
        // Before recentering: [30, 90, 30].
        assert_abs_diff_eq!(outcome.state.error[0], -20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.state.error[1], 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.state.error[2], -20.0, epsilon = 1e-9);
        assert_eq!(outcome.state.bound, state.bound);
    }

    #[test]
    fn zero_mean_after_sync() {
        let slice = TopologySlice::from_edges(4, &[(0, 1), (2, 3), (1, 2)]).unwrap();
        let outcome = run(&ClockState::initial(4), &slice, 5.0);
        assert_abs_diff_eq!(outcome.state.mean_error(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn isolated_node_only_recentered() {
        let slice = TopologySlice::from_edges(3, &[(0, 1)]).unwrap();
        let state = ClockState::new(vec![0.0, 6.0, 3.0], vec![0.0; 3]).unwrap();
        let outcome = run(&state, &slice, 0.0);
        // Before recentering: [6, 0, 3].
        assert_abs_diff_eq!(outcome.state.error[2], 0.0, epsilon = 1e-9);
    }
}
