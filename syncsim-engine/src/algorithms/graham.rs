// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Graham: only nodes directly linked to the reference clock synchronise, and
//! they synchronise to it exactly one hop away.

use std::rc::Rc;

use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::trace;

use super::{SyncAlgorithm, SyncAlgorithmKind, SyncOutcome, SyncParams};
use crate::drift::hop_error;
use crate::state::{ClockState, PathLengths};
use crate::topology::TopologySlice;
use crate::types::{ROOT_NODE, SimError, SimRng};

pub struct Graham {
    pub entity: Rc<Entity>,
}

impl Graham {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for Graham {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl SyncAlgorithm for Graham {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::Graham
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
        let mut sync_count = 0;

        for node in slice.neighbors(ROOT_NODE) {
            next.bound[node] = params.hop_error_bound;
            next.error[node] = hop_error(rng, params.hop_error_bound);
            sync_count += 1;
            trace!(self.entity ; "{ROOT_NODE} -> {node}");
        }

        Ok(SyncOutcome {
            state: next,
            sync_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{seeded_rng, start_test};

    #[test]
    fn only_root_neighbours_reset() {
        let top = start_test(file!());
        let slice = TopologySlice::from_edges(4, &[(0, 2), (2, 3), (1, 3)]).unwrap();
        let state = ClockState::initial(4);
        let outcome = Graham::new(&top, "graham")
            .sync(
                &mut seeded_rng(),
                &state,
                &slice,
                &SyncParams::default(),
                None,
            )
            .unwrap();
        assert_eq!(outcome.sync_count, 1);
        assert_eq!(outcome.state.bound, vec![0.0, 1000.0, 5.0, 1000.0]);
        assert!(outcome.state.error[2].abs() <= 5.0);
        assert_eq!(outcome.state.error[3], 1000.0);
    }

    #[test]
    fn resets_even_when_worse() {
        let top = start_test(file!());
        let slice = TopologySlice::from_edges(2, &[(0, 1)]).unwrap();
        let state = ClockState::new(vec![0.0, 0.5], vec![0.0, 1.0]).unwrap();
        let outcome = Graham::new(&top, "graham")
            .sync(
                &mut seeded_rng(),
                &state,
                &slice,
                &SyncParams::default(),
                None,
            )
            .unwrap();
        assert_eq!(outcome.state.bound[1], 5.0);
    }
}
