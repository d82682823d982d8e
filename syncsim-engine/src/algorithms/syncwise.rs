// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Best-bound selection.
//!
//! Each node looks at the bounds its neighbours had at the end of the previous
//! round and picks the lowest (the lowest id wins a tie). It synchronises to
//! that neighbour only if doing so gives a strictly smaller bound than the one
//! it already has.

use std::rc::Rc;

use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::trace;

use super::{SyncAlgorithm, SyncAlgorithmKind, SyncOutcome, SyncParams};
use crate::drift::hop_error;
use crate::state::{ClockState, PathLengths};
use crate::topology::TopologySlice;
use crate::types::{SimError, SimRng};

pub struct Syncwise {
    pub entity: Rc<Entity>,
}

impl Syncwise {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
        }
    }
}

impl GetEntity for Syncwise {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl SyncAlgorithm for Syncwise {
    fn kind(&self) -> SyncAlgorithmKind {
        SyncAlgorithmKind::Syncwise
    }

    fn sync(
        &self,
        rng: &mut SimRng,
        state: &ClockState,
        slice: &TopologySlice,
        params: &SyncParams,
        mut paths: Option<&mut PathLengths>,
    ) -> Result<SyncOutcome, SimError> {
        let mut next = state.clone();
        let mut sync_count = 0;

        for node in slice.nodes() {
            let neighbors = slice.neighbors(node);
            let Some(chosen) = neighbors
                .iter()
                .copied()
                .reduce(|best, n| if state.bound[n] < state.bound[best] { n } else { best })
            else {
                trace!(self.entity ; "node {node} has no neighbours");
                continue;
            };

            let offered = state.bound[chosen] + params.hop_error_bound;
            if state.bound[node] > offered {
                next.bound[node] = offered;
                next.error[node] = state.error[chosen] + hop_error(rng, params.hop_error_bound);
                sync_count += 1;
                trace!(self.entity ; "{chosen} -> {node}, bound {} -> {offered}", state.bound[node]);
                if let Some(paths) = paths.as_deref_mut() {
                    paths.record(node, chosen);
                }
            }
        }

        Ok(SyncOutcome {
            state: next,
            sync_count,
        })
    }
}
