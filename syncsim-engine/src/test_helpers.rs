// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use rand::SeedableRng;
use syncsim_track::entity::{Entity, toplevel};
use syncsim_track::test_helpers::create_tracker;

use crate::types::SimRng;

/// Seed used by [`seeded_rng`].
pub const TEST_SEED: u64 = 42;

#[must_use]
pub fn start_test(full_filepath: &str) -> Rc<Entity> {
    toplevel(&create_tracker(full_filepath), "top")
}

#[must_use]
pub fn seeded_rng() -> SimRng {
    SimRng::seed_from_u64(TEST_SEED)
}
