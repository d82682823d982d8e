// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Ensure that all version of each macro can be used

use std::rc::Rc;

use syncsim_track::entity::{Entity, toplevel};
use syncsim_track::{Id, debug, error, info, set_time, test_helpers, test_init, trace, warn};

macro_rules! build_with_entity {
    ($name:ident, $macro:ident, $slvl:expr) => (
        #[test]
        fn $name() {
            let (test_tracker, tracker) = test_init!();

            let top = toplevel(&tracker, "top");

            $macro!(top ; "Loc with no args");
            test_helpers::check_and_clear(&test_tracker, &[concat!("top ", $slvl, ": Loc with no args")]);

            $macro!(top ; "Loc with {} argument", 1);
            test_helpers::check_and_clear(&test_tracker, &[concat!("top ", $slvl, ": Loc with 1 argument")]);

            $macro!(top ; "Loc with {}, {} arguments", 1, 1 + 1);
            test_helpers::check_and_clear(&test_tracker, &[concat!("top ", $slvl, ": Loc with 1, 2 arguments")]);
        }
    );
}

build_with_entity!(trace_with_entity, trace, "TRACE");
build_with_entity!(info_with_entity, info, "INFO");
build_with_entity!(debug_with_entity, debug, "DEBUG");
build_with_entity!(warn_with_entity, warn, "WARN");
build_with_entity!(error_with_entity, error, "ERROR");

#[test]
fn child_entities() {
    let (test_tracker, tracker) = test_init!();

    let top = toplevel(&tracker, "top");
    let sim = Rc::new(Entity::new(&top, "graham"));
    assert_eq!((top.id, sim.id), (Id(0), Id(1)));

    info!(sim ; "round {} synced {} nodes", 3, 7);
    test_helpers::check_and_clear(&test_tracker, &["top::graham INFO: round 3 synced 7 nodes"]);
}

#[test]
fn time_does_not_log() {
    let (test_tracker, tracker) = test_init!();

    let top = toplevel(&tracker, "top");
    set_time!(top ; 1000.0);
    test_helpers::check_and_clear(&test_tracker, &[]);
}
