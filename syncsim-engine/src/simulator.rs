// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The simulation driver.
//!
//! Every round the [`Simulator`]:
//!  1. resolves the topology slice in use from the simulated time (rebuilding
//!     the schedule first if this is the configured update round),
//!  2. applies node or link failures to a private copy of that slice,
//!  3. runs the synchronisation algorithm,
//!  4. applies one round of drift,
//!  5. appends the resulting state to the history,
//!  6. advances the simulated time by one sync interval.
//!
//! All randomness comes from a single generator seeded from the
//! configuration, so a run is fully reproducible.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rand::SeedableRng;
use syncsim_track::entity::{Entity, GetEntity};
use syncsim_track::{debug, info, set_time};

use crate::algorithms::{SyncAlgorithm, SyncParams};
use crate::config::{RunLength, SimulatorConfig};
use crate::drift::{DriftModel, runtime_jitter};
use crate::failure::{Failures, sample_failed_links};
use crate::state::{ClockState, PathLengths};
use crate::topology::{TopologySchedule, generate};
use crate::types::{NodeId, ROOT_NODE, SimError, SimResult, SimRng};
use crate::{config_error, structural_error};

/// Lifecycle of a [`Simulator`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Built but not run yet.
    Initializing,

    /// Inside [`Simulator::run`].
    Running,

    /// The last requested run has finished.
    Completed,
}

/// Everything recorded about one round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundRecord {
    /// Clock error per node, failed nodes left out.
    pub error: Vec<f64>,

    /// Error bound per node, failed nodes left out.
    pub bound: Vec<f64>,

    pub sync_count: usize,

    /// Index of the topology slice that was in use.
    pub slice_index: usize,
}

pub struct Simulator {
    pub entity: Rc<Entity>,
    schedule_entity: Rc<Entity>,
    config: SimulatorConfig,
    params: SyncParams,
    rng: SimRng,
    schedule: TopologySchedule,
    failures: Failures,
    drift: DriftModel,
    algorithm: Box<dyn SyncAlgorithm>,
    state: ClockState,
    paths: Option<PathLengths>,
    history: Vec<RoundRecord>,
    elapsed_ns: u64,
    phase: Phase,
}

impl Simulator {
    /// Build a simulator below `parent`.
    ///
    /// Random draws are made in a fixed order: the topology, the randomly
    /// failed links, the drift rates and then the drift variance bounds.
    pub fn new(parent: &Rc<Entity>, config: SimulatorConfig) -> Result<Self, SimError> {
        config.validate()?;

        let entity = Rc::new(Entity::new(parent, &config.name));
        let schedule_entity = Rc::new(Entity::new(&entity, "schedule"));
        let mut rng = SimRng::seed_from_u64(config.seed);

        let first_skew = config.topology_args.map(|(first, _)| first);
        let schedule = build_schedule(&mut rng, &config, first_skew)?;
        info!(schedule_entity ; "{} generated {} slices", config.topology_generator, schedule.len());

        let mut failed_links = config.failed_links.clone();
        if config.random_failed_links > 0 {
            failed_links.extend(sample_failed_links(
                &mut rng,
                &schedule,
                config.random_failed_links,
            ));
        }
        let failures = Failures::new(config.failed_nodes.clone(), failed_links)?;
        debug!(entity ; "failures: {failures:?}");

        let drift = DriftModel::generate(
            &mut rng,
            config.node_count,
            config.drift_bound,
            config.drift_variance_bound,
            config.sync_algorithm.tree_biased_variance(),
        );

        let algorithm = config.sync_algorithm.build(&entity);
        let paths = config
            .sync_algorithm
            .tracks_paths()
            .then(|| PathLengths::new(config.node_count));

        Ok(Self {
            state: ClockState::initial(config.node_count),
            params: config.sync_params(),
            entity,
            schedule_entity,
            config,
            rng,
            schedule,
            failures,
            drift,
            algorithm,
            paths,
            history: Vec::new(),
            elapsed_ns: 0,
            phase: Phase::Initializing,
        })
    }

    /// Replace the initial clock state. Only possible before the first run.
    pub fn set_state(&mut self, state: ClockState) -> SimResult {
        if self.phase != Phase::Initializing {
            return config_error!("the state can only be set before running");
        }
        if state.len() != self.config.node_count {
            return config_error!(
                "state for {} nodes given to a {} node simulation",
                state.len(),
                self.config.node_count
            );
        }
        state.check_invariants(self.config.node_count)?;
        self.state = state;
        Ok(())
    }

    /// Run for the given number of rounds (or duration). Repeated calls carry
    /// on from where the previous one stopped.
    pub fn run(&mut self, length: RunLength) -> SimResult {
        let rounds = length.to_rounds(self.config.sync_interval_ns);
        self.run_with_progress(rounds, |_| {})
    }

    /// As [`Simulator::run`] for a number of rounds, calling `on_round` after
    /// every round with the number of rounds completed so far in this run.
    pub fn run_with_progress<F>(&mut self, rounds: u64, mut on_round: F) -> SimResult
    where
        F: FnMut(u64),
    {
        self.phase = Phase::Running;
        for done in 1..=rounds {
            self.step()?;
            on_round(done);
        }
        self.phase = Phase::Completed;

        info!(self.entity ; "{} sync count: {}", self.config.name, self.last_sync_count().unwrap_or(0));
        Ok(())
    }

    fn step(&mut self) -> SimResult {
        let round = self.elapsed_ns / self.config.sync_interval_ns;
        set_time!(self.entity ; self.elapsed_ns as f64);

        if self.config.topology_update_round == Some(round) {
            let second = self.config.topology_args.map(|(_, second)| second);
            self.schedule = build_schedule(&mut self.rng, &self.config, second)?;
            info!(self.schedule_entity ; "change topology at round {round}: {} slices", self.schedule.len());
        }

        let slice_index = self
            .schedule
            .slice_index_at(self.elapsed_ns, self.config.slice_duration_ns);
        let base = self.schedule.slice(slice_index);
        if base.node_count() != self.config.node_count {
            return structural_error!(
                "slice {slice_index} has {} nodes instead of {}",
                base.node_count(),
                self.config.node_count
            );
        }
        let params = SyncParams {
            base_root_degree: Some(base.degree(ROOT_NODE)),
            ..self.params
        };
        let slice = self.failures.apply(base);

        let outcome = self.algorithm.sync(
            &mut self.rng,
            &self.state,
            &slice,
            &params,
            self.paths.as_mut(),
        )?;
        debug!(self.entity ; "round {round} slice {slice_index}: {} syncs", outcome.sync_count);

        self.state = outcome.state;
        self.apply_drift();
        self.state.check_invariants(self.config.node_count)?;

        let failed = self.failures.failed_nodes();
        let recorded = self.state.without_nodes(failed);
        self.history.push(RoundRecord {
            error: recorded.error,
            bound: recorded.bound,
            sync_count: outcome.sync_count,
            slice_index,
        });

        self.elapsed_ns += self.config.sync_interval_ns;
        Ok(())
    }

    fn apply_drift(&mut self) {
        let scale = self.config.sync_interval_ns as f64 / 1e6;
        let jitter = runtime_jitter(&mut self.rng, &self.drift.variance_bound);

        for node in 0..self.state.len() {
            let variance = self.drift.variance_bound[node];
            if self.config.offset_drift {
                self.state.error[node] += jitter[node] * scale;
                self.state.bound[node] += variance * scale;
            } else {
                let rate = self.drift.drift_rate[node];
                self.state.error[node] += (rate + jitter[node]) * scale;
                self.state.bound[node] += (rate.abs() + variance) * scale;
            }
        }

        if self.config.sync_algorithm.is_consensus() {
            let live: Vec<NodeId> = (0..self.state.len())
                .filter(|n| !self.failures.failed_nodes().contains(n))
                .collect();
            self.state.recenter_nodes(&live);
        } else {
            self.state.pin_root();
        }
    }

    /// `|error|` of every recorded round from `start_from` on.
    ///
    /// Consensus runs are viewed relative to the population mean of each
    /// round.
    #[must_use]
    pub fn get_clock_errors(&self, start_from: usize) -> Vec<Vec<f64>> {
        let consensus = self.config.sync_algorithm.is_consensus();
        self.history
            .get(start_from..)
            .unwrap_or_default()
            .iter()
            .map(|record| {
                let offset = if consensus {
                    crate::state::mean(&record.error)
                } else {
                    0.0
                };
                record.error.iter().map(|e| (e - offset).abs()).collect()
            })
            .collect()
    }

    /// Error bound of every recorded round from `start_from` on.
    #[must_use]
    pub fn get_error_bound(&self, start_from: usize) -> Vec<Vec<f64>> {
        self.history
            .get(start_from..)
            .unwrap_or_default()
            .iter()
            .map(|record| record.bound.clone())
            .collect()
    }

    #[must_use]
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    #[must_use]
    pub fn sync_counts(&self) -> Vec<usize> {
        self.history.iter().map(|r| r.sync_count).collect()
    }

    #[must_use]
    pub fn last_sync_count(&self) -> Option<usize> {
        self.history.last().map(|r| r.sync_count)
    }

    /// Histogram of hop counts, for algorithms that keep one.
    #[must_use]
    pub fn path_length_counter(&self) -> Option<&BTreeMap<usize, u64>> {
        self.paths.as_ref().map(PathLengths::counter)
    }

    /// Current hop count per node, for algorithms that keep one.
    #[must_use]
    pub fn path_length_tracker(&self) -> Option<&[usize]> {
        self.paths.as_ref().map(PathLengths::tracker)
    }

    #[must_use]
    pub fn state(&self) -> &ClockState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns
    }

    #[must_use]
    pub fn rounds_completed(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    #[must_use]
    pub fn schedule(&self) -> &TopologySchedule {
        &self.schedule
    }

    #[must_use]
    pub fn drift_model(&self) -> &DriftModel {
        &self.drift
    }

    #[must_use]
    pub fn failures(&self) -> &Failures {
        &self.failures
    }
}

fn build_schedule(
    rng: &mut SimRng,
    config: &SimulatorConfig,
    skew_ratio: Option<usize>,
) -> Result<TopologySchedule, SimError> {
    let source = config
        .topology_generator
        .build(rng, config.node_count, config.link_count, skew_ratio)?;
    generate(config.node_count, source)
}

impl GetEntity for Simulator {
    fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }
}

impl fmt::Display for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 5;
        let first = self.schedule.slice(0);
        let drift = &self.drift.drift_rate[..SHOWN.min(self.drift.node_count())];
        let variance = &self.drift.variance_bound[..SHOWN.min(self.drift.node_count())];
        write!(
            f,
            "{} {} {} {} {:.3?} {:.3?} {} {}",
            self.config.name,
            self.config.sync_algorithm,
            first.node_count(),
            first.edge_count(),
            drift,
            variance,
            self.config.sync_interval_ns,
            self.config.slice_duration_ns
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use syncsim_track::entity::toplevel;
    use syncsim_track::test_helpers::check_and_clear;
    use syncsim_track::test_init;
    use syncsim_track::tracker::LevelFilter;

    use super::*;
    use crate::algorithms::SyncAlgorithmKind;
    use crate::test_helpers::start_test;
    use crate::topology::generators::TopologyKind;

    fn quiet_tree(node_count: usize, branching: usize) -> SimulatorConfig {
        SimulatorConfig {
            name: "tree".to_string(),
            sync_algorithm: SyncAlgorithmKind::SpanningTree,
            node_count,
            link_count: branching,
            topology_generator: TopologyKind::StaticTree,
            drift_bound: 0.0,
            drift_variance_bound: 0.0,
            hop_error_bound: 0.0,
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn phases() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, SimulatorConfig::default()).unwrap();
        assert_eq!(sim.phase(), Phase::Initializing);
        sim.run(RunLength::Rounds(2)).unwrap();
        assert_eq!(sim.phase(), Phase::Completed);
        assert!(sim.set_state(ClockState::initial(8)).is_err());
    }

    #[test]
    fn repeated_runs_continue() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, SimulatorConfig::default()).unwrap();
        sim.run(RunLength::Rounds(3)).unwrap();
        sim.run(RunLength::DurationNs(150_000)).unwrap();
        assert_eq!(sim.rounds_completed(), 5);
        assert_eq!(sim.elapsed_ns(), 500_000);
        assert_eq!(sim.sync_counts().len(), 5);
    }

    #[test]
    fn noiseless_tree() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, quiet_tree(4, 2)).unwrap();
        sim.run(RunLength::Rounds(1)).unwrap();
        assert_eq!(sim.state().error, vec![0.0; 4]);
        assert_eq!(sim.state().bound, vec![0.0; 4]);
        assert_eq!(sim.last_sync_count(), Some(3));
        assert_eq!(sim.path_length_tracker(), Some(&[0, 1, 1, 2][..]));
    }

    #[test]
    fn set_state_checks_size() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, quiet_tree(4, 2)).unwrap();
        assert!(sim.set_state(ClockState::initial(3)).is_err());
        let state = ClockState::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        sim.set_state(state.clone()).unwrap();
        assert_eq!(sim.state(), &state);
    }

    #[test]
    fn failed_nodes_left_out_of_history() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            failed_nodes: vec![3, 5],
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        sim.run(RunLength::Rounds(4)).unwrap();
        assert!(sim.history().iter().all(|r| r.error.len() == 6));
        assert_eq!(sim.state().len(), 8);
    }

    #[test]
    fn consensus_recentered_with_failures() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            sync_algorithm: SyncAlgorithmKind::Dtp,
            failed_nodes: vec![0, 4],
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        sim.run(RunLength::Rounds(10)).unwrap();
        for record in sim.history() {
            assert_abs_diff_eq!(crate::state::mean(&record.error), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn firefly_converges_without_node_zero() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            sync_algorithm: SyncAlgorithmKind::Firefly,
            topology_generator: TopologyKind::Star,
            node_count: 16,
            drift_bound: 0.0,
            drift_variance_bound: 0.0,
            failed_nodes: vec![ROOT_NODE],
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        let error = (0..16).map(|n| 10.0 * n as f64).collect();
        sim.set_state(ClockState::new(error, vec![0.0; 16]).unwrap())
            .unwrap();
        sim.run(RunLength::Rounds(50)).unwrap();

        let errors = sim.get_clock_errors(0);
        assert_ne!(errors[0], errors[49]);
        assert!(errors[49].iter().all(|e| *e < 1.0), "{:?}", errors[49]);
    }

    #[test]
    fn absolute_drift_keeps_bound_positive() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            offset_drift: false,
            drift_bound: 100.0,
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        sim.run(RunLength::Rounds(20)).unwrap();
        for bounds in sim.get_error_bound(0) {
            assert!(bounds.iter().all(|b| *b >= 0.0));
            assert_eq!(bounds[0], 0.0);
        }
    }

    #[test]
    fn random_failed_links_are_sampled() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            random_failed_links: 8,
            ..SimulatorConfig::default()
        };
        let sim = Simulator::new(&top, config).unwrap();
        match sim.failures() {
            Failures::Links(links) => assert_eq!(links.len(), 8),
            other => panic!("unexpected failures {other:?}"),
        }
    }

    #[test]
    fn topology_update() {
        let top = start_test(file!());
        let config = SimulatorConfig {
            topology_generator: TopologyKind::OperaSkew,
            topology_args: Some((0, 2)),
            topology_update_round: Some(3),
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        let before = sim.schedule().len();
        sim.run(RunLength::Rounds(3)).unwrap();
        assert_eq!(sim.schedule().len(), before);
        sim.run(RunLength::Rounds(1)).unwrap();
        assert!(sim.schedule().len() > before);
    }

    #[test]
    fn topology_changes_are_logged() {
        let filter = LevelFilter::new(log::Level::Error)
            .with_rule("::schedule$", log::Level::Info)
            .unwrap();
        let (test_tracker, tracker) = test_init!(filter);
        let top = toplevel(&tracker, "top");
        let config = SimulatorConfig {
            name: "skew".to_string(),
            topology_generator: TopologyKind::OperaSkew,
            topology_args: Some((0, 2)),
            topology_update_round: Some(3),
            ..SimulatorConfig::default()
        };
        let mut sim = Simulator::new(&top, config).unwrap();
        check_and_clear(
            &test_tracker,
            &[r"^top::skew::schedule INFO: opera-skew generated \d+ slices$"],
        );

        sim.run(RunLength::Rounds(3)).unwrap();
        check_and_clear(&test_tracker, &[]);
        sim.run(RunLength::Rounds(1)).unwrap();
        check_and_clear(
            &test_tracker,
            &[r"^top::skew::schedule INFO: change topology at round 3: \d+ slices$"],
        );
    }

    #[test]
    fn display() {
        let top = start_test(file!());
        let sim = Simulator::new(&top, quiet_tree(4, 2)).unwrap();
        let text = sim.to_string();
        assert!(text.starts_with("tree spanning-tree 4 3 "), "{text}");
        assert!(text.ends_with(" 100000 100000"), "{text}");
    }

    #[test]
    fn start_from_past_end() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, SimulatorConfig::default()).unwrap();
        sim.run(RunLength::Rounds(2)).unwrap();
        assert!(sim.get_clock_errors(5).is_empty());
        assert_eq!(sim.get_error_bound(1).len(), 1);
    }
}
