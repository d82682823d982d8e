// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Textual summary of a finished run.

use std::fmt;

use crate::algorithms::SyncAlgorithmKind;
use crate::config_error;
use crate::simulator::Simulator;
use crate::types::SimError;

/// Tail statistics of the absolute clock error and of the error bound.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub name: String,
    pub algorithm: SyncAlgorithmKind,
    pub rounds: usize,
    pub error_p99: f64,
    pub error_p9999: f64,
    pub error_max: f64,
    pub bound_p99: f64,
    pub bound_p9999: f64,
    pub bound_max: f64,
    pub last_sync_count: usize,
}

impl RunSummary {
    /// Summarise every round recorded from `start_from` on.
    pub fn from_simulator(sim: &Simulator, start_from: usize) -> Result<Self, SimError> {
        let errors: Vec<f64> = sim.get_clock_errors(start_from).concat();
        let bounds: Vec<f64> = sim.get_error_bound(start_from).concat();
        if errors.is_empty() {
            return config_error!(
                "no rounds to summarise from round {start_from} ({} recorded)",
                sim.rounds_completed()
            );
        }

        let errors = sorted(errors);
        let bounds = sorted(bounds);
        Ok(Self {
            name: sim.config().name.clone(),
            algorithm: sim.config().sync_algorithm,
            rounds: sim.rounds_completed().saturating_sub(start_from),
            error_p99: percentile(&errors, 99.0),
            error_p9999: percentile(&errors, 99.99),
            error_max: percentile(&errors, 100.0),
            bound_p99: percentile(&bounds, 99.0),
            bound_p9999: percentile(&bounds, 99.99),
            bound_max: percentile(&bounds, 100.0),
            last_sync_count: sim.last_sync_count().unwrap_or(0),
        })
    }
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// The `p`th percentile of sorted `values`, interpolating linearly between
/// the two closest ranks.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => values[0],
        len => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            values[lower] + (values[upper] - values[lower]) * (rank - lower as f64)
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) over {} rounds", self.name, self.algorithm, self.rounds)?;
        writeln!(
            f,
            "  |error| ns: p99 {:.3}, p99.99 {:.3}, max {:.3}",
            self.error_p99, self.error_p9999, self.error_max
        )?;
        writeln!(
            f,
            "  bound ns:   p99 {:.3}, p99.99 {:.3}, max {:.3}",
            self.bound_p99, self.bound_p9999, self.bound_max
        )?;
        write!(f, "  sync count: {}", self.last_sync_count)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::{RunLength, SimulatorConfig};
    use crate::test_helpers::start_test;

    #[test]
    fn linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 50.0), 3.0);
        assert_relative_eq!(percentile(&values, 99.0), 4.96, epsilon = 1e-12);
        assert_relative_eq!(percentile(&values, 100.0), 5.0);
        assert_relative_eq!(percentile(&values, 0.0), 1.0);
        assert_relative_eq!(percentile(&[7.0], 99.0), 7.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn summary_of_run() {
        let top = start_test(file!());
        let mut sim = Simulator::new(&top, SimulatorConfig::default()).unwrap();
        sim.run(RunLength::Rounds(10)).unwrap();

        let summary = RunSummary::from_simulator(&sim, 2).unwrap();
        assert_eq!(summary.rounds, 8);
        assert!(summary.error_p99 <= summary.error_p9999);
        assert!(summary.error_p9999 <= summary.error_max);
        assert!(summary.bound_p99 <= summary.bound_max);

        let text = summary.to_string();
        assert!(text.starts_with("syncsim (syncwise) over 8 rounds"), "{text}");

        assert!(RunSummary::from_simulator(&sim, 10).is_err());
    }
}
