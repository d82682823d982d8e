// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Command-line arguments and the layering of configuration sources.
//!
//! Options are resolved in order of increasing priority:
//!  - the built-in defaults of [`SimulatorConfig`]
//!  - the TOML file given with `--conf-file`
//!  - environment variables prefixed with [`ENV_PREFIX`]
//!  - flags given on the command line

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use syncsim_engine::algorithms::SyncAlgorithmKind;
use syncsim_engine::config::{RunLength, SimulatorConfig};
use syncsim_engine::topology::generators::TopologyKind;
use syncsim_engine::types::NodeId;

/// Prefix of the environment variables that set simulator options, for
/// example `SYNCSIM_NODE_COUNT=64`.
pub const ENV_PREFIX: &str = "SYNCSIM_";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(about = "Simulate clock synchronisation over a reconfigurable network")]
pub struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    pub stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    pub stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    pub stdout_filter_regex: String,

    /// Enable logging to a text file.
    #[arg(long, default_value = "false")]
    pub log: bool,

    /// Level of log message to write to the log file.
    #[arg(long, default_value = "Trace")]
    pub log_level: log::Level,

    /// Set a regular expression for which entites should have log file level
    /// set to `--log-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    pub log_filter_regex: String,

    /// The filename log output is written to.
    #[arg(long, default_value = "syncsim.log")]
    pub log_file: String,

    /// TOML file of simulator options.
    #[arg(long)]
    pub conf_file: Option<PathBuf>,

    /// Show a progress bar of the rounds completed.
    #[arg(long)]
    pub progress: bool,

    /// Number of synchronisation rounds to run.
    #[arg(long, default_value = "1000")]
    pub rounds: u64,

    /// Run for a simulated duration (ns) instead of a number of rounds.
    #[arg(long, conflicts_with = "rounds")]
    pub duration_ns: Option<u64>,

    /// Leave out this many initial rounds from the summary.
    #[arg(long, default_value = "0")]
    pub summary_from: usize,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Simulator options that, when given, take priority over every other source.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Name of the run.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_enum)]
    pub sync_algorithm: Option<SyncAlgorithmKind>,

    #[arg(long)]
    pub node_count: Option<usize>,

    /// Links per node.
    #[arg(long)]
    pub link_count: Option<usize>,

    #[arg(long, value_enum)]
    pub topology_generator: Option<TopologyKind>,

    /// Bound of the static drift rate (ppm).
    #[arg(long)]
    pub drift_bound: Option<f64>,

    /// Bound of the drift variance (ppm).
    #[arg(long)]
    pub drift_variance_bound: Option<f64>,

    /// Bound of the measurement error of one hop (ns).
    #[arg(long)]
    pub hop_error_bound: Option<f64>,

    /// Bound of the asymmetry of a multi-hop path (ns).
    #[arg(long)]
    pub path_asymmetry_bound: Option<f64>,

    #[arg(long)]
    pub sync_interval_ns: Option<u64>,

    #[arg(long)]
    pub slice_duration_ns: Option<u64>,

    /// Apply only the drift variance (`true`) or the full drift rate
    /// (`false`).
    #[arg(long)]
    pub offset_drift: Option<bool>,

    /// Comma-separated nodes to remove from the network.
    #[arg(long, value_delimiter = ',')]
    pub failed_nodes: Option<Vec<NodeId>>,

    /// A link to remove, as `a,b`. May be repeated.
    #[arg(long = "failed-link", value_parser = parse_pair)]
    pub failed_links: Option<Vec<(NodeId, NodeId)>>,

    /// Number of links to remove at random.
    #[arg(long)]
    pub random_failed_links: Option<usize>,

    /// Round at which the topology is rebuilt.
    #[arg(long)]
    pub topology_update_round: Option<u64>,

    /// Skew ratios before and after the topology update, as `a,b`.
    #[arg(long, value_parser = parse_pair)]
    pub topology_args: Option<(usize, usize)>,

    /// Seed for the random number generator.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Overrides {
    /// Write every option that was given into `config`.
    pub fn apply(&self, config: &mut SimulatorConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut config.name, &self.name);
        set(&mut config.sync_algorithm, &self.sync_algorithm);
        set(&mut config.node_count, &self.node_count);
        set(&mut config.link_count, &self.link_count);
        set(&mut config.topology_generator, &self.topology_generator);
        set(&mut config.drift_bound, &self.drift_bound);
        set(&mut config.drift_variance_bound, &self.drift_variance_bound);
        set(&mut config.hop_error_bound, &self.hop_error_bound);
        set(&mut config.path_asymmetry_bound, &self.path_asymmetry_bound);
        set(&mut config.sync_interval_ns, &self.sync_interval_ns);
        set(&mut config.slice_duration_ns, &self.slice_duration_ns);
        set(&mut config.offset_drift, &self.offset_drift);
        set(&mut config.failed_nodes, &self.failed_nodes);
        set(&mut config.failed_links, &self.failed_links);
        set(&mut config.random_failed_links, &self.random_failed_links);
        if self.topology_update_round.is_some() {
            config.topology_update_round = self.topology_update_round;
        }
        if self.topology_args.is_some() {
            config.topology_args = self.topology_args;
        }
        set(&mut config.seed, &self.seed);
    }
}

fn parse_pair(arg: &str) -> Result<(usize, usize), String> {
    let Some((a, b)) = arg.split_once(',') else {
        return Err(format!("expected `a,b`, got `{arg}`"));
    };
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("`{s}` in `{arg}`: {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

impl Cli {
    /// Combine every configuration source into one simulator configuration.
    pub fn simulator_config(&self) -> Result<SimulatorConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(SimulatorConfig::default()));
        if let Some(conf_file) = &self.conf_file {
            if !conf_file.is_file() {
                bail!("configuration file {} not found", conf_file.display());
            }
            figment = figment.merge(Toml::file(conf_file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let mut config: SimulatorConfig = figment
            .extract()
            .context("failed to read the simulator configuration")?;
        self.overrides.apply(&mut config);
        Ok(config)
    }

    #[must_use]
    pub fn run_length(&self) -> RunLength {
        match self.duration_ns {
            Some(duration) => RunLength::DurationNs(duration),
            None => RunLength::Rounds(self.rounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serial_test::serial;

    use super::*;

    const TEST_ENV_VARS: [&str; 3] = [
        "SYNCSIM_NODE_COUNT",
        "SYNCSIM_SYNC_ALGORITHM",
        "SYNCSIM_HOP_ERROR_BOUND",
    ];

    fn clear_env() {
        for var in TEST_ENV_VARS {
            // SAFETY: every test that touches the environment runs serially.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(var: &str, value: &str) {
        // SAFETY: every test that touches the environment runs serially.
        unsafe { std::env::set_var(var, value) };
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("syncsim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    #[serial]
    fn defaults_without_sources() {
        clear_env();
        let config = parse(&[]).simulator_config().unwrap();
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    #[serial]
    fn file_then_env_then_flags() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        let toml = r#"
            name = "from-file"
            node_count = 32
            sync_algorithm = "dtp"
            hop_error_bound = 2.5
        "#;
        fs::write(&path, toml).unwrap();
        let conf_file = path.to_str().unwrap();

        let config = parse(&["--conf-file", conf_file]).simulator_config().unwrap();
        assert_eq!(config.node_count, 32);
        assert_eq!(config.sync_algorithm, SyncAlgorithmKind::Dtp);
        assert_eq!(config.hop_error_bound, 2.5);
        assert_eq!(config.name, "from-file");

        set_env("SYNCSIM_NODE_COUNT", "64");
        set_env("SYNCSIM_SYNC_ALGORITHM", "firefly");
        let config = parse(&["--conf-file", conf_file]).simulator_config().unwrap();
        assert_eq!(config.node_count, 64);
        assert_eq!(config.sync_algorithm, SyncAlgorithmKind::Firefly);
        assert_eq!(config.hop_error_bound, 2.5);

        let flags = [
            "--conf-file",
            conf_file,
            "--node-count",
            "16",
            "--sync-algorithm",
            "ptp",
        ];
        let config = parse(&flags).simulator_config().unwrap();
        assert_eq!(config.node_count, 16);
        assert_eq!(config.sync_algorithm, SyncAlgorithmKind::SpanningTree);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_file_is_an_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = parse(&["--conf-file", path.to_str().unwrap()]);
        assert!(cli.simulator_config().is_err());
    }

    #[test]
    #[serial]
    fn bad_env_value_is_an_error() {
        clear_env();
        set_env("SYNCSIM_SYNC_ALGORITHM", "sundial");
        assert!(parse(&[]).simulator_config().is_err());
        clear_env();
    }

    #[test]
    fn failure_and_skew_flags() {
        let cli = parse(&[
            "--failed-link",
            "1,2",
            "--failed-link",
            "3, 4",
            "--topology-generator",
            "opera-skew",
            "--topology-args",
            "1,3",
            "--topology-update-round",
            "50",
        ]);
        let mut config = SimulatorConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.failed_links, vec![(1, 2), (3, 4)]);
        assert_eq!(config.topology_generator, TopologyKind::OperaSkew);
        assert_eq!(config.topology_args, Some((1, 3)));
        assert_eq!(config.topology_update_round, Some(50));
        assert!(config.validate().is_ok());

        let cli = parse(&["--failed-nodes", "2,5,7", "--offset-drift", "false"]);
        let mut config = SimulatorConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.failed_nodes, vec![2, 5, 7]);
        assert!(!config.offset_drift);

        assert!(Cli::try_parse_from(["syncsim", "--failed-link", "1"]).is_err());
    }

    #[test]
    fn run_length_from_flags() {
        assert_eq!(parse(&[]).run_length(), RunLength::Rounds(1000));
        assert_eq!(
            parse(&["--duration-ns", "250000"]).run_length(),
            RunLength::DurationNs(250_000)
        );
        assert!(Cli::try_parse_from(["syncsim", "--rounds", "5", "--duration-ns", "9"]).is_err());
    }
}
