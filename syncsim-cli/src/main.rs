// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Run one clock synchronisation simulation and print its summary.
//!
//! For example, run using:
//!   cargo run --bin syncsim -- --sync-algorithm firefly --node-count 64
//!   --rounds 2000 --stdout --stdout-level debug

mod options;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use syncsim_engine::simulator::Simulator;
use syncsim_engine::summary::RunSummary;
use syncsim_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use syncsim_track::entity::toplevel;
use syncsim_track::{Tracker, info};

use crate::options::Cli;

fn setup_all_trackers(args: &Cli) -> Result<Tracker> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
            file: None,
        },
        log_file: TrackerConfig {
            enable: args.log,
            level: args.log_level,
            filter_regex: &args.log_filter_regex,
            file: Some(&args.log_file),
        },
    };
    Ok(setup_trackers(&config)?)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let tracker = setup_all_trackers(&args)?;
    let top = toplevel(&tracker, "top");

    let config = args.simulator_config()?;
    let mut sim = Simulator::new(&top, config).context("failed to build the simulator")?;
    info!(top ; "{sim}");

    let rounds = args.run_length().to_rounds(sim.config().sync_interval_ns);
    let progress_bar = if args.progress {
        ProgressBar::new(rounds)
    } else {
        ProgressBar::hidden()
    };
    let result = sim.run_with_progress(rounds, |_| progress_bar.inc(1));
    progress_bar.finish();
    tracker.shutdown();
    result.context("simulation failed")?;

    println!("{sim}");
    println!("{}", RunSummary::from_simulator(&sim, args.summary_from)?);
    Ok(())
}
