// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Oscillator drift and the per-hop measurement noise shared by all
//! synchronisation algorithms.
//!
//! Every node is given a static drift rate and a drift-variance bound (both in
//! ppm) when the simulation is built. Each round a fresh runtime jitter is
//! drawn per node within its variance bound.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::types::ROOT_NODE;

/// Drift rate bound (ppm) used when none is configured.
pub const DEFAULT_DRIFT_BOUND_PPM: f64 = 40.0;

/// Drift-variance bound (ppm) used when none is configured.
pub const DEFAULT_DRIFT_VARIANCE_BOUND_PPM: f64 = 50.0;

/// Per-hop measurement error bound (ns) used when none is configured.
pub const DEFAULT_HOP_ERROR_BOUND_NS: f64 = 5.0;

/// Bound (ns) of the queueing/link-length asymmetry of a multi-hop path.
pub const DEFAULT_PATH_ASYMMETRY_BOUND_NS: f64 = 10.0;

/// Draw from a zero-mean normal with standard deviation `bound / 3` and clip
/// the result to `[-bound, bound]`.
///
/// `bound` must be finite and non-negative.
pub fn clipped_normal<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    match Normal::new(0.0, bound / 3.0) {
        Ok(normal) => normal.sample(rng).clamp(-bound, bound),
        // Only reachable with a non-finite bound; there is no spread to model.
        Err(_) => 0.0,
    }
}

/// Measurement error of one synchronisation hop.
pub fn hop_error<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    clipped_normal(rng, bound)
}

/// Asymmetry between the two directions of a multi-hop path, uniform in
/// `[-bound, bound]`.
pub fn path_asymmetry<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    rng.random_range(-bound..=bound)
}

/// Static drift rate per node (ppm). The reference node never drifts.
pub fn gen_drift<R: Rng + ?Sized>(rng: &mut R, node_count: usize, bound: f64) -> Vec<f64> {
    let mut drift: Vec<f64> = (0..node_count).map(|_| clipped_normal(rng, bound)).collect();
    if let Some(root) = drift.get_mut(ROOT_NODE) {
        *root = 0.0;
    }
    drift
}

/// Drift-variance bound per node (ppm), uniform in `[0, bound]`.
pub fn gen_drift_variance<R: Rng + ?Sized>(
    rng: &mut R,
    node_count: usize,
    bound: f64,
) -> Vec<f64> {
    let mut variance: Vec<f64> = (0..node_count)
        .map(|_| rng.random_range(0.0..=bound))
        .collect();
    if let Some(root) = variance.get_mut(ROOT_NODE) {
        *root = 0.0;
    }
    variance
}

/// As [`gen_drift_variance`] but with the non-reference values sorted in
/// descending order, so that low node ids (near the top of a tree) get the
/// largest variance.
pub fn gen_drift_variance_tree<R: Rng + ?Sized>(
    rng: &mut R,
    node_count: usize,
    bound: f64,
) -> Vec<f64> {
    let mut variance = gen_drift_variance(rng, node_count, bound);
    if variance.len() > 1 {
        variance[1..].sort_by(|a, b| b.total_cmp(a));
    }
    variance
}

/// One fresh sample per node uniform in `[-v, v]` where `v` is that node's
/// drift-variance bound.
pub fn runtime_jitter<R: Rng + ?Sized>(rng: &mut R, variance_bounds: &[f64]) -> Vec<f64> {
    variance_bounds
        .iter()
        .map(|v| rng.random_range(-v..=*v))
        .collect()
}

/// The static drift parameters of every node.
#[derive(Clone, Debug, PartialEq)]
pub struct DriftModel {
    /// Static drift rate per node (ppm).
    pub drift_rate: Vec<f64>,

    /// Drift-variance bound per node (ppm).
    pub variance_bound: Vec<f64>,
}

impl DriftModel {
    /// Draw the static parameters. The drift rate is drawn before the variance
    /// bound.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        node_count: usize,
        drift_bound: f64,
        variance_bound: f64,
        tree_biased: bool,
    ) -> Self {
        let drift_rate = gen_drift(rng, node_count, drift_bound);
        let variance_bound = if tree_biased {
            gen_drift_variance_tree(rng, node_count, variance_bound)
        } else {
            gen_drift_variance(rng, node_count, variance_bound)
        };
        Self {
            drift_rate,
            variance_bound,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.drift_rate.len()
    }
}
