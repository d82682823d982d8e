// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

use rand_xoshiro::Xoshiro256PlusPlus;

/// Identifier of a node in the network. Node `0` is the reference clock.
pub type NodeId = usize;

/// The id of the reference (root) clock.
pub const ROOT_NODE: NodeId = 0;

/// The random number generator shared by every part of a simulation.
pub type SimRng = Xoshiro256PlusPlus;

// Simulation errors

#[macro_export]
/// Build an `Err(SimError::Configuration)` from a format string
macro_rules! config_error {
    ($($arg:tt)+) => {
        Err($crate::types::SimError::Configuration(format!($($arg)+)))
    };
}

#[macro_export]
/// Build an `Err(SimError::Structural)` from a format string
macro_rules! structural_error {
    ($($arg:tt)+) => {
        Err($crate::types::SimError::Structural(format!($($arg)+)))
    };
}

/// The `SimError` is what should be returned in the case of an error
///
/// No error is ever retried: both kinds abort the operation that raised them.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// An invalid parameter combination, raised when a simulator or topology
    /// is being built.
    Configuration(String),

    /// A broken internal invariant detected while running.
    Structural(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            SimError::Structural(msg) => write!(f, "Structural violation: {msg}"),
        }
    }
}

impl Error for SimError {}

/// The SimResult is the return type for most simulation functions
pub type SimResult = Result<(), SimError>;
