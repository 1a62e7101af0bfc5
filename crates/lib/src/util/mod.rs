//! Shared utilities.
//!
//! Child process execution for the toolchain and daemon adapters, plus test
//! doubles for the capability traits.

pub mod process;

#[cfg(test)]
pub mod testutil;
