//! Subcommand implementations.
//!
//! - `setup`: provision the audit repository
//! - `clone`: check out an existing audit repository next to its config

pub mod clone;
pub mod setup;
