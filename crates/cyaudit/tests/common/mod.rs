//! Shared test utilities for cyaudit integration tests.
//!
//! This module provides:
//! - `FakeHost`, an in-memory hosting provider backed by local bare repositories
//! - `SourceFixture` for building source repositories with branches and commits
//! - `FlakyGit` for injecting git failures

pub mod builders;
pub mod fake_host;

pub use builders::*;
pub use fake_host::{FakeHost, Mutation};
