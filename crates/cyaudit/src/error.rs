use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CyauditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Provision(#[from] ProvisionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Environment variable not found: {name}")]
    MissingEnvVar { name: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("No GitHub token provided (set a personal or organization token)")]
    MissingToken,
}

/// Errors surfaced by the provisioning workflow.
///
/// Messages never carry tokens: git output and API bodies are redacted
/// before they are wrapped here.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    #[error("{owner}/{name} already exists")]
    AlreadyExists { owner: String, name: String },

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Failed to clone repository: {0}")]
    Clone(String),

    #[error("Commit {commit} not found in any branch")]
    CommitNotFound { commit: String },

    #[error("Commit {commit} is on several branches ({}): {reason}", candidates.join(", "))]
    AmbiguousBranch {
        commit: String,
        candidates: Vec<String>,
        reason: String,
    },

    #[error("Failed to push: {0}")]
    Push(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Remote API error: {0}")]
    Remote(String),

    #[error("Invalid provisioning request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while undoing a partially provisioned repository.
///
/// Only ever logged. The error that triggered the rollback is the one
/// returned to the caller.
#[derive(Error, Debug)]
#[error("Rollback of {owner}/{name} failed: {source}")]
pub struct RollbackError {
    pub owner: String,
    pub name: String,
    #[source]
    pub source: ProvisionError,
}

pub type Result<T> = std::result::Result<T, CyauditError>;
