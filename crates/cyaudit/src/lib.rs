pub mod access;
pub mod clone;
pub mod config;
pub mod error;
pub mod git;
pub mod hosting;
pub mod provision;
pub mod secrets;

pub use access::{grant_auditor_access, AccessReport};
pub use clone::{clone_audit_repository, parse_org_repo};
pub use config::{load_config, AuditConfig, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, CyauditError, ProvisionError, Result, RollbackError};
pub use git::{GitDriver, LocalRepository};
pub use hosting::{GitHubClient, RemoteHost, RemoteRepository};
pub use provision::{
    BranchResolver, LogObserver, ProvisionObserver, ProvisionOutcome, Provisioner,
    ProvisioningRequest, SelectionStrategy,
};
pub use secrets::{AuthToken, Credentials};
