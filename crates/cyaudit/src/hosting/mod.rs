//! Source-control hosting provider access.

pub mod github;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

pub use github::GitHubClient;

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// An organization the token was able to look up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgHandle {
    pub login: String,
}

/// Handle to a repository on the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRepository {
    pub name: String,
    pub organization: String,
    pub is_private: bool,
    pub default_branch: String,
    /// HTTPS clone URL without credentials.
    pub clone_url: String,
    pub html_url: String,
}

impl RemoteRepository {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }
}

/// Collaborator permission levels understood by the hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Pull => write!(f, "pull"),
            Permission::Triage => write!(f, "triage"),
            Permission::Push => write!(f, "push"),
            Permission::Maintain => write!(f, "maintain"),
            Permission::Admin => write!(f, "admin"),
        }
    }
}

/// Authenticated operations against a hosting provider.
///
/// Implementations carry their own token; nothing here takes or returns one.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Looks up an organization, failing with `Auth` for a bad token and
    /// `NotFound` for an unknown organization.
    async fn organization(&self, org: &str) -> Result<OrgHandle>;

    /// Cheap existence probe used before creating anything.
    async fn repository_exists(&self, org: &str, name: &str) -> Result<bool>;

    /// Creates a private repository. Fails with `AlreadyExists` if the name is taken.
    async fn create_private_repository(&self, org: &OrgHandle, name: &str)
        -> Result<RemoteRepository>;

    /// Deletes a repository. Deleting one that is already gone succeeds.
    async fn delete_repository(&self, repo: &RemoteRepository) -> Result<()>;

    async fn set_default_branch(&self, repo: &RemoteRepository, branch: &str) -> Result<()>;

    async fn add_collaborator(
        &self,
        repo: &RemoteRepository,
        username: &str,
        permission: Permission,
    ) -> Result<()>;

    /// Credential-free clone URL for `owner/name`.
    fn clone_url(&self, owner: &str, name: &str) -> String;
}
