//! Local git operations for provisioning.

pub mod auth;
pub mod parse;
pub mod repository;

use std::path::Path;

use crate::error::ProvisionError;
use crate::secrets::AuthToken;

pub use repository::GitDriver;

/// Name of the remote created by `git clone`.
pub const DEFAULT_REMOTE: &str = "origin";

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Local version-control operations used by the provisioning workflow.
///
/// Every call blocks until the underlying command exits. Network calls take
/// the token to authenticate with; implementations must never place it in a
/// URL, log line or error message.
pub trait LocalRepository: Send + Sync {
    /// Clones `remote_url` into `destination`. Cloning an empty repository succeeds.
    fn clone_repo(&self, remote_url: &str, token: &AuthToken, destination: &Path) -> Result<()>;

    /// Fetches all branches of `remote`.
    fn fetch(&self, path: &Path, remote: &str, token: &AuthToken) -> Result<()>;

    /// Remote branches (remote prefix stripped) whose history contains
    /// `commit`, in git's listing order. An unknown commit yields an empty list.
    fn list_remote_branches_containing(
        &self,
        path: &Path,
        remote: &str,
        commit: &str,
    ) -> Result<Vec<String>>;

    /// Fetches one branch into `refs/remotes/<remote>/<branch>`.
    fn fetch_ref(&self, path: &Path, remote: &str, branch: &str, token: &AuthToken) -> Result<()>;

    fn checkout(&self, path: &Path, branch: &str) -> Result<()>;

    fn set_remote_url(&self, path: &Path, remote: &str, url: &str) -> Result<()>;

    /// Pushes `local_branch` to `remote_branch` on `remote` and sets upstream.
    fn push(
        &self,
        path: &Path,
        remote: &str,
        local_branch: &str,
        remote_branch: &str,
        token: &AuthToken,
    ) -> Result<()>;
}
