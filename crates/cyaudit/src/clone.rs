//! Cloning an audit repository into a directory that already holds its
//! `cyaudit.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::ProvisionError;
use crate::git::{GitDriver, LocalRepository};
use crate::secrets::{redact_url_credentials, AuthToken};

type Result<T> = std::result::Result<T, ProvisionError>;

/// Extracts `(organization, repository)` from an HTTPS or scp-like git URL.
///
/// ```
/// use cyaudit::clone::parse_org_repo;
///
/// let (org, repo) = parse_org_repo("git@github.com:auditors-org/widget-audit.git").unwrap();
/// assert_eq!((org.as_str(), repo.as_str()), ("auditors-org", "widget-audit"));
/// ```
pub fn parse_org_repo(url: &str) -> Result<(String, String)> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = if let Some((_, rest)) = trimmed.split_once("://") {
        // Drop the authority; any credentials live there
        rest.split_once('/').map(|(_, path)| path).unwrap_or("")
    } else if let Some((host, path)) = trimmed.split_once(':') {
        if host.contains('@') {
            path
        } else {
            ""
        }
    } else {
        ""
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., org, repo] => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if repo.is_empty() {
                return Err(invalid_url(trimmed));
            }
            Ok((org.to_string(), repo.to_string()))
        }
        _ => Err(invalid_url(trimmed)),
    }
}

fn invalid_url(url: &str) -> ProvisionError {
    ProvisionError::InvalidRequest(format!(
        "'{}' is not a repository URL (expected https://host/org/repo or git@host:org/repo.git)",
        redact_url_credentials(url)
    ))
}

/// Moves a file out of the way and puts it back when dropped.
pub struct ConfigStash {
    original: PathBuf,
    stash: Option<NamedTempFile>,
}

impl ConfigStash {
    /// Stashes `path` if it exists. A missing file yields an empty guard.
    pub fn stash(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self {
                original: path.to_path_buf(),
                stash: None,
            });
        }

        let temp = NamedTempFile::new()?;
        fs::copy(path, temp.path())?;
        fs::remove_file(path)?;
        debug!("Stashed {} at {}", path.display(), temp.path().display());

        Ok(Self {
            original: path.to_path_buf(),
            stash: Some(temp),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.stash.is_none()
    }

    /// Puts the file back now, overwriting whatever is at the original path.
    pub fn restore(mut self) -> io::Result<()> {
        self.restore_inner()
    }

    fn restore_inner(&mut self) -> io::Result<()> {
        if let Some(temp) = self.stash.take() {
            fs::copy(temp.path(), &self.original)?;
            debug!("Restored {}", self.original.display());
        }
        Ok(())
    }
}

impl Drop for ConfigStash {
    fn drop(&mut self) {
        if let Err(e) = self.restore_inner() {
            warn!("Failed to restore {}: {}", self.original.display(), e);
        }
    }
}

/// Clones `url` into `directory`, keeping a `cyaudit.toml` already there and
/// staging it in the new checkout.
pub fn clone_audit_repository(
    driver: &GitDriver,
    url: &str,
    token: &AuthToken,
    directory: &Path,
) -> Result<()> {
    let config_path = directory.join(DEFAULT_CONFIG_FILE);
    let stash = ConfigStash::stash(&config_path)?;
    let had_config = !stash.is_empty();

    driver.clone_repo(url, token, directory)?;
    info!("Cloned {} into {}", token.redact(url), directory.display());

    stash.restore()?;
    if had_config {
        driver.stage(directory, DEFAULT_CONFIG_FILE)?;
        info!("Staged {}", DEFAULT_CONFIG_FILE);
    }

    Ok(())
}
