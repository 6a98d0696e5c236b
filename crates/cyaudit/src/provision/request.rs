//! Validated input for one provisioning attempt.

use std::path::Path;

use reqwest::Url;

use crate::error::ProvisionError;
use crate::secrets::{redact_url_credentials, Credentials};

type Result<T> = std::result::Result<T, ProvisionError>;

/// The repository being audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepository {
    /// URL as given by the user, with any embedded credentials removed.
    pub url: String,
    pub owner: String,
    pub name: String,
    /// URL handed to `git clone`. Never contains credentials.
    pub clone_url: String,
}

impl SourceRepository {
    /// Parses a source location.
    ///
    /// Accepted forms:
    /// - `https://github.com/acme/widget(.git)`
    /// - `git@github.com:acme/widget(.git)`
    /// - `file:///srv/git/acme/widget(.git)` or a plain filesystem path
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ProvisionError::InvalidRequest(
                "source URL is empty".to_string(),
            ));
        }

        if trimmed.contains("://") {
            return Self::parse_url(trimmed);
        }

        if let Some((_, path)) = scp_like_path(trimmed) {
            let (owner, name) = owner_and_name(path.split('/'), trimmed)?;
            return Ok(Self {
                url: trimmed.to_string(),
                owner,
                name,
                clone_url: trimmed.to_string(),
            });
        }

        Self::parse_path(trimmed)
    }

    fn parse_url(raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw).map_err(|e| {
            ProvisionError::InvalidRequest(format!(
                "invalid source URL '{}': {}",
                redact_url_credentials(raw),
                e
            ))
        })?;

        // Credentials in the URL are never used; tokens travel separately
        let _ = url.set_username("");
        let _ = url.set_password(None);

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let (owner, name) = owner_and_name(segments.iter().copied(), raw)?;

        let mut clone_url = url.to_string();
        if matches!(url.scheme(), "http" | "https") && !clone_url.ends_with(".git") {
            clone_url.push_str(".git");
        }

        Ok(Self {
            url: url.to_string(),
            owner,
            name,
            clone_url,
        })
    }

    fn parse_path(raw: &str) -> Result<Self> {
        let path = Path::new(raw);
        let components = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .filter(|c| !c.is_empty() && *c != "/");
        let (owner, name) = owner_and_name(components, raw)?;

        Ok(Self {
            url: raw.to_string(),
            owner,
            name,
            clone_url: raw.to_string(),
        })
    }
}

/// Splits `user@host:path` into host part and path, if `raw` has that shape.
fn scp_like_path(raw: &str) -> Option<(&str, &str)> {
    let (host, path) = raw.split_once(':')?;
    if host.contains('@') && !host.contains('/') && !path.is_empty() {
        Some((host, path))
    } else {
        None
    }
}

/// Takes the last two path segments as `(owner, name)`, dropping a `.git` suffix.
fn owner_and_name<'a, I>(segments: I, raw: &str) -> Result<(String, String)>
where
    I: Iterator<Item = &'a str>,
{
    let segments: Vec<&str> = segments.collect();
    if segments.len() < 2 {
        return Err(ProvisionError::InvalidRequest(format!(
            "source URL '{}' must name an owner and a repository",
            redact_url_credentials(raw)
        )));
    }

    let owner = segments[segments.len() - 2];
    let last = segments[segments.len() - 1];
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        return Err(ProvisionError::InvalidRequest(format!(
            "source URL '{}' has an empty repository name",
            redact_url_credentials(raw)
        )));
    }

    Ok((owner.to_string(), name.to_string()))
}

/// Everything one provisioning attempt needs, checked up front.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub source: SourceRepository,
    pub target_organization: String,
    pub target_repo_name: String,
    pub commit_hash: String,
    pub credentials: Credentials,
}

impl ProvisioningRequest {
    pub fn new(
        source_url: &str,
        target_organization: &str,
        target_repo_name: &str,
        commit_hash: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        let source = SourceRepository::parse(source_url)?;
        let target_organization = required("target organization", target_organization)?;
        let target_repo_name = required("target repository name", target_repo_name)?;
        let commit_hash = required("commit hash", commit_hash)?;

        if target_repo_name.contains('/') {
            return Err(ProvisionError::InvalidRequest(format!(
                "target repository name '{}' must not contain '/'",
                target_repo_name
            )));
        }

        if commit_hash.starts_with('-') {
            return Err(ProvisionError::InvalidRequest(format!(
                "commit hash '{}' is not a revision",
                commit_hash
            )));
        }

        Ok(Self {
            source,
            target_organization,
            target_repo_name,
            commit_hash,
            credentials,
        })
    }

    /// `organization/name` of the audit repository.
    pub fn target_full_name(&self) -> String {
        format!("{}/{}", self.target_organization, self.target_repo_name)
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProvisionError::InvalidRequest(format!("{} is required", field)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ProvisionError::InvalidRequest(format!(
            "{} '{}' must not contain whitespace",
            field, value
        )));
    }
    Ok(value.to_string())
}
