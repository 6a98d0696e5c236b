use serde::{Deserialize, Serialize};

/// On-disk layout of `cyaudit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub cyaudit: RawAuditConfig,
}

/// The `[cyaudit]` table before environment substitution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuditConfig {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub target_repo_name: Option<String>,
    #[serde(default)]
    pub target_organization: Option<String>,
    #[serde(default)]
    pub auditors: Vec<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub template_project_id: Option<String>,
    #[serde(default)]
    pub give_users_access: Option<RawFlag>,
}

/// A boolean that may also be written as a string, so it can come from an
/// environment variable (`give_users_access = "$GRANT_ACCESS"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Text(String),
}

/// Fully substituted configuration. Empty values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditConfig {
    pub source_url: Option<String>,
    pub target_repo_name: Option<String>,
    pub target_organization: Option<String>,
    pub auditors: Vec<String>,
    pub commit_hash: Option<String>,
    pub project_title: Option<String>,
    pub template_project_id: Option<String>,
    pub give_users_access: bool,
}
