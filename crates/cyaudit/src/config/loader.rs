use std::path::Path;

use crate::config::schema::{AuditConfig, ConfigFile, RawAuditConfig, RawFlag};
use crate::config::variables::{parse_flag, substitute_env_vars};
use crate::error::ConfigError;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cyaudit.toml";

/// Loads `path`, substituting environment variable references from the
/// process environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AuditConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AuditConfig, ConfigError> {
    load_config_with(content, |name| std::env::var(name).ok())
}

/// Parses TOML content, resolving `$VAR` references through `lookup`.
pub fn load_config_with<F>(content: &str, lookup: F) -> Result<AuditConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file: ConfigFile = toml::from_str(content)?;
    resolve(file.cyaudit, &lookup)
}

fn resolve<F>(raw: RawAuditConfig, lookup: &F) -> Result<AuditConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let substitute = |value: Option<String>| -> Result<Option<String>, ConfigError> {
        match value {
            Some(v) => substitute_env_vars(&v, lookup),
            None => Ok(None),
        }
    };

    let mut auditors = Vec::with_capacity(raw.auditors.len());
    for auditor in raw.auditors {
        if let Some(name) = substitute_env_vars(&auditor, lookup)? {
            auditors.push(name);
        }
    }

    let give_users_access = match raw.give_users_access {
        None => false,
        Some(RawFlag::Bool(b)) => b,
        Some(RawFlag::Text(text)) => match substitute_env_vars(&text, lookup)? {
            Some(value) => parse_flag("give_users_access", &value)?,
            None => false,
        },
    };

    Ok(AuditConfig {
        source_url: substitute(raw.source_url)?,
        target_repo_name: substitute(raw.target_repo_name)?,
        target_organization: substitute(raw.target_organization)?,
        auditors,
        commit_hash: substitute(raw.commit_hash)?,
        project_title: substitute(raw.project_title)?,
        template_project_id: substitute(raw.template_project_id)?,
        give_users_access,
    })
}
