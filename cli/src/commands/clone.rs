//! `cyaudit clone`

use log::info;

use cyaudit::config::{load_config, AuditConfig};
use cyaudit::hosting::github::DEFAULT_WEB_URL;
use cyaudit::secrets::{resolve_token, Credentials, ORG_TOKEN_ENV_VAR, PERSONAL_TOKEN_ENV_VAR};
use cyaudit::{clone_audit_repository, parse_org_repo, ConfigError, CyauditError, GitDriver};

use crate::args::CloneArgs;

/// Picks the URL to clone: the argument if given, otherwise the audit
/// repository named in the config.
pub fn target_url(explicit: Option<&str>, config: &AuditConfig) -> Result<String, CyauditError> {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        parse_org_repo(url)?;
        return Ok(url.to_string());
    }

    match (&config.target_organization, &config.target_repo_name) {
        (Some(org), Some(name)) => Ok(format!("{}/{}/{}.git", DEFAULT_WEB_URL, org, name)),
        _ => Err(ConfigError::MissingValue(
            "target_url, or target_organization and target_repo_name in the config".to_string(),
        )
        .into()),
    }
}

pub fn run(args: CloneArgs) -> Result<(), CyauditError> {
    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        AuditConfig::default()
    };

    let url = target_url(args.target_url.as_deref(), &config)?;
    let (org, repo) = parse_org_repo(&url)?;

    let personal = resolve_token(None, PERSONAL_TOKEN_ENV_VAR)?;
    let organization = resolve_token(None, ORG_TOKEN_ENV_VAR)?;
    // Only the audit side matters here
    let token = Credentials::resolve(personal, organization)?.target;

    let directory = std::env::current_dir().map_err(cyaudit::ProvisionError::from)?;
    info!("Cloning {}/{} into {}", org, repo, directory.display());
    clone_audit_repository(&GitDriver::new(), &url, &token, &directory)?;

    println!("Cloned {}/{}", org, repo);
    Ok(())
}
