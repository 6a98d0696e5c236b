//! `cyaudit setup`

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use cyaudit::config::{load_config, AuditConfig};
use cyaudit::provision::{
    BranchResolver, LogObserver, Provisioner, ProvisioningRequest, SelectionStrategy,
    SourceRepository,
};
use cyaudit::secrets::{resolve_token, Credentials, ORG_TOKEN_ENV_VAR, PERSONAL_TOKEN_ENV_VAR};
use cyaudit::{grant_auditor_access, ConfigError, CyauditError, GitDriver, GitHubClient};

use crate::args::SetupArgs;
use crate::prompts;

/// Command-line values layered over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupValues {
    pub source_url: Option<String>,
    pub target_repo_name: Option<String>,
    pub target_organization: Option<String>,
    pub auditors: Vec<String>,
    pub commit_hash: Option<String>,
    pub project_title: Option<String>,
    pub give_users_access: bool,
}

impl SetupValues {
    /// Command-line values win; blank ones count as absent.
    pub fn merge(args: &SetupArgs, config: AuditConfig) -> Self {
        let pick = |cli: &Option<String>, file: Option<String>| {
            cli.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or(file)
        };

        let auditors = if args.auditors.is_empty() {
            config.auditors
        } else {
            args.auditors.clone()
        };

        Self {
            source_url: pick(&args.source_url, config.source_url),
            target_repo_name: pick(&args.target_repo_name, config.target_repo_name),
            target_organization: pick(&args.target_organization, config.target_organization),
            auditors,
            commit_hash: pick(&args.commit_hash, config.commit_hash),
            project_title: pick(&args.project_title, config.project_title),
            give_users_access: config.give_users_access,
        }
    }

    /// Prompts for whatever is still missing, or fails when prompting is off.
    fn complete(&mut self, interactive: bool) -> Result<(), ConfigError> {
        fill(&mut self.source_url, "Source repository URL", interactive)?;
        fill(&mut self.target_organization, "Target organization", interactive)?;
        fill(&mut self.commit_hash, "Commit hash", interactive)?;

        if self.target_repo_name.is_none() && interactive {
            self.target_repo_name =
                prompts::ask_optional("Target repository name", "blank for the source name");
        }

        if interactive && self.needs_auditors() {
            if let Some(answer) =
                prompts::ask_optional("Auditors", "GitHub usernames separated by spaces")
            {
                self.auditors = split_auditors(&answer);
            }
        }
        Ok(())
    }

    /// Access is requested but nobody has been named.
    fn needs_auditors(&self) -> bool {
        self.give_users_access && self.auditors.is_empty()
    }
}

fn split_auditors(answer: &str) -> Vec<String> {
    answer.split_whitespace().map(str::to_string).collect()
}

fn fill(slot: &mut Option<String>, label: &str, interactive: bool) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Ok(());
    }
    if !interactive {
        return Err(ConfigError::MissingValue(label.to_string()));
    }
    match prompts::ask_required(label) {
        Some(value) => {
            *slot = Some(value);
            Ok(())
        }
        None => Err(ConfigError::MissingValue(label.to_string())),
    }
}

fn required(value: Option<String>, label: &str) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingValue(label.to_string()))
}

pub fn run(args: SetupArgs) -> Result<(), CyauditError> {
    let config = if args.config.exists() {
        info!("Using configuration from {}", args.config.display());
        load_config(&args.config)?
    } else {
        AuditConfig::default()
    };

    let interactive = !args.non_interactive;
    let mut values = SetupValues::merge(&args, config);
    values.complete(interactive)?;

    let personal = resolve_token(
        args.github_token
            .as_deref()
            .or(args.personal_github_token.as_deref()),
        PERSONAL_TOKEN_ENV_VAR,
    )?;
    let organization = resolve_token(args.organization_github_token.as_deref(), ORG_TOKEN_ENV_VAR)?;
    let credentials = Credentials::resolve(personal, organization)?;

    let source_url = required(values.source_url, "Source repository URL")?;
    let target_repo_name = match values.target_repo_name {
        Some(name) => name,
        None => SourceRepository::parse(&source_url)?.name,
    };

    let request = ProvisioningRequest::new(
        &source_url,
        &required(values.target_organization, "Target organization")?,
        &target_repo_name,
        &required(values.commit_hash, "Commit hash")?,
        credentials,
    )?;

    if let Some(title) = &values.project_title {
        info!("Project title: {}", title);
    }

    let strategy = if interactive {
        SelectionStrategy::CallbackPrompt {
            prompter: Arc::new(prompts::StdinPrompter),
            timeout: args.prompt_timeout.map(Duration::from_secs),
        }
    } else {
        SelectionStrategy::FailFast
    };

    let host = GitHubClient::new(request.credentials.target.clone())?;
    let git = GitDriver::new();
    let observer = LogObserver;
    let provisioner = Provisioner::new(&host, &git, BranchResolver::new(strategy), &observer);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(cyaudit::ProvisionError::from)?;

    let auditors = values.auditors;
    let give_users_access = values.give_users_access;
    let result = runtime.block_on(async {
        let outcome = provisioner.provision(&request).await?;

        if give_users_access && !auditors.is_empty() {
            let report = grant_auditor_access(&host, &outcome.repository, &auditors).await;
            if !report.is_complete() {
                warn!(
                    "{} auditor(s) could not be added: {}",
                    report.failed.len(),
                    report
                        .failed
                        .iter()
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }

        Ok::<_, CyauditError>(outcome)
    });

    // A branch prompt abandoned by a timeout may still be blocked on stdin
    runtime.shutdown_background();

    let outcome = result?;
    println!(
        "Audit repository {} created from branch {}: {}",
        outcome.repository.full_name(),
        outcome.branch,
        outcome.repository.html_url
    );
    Ok(())
}
