//! The provisioning workflow.
//!
//! ```text
//! Start -> CheckTargetAbsent -> RemoteCreated -> SourceCloned -> BranchResolved -> Pushed
//!                                     \______________ failure ______________/
//!                                                       |
//!                                                   RolledBack
//! ```
//!
//! Nothing is created before the target is known to be absent. Once the
//! remote exists, every failure deletes it again before the error is
//! returned.

use std::path::{Path, PathBuf};

use log::{error, info, warn};
use tempfile::TempDir;
use tracing::Instrument;

use super::events::{EventLevel, ProvisionEvent, ProvisionObserver, ProvisionState};
use super::request::ProvisioningRequest;
use super::resolver::BranchResolver;
use super::MAIN_BRANCH_NAME;
use crate::error::{ProvisionError, RollbackError};
use crate::git::{LocalRepository, DEFAULT_REMOTE};
use crate::hosting::{RemoteHost, RemoteRepository};

type Result<T> = std::result::Result<T, ProvisionError>;

const WORKING_COPY_PREFIX: &str = "cyaudit-";

/// A fully provisioned audit repository.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub repository: RemoteRepository,
    /// Source branch that was published as `main`.
    pub branch: String,
}

/// Runs provisioning attempts against one host and one git engine.
pub struct Provisioner<'a> {
    host: &'a dyn RemoteHost,
    git: &'a dyn LocalRepository,
    resolver: BranchResolver,
    observer: &'a dyn ProvisionObserver,
    working_root: Option<PathBuf>,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        host: &'a dyn RemoteHost,
        git: &'a dyn LocalRepository,
        resolver: BranchResolver,
        observer: &'a dyn ProvisionObserver,
    ) -> Self {
        Self {
            host,
            git,
            resolver,
            observer,
            working_root: None,
        }
    }

    /// Creates working copies under `root` instead of the system temp directory.
    pub fn with_working_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.working_root = Some(root.into());
        self
    }

    /// Creates the audit repository described by `request` and publishes the
    /// branch containing the requested commit as its `main`.
    pub async fn provision(&self, request: &ProvisioningRequest) -> Result<ProvisionOutcome> {
        let span = tracing::info_span!(
            "provision",
            repository = %request.target_full_name(),
            commit = %request.commit_hash,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ProvisioningRequest) -> Result<ProvisionOutcome> {
        self.emit(
            ProvisionState::Start,
            EventLevel::Info,
            format!(
                "Provisioning {} from {}",
                request.target_full_name(),
                request.credentials.redact(&request.source.url)
            ),
        );

        let org = self.host.organization(&request.target_organization).await?;
        if self
            .host
            .repository_exists(&org.login, &request.target_repo_name)
            .await?
        {
            self.emit(
                ProvisionState::CheckTargetAbsent,
                EventLevel::Error,
                format!("{} already exists", request.target_full_name()),
            );
            return Err(ProvisionError::AlreadyExists {
                owner: org.login,
                name: request.target_repo_name.clone(),
            });
        }
        self.emit(
            ProvisionState::CheckTargetAbsent,
            EventLevel::Info,
            format!("{} is available", request.target_full_name()),
        );

        let repository = self
            .host
            .create_private_repository(&org, &request.target_repo_name)
            .await?;
        self.emit(
            ProvisionState::RemoteCreated,
            EventLevel::Info,
            format!("Created private repository {}", repository.full_name()),
        );

        // Point of no return: from here on a failure must delete the repository
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKING_COPY_PREFIX);
        let working_copy = match &self.working_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let working_copy = match working_copy {
            Ok(dir) => dir,
            Err(e) => {
                let err = ProvisionError::Io(e);
                self.rollback(&repository, &err).await;
                return Err(err);
            }
        };

        let populated = self
            .populate(request, &repository, working_copy.path())
            .await;
        discard_working_copy(working_copy);

        let branch = match populated {
            Ok(branch) => branch,
            Err(err) => {
                self.rollback(&repository, &err).await;
                return Err(err);
            }
        };

        if repository.default_branch != MAIN_BRANCH_NAME {
            if let Err(e) = self
                .host
                .set_default_branch(&repository, MAIN_BRANCH_NAME)
                .await
            {
                warn!(
                    "Could not set default branch of {}: {}",
                    repository.full_name(),
                    e
                );
            }
        }

        let mut repository = repository;
        repository.default_branch = MAIN_BRANCH_NAME.to_string();
        info!(
            "Audit repository ready: {}",
            request.credentials.redact(&repository.html_url)
        );

        Ok(ProvisionOutcome { repository, branch })
    }

    /// Clone, resolve and push. Returns the published branch.
    async fn populate(
        &self,
        request: &ProvisioningRequest,
        repository: &RemoteRepository,
        workdir: &Path,
    ) -> Result<String> {
        let credentials = &request.credentials;

        self.git
            .clone_repo(&request.source.clone_url, &credentials.source, workdir)?;
        self.emit(
            ProvisionState::SourceCloned,
            EventLevel::Info,
            format!(
                "Cloned {}/{}",
                request.source.owner, request.source.name
            ),
        );

        self.git.fetch(workdir, DEFAULT_REMOTE, &credentials.source)?;
        let branch = self
            .resolver
            .resolve(self.git, workdir, &request.commit_hash)
            .await?;
        self.emit(
            ProvisionState::BranchResolved,
            EventLevel::Info,
            format!(
                "Commit {} will be published from branch {}",
                request.commit_hash, branch
            ),
        );

        self.git
            .fetch_ref(workdir, DEFAULT_REMOTE, &branch, &credentials.source)?;
        self.git.checkout(workdir, &branch)?;
        self.git
            .set_remote_url(workdir, DEFAULT_REMOTE, &repository.clone_url)?;
        self.git.push(
            workdir,
            DEFAULT_REMOTE,
            &branch,
            MAIN_BRANCH_NAME,
            &credentials.target,
        )?;
        self.emit(
            ProvisionState::Pushed,
            EventLevel::Info,
            format!(
                "Pushed {} to {} as {}",
                branch,
                repository.full_name(),
                MAIN_BRANCH_NAME
            ),
        );

        Ok(branch)
    }

    /// Deletes a half-provisioned repository. Failures are reported, not returned.
    async fn rollback(&self, repository: &RemoteRepository, cause: &ProvisionError) {
        self.emit(
            ProvisionState::RolledBack,
            EventLevel::Warn,
            format!("Rolling back {}: {}", repository.full_name(), cause),
        );

        if let Err(source) = self.host.delete_repository(repository).await {
            let err = RollbackError {
                owner: repository.organization.clone(),
                name: repository.name.clone(),
                source,
            };
            error!("{}", err);
            self.emit(ProvisionState::RolledBack, EventLevel::Error, err.to_string());
            return;
        }

        self.emit(
            ProvisionState::RolledBack,
            EventLevel::Info,
            format!("Deleted {}", repository.full_name()),
        );
    }

    fn emit(&self, state: ProvisionState, level: EventLevel, message: String) {
        self.observer
            .on_event(&ProvisionEvent::new(state, level, message));
    }
}

fn discard_working_copy(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(
            "Failed to remove working copy {}: {}",
            path.display(),
            e
        );
    }
}
