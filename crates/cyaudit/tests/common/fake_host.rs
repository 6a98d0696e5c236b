//! In-memory `RemoteHost` whose repositories are bare git repositories in a
//! temporary directory, so the real git driver can push into them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use cyaudit::error::ProvisionError;
use cyaudit::hosting::{OrgHandle, Permission, RemoteHost, RemoteRepository};

type Result<T> = std::result::Result<T, ProvisionError>;

/// A state-changing call the host received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created(String),
    Deleted(String),
    DefaultBranch(String, String),
    Collaborator(String, String, Permission),
}

pub struct FakeHost {
    root: TempDir,
    organizations: HashSet<String>,
    repositories: Mutex<HashMap<String, RemoteRepository>>,
    mutations: Mutex<Vec<Mutation>>,
    rejected_users: HashSet<String>,
    fail_deletes: AtomicBool,
}

impl FakeHost {
    pub fn new(organizations: &[&str]) -> Self {
        Self {
            root: TempDir::new().expect("Failed to create host root"),
            organizations: organizations.iter().map(|o| o.to_string()).collect(),
            repositories: Mutex::new(HashMap::new()),
            mutations: Mutex::new(Vec::new()),
            rejected_users: HashSet::new(),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Users that `add_collaborator` reports as unknown.
    pub fn rejecting_users(mut self, users: &[&str]) -> Self {
        self.rejected_users = users.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Makes every delete fail until switched off again.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Registers a repository without recording a mutation.
    pub fn with_existing_repository(self, org: &str, name: &str) -> Self {
        let repo = self.make_repository(org, name);
        self.repositories
            .lock()
            .unwrap()
            .insert(repo.full_name(), repo);
        self
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn repository(&self, org: &str, name: &str) -> Option<RemoteRepository> {
        self.repositories
            .lock()
            .unwrap()
            .get(&format!("{}/{}", org, name))
            .cloned()
    }

    /// Bare repository backing `org/name`.
    pub fn repository_path(&self, org: &str, name: &str) -> PathBuf {
        self.root.path().join(org).join(format!("{}.git", name))
    }

    fn make_repository(&self, org: &str, name: &str) -> RemoteRepository {
        let path = self.repository_path(org, name);
        std::fs::create_dir_all(&path).expect("Failed to create repository dir");
        git(&path, &["init", "--bare", "-b", "master"]);

        RemoteRepository {
            name: name.to_string(),
            organization: org.to_string(),
            is_private: true,
            default_branch: "master".to_string(),
            clone_url: path.to_string_lossy().into_owned(),
            html_url: format!("https://git.example.test/{}/{}", org, name),
        }
    }

    fn record(&self, mutation: Mutation) {
        self.mutations.lock().unwrap().push(mutation);
    }
}

/// Runs git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[async_trait]
impl RemoteHost for FakeHost {
    async fn organization(&self, org: &str) -> Result<OrgHandle> {
        if self.organizations.contains(org) {
            Ok(OrgHandle {
                login: org.to_string(),
            })
        } else {
            Err(ProvisionError::NotFound {
                kind: "Organization".to_string(),
                name: org.to_string(),
            })
        }
    }

    async fn repository_exists(&self, org: &str, name: &str) -> Result<bool> {
        Ok(self.repository(org, name).is_some())
    }

    async fn create_private_repository(
        &self,
        org: &OrgHandle,
        name: &str,
    ) -> Result<RemoteRepository> {
        if self.repository(&org.login, name).is_some() {
            return Err(ProvisionError::AlreadyExists {
                owner: org.login.clone(),
                name: name.to_string(),
            });
        }

        let repo = self.make_repository(&org.login, name);
        self.repositories
            .lock()
            .unwrap()
            .insert(repo.full_name(), repo.clone());
        self.record(Mutation::Created(repo.full_name()));
        Ok(repo)
    }

    async fn delete_repository(&self, repo: &RemoteRepository) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ProvisionError::Permission(format!(
                "cannot delete {}",
                repo.full_name()
            )));
        }

        self.repositories.lock().unwrap().remove(&repo.full_name());
        let path = self.repository_path(&repo.organization, &repo.name);
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        self.record(Mutation::Deleted(repo.full_name()));
        Ok(())
    }

    async fn set_default_branch(&self, repo: &RemoteRepository, branch: &str) -> Result<()> {
        let path = self.repository_path(&repo.organization, &repo.name);
        git(&path, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)]);

        if let Some(stored) = self.repositories.lock().unwrap().get_mut(&repo.full_name()) {
            stored.default_branch = branch.to_string();
        }
        self.record(Mutation::DefaultBranch(repo.full_name(), branch.to_string()));
        Ok(())
    }

    async fn add_collaborator(
        &self,
        repo: &RemoteRepository,
        username: &str,
        permission: Permission,
    ) -> Result<()> {
        if self.rejected_users.contains(username) {
            return Err(ProvisionError::NotFound {
                kind: "User".to_string(),
                name: username.to_string(),
            });
        }
        self.record(Mutation::Collaborator(
            repo.full_name(),
            username.to_string(),
            permission,
        ));
        Ok(())
    }

    fn clone_url(&self, owner: &str, name: &str) -> String {
        self.repository_path(owner, name)
            .to_string_lossy()
            .into_owned()
    }
}
