//! Builders for source repositories and git doubles.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::TempDir;

use cyaudit::error::ProvisionError;
use cyaudit::git::{GitDriver, LocalRepository};
use cyaudit::provision::BranchPrompter;
use cyaudit::secrets::AuthToken;

use super::fake_host::git;

type Result<T> = std::result::Result<T, ProvisionError>;

/// A source repository laid out as `<tmp>/acme/widget` with a `main` branch.
pub struct SourceFixture {
    _root: TempDir,
    pub path: PathBuf,
}

impl SourceFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create source root");
        let path = root.path().join("acme").join("widget");
        std::fs::create_dir_all(&path).expect("Failed to create source dir");

        git(&path, &["init", "-b", "main"]);
        git(&path, &["config", "user.email", "dev@acme.test"]);
        git(&path, &["config", "user.name", "Acme Dev"]);
        std::fs::write(path.join("README.md"), "# widget\n").unwrap();
        git(&path, &["add", "."]);
        git(&path, &["commit", "-m", "initial"]);

        Self { _root: root, path }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Creates `branch` from `base`.
    pub fn branch(&self, branch: &str, base: &str) -> &Self {
        git(&self.path, &["branch", branch, base]);
        self
    }

    /// Commits a new file on `branch` and returns the commit hash.
    pub fn commit(&self, branch: &str, file: &str) -> String {
        git(&self.path, &["checkout", branch]);
        std::fs::write(self.path.join(file), format!("// {}\n", file)).unwrap();
        git(&self.path, &["add", "."]);
        git(&self.path, &["commit", "-m", &format!("add {}", file)]);
        let hash = git(&self.path, &["rev-parse", "HEAD"]);
        git(&self.path, &["checkout", "main"]);
        hash
    }

    pub fn head_of(&self, branch: &str) -> String {
        git(&self.path, &["rev-parse", branch])
    }
}

/// Branch of a bare repository, if it exists.
pub fn bare_ref(path: &Path, branch: &str) -> Option<String> {
    let output = std::process::Command::new("git")
        .current_dir(path)
        .args(["rev-parse", "--verify", &format!("refs/heads/{}", branch)])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether `commit` is reachable from `branch` in the repository at `path`.
pub fn branch_contains(path: &Path, branch: &str, commit: &str) -> bool {
    std::process::Command::new("git")
        .current_dir(path)
        .args(["merge-base", "--is-ancestor", commit, &format!("refs/heads/{}", branch)])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Real git driver whose first `push_failures` pushes fail.
pub struct FlakyGit {
    inner: GitDriver,
    push_failures: AtomicUsize,
}

impl FlakyGit {
    pub fn failing_pushes(count: usize) -> Self {
        Self {
            inner: GitDriver::new(),
            push_failures: AtomicUsize::new(count),
        }
    }
}

impl LocalRepository for FlakyGit {
    fn clone_repo(&self, remote_url: &str, token: &AuthToken, destination: &Path) -> Result<()> {
        self.inner.clone_repo(remote_url, token, destination)
    }

    fn fetch(&self, path: &Path, remote: &str, token: &AuthToken) -> Result<()> {
        self.inner.fetch(path, remote, token)
    }

    fn list_remote_branches_containing(
        &self,
        path: &Path,
        remote: &str,
        commit: &str,
    ) -> Result<Vec<String>> {
        self.inner
            .list_remote_branches_containing(path, remote, commit)
    }

    fn fetch_ref(&self, path: &Path, remote: &str, branch: &str, token: &AuthToken) -> Result<()> {
        self.inner.fetch_ref(path, remote, branch, token)
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<()> {
        self.inner.checkout(path, branch)
    }

    fn set_remote_url(&self, path: &Path, remote: &str, url: &str) -> Result<()> {
        self.inner.set_remote_url(path, remote, url)
    }

    fn push(
        &self,
        path: &Path,
        remote: &str,
        local_branch: &str,
        remote_branch: &str,
        token: &AuthToken,
    ) -> Result<()> {
        let remaining = self.push_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.push_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProvisionError::Push(format!(
                "remote rejected {} (token {})",
                remote_branch,
                token.redact(token.expose())
            )));
        }
        self.inner
            .push(path, remote, local_branch, remote_branch, token)
    }
}

/// Answers branch prompts from a script and counts the questions.
pub struct ScriptedPrompter {
    answers: Mutex<Vec<String>>,
    asked: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl BranchPrompter for ScriptedPrompter {
    fn present(&self, _commit: &str, _candidates: &[String]) {}

    fn ask(&self, _message: &str) -> Option<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().unwrap().pop()
    }

    fn reject(&self, _message: &str) {}
}
