//! `git` subprocess driver.

use std::path::Path;
use std::process::{Command, Output};

use super::auth::{build_auth_env, AuthEnv};
use super::parse::{format_git_error, is_unknown_commit, parse_remote_branches};
use super::{LocalRepository, Result, DEFAULT_REMOTE};
use crate::error::ProvisionError;
use crate::secrets::{redact_url_credentials, AuthToken};

/// An empty `credential.helper` clears every helper configured so far.
const NO_CREDENTIAL_HELPER: [&str; 2] = ["-c", "credential.helper="];

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct GitDriver;

impl GitDriver {
    pub fn new() -> Self {
        Self
    }

    /// Stages a single file.
    pub fn stage(&self, path: &Path, file: &str) -> Result<()> {
        let output = self.run_git(Some(path), &["add", "--", file])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Git(redact_url_credentials(&format_git_error(
                &output,
            ))))
        }
    }

    /// Returns the commit `HEAD` points at.
    pub fn head_commit(&self, path: &Path) -> Result<String> {
        let output = self.run_git(Some(path), &["rev-parse", "HEAD"])?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(ProvisionError::Git(format_git_error(&output)))
        }
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    /// Runs a git command, optionally inside `repo_path`.
    fn run_git(&self, repo_path: Option<&Path>, args: &[&str]) -> Result<Output> {
        self.run(repo_path, args, None)
    }

    /// Runs a git command with askpass authentication.
    fn run_git_authenticated(
        &self,
        repo_path: Option<&Path>,
        args: &[&str],
        token: &AuthToken,
    ) -> Result<Output> {
        let auth = build_auth_env(token)?;
        let output = self.run(repo_path, args, Some(&auth));

        // Drop auth env (cleanup guard) after command completes
        drop(auth);
        output
    }

    fn run(&self, repo_path: Option<&Path>, args: &[&str], auth: Option<&AuthEnv>) -> Result<Output> {
        log::debug!("git {}", redact_url_credentials(&args.join(" ")));

        self.command(repo_path, args, auth)
            .output()
            .map_err(|e| ProvisionError::Git(format!("failed to run git: {}", e)))
    }

    /// Builds the git invocation. Authenticated commands get their answers
    /// from askpass alone: configured credential helpers are neither asked
    /// nor told about the token.
    fn command(&self, repo_path: Option<&Path>, args: &[&str], auth: Option<&AuthEnv>) -> Command {
        let mut cmd = Command::new("git");
        if let Some(path) = repo_path {
            cmd.current_dir(path);
        }

        if let Some(auth) = auth {
            cmd.args(NO_CREDENTIAL_HELPER);
            for (key, value) in &auth.env_vars {
                cmd.env(key, value);
            }
        }

        cmd.args(args);
        cmd
    }
}

impl LocalRepository for GitDriver {
    fn clone_repo(&self, remote_url: &str, token: &AuthToken, destination: &Path) -> Result<()> {
        let destination = destination.to_str().ok_or_else(|| {
            ProvisionError::Clone("destination path contains non-UTF8 characters".to_string())
        })?;

        let output = self.run_git_authenticated(None, &["clone", remote_url, destination], token)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Clone(token.redact(&format_git_error(&output))))
        }
    }

    fn fetch(&self, path: &Path, remote: &str, token: &AuthToken) -> Result<()> {
        let output = self.run_git_authenticated(Some(path), &["fetch", remote], token)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Git(token.redact(&format_git_error(&output))))
        }
    }

    fn list_remote_branches_containing(
        &self,
        path: &Path,
        remote: &str,
        commit: &str,
    ) -> Result<Vec<String>> {
        let output = self.run_git(Some(path), &["branch", "-r", "--contains", commit])?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Ok(parse_remote_branches(&stdout, remote));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_unknown_commit(&stderr) {
            log::debug!("Commit {} is unknown to the working copy", commit);
            return Ok(Vec::new());
        }

        Err(ProvisionError::Git(redact_url_credentials(&format_git_error(
            &output,
        ))))
    }

    fn fetch_ref(&self, path: &Path, remote: &str, branch: &str, token: &AuthToken) -> Result<()> {
        let refspec = format!("{}:refs/remotes/{}/{}", branch, remote, branch);
        let output = self.run_git_authenticated(Some(path), &["fetch", remote, &refspec], token)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Git(token.redact(&format_git_error(&output))))
        }
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<()> {
        let output = self.run_git(Some(path), &["checkout", branch])?;

        if output.status.success() {
            return Ok(());
        }

        // If failed, try creating local branch tracking remote
        let remote_ref = format!("{}/{}", DEFAULT_REMOTE, branch);
        let output = self.run_git(Some(path), &["checkout", "-b", branch, &remote_ref])?;

        if output.status.success() {
            return Ok(());
        }

        Err(ProvisionError::Git(format_git_error(&output)))
    }

    fn set_remote_url(&self, path: &Path, remote: &str, url: &str) -> Result<()> {
        let output = self.run_git(Some(path), &["remote", "set-url", remote, url])?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Git(redact_url_credentials(&format_git_error(
                &output,
            ))))
        }
    }

    fn push(
        &self,
        path: &Path,
        remote: &str,
        local_branch: &str,
        remote_branch: &str,
        token: &AuthToken,
    ) -> Result<()> {
        let refspec = format!("{}:{}", local_branch, remote_branch);
        let output =
            self.run_git_authenticated(Some(path), &["push", "-u", remote, &refspec], token)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Push(token.redact(&format_git_error(&output))))
        }
    }
}
