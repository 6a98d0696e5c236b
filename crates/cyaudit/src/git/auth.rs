//! Token authentication for git subprocesses.
//!
//! The token is handed to git through a short-lived `GIT_ASKPASS` script so
//! it never shows up in a remote URL, `.git/config`, or process arguments.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::git::Result;
use crate::secrets::AuthToken;

/// Username sent alongside a token over HTTPS.
pub const TOKEN_USERNAME: &str = "x-access-token";

/// Quotes `value` for a POSIX shell: wraps it in single quotes and turns every
/// embedded `'` into `'\''`.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Escapes batch metacharacters with `^` and doubles `%`.
#[cfg(windows)]
fn batch_escape(value: &str) -> String {
    value
        .chars()
        .fold(String::with_capacity(value.len() * 2), |mut out, ch| {
            match ch {
                '%' => out.push_str("%%"),
                '^' | '&' | '|' | '<' | '>' | '(' | ')' | '"' => {
                    out.push('^');
                    out.push(ch);
                }
                _ => out.push(ch),
            }
            out
        })
}

/// Script body and file extension for the current platform. Git passes the
/// prompt text as the first argument.
#[cfg(unix)]
fn askpass_script(token: &AuthToken) -> (&'static str, String) {
    let body = format!(
        "#!/bin/sh\ncase \"$1\" in\n  Username*) echo {} ;;\n  *) echo {} ;;\nesac\n",
        sh_quote(TOKEN_USERNAME),
        sh_quote(token.expose())
    );
    ("sh", body)
}

#[cfg(windows)]
fn askpass_script(token: &AuthToken) -> (&'static str, String) {
    let body = format!(
        "@echo off\r\necho %~1 | findstr /b \"Username\" >nul && (echo {}) || (echo {})\r\n",
        TOKEN_USERNAME,
        batch_escape(token.expose())
    );
    ("bat", body)
}

/// Creates `path` readable and executable by the owner only.
fn write_private_executable(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o700);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())
}

/// Deletes the askpass script when dropped.
#[derive(Debug)]
pub struct AskpassCleanup {
    path: Option<PathBuf>,
}

impl AskpassCleanup {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for AskpassCleanup {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("Failed to remove askpass script {}: {}", path.display(), e);
        }
    }
}

/// Environment for one authenticated git command.
#[derive(Debug)]
pub struct AuthEnv {
    pub env_vars: Vec<(String, String)>,
    /// Keep alive until the git command has exited.
    pub cleanup: AskpassCleanup,
}

/// Writes an askpass script for `token` into the temp directory.
pub fn build_auth_env(token: &AuthToken) -> Result<AuthEnv> {
    let (extension, script) = askpass_script(token);
    let path = std::env::temp_dir().join(format!(
        ".cyaudit-askpass-{}.{}",
        uuid::Uuid::new_v4(),
        extension
    ));

    write_private_executable(&path, &script)?;
    let cleanup = AskpassCleanup::new(path);

    let askpass = cleanup
        .path()
        .and_then(Path::to_str)
        .ok_or_else(|| ProvisionError::Auth("temp directory path is not valid UTF-8".to_string()))?
        .to_string();

    Ok(AuthEnv {
        env_vars: vec![
            ("GIT_ASKPASS".to_string(), askpass),
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
        ],
        cleanup,
    })
}
