use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cyaudit::DEFAULT_CONFIG_FILE;

/// Sets up private smart-contract audit repositories.
#[derive(Debug, Parser)]
#[command(name = "cyaudit", disable_version_flag = true)]
pub struct Cli {
    /// Print version information
    #[arg(long)]
    pub version: bool,

    /// Verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the audit repository from a source repository at a commit
    Setup(SetupArgs),
    /// Clone the audit repository into the current directory, keeping cyaudit.toml
    Clone(CloneArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// URL of the repository under audit
    #[arg(short = 's', long)]
    pub source_url: Option<String>,

    /// Name of the audit repository (defaults to the source repository name)
    #[arg(short = 't', long)]
    pub target_repo_name: Option<String>,

    /// GitHub usernames of the auditors
    #[arg(short = 'a', long, num_args = 1..)]
    pub auditors: Vec<String>,

    /// Organization that will own the audit repository
    #[arg(short = 'o', long)]
    pub target_organization: Option<String>,

    /// Commit the audit is pinned to
    #[arg(short = 'c', long)]
    pub commit_hash: Option<String>,

    /// Token used for every GitHub operation
    #[arg(long, conflicts_with = "personal_github_token")]
    pub github_token: Option<String>,

    /// Personal token, used to read the source repository
    #[arg(short = 'p', long)]
    pub personal_github_token: Option<String>,

    /// Organization token, used to create and push the audit repository
    #[arg(short = 'g', long)]
    pub organization_github_token: Option<String>,

    #[arg(long)]
    pub project_title: Option<String>,

    /// Configuration file, read when present
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Never prompt; fail when a value is missing or the branch is ambiguous
    #[arg(long)]
    pub non_interactive: bool,

    /// Give up on the branch prompt after this many seconds
    #[arg(long, value_name = "SECS")]
    pub prompt_timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CloneArgs {
    /// Audit repository URL (defaults to target_organization/target_repo_name from the config)
    pub target_url: Option<String>,

    /// Configuration file, read when present
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}
