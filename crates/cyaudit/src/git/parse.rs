//! Parsing of git command output.

use std::process::Output;

/// Describes a failed git command from whatever it printed, stderr first.
///
/// The result is not redacted; callers pass it through
/// [`AuthToken::redact`](crate::secrets::AuthToken::redact) before storing it.
pub fn format_git_error(output: &Output) -> String {
    let streams: Vec<String> = [&output.stderr, &output.stdout]
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if streams.is_empty() {
        match output.status.code() {
            Some(code) => format!("git exited with status {}", code),
            None => "git was terminated by a signal".to_string(),
        }
    } else {
        streams.join("\n")
    }
}

/// Parses `git branch -r --contains` output into branch names.
///
/// Drops symbolic entries (`origin/HEAD -> origin/main`) and strips the
/// `<remote>/` prefix. Branches of other remotes are ignored.
pub fn parse_remote_branches(output: &str, remote: &str) -> Vec<String> {
    let prefix = format!("{}/", remote);

    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("->"))
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|name| !name.is_empty() && *name != "HEAD")
        .map(str::to_string)
        .collect()
}

/// Whether git rejected a revision because it does not exist locally.
pub fn is_unknown_commit(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("malformed object name")
        || lower.contains("no such commit")
        || lower.contains("not a valid object name")
        || lower.contains("unknown revision")
}
