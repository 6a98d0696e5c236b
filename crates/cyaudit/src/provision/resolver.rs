//! Picks the source branch that carries the audited commit.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::error::ProvisionError;
use crate::git::{LocalRepository, DEFAULT_REMOTE};

type Result<T> = std::result::Result<T, ProvisionError>;

/// Interactive side of branch selection.
///
/// Implementations only do I/O; validation and re-prompting live in the
/// resolver.
pub trait BranchPrompter: Send + Sync {
    /// Shows the numbered candidate list.
    fn present(&self, commit: &str, candidates: &[String]);

    /// Asks for an answer. `None` means input is exhausted.
    fn ask(&self, message: &str) -> Option<String>;

    /// Tells the user an answer was not accepted.
    fn reject(&self, message: &str);
}

/// What to do when a commit lives on more than one branch.
#[derive(Clone)]
pub enum SelectionStrategy {
    /// Take the first candidate in listing order.
    Automatic,
    /// Ask through a prompter, optionally giving up after `timeout`.
    CallbackPrompt {
        prompter: Arc<dyn BranchPrompter>,
        timeout: Option<Duration>,
    },
    /// Refuse to guess.
    FailFast,
}

impl fmt::Debug for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStrategy::Automatic => f.write_str("Automatic"),
            SelectionStrategy::CallbackPrompt { timeout, .. } => f
                .debug_struct("CallbackPrompt")
                .field("timeout", timeout)
                .finish_non_exhaustive(),
            SelectionStrategy::FailFast => f.write_str("FailFast"),
        }
    }
}

/// Parses a 1-based menu answer into an index into the candidates.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    if (1..=count).contains(&choice) {
        Some(choice - 1)
    } else {
        None
    }
}

fn ambiguous(commit: &str, candidates: &[String], reason: &str) -> ProvisionError {
    ProvisionError::AmbiguousBranch {
        commit: commit.to_string(),
        candidates: candidates.to_vec(),
        reason: reason.to_string(),
    }
}

/// Blocking prompt loop. Keeps asking until an answer is valid or input ends.
fn prompt_for_branch(
    prompter: &dyn BranchPrompter,
    commit: &str,
    candidates: &[String],
) -> Result<String> {
    prompter.present(commit, candidates);
    let question = format!("Select a branch [1-{}]: ", candidates.len());

    loop {
        let Some(answer) = prompter.ask(&question) else {
            return Err(ambiguous(commit, candidates, "no selection was made"));
        };

        match parse_selection(&answer, candidates.len()) {
            Some(index) => return Ok(candidates[index].clone()),
            None => prompter.reject(&format!(
                "'{}' is not a number between 1 and {}",
                answer.trim(),
                candidates.len()
            )),
        }
    }
}

/// Resolves the branch to publish for a commit.
#[derive(Debug, Clone)]
pub struct BranchResolver {
    strategy: SelectionStrategy,
}

impl BranchResolver {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &SelectionStrategy {
        &self.strategy
    }

    /// Lists the branches of the working copy at `path` that contain
    /// `commit` and picks one.
    pub async fn resolve(
        &self,
        git: &dyn LocalRepository,
        path: &Path,
        commit: &str,
    ) -> Result<String> {
        let candidates = git.list_remote_branches_containing(path, DEFAULT_REMOTE, commit)?;
        debug!("Commit {} is on {} branch(es)", commit, candidates.len());
        self.choose(commit, candidates).await
    }

    /// Picks one of `candidates`. The result is always one of them.
    pub async fn choose(&self, commit: &str, candidates: Vec<String>) -> Result<String> {
        match candidates.len() {
            0 => {
                return Err(ProvisionError::CommitNotFound {
                    commit: commit.to_string(),
                })
            }
            1 => {
                info!("Commit {} found on branch {}", commit, candidates[0]);
                return Ok(candidates[0].clone());
            }
            _ => {}
        }

        match &self.strategy {
            SelectionStrategy::Automatic => {
                info!(
                    "Commit {} is on several branches, using {}",
                    commit, candidates[0]
                );
                Ok(candidates[0].clone())
            }
            SelectionStrategy::FailFast => Err(ambiguous(
                commit,
                &candidates,
                "interactive selection is disabled",
            )),
            SelectionStrategy::CallbackPrompt { prompter, timeout } => {
                let prompter = Arc::clone(prompter);
                let owned_commit = commit.to_string();
                let owned_candidates = candidates.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    prompt_for_branch(prompter.as_ref(), &owned_commit, &owned_candidates)
                });

                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(*limit, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            return Err(ambiguous(
                                commit,
                                &candidates,
                                &format!("no selection within {:?}", limit),
                            ))
                        }
                    },
                    None => handle.await,
                };

                joined.map_err(|e| {
                    ambiguous(commit, &candidates, &format!("prompt task failed: {}", e))
                })?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted answers and records what was shown.
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: Mutex<VecDeque<String>>,
        asked: Mutex<usize>,
        rejected: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn with_answers(answers: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
                ..Default::default()
            })
        }
    }

    impl BranchPrompter for ScriptedPrompter {
        fn present(&self, _commit: &str, _candidates: &[String]) {}

        fn ask(&self, _message: &str) -> Option<String> {
            *self.asked.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop_front()
        }

        fn reject(&self, message: &str) {
            self.rejected.lock().unwrap().push(message.to_string());
        }
    }

    /// Never answers.
    struct StalledPrompter;

    impl BranchPrompter for StalledPrompter {
        fn present(&self, _commit: &str, _candidates: &[String]) {}

        fn ask(&self, _message: &str) -> Option<String> {
            std::thread::sleep(Duration::from_secs(2));
            None
        }

        fn reject(&self, _message: &str) {}
    }

    fn candidates() -> Vec<String> {
        vec!["develop".to_string(), "release-1.0".to_string()]
    }

    fn prompting(prompter: Arc<dyn BranchPrompter>) -> BranchResolver {
        BranchResolver::new(SelectionStrategy::CallbackPrompt {
            prompter,
            timeout: None,
        })
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 2), Some(0));
        assert_eq!(parse_selection(" 2\n", 2), Some(1));
        assert_eq!(parse_selection("0", 2), None);
        assert_eq!(parse_selection("3", 2), None);
        assert_eq!(parse_selection("develop", 2), None);
        assert_eq!(parse_selection("", 2), None);
    }

    #[tokio::test]
    async fn test_no_candidates_is_commit_not_found() {
        let resolver = BranchResolver::new(SelectionStrategy::Automatic);
        let result = resolver.choose("abc123", Vec::new()).await;
        assert!(matches!(result, Err(ProvisionError::CommitNotFound { .. })));
    }

    #[tokio::test]
    async fn test_single_candidate_never_prompts() {
        let prompter = ScriptedPrompter::with_answers(&[]);
        let resolver = prompting(prompter.clone());

        let branch = resolver
            .choose("abc123", vec!["develop".to_string()])
            .await
            .unwrap();
        assert_eq!(branch, "develop");
        assert_eq!(*prompter.asked.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_single_candidate_with_fail_fast() {
        let resolver = BranchResolver::new(SelectionStrategy::FailFast);
        let branch = resolver
            .choose("abc123", vec!["develop".to_string()])
            .await
            .unwrap();
        assert_eq!(branch, "develop");
    }

    #[tokio::test]
    async fn test_automatic_picks_first() {
        let resolver = BranchResolver::new(SelectionStrategy::Automatic);
        let branch = resolver.choose("abc123", candidates()).await.unwrap();
        assert_eq!(branch, "develop");
    }

    #[tokio::test]
    async fn test_fail_fast_lists_candidates() {
        let resolver = BranchResolver::new(SelectionStrategy::FailFast);
        let err = resolver.choose("abc123", candidates()).await.unwrap_err();

        match &err {
            ProvisionError::AmbiguousBranch { candidates, .. } => {
                assert_eq!(candidates, &vec!["develop", "release-1.0"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("develop, release-1.0"));
    }

    #[tokio::test]
    async fn test_prompt_answer_selects_candidate() {
        let prompter = ScriptedPrompter::with_answers(&["2"]);
        let resolver = prompting(prompter);

        let branch = resolver.choose("abc123", candidates()).await.unwrap();
        assert_eq!(branch, "release-1.0");
    }

    #[tokio::test]
    async fn test_prompt_reprompts_on_invalid_answers() {
        let prompter = ScriptedPrompter::with_answers(&["5", "release", "1"]);
        let resolver = prompting(prompter.clone());

        let branch = resolver.choose("abc123", candidates()).await.unwrap();
        assert_eq!(branch, "develop");
        assert_eq!(*prompter.asked.lock().unwrap(), 3);
        assert_eq!(prompter.rejected.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_prompt_end_of_input_is_ambiguous() {
        let prompter = ScriptedPrompter::with_answers(&["9"]);
        let resolver = prompting(prompter);

        let result = resolver.choose("abc123", candidates()).await;
        assert!(matches!(result, Err(ProvisionError::AmbiguousBranch { .. })));
    }

    #[tokio::test]
    async fn test_prompt_timeout_is_ambiguous() {
        let resolver = BranchResolver::new(SelectionStrategy::CallbackPrompt {
            prompter: Arc::new(StalledPrompter),
            timeout: Some(Duration::from_millis(50)),
        });

        let err = resolver.choose("abc123", candidates()).await.unwrap_err();
        assert!(
            matches!(err, ProvisionError::AmbiguousBranch { ref reason, .. } if reason == "no selection within 50ms"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_strategy_debug_omits_prompter() {
        let strategy = SelectionStrategy::CallbackPrompt {
            prompter: ScriptedPrompter::with_answers(&[]),
            timeout: Some(Duration::from_secs(30)),
        };
        let debug = format!("{:?}", strategy);
        assert!(debug.starts_with("CallbackPrompt"));
        assert!(debug.contains("30s"));
    }
}
