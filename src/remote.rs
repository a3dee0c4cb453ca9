//! Async operation guard and the policies for remote operations.
//!
//! Fetch, pull and push all talk to the network and must not overlap. They run
//! as background tasks holding a [`RemoteGuard`]; the event loop keeps drawing
//! a loader while they do. The push and pull policies are plain functions so
//! the retry bound can be checked without a repository.
use crate::config::GitConfig;
use crate::git::{GitError, PushOptions};
use crate::models::Branch;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shown when force pushing would be needed but is turned off in config.
pub const FORCE_PUSH_DISABLED: &str =
    "Updates were rejected and you have disabled force pushing";

/// Shown in the force-push confirmation.
pub const FORCE_PUSH_PROMPT: &str =
    "Your branch has diverged from the remote branch. Press 'esc' to cancel, or 'enter' to force push.";

// ============================================================================
// Guard
// ============================================================================

/// Global exclusion for network-bound git operations.
///
/// Clones share the same lock. The lock is released when the guarded future
/// finishes, whether it succeeded, failed or panicked.
#[derive(Debug, Clone, Default)]
pub struct RemoteGuard {
    lock: Arc<Mutex<()>>,
}

impl RemoteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock, then run `op` while holding it.
    pub async fn run<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let _held = self.lock.lock().await;
        op.await
    }

    /// Run `op` only if no other remote operation is running. Periodic
    /// background fetches use this so they are skipped rather than queued.
    pub async fn try_run<F, T>(&self, op: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let Ok(_held) = self.lock.try_lock() else {
            tracing::debug!("Remote operation skipped: guard busy");
            return None;
        };
        Some(op.await)
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

// ============================================================================
// Push Policy
// ============================================================================

/// What to do before a push is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushPreflight {
    /// Push straight away with these options.
    Push(PushOptions),
    /// No upstream: ask for `"<remote> <branch>"`, prefilled with `suggestion`.
    AskUpstream { suggestion: String },
    /// The branch is behind its upstream: confirm a force push first.
    ConfirmForce,
    /// The branch is behind and force pushing is disabled.
    ForceDisabled,
}

pub fn push_preflight(branch: Option<&Branch>, git: &GitConfig) -> PushPreflight {
    let Some(branch) = branch else {
        return PushPreflight::Push(PushOptions::default());
    };

    match branch.pullables.as_str() {
        "?" if branch.upstream_name.is_some() => PushPreflight::Push(PushOptions::default()),
        "?" if git.push_to_current => PushPreflight::Push(PushOptions {
            set_upstream_current: true,
            ..Default::default()
        }),
        "?" => PushPreflight::AskUpstream {
            suggestion: format!("origin {}", branch.name),
        },
        "0" => PushPreflight::Push(PushOptions::default()),
        _ if git.disable_force_pushing => PushPreflight::ForceDisabled,
        _ => PushPreflight::ConfirmForce,
    }
}

/// What to do after a push attempt finished.
#[derive(Debug)]
pub enum PushFollowUp {
    Done,
    /// Rejected without force: ask the user whether to retry with force.
    AskForce,
    /// Rejected without force and force pushing is disabled.
    ForceDisabled,
    /// Terminal failure, including any failure of a forced push.
    Failed(GitError),
}

/// Decide the follow-up for a finished push. A forced push is never retried,
/// so a chain of attempts contains at most one forced retry.
pub fn after_push(result: Result<(), GitError>, forced: bool, git: &GitConfig) -> PushFollowUp {
    match result {
        Ok(()) => PushFollowUp::Done,
        Err(GitError::PushRejected) if !forced && git.disable_force_pushing => {
            PushFollowUp::ForceDisabled
        }
        Err(GitError::PushRejected) if !forced => PushFollowUp::AskForce,
        Err(e) => PushFollowUp::Failed(e),
    }
}

// ============================================================================
// Pull Policy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullPreflight {
    Pull,
    /// No upstream: ask for `"<remote>/<branch>"`, prefilled with `suggestion`,
    /// set it, then pull.
    AskUpstream { suggestion: String },
}

pub fn pull_preflight(branch: Option<&Branch>) -> PullPreflight {
    match branch {
        Some(b) if !b.has_upstream() && b.upstream_name.is_none() => PullPreflight::AskUpstream {
            suggestion: format!("origin/{}", b.name),
        },
        _ => PullPreflight::Pull,
    }
}

/// Reword the error git gives for a missing upstream into a hint.
pub fn explain_upstream_error(err: GitError, upstream: &str) -> GitError {
    match err {
        GitError::Failed(msg) if msg.contains("does not exist") => GitError::Failed(format!(
            "The upstream branch {upstream} does not exist on the remote. \
             Fetch with 'f' first, or push with 'P' to create it."
        )),
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn branch(pullables: &str, upstream: Option<&str>) -> Branch {
        Branch {
            name: "topic".into(),
            pushables: "1".into(),
            pullables: pullables.into(),
            upstream_name: upstream.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_preflight_in_sync_pushes() {
        let b = branch("0", Some("origin/topic"));
        assert_eq!(
            push_preflight(Some(&b), &GitConfig::default()),
            PushPreflight::Push(PushOptions::default())
        );
    }

    #[test]
    fn test_preflight_no_upstream_asks() {
        let b = branch("?", None);
        assert_eq!(
            push_preflight(Some(&b), &GitConfig::default()),
            PushPreflight::AskUpstream {
                suggestion: "origin topic".into()
            }
        );
    }

    #[test]
    fn test_preflight_no_upstream_push_to_current() {
        let b = branch("?", None);
        let git = GitConfig {
            push_to_current: true,
            ..Default::default()
        };
        let PushPreflight::Push(opts) = push_preflight(Some(&b), &git) else {
            panic!("expected push");
        };
        assert!(opts.set_upstream_current);
    }

    #[test]
    fn test_preflight_behind_needs_force() {
        let b = branch("2", Some("origin/topic"));
        assert_eq!(
            push_preflight(Some(&b), &GitConfig::default()),
            PushPreflight::ConfirmForce
        );
        let git = GitConfig {
            disable_force_pushing: true,
            ..Default::default()
        };
        assert_eq!(push_preflight(Some(&b), &git), PushPreflight::ForceDisabled);
    }

    #[test]
    fn test_force_retry_bound() {
        let git = GitConfig::default();

        // First rejection asks for force
        let first = after_push(Err(GitError::PushRejected), false, &git);
        assert!(matches!(first, PushFollowUp::AskForce));

        // A rejected forced retry is terminal
        let second = after_push(Err(GitError::PushRejected), true, &git);
        assert!(matches!(second, PushFollowUp::Failed(GitError::PushRejected)));
    }

    #[test]
    fn test_rejection_with_force_disabled() {
        let git = GitConfig {
            disable_force_pushing: true,
            ..Default::default()
        };
        assert!(matches!(
            after_push(Err(GitError::PushRejected), false, &git),
            PushFollowUp::ForceDisabled
        ));
    }

    #[test]
    fn test_other_failures_are_terminal() {
        let git = GitConfig::default();
        assert!(matches!(
            after_push(Err(GitError::Failed("no network".into())), false, &git),
            PushFollowUp::Failed(_)
        ));
        assert!(matches!(after_push(Ok(()), false, &git), PushFollowUp::Done));
    }

    #[test]
    fn test_pull_preflight() {
        assert_eq!(
            pull_preflight(Some(&branch("?", None))),
            PullPreflight::AskUpstream {
                suggestion: "origin/topic".into()
            }
        );
        assert_eq!(pull_preflight(Some(&branch("0", Some("origin/topic")))), PullPreflight::Pull);
        assert_eq!(pull_preflight(None), PullPreflight::Pull);
    }

    #[test]
    fn test_explain_upstream_error() {
        let err = explain_upstream_error(
            GitError::Failed("error: the requested upstream branch 'origin/x' does not exist".into()),
            "origin/x",
        );
        assert!(err.to_string().contains("'f'"));
    }

    #[tokio::test]
    async fn test_guard_serializes_operations() {
        let guard = RemoteGuard::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let guard = guard.clone();
            let active = active.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                guard
                    .run(async {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_run_skips_when_busy() {
        let guard = RemoteGuard::new();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let holder = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run(async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        assert!(guard.is_busy());
        assert_eq!(guard.try_run(async { 1 }).await, None);

        release_tx.send(()).unwrap();
        holder.await.unwrap();
        assert!(!guard.is_busy());
        assert_eq!(guard.try_run(async { 2 }).await, Some(2));
    }

    #[tokio::test]
    async fn test_guard_released_after_error() {
        let guard = RemoteGuard::new();
        let result: Result<(), GitError> = guard
            .run(async { Err(GitError::Failed("boom".into())) })
            .await;
        assert!(result.is_err());
        assert!(!guard.is_busy());
    }
}
