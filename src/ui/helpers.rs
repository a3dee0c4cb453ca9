//! Background task spawning shared by the input and event handlers.
//!
//! Every task catches its own panics and always reports back through the
//! event channel, so bookkeeping held by the loop (refresh slots, loaders)
//! is released whatever happens in the task.

use crate::app::{App, AppEvent, RemoteOp};
use crate::git::{GitError, PullMode, PushOptions};
use crate::panels::PanelKind;
use crate::remote::explain_upstream_error;
use futures::FutureExt;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run `op` in the background and turn a panic into a [`GitError`] so the
/// caller's completion event is still sent.
fn spawn_reporting<F, M>(task: &'static str, tx: &mpsc::Sender<AppEvent>, op: F, into_event: M)
where
    F: Future<Output = Result<(), GitError>> + Send + 'static,
    M: FnOnce(Result<(), GitError>) -> AppEvent + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = match catch_task_panic(op).await {
            Ok(result) => result,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                let _ = tx
                    .send(AppEvent::TaskPanicked {
                        task,
                        error: panic_msg.clone(),
                    })
                    .await;
                Err(GitError::Failed(format!("{} failed unexpectedly: {}", task, panic_msg)))
            }
        };
        if let Err(e) = tx.send(into_event(result)).await {
            tracing::warn!(task, error = %e, "Failed to send task result (receiver dropped)");
        }
    });
}

// ============================================================================
// Panel Refresh
// ============================================================================

/// Start a background fetch of `kind`. Returns `false` when the request was
/// dropped because a fetch of the same panel is still running (or the panel
/// has no scope yet).
pub fn refresh_panel(app: &mut App, kind: PanelKind, tx: &mpsc::Sender<AppEvent>) -> bool {
    let Some(request) = app.panels.begin_refresh(kind) else {
        return false;
    };

    let repo = app.repo.clone();
    let tx = tx.clone();
    tracing::debug!(panel = ?kind, scope = ?request.scope, "Spawning panel refresh");

    tokio::spawn(async move {
        let result = match catch_task_panic(repo.load(&request)).await {
            Ok(result) => result,
            Err(panic_msg) => {
                tracing::error!(panel = ?request.kind, error = %panic_msg, "Panel refresh panicked");
                Err(GitError::Failed(format!("refresh panicked: {}", panic_msg)))
            }
        };
        if let Err(e) = tx.send(AppEvent::PanelLoaded { request, result }).await {
            tracing::warn!(error = %e, "Failed to send panel data (receiver dropped)");
        }
    });
    true
}

pub(super) fn refresh_panels(app: &mut App, kinds: &[PanelKind], tx: &mpsc::Sender<AppEvent>) {
    for &kind in kinds {
        refresh_panel(app, kind, tx);
    }
}

// ============================================================================
// Main View Preview
// ============================================================================

/// Load the preview for the focused selection if it changed.
pub(super) fn request_preview(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let target = app.preview_target();
    if target == app.preview.target {
        return;
    }

    app.preview.generation = app.preview.generation.wrapping_add(1);
    app.preview.target = target.clone();
    app.preview.scroll = 0;
    app.needs_redraw = true;

    let Some(target) = target else {
        app.preview.text.clear();
        app.preview.loading = false;
        return;
    };

    app.preview.loading = true;
    let generation = app.preview.generation;
    let repo = app.repo.clone();
    let tx = tx.clone();

    tokio::spawn(async move {
        let result = match catch_task_panic(repo.preview(&target)).await {
            Ok(result) => result,
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Preview load panicked");
                Err(GitError::Failed(panic_msg))
            }
        };
        let _ = tx.send(AppEvent::PreviewLoaded { generation, result }).await;
    });
}

// ============================================================================
// Remote Operations
// ============================================================================

/// Fetch under the remote guard. A background fetch is skipped, not queued,
/// while another remote operation holds the guard.
pub(super) fn spawn_fetch(app: &mut App, background: bool, tx: &mpsc::Sender<AppEvent>) {
    let repo = app.repo.clone();
    let guard = app.remote_guard.clone();

    if background {
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(result) = guard.try_run(repo.fetch()).await else {
                return;
            };
            let _ = tx
                .send(AppEvent::RemoteDone {
                    op: RemoteOp::BackgroundFetch,
                    loader: None,
                    result,
                })
                .await;
        });
        return;
    }

    let loader = app.set_loader("Fetching...");
    spawn_reporting(
        "fetch",
        tx,
        async move { guard.run(repo.fetch()).await },
        move |result| AppEvent::RemoteDone {
            op: RemoteOp::Fetch,
            loader: Some(loader),
            result,
        },
    );
}

/// Pull, first setting `upstream` when the branch has none.
pub(super) fn spawn_pull(
    app: &mut App,
    mode: PullMode,
    upstream: Option<String>,
    tx: &mpsc::Sender<AppEvent>,
) {
    let repo = app.repo.clone();
    let guard = app.remote_guard.clone();
    let loader = app.set_loader("Pulling...");

    spawn_reporting(
        "pull",
        tx,
        async move {
            guard
                .run(async {
                    if let Some(upstream) = upstream {
                        repo.set_upstream(&upstream)
                            .await
                            .map_err(|e| explain_upstream_error(e, &upstream))?;
                    }
                    repo.pull(mode).await
                })
                .await
        },
        move |result| AppEvent::RemoteDone {
            op: RemoteOp::Pull,
            loader: Some(loader),
            result,
        },
    );
}

pub(super) fn spawn_push(app: &mut App, options: PushOptions, tx: &mpsc::Sender<AppEvent>) {
    let repo = app.repo.clone();
    let guard = app.remote_guard.clone();
    let forced = options.force;
    let loader = app.set_loader(if forced { "Force pushing..." } else { "Pushing..." });
    tracing::info!(forced, target = ?options.target, "Starting push");

    let for_task = options.clone();
    spawn_reporting(
        "push",
        tx,
        async move { guard.run(repo.push(&for_task)).await },
        move |result| AppEvent::PushDone {
            options,
            loader,
            result,
        },
    );
}

// ============================================================================
// Mutations
// ============================================================================

/// Run a repository mutation in the background. `refresh` is reloaded once it
/// finishes, whether or not it succeeded.
pub(super) fn spawn_mutation<F>(
    app: &mut App,
    label: impl Into<Cow<'static, str>>,
    refresh: &'static [PanelKind],
    op: F,
    tx: &mpsc::Sender<AppEvent>,
) where
    F: Future<Output = Result<(), GitError>> + Send + 'static,
{
    let label = label.into();
    let loader = app.set_loader(label.clone());
    spawn_reporting("mutation", tx, op, move |result| AppEvent::MutationDone {
        label,
        loader,
        refresh,
        result,
    });
}
