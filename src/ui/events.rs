//! Application event handling.
//!
//! Background tasks report back here. This is the only place their results
//! touch the application state, so panel data, the loader and popups are
//! always mutated from the event loop.
//!
//! Results never interrupt the user: a popup raised here waits until the open
//! popup or custom command is done.

use crate::app::{App, AppEvent, ConfirmPurpose, Popup, RemoteOp};
use crate::context::{ContextKey, ViewName};
use crate::git::{GitError, PushOptions};
use crate::panels::PanelKind;
use crate::remote::{after_push, PushFollowUp, FORCE_PUSH_DISABLED, FORCE_PUSH_PROMPT};
use tokio::sync::mpsc;

use super::helpers::{refresh_panels, request_preview};
use super::input::refresh_all;

/// Handle an event from a background task.
pub fn handle_app_event(app: &mut App, event: AppEvent, tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::PanelLoaded { request, result } => {
            let kind = request.kind;
            match app.panels.finish_refresh(&request, result) {
                Ok(Some(outcome)) => {
                    tracing::debug!(
                        panel = ?kind,
                        same_item = outcome.same_item_selected,
                        index_changed = outcome.index_changed,
                        "Panel refreshed"
                    );
                    if owner_focused(app, kind) {
                        app.needs_redraw = true;
                        request_preview(app, tx);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(panel = ?kind, error = %e, "Panel refresh failed");
                    app.set_status(format!("Failed to refresh {}: {}", kind.title(), e));
                }
            }
        }
        AppEvent::PreviewLoaded { generation, result } => {
            if generation != app.preview.generation {
                tracing::debug!(generation, "Discarding stale preview");
                return;
            }
            app.preview.loading = false;
            app.preview.text = match result {
                Ok(text) => text,
                Err(e) => e.to_string(),
            };
            app.needs_redraw = true;
        }
        AppEvent::RemoteDone { op, loader, result } => {
            if let Some(loader) = loader {
                app.clear_loader(loader);
            }
            handle_remote_done(app, op, result, tx)
        }
        AppEvent::PushDone {
            options,
            loader,
            result,
        } => {
            app.clear_loader(loader);
            handle_push_done(app, options, result, tx)
        }
        AppEvent::MutationDone {
            label,
            loader,
            refresh,
            result,
        } => {
            app.clear_loader(loader);
            if let Err(e) = result {
                tracing::warn!(operation = %label, error = %e, "Operation failed");
                app.report_error(e.to_string());
            }
            // The repository may have changed even when the command failed
            refresh_panels(app, refresh, tx);
        }
        AppEvent::TaskPanicked { task, error } => {
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}

/// Whether a refresh of `kind` should redraw: its view is focused and showing
/// it, or the main view is resolving conflicts in the files panel's file.
fn owner_focused(app: &App, kind: PanelKind) -> bool {
    if app.focused == kind.view() && app.is_displayed(kind) {
        return true;
    }
    kind == PanelKind::Files
        && app.focused == ViewName::Main
        && app.context_of(ViewName::Main) == ContextKey::MainMerging
}

fn handle_remote_done(
    app: &mut App,
    op: RemoteOp,
    result: Result<(), GitError>,
    tx: &mpsc::Sender<AppEvent>,
) {
    match (op, result) {
        (RemoteOp::BackgroundFetch, Ok(())) => {
            refresh_panels(app, &[PanelKind::Branches, PanelKind::Commits, PanelKind::Remotes], tx);
        }
        (RemoteOp::BackgroundFetch, Err(e)) => {
            tracing::warn!(error = %e, "Background fetch failed");
        }
        (op, Ok(())) => {
            tracing::info!(?op, "Remote operation finished");
            refresh_all(app, tx);
        }
        (op, Err(e)) => {
            tracing::warn!(?op, error = %e, "Remote operation failed");
            app.report_error(e.to_string());
            refresh_all(app, tx);
        }
    }
}

fn handle_push_done(
    app: &mut App,
    options: PushOptions,
    result: Result<(), GitError>,
    tx: &mpsc::Sender<AppEvent>,
) {
    match after_push(result, options.force, &app.config.git) {
        PushFollowUp::Done => {
            tracing::info!(forced = options.force, "Push finished");
            refresh_all(app, tx);
        }
        PushFollowUp::AskForce => app.queue_popup(Popup::Confirm {
            title: "Force push".to_string(),
            message: FORCE_PUSH_PROMPT.to_string(),
            purpose: ConfirmPurpose::ForcePush(PushOptions {
                force: true,
                ..options
            }),
        }),
        PushFollowUp::ForceDisabled => app.report_error(FORCE_PUSH_DISABLED),
        PushFollowUp::Failed(e) => {
            tracing::warn!(forced = options.force, error = %e, "Push failed");
            app.report_error(e.to_string());
        }
    }
}
