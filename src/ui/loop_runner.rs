//! Main event loop for the TUI.
//!
//! This module contains the core event loop that multiplexes terminal input,
//! background task events, periodic refreshes and ticks.

use crate::app::{App, AppEvent};
use crate::git::shell;
use crate::panels::PanelKind;
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::{refresh_panel, request_preview, spawn_fetch};
use super::input::{handle_key_event, handle_mouse_event, refresh_all, LoopControl};
use super::render::{render, SPINNER_FRAMES};

const TICK: Duration = Duration::from_millis(100);

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` to multiplex:
/// - **Terminal input**: key presses and mouse events from crossterm's async event stream
/// - **Background tasks**: panel loads, previews and remote operations via the `AppEvent` channel
/// - **Periodic refresh**: the files panel and a background fetch, each on its own interval
/// - **Tick**: spinner animation and status expiry
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
///
/// # Returns
///
/// Returns `Ok(())` on graceful exit (user quit), or an error if terminal
/// setup fails.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal(app.config.mouse)?;
    let mut event_stream = EventStream::new();

    let mut tick_interval = tokio::time::interval(TICK);
    let mut refresh_interval = periodic(app.config.refresh_interval_secs);
    let mut fetch_interval = periodic(app.config.fetch_interval_secs);

    // Signal handlers for graceful shutdown (Unix only)
    // On non-Unix platforms, these become pending futures that never complete
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    refresh_all(app, &event_tx);
    request_preview(app, &event_tx);
    app.needs_redraw = true;

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Drain pending app events before handling more input so task
        // results are not starved by rapid typing.
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event, &event_tx);
        }

        if let Some(command) = app.pending_subprocess.take() {
            drop(event_stream);
            run_subprocess(&mut terminal, &command, app.config.mouse).await?;
            event_stream = EventStream::new();
            terminal.clear()?;
            refresh_all(app, &event_tx);
            app.needs_redraw = true;
            continue;
        }

        // Platform-specific signal futures
        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;  // Process in order listed for predictable behavior

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                let control = match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        handle_key_event(app, &key, &event_tx)
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        app.needs_redraw = true;
                        handle_mouse_event(app, &mouse, &event_tx)
                    }
                    Some(Ok(Event::Resize(..))) => {
                        app.needs_redraw = true;
                        LoopControl::Continue
                    }
                    Some(Ok(_)) => LoopControl::Continue,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Terminal event stream failed");
                        break;
                    }
                    None => break,
                };
                if control == LoopControl::Quit {
                    break;
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event, &event_tx);
            }

            _ = tick(&mut refresh_interval) => {
                refresh_panel(app, PanelKind::Files, &event_tx);
            }

            _ = tick(&mut fetch_interval) => {
                spawn_fetch(app, true, &event_tx);
            }

            _ = tick_interval.tick() => {
                handle_tick(app);
            }
        }
    }

    restore_terminal(terminal, app.config.mouse)?;
    Ok(())
}

/// Interval firing every `secs` seconds, starting one period from now.
/// Zero disables it.
fn periodic(secs: u64) -> Option<Interval> {
    if secs == 0 {
        return None;
    }
    let period = Duration::from_secs(secs);
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn handle_tick(app: &mut App) {
    if app.loader.is_active() {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER_FRAMES;
        app.needs_redraw = true;
    }
    if app.clear_expired_status() {
        app.needs_redraw = true;
    }
}

/// Hand the terminal to a shell command, then wait for the user before
/// taking it back.
async fn run_subprocess(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    command: &str,
    mouse: bool,
) -> Result<()> {
    suspend_terminal(terminal, mouse)?;
    tracing::info!(command, "Running subprocess");

    let (program, flag) = shell();
    match tokio::process::Command::new(program)
        .arg(flag)
        .arg(command)
        .status()
        .await
    {
        Ok(status) if !status.success() => {
            tracing::warn!(command, ?status, "Subprocess exited unsuccessfully");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(command, error = %e, "Failed to start subprocess");
            println!("{}", e);
        }
    }

    print!("\nPress enter to return to gitdeck");
    io::stdout().flush()?;
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line)
    })
    .await??;

    resume_terminal(terminal, mouse)
}

/// Set up the terminal for TUI rendering.
fn setup_terminal(mouse: bool) -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn suspend_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mouse: bool) -> Result<()> {
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn resume_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mouse: bool) -> Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    if mouse {
        execute!(terminal.backend_mut(), EnableMouseCapture)?;
    }
    Ok(())
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>, mouse: bool) -> Result<()> {
    suspend_terminal(&mut terminal, mouse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_interval_disabled() {
        assert!(periodic(0).is_none());
        let interval = periodic(30).unwrap();
        assert_eq!(interval.period(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_first_tick_after_one_period() {
        let start = Instant::now();
        let mut interval = periodic(5);
        tick(&mut interval).await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
