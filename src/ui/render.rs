//! Render functions for the TUI.
//!
//! The screen is a column of side windows on the left, the main view on the
//! right and a one-line status bar at the bottom. Rendering also records where
//! each view landed so mouse events can be routed to the view under the
//! pointer.

use crate::app::{App, Popup};
use crate::context::{ContextKey, ViewName};
use crate::git::PreviewTarget;
use crate::panels::PanelKind;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::borrow::Cow;
use unicode_width::UnicodeWidthStr;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 16;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

/// Main render entry point.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        app.layout.views.clear();
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Fill(3),
            Constraint::Fill(3),
            Constraint::Fill(3),
            Constraint::Fill(2),
        ])
        .split(columns[0]);

    app.layout.views.clear();
    for (view, rect) in ViewName::SIDE_WINDOWS.into_iter().zip(side.iter().copied()) {
        app.layout.views.push((view, rect));
        if view == ViewName::Status {
            render_status_window(f, app, rect);
        } else {
            render_side_window(f, app, view, rect);
        }
    }

    app.layout.views.push((ViewName::Main, columns[1]));
    render_main(f, app, columns[1]);
    render_status_bar(f, app, rows[1]);

    app.layout.popup = None;
    if let Some(popup) = app.popup.clone() {
        render_popup(f, app, &popup);
    }
}

// ============================================================================
// Side Windows
// ============================================================================

fn render_status_window(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused == ViewName::Status;
    let text = match app.checked_out_branch() {
        Some(b) if b.has_upstream() => format!("↑{} ↓{} {}", b.pushables, b.pullables, b.name),
        Some(b) => b.name.clone(),
        None => String::new(),
    };
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused))
            .title(" Status "),
    );
    f.render_widget(paragraph, area);
}

/// Window title: the view's tabs with the active one highlighted, or the
/// drill-down panel's own title.
fn window_title(app: &App, view: ViewName) -> Line<'static> {
    let ctx = app.context_of(view);
    let tabs = view.tabs();
    if tabs.contains(&ctx) {
        let mut spans = vec![Span::raw(" ")];
        for (i, tab) in tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" - "));
            }
            let title = PanelKind::for_context(*tab).map_or("", PanelKind::title);
            let style = if *tab == ctx {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(title, style));
        }
        spans.push(Span::raw(" "));
        return Line::from(spans);
    }

    let title = PanelKind::for_context(ctx).map_or(view.as_str(), PanelKind::title);
    let scoped = PanelKind::for_context(ctx)
        .and_then(|kind| app.panels.scope(kind))
        .map(|scope| format!(" {} ({}) ", title, scope));
    Line::from(scoped.unwrap_or_else(|| format!(" {} ", title)))
}

fn render_side_window(f: &mut Frame, app: &mut App, view: ViewName, area: Rect) {
    let focused = app.focused == view;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(window_title(app, view));

    let Some(kind) = app.panel_of(view) else {
        f.render_widget(block, area);
        return;
    };

    let snapshot = app.panels.current(kind);
    let count = format!(" {} of {} ", snapshot.selected.map_or(0, |i| i + 1), snapshot.rows.len());
    let block = block.title_bottom(Line::from(count).alignment(Alignment::Right));

    let refreshing = app.panels.is_refreshing(kind) && snapshot.rows.is_empty();
    let items: Vec<ListItem> = if refreshing {
        vec![ListItem::new("Loading...")]
    } else {
        snapshot.rows.into_iter().map(ListItem::new).collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(focused));

    let previous_offset = app.layout.offsets.get(&kind).copied().unwrap_or(0);
    let mut state = ListState::default()
        .with_offset(previous_offset)
        .with_selected(if refreshing { None } else { snapshot.selected });
    f.render_stateful_widget(list, area, &mut state);

    app.layout.offsets.insert(kind, state.offset());
    app.layout
        .heights
        .insert(kind, area.height.saturating_sub(2) as usize);
}

// ============================================================================
// Main View
// ============================================================================

fn main_title(app: &App) -> &'static str {
    match app.context_of(ViewName::Main) {
        ContextKey::MainStaging => " Staging ",
        ContextKey::MainMerging => " Merging ",
        ContextKey::MainPatchBuilding => " Patch ",
        _ => match app.preview.target {
            Some(PreviewTarget::File { .. }) | Some(PreviewTarget::CommitFile { .. }) => " Diff ",
            Some(PreviewTarget::Commit(_)) | Some(PreviewTarget::Stash(_)) => " Patch ",
            Some(_) => " Log ",
            None => "",
        },
    }
}

fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused == ViewName::Main;
    let text: Cow<'_, str> = if app.preview.loading && app.preview.text.is_empty() {
        Cow::Borrowed("Loading...")
    } else {
        Cow::Borrowed(app.preview.text.as_str())
    };

    let paragraph = Paragraph::new(text.into_owned())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused))
                .title(main_title(app)),
        )
        .scroll((app.preview.scroll, 0));
    f.render_widget(paragraph, area);
}

// ============================================================================
// Status Bar
// ============================================================================

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some(loader) = app.loader.current() {
        Cow::Owned(format!("{} {}", SPINNER[app.spinner_frame % SPINNER_FRAMES], loader))
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Owned(format!(
            "{}: keybindings  {}: push  {}: pull  {}: quit",
            app.keys.label("universal.optionMenu"),
            app.keys.label("universal.pushFiles"),
            app.keys.label("universal.pullFiles"),
            app.keys.label("universal.quit"),
        ))
    };

    let style = Style::default().fg(Color::Cyan);
    f.render_widget(Paragraph::new(text).style(style), area);
}

// ============================================================================
// Popups
// ============================================================================

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_popup(f: &mut Frame, app: &mut App, popup: &Popup) {
    let area = f.area();
    let popup_style = Style::default().fg(Color::Green);

    let overlay = match popup {
        Popup::Prompt {
            title,
            input,
            cursor,
            ..
        } => {
            let overlay = centered(area, 70, 3);
            f.render_widget(Clear, overlay);
            let paragraph = Paragraph::new(input.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(popup_style)
                    .title(format!(" {} ", title)),
            );
            f.render_widget(paragraph, overlay);

            let before: String = input.chars().take(*cursor).collect();
            let x = overlay.x + 1 + before.width() as u16;
            f.set_cursor_position(Position::new(
                x.min(overlay.x + overlay.width.saturating_sub(2)),
                overlay.y + 1,
            ));
            overlay
        }
        Popup::Menu {
            title,
            items,
            selected,
        } => {
            let label_width = items.iter().map(|i| i.label.width()).max().unwrap_or(0);
            let rows: Vec<ListItem> = items
                .iter()
                .map(|item| {
                    let pad = label_width.saturating_sub(item.label.width());
                    let mut spans = vec![Span::styled(
                        format!("{}{}", item.label, " ".repeat(pad)),
                        Style::default().fg(Color::Cyan),
                    )];
                    if !item.description.is_empty() {
                        spans.push(Span::raw(format!("  {}", item.description)));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let height = (items.len() as u16).saturating_add(2).max(3);
            let overlay = centered(area, 80, height);
            f.render_widget(Clear, overlay);
            let list = List::new(rows)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(popup_style)
                        .title(format!(" {} ", title)),
                )
                .highlight_style(highlight_style(true));
            let mut state = ListState::default().with_selected(Some(*selected));
            f.render_stateful_widget(list, overlay, &mut state);
            overlay
        }
        Popup::Confirm { title, message, .. } => {
            render_message(f, area, title, message, popup_style)
        }
        Popup::Error { message } => {
            render_message(f, area, "Error", message, Style::default().fg(Color::Red))
        }
    };

    app.layout.popup = Some(overlay);
}

fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, style: Style) -> Rect {
    let width = 70u16;
    let inner = width.saturating_sub(2).max(1) as usize;
    let lines: u16 = message
        .lines()
        .map(|l| (l.width() / inner + 1) as u16)
        .sum::<u16>()
        .max(1);
    let overlay = centered(area, width, lines + 2);
    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(format!(" {} ", title)),
        );
    f.render_widget(paragraph, overlay);
    overlay
}
