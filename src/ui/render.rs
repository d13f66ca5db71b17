//! Main rendering module for capiview
//!
//! Renders the complete UI:
//! - Header bar with the view path and canvas state
//! - Active view (tree canvas or logs)
//! - Status bar with key hints
//! - Settings/help overlays, popups and alerts

use crate::app::{App, Overlay, PopupState, Screen, SETTINGS_LABELS};
use crate::modules::{logs, tree_view};
use crate::ui::widgets::{self, KeyHint};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

/// Main render function – entry point for all UI rendering
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Fill entire background
    frame.render_widget(Block::default().style(app.theme.block_style()), area);

    let vertical = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(3),    // active view
        Constraint::Length(1), // status bar
    ])
    .split(area);

    render_header(frame, app, vertical[0]);
    render_content(frame, app, vertical[1]);
    render_status_bar(frame, app, vertical[2]);

    match app.overlay {
        Overlay::None => {}
        Overlay::Settings => render_settings(frame, app, area),
        Overlay::Help => render_help(frame, app, area),
    }

    render_popups(frame, app, area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let sep = || Span::styled("  │  ", theme.border());

    let mut spans = vec![
        Span::styled(
            " capiview ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(app.breadcrumb(), theme.title()),
    ];

    if let Some(Screen::Tree(tree)) = app.active() {
        spans.push(sep());
        spans.push(Span::styled(format!("Zoom {}%", tree.zoom_percent), theme.text()));
        spans.push(sep());
        spans.push(Span::styled("Lens ", theme.text_dim()));
        spans.push(toggle(tree.show_lens, "on", "off", app));
        spans.push(sep());
        spans.push(Span::styled("Links ", theme.text_dim()));
        spans.push(Span::styled(
            if tree.straight { "straight" } else { "curved" },
            Style::default().fg(theme.accent),
        ));
        spans.push(sep());
        let interval = match tree.refresh.poll_period() {
            Some(_) => format!("⟳ {}", app.refresh_interval),
            None => "⟳ off".to_string(),
        };
        spans.push(Span::styled(interval, theme.text()));
        if let Some(updated) = tree.refresh.last_updated() {
            spans.push(sep());
            spans.push(Span::styled(
                format!("Updated {}", updated.format("%H:%M:%S")),
                theme.text_dim(),
            ));
        }
        if tree.refresh.is_loading() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(widgets::spinner_frame(), Style::default().fg(theme.accent)));
        }
    } else if let Some(Screen::Logs(logs)) = app.active() {
        spans.push(sep());
        spans.push(Span::styled(format!("{} lines", logs.lines.len()), theme.text_dim()));
        if logs.loading {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(widgets::spinner_frame(), Style::default().fg(theme.accent)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn toggle<'a>(value: bool, on: &'a str, off: &'a str, app: &App) -> Span<'a> {
    if value {
        Span::styled(on, app.theme.toggle_on())
    } else {
        Span::styled(off, app.theme.toggle_off())
    }
}

fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    match app.screens.last_mut() {
        Some(Screen::Tree(tree)) => tree_view::render(frame, tree, theme, area),
        Some(Screen::Logs(state)) => logs::render(frame, state, theme, area),
        None => {}
    }
}

/// Render status bar: the newest alert if one is showing, key hints otherwise
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let right = match &app.backend_version {
        Some(v) if !v.is_empty() => format!("backend {}", v),
        _ => String::new(),
    };

    let left = match &app.flash_message {
        Some(alert) => widgets::alert_line(alert, theme),
        None => Line::from(widgets::key_hints(&status_hints(app), theme)),
    };
    widgets::render_status_bar(frame, left, &right, theme, area);
}

fn status_hints(app: &App) -> Vec<KeyHint<'static>> {
    if app.settings_editing {
        return vec![("Enter", "Save"), ("Esc", "Cancel")];
    }
    let mut hints = match (app.overlay, app.active()) {
        (Overlay::Settings, _) => {
            return vec![("j/k", "Navigate"), ("Enter", "Change"), ("Esc", "Close")];
        }
        (Overlay::Help, _) => return vec![("Esc", "Close")],
        (Overlay::None, Some(Screen::Tree(_))) => vec![
            ("+/-", "Zoom"),
            ("Arrows", "Pan"),
            ("c", "Center"),
            ("Tab", "Select"),
            ("i", "Lens"),
            ("s", "Links"),
            ("r", "Reload"),
        ],
        (Overlay::None, Some(Screen::Logs(_))) => {
            vec![("j/k", "Scroll"), ("g/G", "Top/End"), ("r", "Reload")]
        }
        (Overlay::None, None) => Vec::new(),
    };
    if app.screens.len() > 1 {
        hints.push(("Esc", "Back"));
    }
    if matches!(app.active(), Some(Screen::Tree(_))) {
        hints.push(("?", "Help"));
    }
    hints.push(("q", "Quit"));
    hints
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let mut content: Vec<Line> = SETTINGS_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let style = if i == app.settings_selected {
                theme.selected()
            } else {
                theme.text()
            };
            let editing = app.settings_editing && i == app.settings_selected;
            let value_style = if editing {
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.accent)
            };
            Line::from(vec![
                Span::styled(format!(" {:<18}", label), style),
                Span::styled(format!("[{}]", app.settings_value(i)), value_style),
            ])
        })
        .collect();

    content.push(Line::raw(""));
    content.push(Line::styled(
        format!(
            " Backend version: {}",
            app.backend_version.as_deref().unwrap_or("unavailable")
        ),
        theme.text_dim(),
    ));
    content.push(Line::styled(
        format!(" Config: {}", app.config_path().display()),
        theme.text_dim(),
    ));

    widgets::render_dialog(frame, "Settings", content, &[], theme, area);
}

const HELP_KEYS: &[(&str, &str)] = &[
    ("+ / -", "Zoom in / out (mouse wheel too)"),
    ("0", "Reset zoom"),
    ("Arrows", "Pan (or drag with the mouse)"),
    ("c", "Center the tree"),
    ("Tab / S-Tab", "Select next / previous node"),
    ("Enter", "Open selected workload cluster"),
    ("l", "Show logs of selected resource"),
    ("i", "Toggle details lens"),
    ("s", "Toggle straight / curved links"),
    ("r", "Reload now"),
    ("e", "Export tree as SVG"),
    ("Esc", "Back"),
    (",", "Settings"),
    ("q", "Quit"),
];

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let content: Vec<Line> = HELP_KEYS
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<13}", key),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(*desc, theme.text()),
            ])
        })
        .collect();

    widgets::render_dialog(frame, "Keys", content, &[("?", "Close")], theme, area);
}

/// Render the error popup above everything else
fn render_popups(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    if let PopupState::Error { title, message } = &app.popup {
        let body = vec![Line::styled(message.as_str(), theme.error())];
        widgets::render_dialog(frame, title, body, &[("Enter", "Dismiss")], theme, area);
    }
}
