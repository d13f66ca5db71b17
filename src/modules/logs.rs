//! Resource logs view
//!
//! Shows the controller log lines for one resource of a workload cluster.
//! Logs are fetched in the background; `r` fetches them again.

use crate::api::FetchError;
use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::mpsc;
use tracing::{debug, warn};

/// The resource whose logs are shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub resource_type: String,
    pub name: String,
    pub namespace: String,
}

impl LogTarget {
    pub fn title(&self) -> String {
        format!("{}/{}", self.resource_type, self.name)
    }

    pub fn alert_message(&self, err: &FetchError) -> String {
        match err {
            FetchError::NotFound => format!(
                "Resource {}/{} not found in namespace {}",
                self.resource_type, self.name, self.namespace
            ),
            FetchError::Transport(_) => "No server response received".to_string(),
            FetchError::Request(_) => "Unable to create request".to_string(),
            FetchError::Server { .. } | FetchError::Decode(_) => {
                format!("Unable to load logs for {}/{}", self.resource_type, self.name)
            }
        }
    }
}

/// What the app should do after a key was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogsAction {
    None,
    Reload,
}

pub struct LogsState {
    pub target: LogTarget,
    pub lines: Vec<String>,
    pub scroll: usize,
    pub loading: bool,
    pub loaded: bool,
    load_rx: Option<mpsc::Receiver<Result<String, FetchError>>>,
    /// Rows visible in the last render, used for paging
    page_rows: usize,
}

impl LogsState {
    pub fn new(target: LogTarget) -> Self {
        Self {
            target,
            lines: Vec::new(),
            scroll: 0,
            loading: false,
            loaded: false,
            load_rx: None,
            page_rows: 20,
        }
    }

    /// Kick off a background fetch (non-blocking)
    pub fn start_loading<F>(&mut self, fetch: F)
    where
        F: FnOnce() -> Result<String, FetchError> + Send + 'static,
    {
        if self.loading {
            return;
        }
        debug!(resource = %self.target.title(), "loading logs");
        self.loading = true;
        let (tx, rx) = mpsc::channel();
        self.load_rx = Some(rx);
        std::thread::spawn(move || {
            let _ = tx.send(fetch());
        });
    }

    /// Poll for the background result. Returns an alert message on failure.
    pub fn poll_load(&mut self) -> Option<String> {
        let rx = self.load_rx.as_ref()?;
        match rx.try_recv() {
            Ok(Ok(text)) => {
                self.lines = text.lines().map(str::to_string).collect();
                // Newest lines are at the bottom
                self.scroll = self.lines.len().saturating_sub(self.page_rows);
                self.finish();
                None
            }
            Ok(Err(err)) => {
                warn!(resource = %self.target.title(), error = %err, "log fetch failed");
                self.finish();
                Some(self.target.alert_message(&err))
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.finish();
                None
            }
        }
    }

    fn finish(&mut self) {
        self.loading = false;
        self.loaded = true;
        self.load_rx = None;
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.page_rows)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> LogsAction {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::PageDown | KeyCode::Char(' ') => {
                self.scroll = (self.scroll + self.page_rows).min(self.max_scroll());
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(self.page_rows);
            }
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            KeyCode::Char('r') => return LogsAction::Reload,
            _ => {}
        }
        LogsAction::None
    }
}

pub fn render(frame: &mut Frame, state: &mut LogsState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .style(theme.block_style())
        .title(format!(
            " Logs: {} ({}) ",
            state.target.title(),
            state.target.namespace
        ))
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);
    state.page_rows = (inner.height as usize).max(1);

    if state.loading && state.lines.is_empty() {
        let msg = Paragraph::new(vec![
            Line::raw(""),
            Line::styled(
                "Loading logs ...",
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    }

    if state.lines.is_empty() {
        let msg = Paragraph::new(vec![
            Line::raw(""),
            Line::styled("No logs available", theme.text_dim()),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    }

    let visible = inner.height as usize;
    let scroll = state.scroll.min(state.lines.len().saturating_sub(visible));

    let log_lines: Vec<Line> = state
        .lines
        .iter()
        .skip(scroll)
        .take(visible)
        .map(|line| {
            let lower = line.to_lowercase();
            let style = if lower.contains("error") || lower.contains("failed") {
                theme.error()
            } else if lower.contains("warn") {
                theme.warning()
            } else {
                theme.text()
            };
            Line::styled(line.as_str(), style)
        })
        .collect();

    frame.render_widget(Paragraph::new(log_lines), inner);
}
