//! Drawing helpers shared by the views: dialogs, the key bar and alerts

use crate::types::FlashMessage;
use crate::ui::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
    Frame,
};

/// A key and what it does, e.g. `("r", "Reload")`
pub type KeyHint<'a> = (&'a str, &'a str);

/// `[key] label` spans for the key bar and dialog footers
pub fn key_hints<'a>(hints: &[KeyHint<'a>], theme: &Theme) -> Vec<Span<'a>> {
    let mut spans = Vec::with_capacity(hints.len() * 5);
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled("[", theme.text_dim()));
        spans.push(Span::styled(*key, theme.text().fg(theme.accent).add_modifier(Modifier::BOLD)));
        spans.push(Span::styled("] ", theme.text_dim()));
        spans.push(Span::styled(*label, theme.text_dim()));
    }
    spans
}

/// One-line rendition of a fetch alert or a confirmation
pub fn alert_line<'a>(alert: &'a FlashMessage, theme: &Theme) -> Line<'a> {
    let (marker, style) = if alert.is_error {
        ("✗ ", theme.error())
    } else {
        ("✓ ", theme.success())
    };
    Line::from(vec![
        Span::styled(marker, style),
        Span::styled(alert.text.as_str(), style.add_modifier(Modifier::BOLD)),
    ])
}

/// Bottom bar: hints or an alert on the left, backend info on the right
pub fn render_status_bar(frame: &mut Frame, left: Line, right: &str, theme: &Theme, area: Rect) {
    frame.render_widget(Clear, area);
    let right_width = right.chars().count() as u16 + 1;
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(right_width)]).areas(area);

    frame.render_widget(Paragraph::new(left).style(theme.text_dim()), left_area);
    frame.render_widget(
        Paragraph::new(right)
            .style(theme.text_dim())
            .alignment(Alignment::Right),
        right_area,
    );
}

/// Modal box sized to its body, with an optional key footer.
///
/// Used for the settings and help overlays and the error popup.
pub fn render_dialog(
    frame: &mut Frame,
    title: &str,
    body: Vec<Line>,
    footer: &[KeyHint],
    theme: &Theme,
    area: Rect,
) {
    let footer_line = Line::from(key_hints(footer, theme));
    let content_width = body
        .iter()
        .map(Line::width)
        .chain([footer_line.width(), title.chars().count() + 2])
        .max()
        .unwrap_or(0);
    // borders plus one column of padding per side
    let width = content_width as u16 + 4;
    let footer_rows = if footer.is_empty() { 0 } else { 2 };
    let height = body.len() as u16 + footer_rows + 2;
    let dialog = dialog_area(width, height, area);

    frame.render_widget(Clear, dialog);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_focused())
        .title(format!(" {} ", title))
        .title_style(theme.title())
        .padding(Padding::horizontal(1))
        .style(theme.block_style());
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(footer_rows)]).areas(inner);
    frame.render_widget(
        Paragraph::new(body)
            .style(theme.text())
            .wrap(Wrap { trim: false }),
        body_area,
    );
    if !footer.is_empty() {
        let [_, hint_row] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(footer_area);
        frame.render_widget(
            Paragraph::new(footer_line).alignment(Alignment::Center),
            hint_row,
        );
    }
}

/// Centre a `width` x `height` box in `area`, shrinking it to leave a margin
pub fn dialog_area(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Braille spinner frame for the current instant
pub fn spinner_frame() -> &'static str {
    const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let tick = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        / 100;
    FRAMES[tick as usize % FRAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer.cell((x, y)).map_or(" ", |c| c.symbol()))
            .collect()
    }

    #[test]
    fn test_dialog_area_centres_and_shrinks() {
        let area = Rect::new(10, 5, 100, 40);
        assert_eq!(dialog_area(20, 10, area), Rect::new(50, 20, 20, 10));

        let clamped = dialog_area(200, 100, area);
        assert_eq!(clamped.width, 96);
        assert_eq!(clamped.height, 38);
        assert_eq!((clamped.x, clamped.y), (12, 6));
    }

    #[test]
    fn test_key_hints_text() {
        let theme = Theme::dark();
        let line = Line::from(key_hints(&[("r", "Reload"), ("q", "Quit")], &theme));
        assert_eq!(line.to_string(), "[r] Reload  [q] Quit");
    }

    #[test]
    fn test_alert_line_marks_errors() {
        let theme = Theme::dark();
        let alert = FlashMessage::error("No server response received");
        assert_eq!(alert_line(&alert, &theme).to_string(), "✗ No server response received");
        let saved = FlashMessage::info("Settings saved");
        assert_eq!(alert_line(&saved, &theme).to_string(), "✓ Settings saved");
    }

    #[test]
    fn test_dialog_fits_body_and_footer() {
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal
            .draw(|f| {
                let body = vec![Line::raw("permission denied")];
                render_dialog(f, "Save failed", body, &[("Enter", "Dismiss")], &theme, f.area());
            })
            .unwrap();

        // 1 body row + 2 footer rows + 2 borders, centred in 12 rows
        let rows: Vec<String> = (0..12).map(|y| row_text(&terminal, y)).collect();
        assert!(rows[3].contains("Save failed"));
        assert!(rows[4].contains("permission denied"));
        assert!(rows[6].contains("[Enter] Dismiss"));
        assert!(rows[2].trim().is_empty());
        assert!(rows[8].trim().is_empty());
    }

    #[test]
    fn test_status_bar_keeps_right_text() {
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(40, 1)).unwrap();
        terminal
            .draw(|f| {
                let left = Line::from(key_hints(&[("q", "Quit")], &theme));
                render_status_bar(f, left, "backend v1.2", &theme, f.area());
            })
            .unwrap();
        let row = row_text(&terminal, 0);
        assert!(row.starts_with("[q] Quit"));
        assert!(row.ends_with("backend v1.2"));
    }

    #[test]
    fn test_spinner_frame_is_braille() {
        let frame = spinner_frame();
        assert_eq!(frame.chars().count(), 1);
    }
}
