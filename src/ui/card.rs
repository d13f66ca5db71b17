//! Node cards
//!
//! [`render_card`] turns a positioned node into display data; [`draw_card`]
//! paints that data into a buffer region.

use crate::tree::{NodeStatus, PositionedNode};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// One line of the details lens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailLine {
    Field { label: &'static str, value: String },
    /// A label with no value, shown only when the flag is set
    Flag(&'static str),
}

impl DetailLine {
    pub fn text(&self) -> String {
        match self {
            DetailLine::Field { label, value } => format!("{}: {}", label, value),
            DetailLine::Flag(label) => label.to_string(),
        }
    }
}

/// Everything needed to draw one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCard {
    pub title: String,
    pub details: Vec<DetailLine>,
    pub status: NodeStatus,
}

pub fn render_card(node: &PositionedNode, show_lens: bool) -> NodeCard {
    let status = NodeStatus::of(&node.attrs);
    let mut details = Vec::new();

    if show_lens {
        let attrs = &node.attrs;
        for (label, value) in [
            ("Namespace", &attrs.namespace),
            ("Kind", &attrs.kind),
            ("Provider", &attrs.provider),
        ] {
            if !value.trim().is_empty() {
                details.push(DetailLine::Field {
                    label,
                    value: value.clone(),
                });
            }
        }
        if attrs.is_management {
            details.push(DetailLine::Flag("Management Cluster"));
        }
    }

    NodeCard {
        title: node.name.clone(),
        details,
        status,
    }
}

/// Smallest card that still fits a border, a title and the status bar
const MIN_CARD_WIDTH: u16 = 8;
const MIN_CARD_HEIGHT: u16 = 4;

/// Paint `card` into `area`. Areas too small for text collapse to a marker.
pub fn draw_card(card: &NodeCard, area: Rect, buf: &mut Buffer, theme: &Theme, focused: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let status_color = card.status.color();
    if area.width < MIN_CARD_WIDTH || area.height < MIN_CARD_HEIGHT {
        let marker_style = if focused {
            Style::default().fg(status_color).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(status_color)
        };
        buf.set_style(area, marker_style);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol("■");
                }
            }
        }
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.card_border(focused))
        .style(theme.card());
    let inner = block.inner(area);
    block.render(area, buf);

    // Title first, then as many details as fit above the status row
    let body_rows = inner.height.saturating_sub(1) as usize;
    let mut lines = vec![Line::from(Span::styled(
        card.title.clone(),
        theme.card().add_modifier(Modifier::BOLD),
    ))
    .centered()];
    lines.extend(
        card.details
            .iter()
            .take(body_rows.saturating_sub(1))
            .map(|d| Line::from(Span::styled(d.text(), theme.card().fg(theme.fg_dim)))),
    );
    let body = Rect {
        height: body_rows as u16,
        ..inner
    };
    Paragraph::new(lines).render(body, buf);

    let status_row = Rect {
        y: inner.bottom().saturating_sub(1),
        height: 1,
        ..inner
    };
    let bar_style = Style::default()
        .bg(status_color)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);
    buf.set_style(status_row, bar_style);
    buf.set_stringn(
        status_row.x,
        status_row.y,
        card.status.label(),
        status_row.width as usize,
        bar_style,
    );
}
