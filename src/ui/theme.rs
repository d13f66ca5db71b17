//! Theme definitions for capiview
//!
//! Three built-in themes: Dark, Light and Transparent.
//! One theme instance, applied to every view.

use crate::config::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Complete theme with all required colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,

    // Accent colors
    pub accent: Color,

    // Alert colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    // UI element colors
    pub border: Color,
    pub border_focused: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Tree canvas
    pub card_bg: Color,
    pub link: Color,

    // Internal flag for transparent mode
    is_transparent: bool,
}

impl Theme {
    /// Create a theme from a theme name
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
            ThemeName::Transparent => Self::transparent(),
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(18, 18, 18),
            fg: Color::Rgb(236, 239, 241),
            fg_dim: Color::Rgb(144, 164, 174),
            accent: Color::Rgb(144, 202, 249),
            success: Color::Rgb(102, 187, 106),
            warning: Color::Rgb(255, 167, 38),
            error: Color::Rgb(244, 67, 54),
            border: Color::Rgb(66, 66, 66),
            border_focused: Color::Rgb(144, 202, 249),
            selection_bg: Color::Rgb(48, 48, 48),
            selection_fg: Color::Rgb(236, 239, 241),
            card_bg: Color::Rgb(30, 30, 30),
            link: Color::Rgb(117, 117, 117),
            is_transparent: false,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(250, 250, 250),
            fg: Color::Rgb(33, 33, 33),
            fg_dim: Color::Rgb(97, 97, 97),
            accent: Color::Rgb(25, 118, 210),
            success: Color::Rgb(46, 125, 50),
            warning: Color::Rgb(237, 108, 2),
            error: Color::Rgb(211, 47, 47),
            border: Color::Rgb(189, 189, 189),
            border_focused: Color::Rgb(25, 118, 210),
            selection_bg: Color::Rgb(227, 242, 253),
            selection_fg: Color::Rgb(33, 33, 33),
            card_bg: Color::Rgb(255, 255, 255),
            link: Color::Rgb(158, 158, 158),
            is_transparent: false,
        }
    }

    /// Transparent theme (uses terminal colors)
    pub fn transparent() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            fg_dim: Color::Gray,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            selection_bg: Color::Reset,
            selection_fg: Color::White,
            card_bg: Color::Reset,
            link: Color::DarkGray,
            is_transparent: true,
        }
    }

    // === STYLE HELPERS ===

    pub fn text(&self) -> Style {
        self.with_bg(Style::default().fg(self.fg))
    }

    pub fn text_dim(&self) -> Style {
        self.with_bg(Style::default().fg(self.fg_dim))
    }

    pub fn title(&self) -> Style {
        self.with_bg(Style::default().fg(self.accent).add_modifier(Modifier::BOLD))
    }

    pub fn selected(&self) -> Style {
        if self.is_transparent {
            Style::default()
                .fg(self.selection_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(self.selection_fg)
                .bg(self.selection_bg)
                .add_modifier(Modifier::BOLD)
        }
    }

    pub fn border(&self) -> Style {
        self.with_bg(Style::default().fg(self.border))
    }

    pub fn border_focused(&self) -> Style {
        self.with_bg(Style::default().fg(self.border_focused))
    }

    /// Header toggle that is switched on
    pub fn toggle_on(&self) -> Style {
        self.with_bg(Style::default().fg(self.accent).add_modifier(Modifier::BOLD))
    }

    pub fn toggle_off(&self) -> Style {
        self.with_bg(Style::default().fg(self.fg_dim))
    }

    pub fn success(&self) -> Style {
        self.with_bg(Style::default().fg(self.success))
    }

    pub fn warning(&self) -> Style {
        self.with_bg(Style::default().fg(self.warning))
    }

    pub fn error(&self) -> Style {
        self.with_bg(Style::default().fg(self.error))
    }

    pub fn block_style(&self) -> Style {
        if self.is_transparent {
            Style::default()
        } else {
            Style::default().bg(self.bg)
        }
    }

    // === CANVAS ===

    pub fn card(&self) -> Style {
        if self.is_transparent {
            Style::default().fg(self.fg)
        } else {
            Style::default().fg(self.fg).bg(self.card_bg)
        }
    }

    pub fn card_border(&self, focused: bool) -> Style {
        let fg = if focused { self.border_focused } else { self.border };
        let style = Style::default().fg(fg);
        let style = if focused {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        };
        if self.is_transparent {
            style
        } else {
            style.bg(self.card_bg)
        }
    }

    pub fn link(&self) -> Style {
        self.with_bg(Style::default().fg(self.link))
    }

    pub fn is_light(&self) -> bool {
        self.bg == Color::Rgb(250, 250, 250)
    }

    fn with_bg(&self, style: Style) -> Style {
        if self.is_transparent {
            style
        } else {
            style.bg(self.bg)
        }
    }
}
