//! User interface layer for capiview
//!
//! - Theme definitions and colors
//! - Tree canvas and node cards
//! - Reusable widgets
//! - Main render entry point

pub mod canvas;
pub mod card;
pub mod render;
pub mod theme;
pub mod widgets;

pub use render::render;
pub use theme::Theme;
