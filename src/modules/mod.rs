//! Views of capiview
//!
//! Each view owns its state, handles its keys and renders itself.

pub mod export;
pub mod logs;
pub mod tree_view;
