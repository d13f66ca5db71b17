//! Node status resolution and status bar colours

use super::NodeAttributes;
use ratatui::style::Color;

/// Closed set of statuses a card can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Ready,
    Pending,
    Running,
    Succeeded,
    Deleting,
    Failed,
    Unknown,
}

impl NodeStatus {
    /// Resolve from the ready flag and the phase text.
    ///
    /// The ready flag wins; an empty phase counts as pending; anything outside
    /// the known phases is `Unknown`.
    pub fn resolve(ready: bool, phase: &str) -> Self {
        if ready {
            return NodeStatus::Ready;
        }
        let phase = phase.trim();
        if phase.is_empty() {
            return NodeStatus::Pending;
        }
        match phase.to_lowercase().as_str() {
            "pending" => NodeStatus::Pending,
            "running" | "provisioning" => NodeStatus::Running,
            "succeeded" | "provisioned" => NodeStatus::Succeeded,
            "deleting" => NodeStatus::Deleting,
            "failed" => NodeStatus::Failed,
            _ => NodeStatus::Unknown,
        }
    }

    pub fn of(attrs: &NodeAttributes) -> Self {
        Self::resolve(attrs.ready, &attrs.phase)
    }

    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            NodeStatus::Ready => (0x4c, 0xaf, 0x50),
            NodeStatus::Pending => (0xff, 0xc1, 0x07),
            NodeStatus::Running => (0x21, 0x96, 0xf3),
            NodeStatus::Succeeded => (0x8b, 0xc3, 0x4a),
            NodeStatus::Deleting => (0xff, 0x57, 0x22),
            NodeStatus::Failed => (0xf4, 0x43, 0x36),
            NodeStatus::Unknown => (0x9e, 0x9e, 0x9e),
        }
    }

    /// CSS colour for SVG export
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn color(&self) -> Color {
        let (r, g, b) = self.rgb();
        Color::Rgb(r, g, b)
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Ready => "Ready",
            NodeStatus::Pending => "Pending",
            NodeStatus::Running => "Running",
            NodeStatus::Succeeded => "Succeeded",
            NodeStatus::Deleting => "Deleting",
            NodeStatus::Failed => "Failed",
            NodeStatus::Unknown => "Unknown",
        }
    }

    #[cfg(test)]
    pub fn all() -> &'static [NodeStatus] {
        &[
            NodeStatus::Ready,
            NodeStatus::Pending,
            NodeStatus::Running,
            NodeStatus::Succeeded,
            NodeStatus::Deleting,
            NodeStatus::Failed,
            NodeStatus::Unknown,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ready_wins() {
        assert_eq!(NodeStatus::resolve(true, ""), NodeStatus::Ready);
        assert_eq!(NodeStatus::resolve(true, "Failed"), NodeStatus::Ready);
    }

    #[test]
    fn test_phase_matching_is_case_insensitive() {
        assert_eq!(NodeStatus::resolve(false, "Provisioning"), NodeStatus::Running);
        assert_eq!(NodeStatus::resolve(false, "RUNNING"), NodeStatus::Running);
        assert_eq!(NodeStatus::resolve(false, "provisioned"), NodeStatus::Succeeded);
        assert_eq!(NodeStatus::resolve(false, "Succeeded"), NodeStatus::Succeeded);
        assert_eq!(NodeStatus::resolve(false, "Deleting"), NodeStatus::Deleting);
        assert_eq!(NodeStatus::resolve(false, "failed"), NodeStatus::Failed);
        assert_eq!(NodeStatus::resolve(false, "Pending"), NodeStatus::Pending);
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(NodeStatus::resolve(false, ""), NodeStatus::Pending);
        assert_eq!(NodeStatus::resolve(false, "  "), NodeStatus::Pending);
        assert_eq!(NodeStatus::resolve(false, "Upgrading"), NodeStatus::Unknown);
    }

    #[test]
    fn test_colors_are_distinct() {
        let colors: HashSet<String> = NodeStatus::all().iter().map(|s| s.hex()).collect();
        assert_eq!(colors.len(), NodeStatus::all().len());
    }

    #[test]
    fn test_hex_matches_terminal_color() {
        assert_eq!(NodeStatus::Failed.hex(), "#f44336");
        assert_eq!(NodeStatus::Running.hex(), "#2196f3");
        for status in NodeStatus::all() {
            let Color::Rgb(r, g, b) = status.color() else {
                panic!("{:?} is not an rgb colour", status);
            };
            assert_eq!(status.hex(), format!("#{:02x}{:02x}{:02x}", r, g, b));
        }
    }
}
