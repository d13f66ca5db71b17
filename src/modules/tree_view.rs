//! Tree view: management cluster tree or one cluster's resource tree
//!
//! Glues the refresh controller (what is shown) to the view controller (where
//! it is shown) and handles keyboard and mouse input for the canvas.

use crate::config::Config;
use crate::modules::export::{self, SvgOptions};
use crate::modules::logs::LogTarget;
use crate::refresh::{RefreshController, RefreshOutcome, TreeSource, TreeTarget};
use crate::tree::PositionedNode;
use crate::ui::canvas::{viewport_for, CanvasGeometry, TreeCanvas, CELL_HEIGHT, CELL_WIDTH};
use crate::ui::theme::Theme;
use crate::view::{PointerButton, ViewController};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph},
    Frame,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Keyboard pan step in virtual pixels
const PAN_STEP: f64 = 40.0;

/// Requests the tree view hands up to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAction {
    None,
    OpenCluster { name: String, namespace: String },
    OpenLogs(LogTarget),
    Exported(PathBuf),
    ExportFailed(String),
}

pub struct TreeViewState {
    pub refresh: RefreshController,
    pub view: ViewController,
    source: Arc<dyn TreeSource>,
    pub show_lens: bool,
    pub straight: bool,
    /// Key of the selected node; survives refreshes while the node exists
    selected_key: Option<String>,
    /// Last reported zoom, in percent
    pub zoom_percent: u32,
    canvas_area: Option<Rect>,
    started: bool,
}

impl TreeViewState {
    pub fn new(target: TreeTarget, source: Arc<dyn TreeSource>, config: &Config) -> Self {
        let mut refresh = RefreshController::new(target, config.tree);
        if let Err(e) = refresh.configure_interval(&config.refresh_interval, Instant::now()) {
            warn!(error = %e, "polling disabled");
        }
        Self {
            refresh,
            view: ViewController::new(),
            source,
            show_lens: config.show_lens,
            straight: config.straight_links,
            selected_key: None,
            zoom_percent: 100,
            canvas_area: None,
            started: false,
        }
    }

    pub fn title(&self) -> String {
        self.refresh.target().title()
    }

    /// First fetch of this view (non-blocking)
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.refresh.request(Arc::clone(&self.source), true);
    }

    /// Manual reload; always replaces the displayed tree
    pub fn reload(&mut self) {
        info!(view = %self.title(), "manual reload");
        self.refresh.request(Arc::clone(&self.source), true);
    }

    /// Drive timers and background fetches. Returns alerts to show.
    pub fn poll(&mut self, now: Instant) -> Vec<String> {
        let outcomes = self.refresh.poll(now, &self.source);
        if outcomes.contains(&RefreshOutcome::Replaced) && self.selected().is_none() {
            self.selected_key = None;
        }
        if let Some(scale) = self.view.take_scale_change() {
            self.zoom_percent = (scale * 100.0).round() as u32;
        }
        self.refresh.take_alerts()
    }

    pub fn set_interval(&mut self, interval: &str) {
        if let Err(e) = self.refresh.configure_interval(interval, Instant::now()) {
            warn!(error = %e, "polling disabled");
        }
    }

    /// Index and node of the current selection
    pub fn selected(&self) -> Option<(usize, &PositionedNode)> {
        let key = self.selected_key.as_deref()?;
        let layout = &self.refresh.tree()?.layout;
        let idx = layout.index_of(key)?;
        layout.nodes.get(idx).map(|n| (idx, n))
    }

    fn select_index(&mut self, idx: usize) {
        self.selected_key = self
            .refresh
            .tree()
            .and_then(|t| t.layout.nodes.get(idx))
            .map(|n| n.key.clone());
    }

    fn cycle_selection(&mut self, forward: bool) {
        let Some(count) = self.refresh.tree().map(|t| t.layout.nodes.len()) else {
            return;
        };
        if count == 0 {
            return;
        }
        let next = match (self.selected().map(|(i, _)| i), forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.select_index(next);
    }

    fn recenter(&mut self) {
        let (Some(tree), Some(area)) = (self.refresh.tree(), self.canvas_area) else {
            return;
        };
        let config = self.refresh.layout_config();
        let bounds = tree.layout.bounds();
        self.view
            .recenter(bounds, viewport_for(area), config.node_width, config.node_height);
    }

    /// The selected node as a cluster to drill into
    fn cluster_to_open(&self) -> Option<TreeAction> {
        if !matches!(self.refresh.target(), TreeTarget::Management) {
            return None;
        }
        let (_, node) = self.selected()?;
        if node.attrs.is_management || node.parent.is_none() {
            return None;
        }
        Some(TreeAction::OpenCluster {
            name: node.name.clone(),
            namespace: node.attrs.namespace.clone(),
        })
    }

    /// The selected node as a resource whose logs can be shown
    fn logs_to_open(&self) -> Option<TreeAction> {
        let TreeTarget::Cluster { namespace, .. } = self.refresh.target() else {
            return None;
        };
        let (_, node) = self.selected()?;
        if node.attrs.kind.is_empty() {
            return None;
        }
        let namespace = if node.attrs.namespace.is_empty() {
            namespace.clone()
        } else {
            node.attrs.namespace.clone()
        };
        Some(TreeAction::OpenLogs(LogTarget {
            resource_type: node.attrs.kind.clone(),
            name: node.name.clone(),
            namespace,
        }))
    }

    pub fn export(&self, theme: &Theme) -> TreeAction {
        let Some(tree) = self.refresh.tree() else {
            return TreeAction::ExportFailed("Nothing to export yet".to_string());
        };
        let opts = SvgOptions {
            straight: self.straight,
            show_lens: self.show_lens,
            light: theme.is_light(),
        };
        match export::save_tree_svg(&self.title(), &tree.layout, &self.refresh.layout_config(), opts) {
            Ok(path) => {
                info!(path = %path.display(), "tree exported");
                TreeAction::Exported(path)
            }
            Err(e) => TreeAction::ExportFailed(format!("Export failed: {}", e)),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, theme: &Theme) -> TreeAction {
        match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => self.view.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => self.view.zoom_out(),
            KeyCode::Char('0') => self.view.set_scale(1.0),
            KeyCode::Left => self.view.drag_by(PAN_STEP, 0.0),
            KeyCode::Right => self.view.drag_by(-PAN_STEP, 0.0),
            KeyCode::Up => self.view.drag_by(0.0, PAN_STEP),
            KeyCode::Down => self.view.drag_by(0.0, -PAN_STEP),
            KeyCode::Char('c') => self.recenter(),
            KeyCode::Char('i') => self.show_lens = !self.show_lens,
            KeyCode::Char('s') => self.straight = !self.straight,
            KeyCode::Char('r') => self.reload(),
            KeyCode::Tab => self.cycle_selection(true),
            KeyCode::BackTab => self.cycle_selection(false),
            KeyCode::Enter => return self.cluster_to_open().unwrap_or(TreeAction::None),
            KeyCode::Char('l') => return self.logs_to_open().unwrap_or(TreeAction::None),
            KeyCode::Char('e') => return self.export(theme),
            _ => {}
        }
        TreeAction::None
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let x = f64::from(mouse.column) * CELL_WIDTH;
        let y = f64::from(mouse.row) * CELL_HEIGHT;
        match mouse.kind {
            MouseEventKind::Down(_) if !self.on_canvas(mouse.column, mouse.row) => {}
            MouseEventKind::Down(button) => {
                let button = PointerButton::from(button);
                if button == PointerButton::Primary {
                    if let Some(idx) = self.node_at(mouse.column, mouse.row) {
                        self.select_index(idx);
                    }
                }
                self.view.begin_drag(button, x, y);
            }
            MouseEventKind::Drag(_) if self.view.is_dragging() => self.view.drag_to(x, y),
            MouseEventKind::Up(_) => self.view.end_drag(),
            MouseEventKind::ScrollUp => self.view.zoom_in(),
            MouseEventKind::ScrollDown => self.view.zoom_out(),
            _ => {}
        }
    }

    fn on_canvas(&self, column: u16, row: u16) -> bool {
        self.canvas_area
            .is_some_and(|area| area.contains(Position::new(column, row)))
    }

    fn node_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.canvas_area?;
        let tree = self.refresh.tree()?;
        let geometry = CanvasGeometry::new(area, self.view.transform(), &self.refresh.layout_config());
        geometry.node_at(&tree.layout, column, row)
    }
}

pub fn render(frame: &mut Frame, state: &mut TreeViewState, theme: &Theme, area: Rect) {
    state.start();
    state.canvas_area = Some(area);
    frame.render_widget(Block::default().style(theme.block_style()), area);

    let config = state.refresh.layout_config();
    let selected = state.selected().map(|(idx, _)| idx);
    let Some(tree) = state.refresh.tree() else {
        let text = if state.refresh.is_loading() {
            Line::styled(
                format!("Loading {} ...", state.title()),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            )
        } else {
            Line::styled("No data. Press [r] to retry.", theme.text_dim())
        };
        let msg = Paragraph::new(vec![Line::raw(""), Line::raw(""), text])
            .alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    };

    state.view.ensure_centered(
        tree.layout.bounds(),
        viewport_for(area),
        config.node_width,
        config.node_height,
    );

    let canvas = TreeCanvas::new(&tree.layout, config, state.view.transform(), theme)
        .straight(state.straight)
        .show_lens(state.show_lens)
        .selected(selected);
    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchError;
    use crate::tree::TreeNode;
    use crossterm::event::{KeyModifiers, MouseButton};
    use std::time::Duration;

    struct FixedSource(TreeNode);

    impl TreeSource for FixedSource {
        fn fetch_tree(&self) -> Result<TreeNode, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn management_state() -> TreeViewState {
        let root: TreeNode = serde_json::from_str(
            r#"{"name": "mgmt", "isManagement": true, "ready": true, "children": [
                {"name": "w1", "namespace": "default", "phase": "Provisioned"},
                {"name": "w2", "namespace": "team-a", "phase": "Provisioning"}
            ]}"#,
        )
        .unwrap();
        let mut state = TreeViewState::new(
            TreeTarget::Management,
            Arc::new(FixedSource(root.clone())),
            &Config::default(),
        );
        state.refresh.refresh(&FixedSource(root), true);
        state
    }

    fn cluster_state() -> TreeViewState {
        let root: TreeNode = serde_json::from_str(
            r#"{"name": "w1", "kind": "Cluster", "children": [
                {"name": "w1-cp", "kind": "KubeadmControlPlane"},
                {"name": "w1-md-0", "kind": "MachineDeployment", "namespace": "other"}
            ]}"#,
        )
        .unwrap();
        let target = TreeTarget::Cluster {
            name: "w1".to_string(),
            namespace: "default".to_string(),
        };
        let mut state =
            TreeViewState::new(target, Arc::new(FixedSource(root.clone())), &Config::default());
        state.refresh.refresh(&FixedSource(root), true);
        state
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_tab_cycles_selection() {
        let mut state = management_state();
        let theme = Theme::dark();
        assert!(state.selected().is_none());
        state.handle_key(key(KeyCode::Tab), &theme);
        assert_eq!(state.selected().map(|(i, _)| i), Some(0));
        state.handle_key(key(KeyCode::BackTab), &theme);
        assert_eq!(state.selected().map(|(i, _)| i), Some(2));
        state.handle_key(key(KeyCode::Tab), &theme);
        assert_eq!(state.selected().map(|(i, _)| i), Some(0));
    }

    #[test]
    fn test_enter_opens_workload_cluster_only() {
        let mut state = management_state();
        let theme = Theme::dark();
        state.handle_key(key(KeyCode::Tab), &theme);
        assert_eq!(state.handle_key(key(KeyCode::Enter), &theme), TreeAction::None);

        state.handle_key(key(KeyCode::BackTab), &theme);
        assert_eq!(
            state.handle_key(key(KeyCode::Enter), &theme),
            TreeAction::OpenCluster {
                name: "w2".to_string(),
                namespace: "team-a".to_string()
            }
        );
    }

    #[test]
    fn test_logs_use_node_or_cluster_namespace() {
        let mut state = cluster_state();
        let theme = Theme::dark();
        state.handle_key(key(KeyCode::Tab), &theme);
        state.handle_key(key(KeyCode::Tab), &theme);
        assert_eq!(
            state.handle_key(key(KeyCode::Char('l')), &theme),
            TreeAction::OpenLogs(LogTarget {
                resource_type: "KubeadmControlPlane".to_string(),
                name: "w1-cp".to_string(),
                namespace: "default".to_string(),
            })
        );
        state.handle_key(key(KeyCode::Tab), &theme);
        match state.handle_key(key(KeyCode::Char('l')), &theme) {
            TreeAction::OpenLogs(target) => assert_eq!(target.namespace, "other"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_logs_from_management_view() {
        let mut state = management_state();
        let theme = Theme::dark();
        state.handle_key(key(KeyCode::Tab), &theme);
        assert_eq!(state.handle_key(key(KeyCode::Char('l')), &theme), TreeAction::None);
    }

    #[test]
    fn test_toggles_and_zoom_readout() {
        let mut state = management_state();
        let theme = Theme::dark();
        assert!(state.show_lens);
        assert!(!state.straight);
        state.handle_key(key(KeyCode::Char('i')), &theme);
        state.handle_key(key(KeyCode::Char('s')), &theme);
        assert!(!state.show_lens);
        assert!(state.straight);

        state.handle_key(key(KeyCode::Char('+')), &theme);
        state.poll(Instant::now());
        assert_eq!(state.zoom_percent, 110);
        for _ in 0..30 {
            state.handle_key(key(KeyCode::Char('-')), &theme);
        }
        state.poll(Instant::now());
        assert_eq!(state.zoom_percent, 10);
    }

    #[test]
    fn test_mouse_drag_pans_and_click_selects() {
        let mut state = management_state();
        let area = Rect::new(0, 0, 120, 30);
        state.canvas_area = Some(area);
        let config = state.refresh.layout_config();
        let bounds = state.refresh.tree().unwrap().layout.bounds();
        state
            .view
            .recenter(bounds, viewport_for(area), config.node_width, config.node_height);

        let geometry = CanvasGeometry::new(area, state.view.transform(), &config);
        let root = geometry.card_cells(&state.refresh.tree().unwrap().layout.nodes[0]);
        let (col, row) = ((root.x + root.width / 2) as u16, (root.y + root.height / 2) as u16);

        let before = state.view.transform();
        let event = |kind: MouseEventKind, column: u16, row: u16| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        state.handle_mouse(event(MouseEventKind::Down(MouseButton::Left), col, row));
        assert_eq!(state.selected().map(|(i, _)| i), Some(0));

        state.handle_mouse(event(MouseEventKind::Drag(MouseButton::Left), col + 2, row + 1));
        state.handle_mouse(event(MouseEventKind::Up(MouseButton::Left), col + 2, row + 1));
        let after = state.view.transform();
        assert_eq!(after.translate_x - before.translate_x, 2.0 * CELL_WIDTH);
        assert_eq!(after.translate_y - before.translate_y, CELL_HEIGHT);
        assert!(!state.view.is_dragging());

        state.handle_mouse(event(MouseEventKind::Down(MouseButton::Right), 0, 0));
        assert!(!state.view.is_dragging());
    }

    #[test]
    fn test_press_outside_canvas_does_not_drag() {
        let mut state = management_state();
        state.canvas_area = Some(Rect::new(0, 1, 120, 28));
        let press = |row: u16| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        };

        state.handle_mouse(press(0));
        assert!(!state.view.is_dragging());
        state.handle_mouse(press(29));
        assert!(!state.view.is_dragging());

        state.handle_mouse(press(5));
        assert!(state.view.is_dragging());
    }

    #[test]
    fn test_start_fetches_in_background() {
        let mut state = management_state();
        let generation = state.refresh.tree().map(|t| t.generation);
        state.start();
        assert!(state.refresh.is_loading());
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.refresh.is_loading() && Instant::now() < deadline {
            state.poll(Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
        // First fetch is forced, so the tree is replaced even though it is identical
        assert_ne!(state.refresh.tree().map(|t| t.generation), generation);
    }
}
