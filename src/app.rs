//! Application state and event handling for capiview

use crate::api::{ApiClient, FetchError};
use crate::config::Config;
use crate::modules::logs::{LogTarget, LogsAction, LogsState};
use crate::modules::tree_view::{TreeAction, TreeViewState};
use crate::refresh::{ApiTreeSource, TreeTarget};
use crate::types::{FlashMessage, ALERT_SECONDS};
use crate::ui::Theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use tracing::{debug, info};

/// Labels of the settings overlay, in display order
pub const SETTINGS_LABELS: &[&str] = &[
    "Theme",
    "Link style",
    "Details lens",
    "Refresh interval",
    "Max log lines",
    "Server URL",
];

const SERVER_URL_SETTING: usize = 5;

/// Session values that override the config file without being saved
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub server_url: Option<String>,
    pub interval: Option<String>,
    pub cluster: Option<String>,
    pub namespace: String,
}

/// One entry of the navigation stack
pub enum Screen {
    Tree(TreeViewState),
    Logs(LogsState),
}

impl Screen {
    pub fn title(&self) -> String {
        match self {
            Screen::Tree(tree) => tree.title(),
            Screen::Logs(logs) => logs.target.title(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Settings,
    Help,
}

#[derive(Debug, Clone)]
pub enum PopupState {
    None,
    Error { title: String, message: String },
}

/// Main application state
pub struct App {
    pub should_quit: bool,
    pub config: Config,
    config_path: PathBuf,
    pub theme: Theme,
    pub client: ApiClient,
    /// Effective backend URL (config or `--server`)
    pub server_url: String,
    /// Effective polling interval (config or `--interval`)
    pub refresh_interval: String,
    root_target: TreeTarget,
    /// Navigation stack; the first entry is never popped
    pub screens: Vec<Screen>,
    pub overlay: Overlay,
    pub settings_selected: usize,
    pub settings_editing: bool,
    pub settings_edit_buffer: String,
    pub popup: PopupState,
    pub flash_message: Option<FlashMessage>,
    pub backend_version: Option<String>,
    version_rx: Option<mpsc::Receiver<Result<String, FetchError>>>,
}

impl App {
    pub fn new(config: Config, options: StartOptions) -> Result<Self> {
        Self::with_config_path(config, Config::path()?, options)
    }

    pub fn with_config_path(config: Config, config_path: PathBuf, options: StartOptions) -> Result<Self> {
        let theme = Theme::from_name(config.theme);
        let server_url = options
            .server_url
            .unwrap_or_else(|| config.server_url.clone());
        let refresh_interval = options
            .interval
            .unwrap_or_else(|| config.refresh_interval.clone());
        let root_target = match options.cluster {
            Some(name) => TreeTarget::Cluster {
                name,
                namespace: options.namespace,
            },
            None => TreeTarget::Management,
        };

        let mut app = Self {
            should_quit: false,
            config,
            config_path,
            theme,
            client: ApiClient::new(&server_url),
            server_url,
            refresh_interval,
            root_target,
            screens: Vec::new(),
            overlay: Overlay::None,
            settings_selected: 0,
            settings_editing: false,
            settings_edit_buffer: String::new(),
            popup: PopupState::None,
            flash_message: None,
            backend_version: None,
            version_rx: None,
        };
        app.reset_screens();
        app.fetch_version();
        Ok(app)
    }

    /// Drop every view and start over at the root tree
    fn reset_screens(&mut self) {
        info!(server = %self.server_url, view = %self.root_target.title(), "opening root view");
        let root = self.tree_screen(self.root_target.clone());
        self.screens = vec![root];
    }

    fn tree_screen(&self, target: TreeTarget) -> Screen {
        let source = Arc::new(ApiTreeSource::new(self.client.clone(), target.clone()));
        let mut view_config = self.config.clone();
        view_config.refresh_interval = self.refresh_interval.clone();
        Screen::Tree(TreeViewState::new(target, source, &view_config))
    }

    /// Ask the backend for its version once (non-blocking)
    fn fetch_version(&mut self) {
        let client = self.client.clone();
        let (tx, rx) = mpsc::channel();
        self.version_rx = Some(rx);
        self.backend_version = None;
        std::thread::spawn(move || {
            let _ = tx.send(client.get_version());
        });
    }

    pub fn active(&self) -> Option<&Screen> {
        self.screens.last()
    }

    pub fn breadcrumb(&self) -> String {
        self.screens
            .iter()
            .map(Screen::title)
            .collect::<Vec<_>>()
            .join(" › ")
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        // App-level popup handling
        if let PopupState::Error { .. } = self.popup {
            if matches!(key.code, KeyCode::Char('o') | KeyCode::Enter | KeyCode::Esc) {
                self.popup = PopupState::None;
            }
            return Ok(());
        }

        // Settings text editing mode captures ALL keys
        if self.settings_editing {
            self.handle_settings_edit_key(key);
            return Ok(());
        }

        match self.overlay {
            Overlay::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                    self.overlay = Overlay::None;
                }
                return Ok(());
            }
            Overlay::Settings => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char(',') | KeyCode::Char('q') => {
                        self.overlay = Overlay::None;
                    }
                    _ => self.handle_settings_key(key),
                }
                return Ok(());
            }
            Overlay::None => {}
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char(',') => {
                self.overlay = Overlay::Settings;
                return Ok(());
            }
            KeyCode::Char('?') => {
                self.overlay = Overlay::Help;
                return Ok(());
            }
            KeyCode::Esc => {
                self.go_back();
                return Ok(());
            }
            _ => {}
        }

        match self.screens.last_mut() {
            Some(Screen::Tree(tree)) => {
                let action = tree.handle_key(key, &self.theme);
                self.handle_tree_action(action);
            }
            Some(Screen::Logs(logs)) => {
                if logs.handle_key(key) == LogsAction::Reload {
                    self.load_logs();
                }
            }
            None => {}
        }
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.overlay != Overlay::None || !matches!(self.popup, PopupState::None) {
            return Ok(());
        }
        if let Some(Screen::Tree(tree)) = self.screens.last_mut() {
            tree.handle_mouse(mouse);
        }
        Ok(())
    }

    fn go_back(&mut self) {
        if self.screens.len() > 1 {
            if let Some(screen) = self.screens.pop() {
                info!(view = %screen.title(), "leaving view");
            }
        }
    }

    pub fn handle_tree_action(&mut self, action: TreeAction) {
        match action {
            TreeAction::None => {}
            TreeAction::OpenCluster { name, namespace } => {
                info!(cluster = %name, namespace = %namespace, "opening cluster");
                let screen = self.tree_screen(TreeTarget::Cluster { name, namespace });
                self.screens.push(screen);
            }
            TreeAction::OpenLogs(target) => {
                info!(resource = %target.title(), "opening logs");
                self.screens.push(Screen::Logs(LogsState::new(target)));
                self.load_logs();
            }
            TreeAction::Exported(path) => {
                self.flash_message = Some(FlashMessage::info(format!(
                    "Exported to {}",
                    path.display()
                )));
            }
            TreeAction::ExportFailed(message) => {
                self.flash_message = Some(FlashMessage::error(message));
            }
        }
    }

    /// Fetch logs for the active logs view
    fn load_logs(&mut self) {
        let client = self.client.clone();
        let max_lines = self.config.max_log_lines;
        if let Some(Screen::Logs(logs)) = self.screens.last_mut() {
            let LogTarget {
                resource_type,
                name,
                namespace,
            } = logs.target.clone();
            logs.start_loading(move || client.get_logs(&resource_type, &name, &namespace, max_lines));
        }
    }

    pub fn update_timers(&mut self) -> Result<()> {
        let now = Instant::now();

        // Poll background loaders (non-blocking)
        let alerts = match self.screens.last_mut() {
            Some(Screen::Tree(tree)) => tree.poll(now),
            Some(Screen::Logs(logs)) => logs.poll_load().into_iter().collect(),
            None => Vec::new(),
        };
        if let Some(alert) = alerts.into_iter().last() {
            self.flash_message = Some(FlashMessage::error(alert));
        }

        self.poll_version();

        if let Some(msg) = &self.flash_message {
            if msg.is_expired(ALERT_SECONDS) {
                self.flash_message = None;
            }
        }
        Ok(())
    }

    fn poll_version(&mut self) {
        let Some(rx) = &self.version_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(version)) => {
                debug!(version = %version, "backend version");
                self.backend_version = Some(version);
                self.version_rx = None;
            }
            Ok(Err(e)) => {
                debug!(error = %e, "backend version unavailable");
                self.version_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.version_rx = None,
        }
    }

    fn tree_views_mut(&mut self) -> impl Iterator<Item = &mut TreeViewState> {
        self.screens.iter_mut().filter_map(|s| match s {
            Screen::Tree(tree) => Some(tree),
            Screen::Logs(_) => None,
        })
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.settings_selected < SETTINGS_LABELS.len() - 1 {
                    self.settings_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings_selected = self.settings_selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                match self.settings_selected {
                    0 => {
                        self.config.theme = self.config.theme.next();
                        self.theme = Theme::from_name(self.config.theme);
                    }
                    1 => {
                        self.config.straight_links = !self.config.straight_links;
                        let straight = self.config.straight_links;
                        self.tree_views_mut().for_each(|t| t.straight = straight);
                    }
                    2 => {
                        self.config.show_lens = !self.config.show_lens;
                        let show = self.config.show_lens;
                        self.tree_views_mut().for_each(|t| t.show_lens = show);
                    }
                    3 => {
                        self.config.refresh_interval = self.config.next_refresh_interval();
                        self.refresh_interval = self.config.refresh_interval.clone();
                        let interval = self.refresh_interval.clone();
                        self.tree_views_mut().for_each(|t| t.set_interval(&interval));
                    }
                    4 => {
                        self.config.max_log_lines = self.config.next_max_log_lines();
                    }
                    SERVER_URL_SETTING => {
                        self.settings_editing = true;
                        self.settings_edit_buffer = self.server_url.clone();
                        return;
                    }
                    _ => {}
                }
                self.save_config();
            }
            _ => {}
        }
    }

    /// Handle key events while editing a settings text field.
    fn handle_settings_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.settings_editing = false;
                self.settings_edit_buffer.clear();
            }
            KeyCode::Enter => {
                let value = self.settings_edit_buffer.trim().to_string();
                self.settings_editing = false;
                self.settings_edit_buffer.clear();
                if self.settings_selected == SERVER_URL_SETTING {
                    self.config.server_url = if value.is_empty() {
                        Config::default().server_url
                    } else {
                        value
                    };
                    self.server_url = self.config.server_url.clone();
                    self.client = ApiClient::new(&self.server_url);
                    self.reset_screens();
                    self.fetch_version();
                }
                self.save_config();
            }
            KeyCode::Backspace => {
                self.settings_edit_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.settings_edit_buffer.push(c);
            }
            _ => {}
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            self.popup = PopupState::Error {
                title: "Save failed".into(),
                message: format!("{:#}", e),
            };
        } else {
            self.flash_message = Some(FlashMessage::info("Settings saved"));
        }
    }

    /// Current value of a settings row, as shown in the overlay
    pub fn settings_value(&self, index: usize) -> String {
        match index {
            0 => self.config.theme.as_str().to_string(),
            1 => on_off(self.config.straight_links, "Straight", "Curved"),
            2 => on_off(self.config.show_lens, "On", "Off"),
            3 => self.refresh_interval.clone(),
            4 => self.config.max_log_lines.to_string(),
            SERVER_URL_SETTING => {
                if self.settings_editing {
                    format!("{}_", self.settings_edit_buffer)
                } else {
                    self.server_url.clone()
                }
            }
            _ => String::new(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

fn on_off(value: bool, on: &str, off: &str) -> String {
    if value { on } else { off }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeName;
    use std::time::Duration;

    fn test_app(name: &str, options: StartOptions) -> App {
        let dir = std::env::temp_dir().join(format!("capiview-app-{}-{}", name, std::process::id()));
        let config = Config {
            server_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        App::with_config_path(config, dir.join("config.toml"), options).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn open_cluster(app: &mut App) {
        app.handle_tree_action(TreeAction::OpenCluster {
            name: "w1".to_string(),
            namespace: "default".to_string(),
        });
    }

    #[test]
    fn test_starts_at_management_tree() {
        let app = test_app("root", StartOptions::default());
        assert_eq!(app.screens.len(), 1);
        assert_eq!(app.breadcrumb(), "Management Cluster");
    }

    #[test]
    fn test_cluster_flag_opens_cluster_tree() {
        let app = test_app(
            "flag",
            StartOptions {
                cluster: Some("w1".to_string()),
                namespace: "team-a".to_string(),
                interval: Some("30s".to_string()),
                ..StartOptions::default()
            },
        );
        assert_eq!(app.breadcrumb(), "w1");
        assert_eq!(app.refresh_interval, "30s");
        assert_eq!(app.config.refresh_interval, "1m");
        match app.active() {
            Some(Screen::Tree(tree)) => {
                assert_eq!(tree.refresh.poll_period(), Some(Duration::from_secs(30)))
            }
            _ => panic!("expected a tree view"),
        }
    }

    #[test]
    fn test_navigation_stack() {
        let mut app = test_app("nav", StartOptions::default());
        open_cluster(&mut app);
        assert_eq!(app.breadcrumb(), "Management Cluster › w1");

        app.handle_tree_action(TreeAction::OpenLogs(LogTarget {
            resource_type: "Machine".to_string(),
            name: "m1".to_string(),
            namespace: "default".to_string(),
        }));
        assert_eq!(app.screens.len(), 3);
        assert!(matches!(app.active(), Some(Screen::Logs(logs)) if logs.loading));

        app.handle_key(key(KeyCode::Esc)).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.screens.len(), 1);
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_overlays_capture_keys() {
        let mut app = test_app("overlay", StartOptions::default());
        app.handle_key(key(KeyCode::Char('?'))).unwrap();
        assert_eq!(app.overlay, Overlay::Help);
        app.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert_eq!(app.overlay, Overlay::None);
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Char(','))).unwrap();
        assert_eq!(app.overlay, Overlay::Settings);
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn test_settings_apply_to_open_views_and_save() {
        let mut app = test_app("settings", StartOptions::default());
        open_cluster(&mut app);
        app.handle_key(key(KeyCode::Char(','))).unwrap();

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.config.theme, ThemeName::Light);
        assert!(app.theme.is_light());

        app.handle_key(key(KeyCode::Down)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        for screen in &app.screens {
            if let Screen::Tree(tree) = screen {
                assert!(tree.straight);
            }
        }

        app.handle_key(key(KeyCode::Down)).unwrap();
        app.handle_key(key(KeyCode::Down)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.refresh_interval, "5m");
        for screen in &app.screens {
            if let Screen::Tree(tree) = screen {
                assert_eq!(tree.refresh.poll_period(), Some(Duration::from_secs(300)));
            }
        }

        assert!(matches!(&app.flash_message, Some(m) if !m.is_error));
        let saved = Config::load_from(app.config_path()).unwrap();
        assert_eq!(saved.theme, ThemeName::Light);
        assert!(saved.straight_links);
        assert_eq!(saved.refresh_interval, "5m");
        if let Some(dir) = app.config_path().parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_server_url_edit_resets_views() {
        let mut app = test_app("server", StartOptions::default());
        open_cluster(&mut app);
        app.handle_key(key(KeyCode::Char(','))).unwrap();
        app.settings_selected = SERVER_URL_SETTING;
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.settings_editing);

        app.settings_edit_buffer.clear();
        for c in "http://127.0.0.1:10".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(!app.settings_editing);
        assert_eq!(app.server_url, "http://127.0.0.1:10");
        assert_eq!(app.client.base_url(), "http://127.0.0.1:10/api/v1");
        assert_eq!(app.screens.len(), 1);
        if let Some(dir) = app.config_path().parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_export_results_flash() {
        let mut app = test_app("flash", StartOptions::default());
        app.handle_tree_action(TreeAction::ExportFailed("Nothing to export yet".to_string()));
        assert!(matches!(&app.flash_message, Some(m) if m.is_error));
        app.handle_tree_action(TreeAction::Exported(PathBuf::from("/tmp/x.svg")));
        assert_eq!(
            app.flash_message.as_ref().map(|m| m.text.as_str()),
            Some("Exported to /tmp/x.svg")
        );
    }

    #[test]
    fn test_unreachable_backend_alerts() {
        let mut app = test_app("alert", StartOptions::default());
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.flash_message.is_none() && Instant::now() < deadline {
            if let Some(Screen::Tree(tree)) = app.screens.last_mut() {
                tree.start();
            }
            app.update_timers().unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(
            app.flash_message.as_ref().map(|m| m.text.as_str()),
            Some("No server response received")
        );
        assert_eq!(app.screens.len(), 1);
    }
}
