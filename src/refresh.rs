//! Refresh/diff controller for one tree view
//!
//! Owns the displayed tree. Snapshots come in either synchronously through
//! [`RefreshController::refresh`] or from a worker thread started by
//! [`RefreshController::request`]; both end up in [`RefreshController::apply`],
//! which is the only place the displayed tree is replaced.

use crate::api::{ApiClient, FetchError};
use crate::tree::{self, LayoutConfig, NormalizedNode, TreeLayout, TreeNode};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Interval choices offered by the settings overlay
pub const INTERVAL_CHOICES: &[&str] = &["Off", "10s", "30s", "1m", "5m"];

static SECONDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*s").expect("Invalid seconds pattern"));
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*m").expect("Invalid minutes pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid refresh interval '{0}'")]
pub struct IntervalError(pub String);

/// Parse an interval: "Off", "<n>s", "<n>m" or "<n>m<k>s".
///
/// Returns `None` for "Off". Minute and second components are summed.
pub fn parse_interval(interval: &str) -> Result<Option<Duration>, IntervalError> {
    let trimmed = interval.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return Ok(None);
    }

    let component = |re: &Regex| -> u64 {
        re.captures(trimmed)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let seconds = component(&SECONDS_RE) + component(&MINUTES_RE) * 60;

    if seconds == 0 {
        return Err(IntervalError(interval.to_string()));
    }
    Ok(Some(Duration::from_secs(seconds)))
}

/// The single periodic timer of a tree view
#[derive(Debug, Default)]
pub struct PollTimer {
    period: Option<Duration>,
    next_due: Option<Instant>,
}

impl PollTimer {
    pub fn start(&mut self, period: Duration, now: Instant) {
        self.period = Some(period);
        self.next_due = Some(now + period);
    }

    pub fn cancel(&mut self) {
        self.period = None;
        self.next_due = None;
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// True once per elapsed period; re-arms itself from `now`
    pub fn due(&mut self, now: Instant) -> bool {
        match (self.period, self.next_due) {
            (Some(period), Some(next)) if now >= next => {
                self.next_due = Some(now + period);
                true
            }
            _ => false,
        }
    }
}

/// Anything that can produce a tree snapshot
pub trait TreeSource: Send + Sync {
    fn fetch_tree(&self) -> Result<TreeNode, FetchError>;
}

/// Which tree a view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeTarget {
    Management,
    Cluster { name: String, namespace: String },
}

impl TreeTarget {
    pub fn title(&self) -> String {
        match self {
            TreeTarget::Management => "Management Cluster".to_string(),
            TreeTarget::Cluster { name, .. } => name.clone(),
        }
    }

    /// User-facing alert text for a failed fetch of this tree
    pub fn alert_message(&self, err: &FetchError) -> String {
        match (self, err) {
            (_, FetchError::Transport(_)) => "No server response received".to_string(),
            (_, FetchError::Request(_)) => "Unable to create request".to_string(),
            (TreeTarget::Management, FetchError::NotFound) => {
                "Management cluster not found, is the kubeconfig set?".to_string()
            }
            (TreeTarget::Management, _) => {
                "Unable to load management cluster and workload clusters".to_string()
            }
            (TreeTarget::Cluster { name, namespace }, FetchError::NotFound) => {
                format!("Cluster {} not found in namespace {}", name, namespace)
            }
            (TreeTarget::Cluster { name, .. }, _) => {
                format!("Unable to load details for cluster {}", name)
            }
        }
    }
}

/// Backend-backed source for a [`TreeTarget`]
pub struct ApiTreeSource {
    client: ApiClient,
    target: TreeTarget,
}

impl ApiTreeSource {
    pub fn new(client: ApiClient, target: TreeTarget) -> Self {
        Self { client, target }
    }
}

impl TreeSource for ApiTreeSource {
    fn fetch_tree(&self) -> Result<TreeNode, FetchError> {
        match &self.target {
            TreeTarget::Management => self.client.get_management_tree(),
            TreeTarget::Cluster { name, namespace } => {
                self.client.get_cluster_tree(name, namespace)
            }
        }
    }
}

/// The tree currently on screen
#[derive(Debug, Clone)]
pub struct RenderedTree {
    /// Bumped every time the displayed tree is replaced
    pub generation: u64,
    pub root: NormalizedNode,
    pub layout: TreeLayout,
}

/// What `apply` did with a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced,
    Unchanged,
    /// An older response arrived after a newer one was applied
    Stale,
    Failed(String),
}

struct FetchResult {
    seq: u64,
    force: bool,
    result: Result<TreeNode, FetchError>,
}

pub struct RefreshController {
    target: TreeTarget,
    layout_config: LayoutConfig,
    fingerprint: Option<String>,
    timer: PollTimer,
    next_seq: u64,
    last_applied_seq: Option<u64>,
    in_flight: usize,
    result_tx: mpsc::Sender<FetchResult>,
    result_rx: mpsc::Receiver<FetchResult>,
    tree: Option<RenderedTree>,
    generation: u64,
    last_updated: Option<DateTime<Local>>,
    alerts: Vec<String>,
}

impl RefreshController {
    pub fn new(target: TreeTarget, layout_config: LayoutConfig) -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        Self {
            target,
            layout_config,
            fingerprint: None,
            timer: PollTimer::default(),
            next_seq: 0,
            last_applied_seq: None,
            in_flight: 0,
            result_tx,
            result_rx,
            tree: None,
            generation: 0,
            last_updated: None,
            alerts: Vec::new(),
        }
    }

    pub fn target(&self) -> &TreeTarget {
        &self.target
    }

    pub fn tree(&self) -> Option<&RenderedTree> {
        self.tree.as_ref()
    }

    pub fn layout_config(&self) -> LayoutConfig {
        self.layout_config
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn poll_period(&self) -> Option<Duration> {
        self.timer.period()
    }

    /// Replace the poll timer. The old timer is always cancelled first; an
    /// invalid interval leaves polling off.
    pub fn configure_interval(
        &mut self,
        interval: &str,
        now: Instant,
    ) -> Result<Option<Duration>, IntervalError> {
        self.timer.cancel();
        let period = parse_interval(interval)?;
        if let Some(period) = period {
            self.timer.start(period, now);
        }
        info!(view = %self.target.title(), ?period, "refresh interval configured");
        Ok(period)
    }

    /// Fetch on the calling thread and apply the result
    pub fn refresh(&mut self, source: &dyn TreeSource, force: bool) -> RefreshOutcome {
        let seq = self.next_seq();
        let result = source.fetch_tree();
        self.apply(seq, force, result)
    }

    /// Fetch on a worker thread; the result is applied by a later `poll`
    pub fn request(&mut self, source: Arc<dyn TreeSource>, force: bool) {
        let seq = self.next_seq();
        let tx = self.result_tx.clone();
        self.in_flight += 1;
        debug!(seq, force, "background fetch started");
        std::thread::spawn(move || {
            let result = source.fetch_tree();
            let _ = tx.send(FetchResult { seq, force, result });
        });
    }

    /// Fire the timer if due, then apply every finished fetch
    pub fn poll(&mut self, now: Instant, source: &Arc<dyn TreeSource>) -> Vec<RefreshOutcome> {
        if self.timer.due(now) {
            self.request(Arc::clone(source), false);
        }

        let mut outcomes = Vec::new();
        while let Ok(done) = self.result_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            outcomes.push(self.apply(done.seq, done.force, done.result));
        }
        outcomes
    }

    /// Apply a fetch result tagged with its request sequence number
    pub fn apply(
        &mut self,
        seq: u64,
        force: bool,
        result: Result<TreeNode, FetchError>,
    ) -> RefreshOutcome {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let message = self.target.alert_message(&err);
                warn!(seq, error = %err, "tree fetch failed");
                self.alerts.push(message.clone());
                return RefreshOutcome::Failed(message);
            }
        };

        if matches!(self.last_applied_seq, Some(last) if seq < last) {
            debug!(seq, "discarding stale snapshot");
            return RefreshOutcome::Stale;
        }
        self.last_applied_seq = Some(seq);
        self.last_updated = Some(Local::now());

        let fingerprint = snapshot.fingerprint();
        if !force && self.tree.is_some() && self.fingerprint.as_deref() == Some(fingerprint.as_str())
        {
            debug!(seq, nodes = snapshot.node_count(), "snapshot unchanged");
            return RefreshOutcome::Unchanged;
        }

        let root = tree::normalize(&snapshot);
        let layout = tree::layout(&root, &self.layout_config);
        self.generation += 1;
        debug!(
            seq,
            generation = self.generation,
            nodes = layout.nodes.len(),
            "tree replaced"
        );
        self.tree = Some(RenderedTree {
            generation: self.generation,
            root,
            layout,
        });
        self.fingerprint = Some(fingerprint);
        RefreshOutcome::Replaced
    }

    /// Alerts raised since the last call, oldest first
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
