//! Small types shared across views

use std::time::{Duration, Instant};

/// How long an alert stays on screen
pub const ALERT_SECONDS: u64 = 6;

/// A temporary UI message shown to the user (fetch alerts, export results)
#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

impl FlashMessage {
    pub fn new(text: String, is_error: bool) -> Self {
        Self {
            text,
            is_error,
            created: Instant::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text.into(), true)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text.into(), false)
    }

    pub fn is_expired(&self, seconds: u64) -> bool {
        self.created.elapsed() >= Duration::from_secs(seconds)
    }
}
