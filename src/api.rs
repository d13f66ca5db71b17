//! HTTP client for the visualizer backend.
//!
//! All calls are blocking, run them in a background thread.
//! Uses `ureq` with a timeout on every request.

use crate::tree::TreeNode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TIMEOUT_SECS: u64 = 30;
const API_PREFIX: &str = "/api/v1";

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The resource does not exist (HTTP 404 or a `null` body)
    #[error("resource not found")]
    NotFound,
    /// The server answered with a non-success status
    #[error("server returned status {status}")]
    Server { status: u16 },
    /// No response reached us
    #[error("no response from server: {0}")]
    Transport(String),
    /// The request could not be built (bad URL, unknown scheme)
    #[error("invalid request: {0}")]
    Request(String),
    /// The response body was not what we expected
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize)]
struct VersionResponse {
    #[serde(alias = "gitVersion")]
    version: String,
}

/// Thin client over the backend's REST endpoints
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ApiClient {
    pub fn new(server_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build();
        Self {
            agent,
            base_url: format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Management cluster with its workload clusters as children
    pub fn get_management_tree(&self) -> Result<TreeNode, FetchError> {
        self.get_json("/management-cluster", &[])?
            .ok_or(FetchError::NotFound)
    }

    /// Resource tree of one workload cluster
    pub fn get_cluster_tree(&self, cluster: &str, namespace: &str) -> Result<TreeNode, FetchError> {
        self.get_json(
            "/describe-cluster",
            &[("cluster", cluster), ("namespace", namespace)],
        )?
        .ok_or(FetchError::NotFound)
    }

    /// Controller logs for one resource
    pub fn get_logs(
        &self,
        resource_type: &str,
        resource_name: &str,
        namespace: &str,
        max_lines: u32,
    ) -> Result<String, FetchError> {
        let max_lines = max_lines.to_string();
        let body = self.get_text(
            "/logs",
            &[
                ("resourceType", resource_type),
                ("resourceName", resource_name),
                ("namespace", namespace),
                ("maxLines", &max_lines),
            ],
        )?;
        decode_log_body(&body).ok_or(FetchError::NotFound)
    }

    /// Backend build version
    pub fn get_version(&self) -> Result<String, FetchError> {
        let resp: Option<VersionResponse> = self.get_json("/version", &[])?;
        Ok(resp.map(|v| v.version).unwrap_or_default())
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, FetchError> {
        let body = self.get_text(path, query)?;
        decode_json_body(&body)
    }

    fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let mut request = self.agent.get(&url);
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| FetchError::Decode(e.to_string())),
            Err(err) => Err(classify(err)),
        }
    }
}

fn classify(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(404, _) => FetchError::NotFound,
        ureq::Error::Status(status, _) => FetchError::Server { status },
        ureq::Error::Transport(t) => match t.kind() {
            ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
                FetchError::Request(t.to_string())
            }
            _ => FetchError::Transport(t.to_string()),
        },
    }
}

/// `null` or an empty body means "nothing there"
fn decode_json_body<T: DeserializeOwned>(body: &str) -> Result<Option<T>, FetchError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| FetchError::Decode(e.to_string()))
}

/// Logs come back either as a JSON string or as plain text
fn decode_log_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(text)) => Some(text),
        Ok(serde_json::Value::Null) => None,
        _ => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_body_is_none() {
        let parsed: Option<TreeNode> = decode_json_body("null").unwrap();
        assert!(parsed.is_none());
        let parsed: Option<TreeNode> = decode_json_body("  ").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_tree_body_decodes() {
        let parsed: Option<TreeNode> =
            decode_json_body(r#"{"name": "mgmt", "children": []}"#).unwrap();
        assert_eq!(parsed.map(|t| t.name), Some("mgmt".to_string()));
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let parsed: Result<Option<TreeNode>, _> = decode_json_body("<html>");
        assert!(matches!(parsed, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_log_body_variants() {
        assert_eq!(decode_log_body(r#""line1\nline2""#), Some("line1\nline2".to_string()));
        assert_eq!(decode_log_body("plain text\n"), Some("plain text\n".to_string()));
        assert_eq!(decode_log_body("null"), None);
        assert_eq!(decode_log_body(""), None);
    }

    #[test]
    fn test_version_alias() {
        let v: VersionResponse = serde_json::from_str(r#"{"gitVersion": "v1.2.3"}"#).unwrap();
        assert_eq!(v.version, "v1.2.3");
    }

    #[test]
    fn test_base_url_normalized() {
        let client = ApiClient::new("http://localhost:8081/");
        assert_eq!(client.base_url(), "http://localhost:8081/api/v1");
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let client = ApiClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.get_management_tree(),
            Err(FetchError::Transport(_))
        ));
    }

    #[test]
    fn test_bad_scheme_is_request_error() {
        let client = ApiClient::new("ftp://example.invalid");
        assert!(matches!(
            client.get_version(),
            Err(FetchError::Request(_))
        ));
    }
}
