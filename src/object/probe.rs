//! Health probe bodies
//!
//! Probes use the platform's own field names, so the same structs are
//! decoded from the input and serialized into workload containers as-is.
//! Unknown keys are ignored here, unlike every other node of a document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A liveness or readiness check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    /// Run a command inside the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecAction>,

    /// Issue an HTTP GET
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_get: Option<HttpGetAction>,

    /// Open a TCP connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_socket: Option<TcpSocketAction>,

    /// Seconds before the first check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<i32>,

    /// Seconds before a check times out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,

    /// Seconds between checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<i32>,

    /// Consecutive successes to count as healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<i32>,

    /// Consecutive failures to count as unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<i32>,
}

impl Probe {
    /// Number of handlers set on this probe
    #[must_use]
    pub fn handler_count(&self) -> usize {
        usize::from(self.exec.is_some())
            + usize::from(self.http_get.is_some())
            + usize::from(self.tcp_socket.is_some())
    }

    /// Timing fields paired with their input names
    #[must_use]
    pub fn timings(&self) -> [(&'static str, Option<i32>); 5] {
        [
            ("initialDelaySeconds", self.initial_delay_seconds),
            ("timeoutSeconds", self.timeout_seconds),
            ("periodSeconds", self.period_seconds),
            ("successThreshold", self.success_threshold),
            ("failureThreshold", self.failure_threshold),
        ]
    }
}

/// Command handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecAction {
    /// Command line, first element is the executable
    #[serde(default)]
    pub command: Vec<String>,
}

/// HTTP GET handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetAction {
    /// Request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Target port
    pub port: PortRef,
    /// Target host, defaults to the pod IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// `HTTP` or `HTTPS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

/// One HTTP header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

/// TCP handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSocketAction {
    /// Target port
    pub port: PortRef,
    /// Target host, defaults to the pod IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// A port given by number or by container port name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    /// Numeric port
    Number(i32),
    /// Named port
    Name(String),
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_from_json_ignores_unknown_keys() {
        let probe: Probe = serde_json::from_value(serde_json::json!({
            "httpGet": { "path": "/healthz", "port": 8080 },
            "periodSeconds": 5,
            "somethingElse": true
        }))
        .unwrap();
        assert_eq!(probe.handler_count(), 1);
        assert_eq!(probe.period_seconds, Some(5));
        assert_eq!(
            probe.http_get.unwrap().port,
            PortRef::Number(8080)
        );
    }

    #[test]
    fn test_named_port() {
        let action: TcpSocketAction =
            serde_json::from_value(serde_json::json!({ "port": "http" })).unwrap();
        assert_eq!(action.port, PortRef::Name("http".to_string()));
    }

    #[test]
    fn test_probe_serializes_only_set_fields() {
        let probe = Probe {
            exec: Some(ExecAction {
                command: vec!["true".to_string()],
            }),
            ..Probe::default()
        };
        assert_eq!(
            serde_json::to_value(&probe).unwrap(),
            serde_json::json!({ "exec": { "command": ["true"] } })
        );
    }
}
