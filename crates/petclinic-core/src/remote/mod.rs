//! Transport to the remote record service.
//!
//! The service is an external collaborator. [`Transport`] is the seam: the
//! HTTP implementation talks to the real backend, the in-memory one stands in
//! for it in tests.

mod http;
mod memory;

pub use http::*;
pub use memory::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Remote service errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Connection error: {0}")]
    Network(String),

    #[error("Server returned {status}")]
    Status { status: u16, message: Option<String> },

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl RemoteError {
    /// Message suitable for an alert: the server's own message when it sent
    /// one, otherwise the given fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            RemoteError::Network(_) => "Connection error".to_string(),
            RemoteError::Rejected(msg) => msg.clone(),
            RemoteError::Status {
                message: Some(msg), ..
            } => msg.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Network(format!("decode failed: {e}"))
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Raw JSON transport. Paths are given as segments and joined onto the base
/// origin by the implementation, so IDs never need manual escaping.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short tag for logs.
    fn backend_tag(&self) -> &'static str;

    async fn get_json(&self, path: &[&str]) -> RemoteResult<Value>;

    async fn post_json(&self, path: &[&str], body: Value) -> RemoteResult<Value>;

    /// Multipart upload of one file under the form field `file`.
    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<Value>;
}

/// Acknowledgement body of a mutation. Only parsed leniently; callers do not
/// rely on its contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl Ack {
    pub(crate) fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Ack::default(),
        }
    }

    /// False when the body carries an error or a non-ok status.
    pub fn looks_ok(&self) -> bool {
        self.error.is_none()
            && self
                .status
                .as_deref()
                .map(|s| s == "ok")
                .unwrap_or(true)
    }
}

/// Render a segment path as `/a/b` for logs.
pub(crate) fn display_path(path: &[&str]) -> String {
    let mut out = String::new();
    for seg in path {
        out.push('/');
        out.push_str(seg);
    }
    out
}
