//! Wire message types shared by every transport.
//!
//! A [`Query`] is the transport-independent description of one backend call.
//! Each transport then renders it in its own framing:
//!
//! - HTTP: `GET|POST /api/{endpoint}` with the body as the JSON request body.
//! - Native channel: `call(queryID, NativeQuery-as-JSON)`.
//! - WebView pipe: one [`WebViewFrame::Call`] per line.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Request identifiers ───────────────────────────────────────────────────────

/// Identifier tying a response back to the request that caused it.
///
/// Issued by [`crate::protocol::RequestIdCounter`]; never reused within one
/// counter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Returns the raw numeric value used on the wire.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// HTTP-style verb of a backend call.  The backend only routes these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the verb exactly as it appears on the wire (`"GET"` / `"POST"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to a backend endpoint.
///
/// `endpoint` is relative to the API root, without a leading slash:
/// `"accounts"`, `"account/btc-0/status"`, `"config"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub method: Method,
    pub endpoint: String,
    /// JSON request body.  Always `None` for GET.
    pub body: Option<Value>,
}

impl Query {
    /// Builds a GET query for `endpoint`.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: normalize_endpoint(endpoint.into()),
            body: None,
        }
    }

    /// Builds a POST query for `endpoint` with an optional JSON body.
    pub fn post(endpoint: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            endpoint: normalize_endpoint(endpoint.into()),
            body,
        }
    }
}

fn normalize_endpoint(endpoint: String) -> String {
    match endpoint.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => endpoint,
    }
}

/// The string map the native backend bridge consumes.
///
/// The backend unmarshals this into a `map[string]string`, so every value is
/// a string: the POST body travels JSON-encoded inside `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeQuery {
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub body: String,
}

// ── WebView framing ───────────────────────────────────────────────────────────

/// One frame on the WebView pipe.  Frames are newline-delimited JSON objects.
///
/// ```json
/// {"type":"call","queryID":3,"query":"{\"method\":\"GET\",\"endpoint\":\"accounts\",\"body\":\"\"}"}
/// {"type":"response","queryID":3,"response":"[]"}
/// {"type":"push","notification":"{\"subject\":\"accounts\",\"action\":\"reload\"}"}
/// ```
///
/// `query`, `response` and `notification` are JSON *strings* holding JSON,
/// the same double encoding the host side receives from its native bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebViewFrame {
    /// UI → host: perform a backend call.
    Call {
        #[serde(rename = "queryID")]
        query_id: u64,
        query: String,
    },
    /// Host → UI: the answer to an earlier `Call`.
    Response {
        #[serde(rename = "queryID")]
        query_id: u64,
        response: String,
    },
    /// Host → UI: an unsolicited notification.
    Push { notification: String },
}
