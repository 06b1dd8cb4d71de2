//! JSON codec for the native-channel query map and the WebView frame pipe.
//!
//! Both bridges move strings, not structured values.  A native call carries a
//! [`NativeQuery`] encoded as JSON; a WebView frame is a single JSON object per
//! line.  The functions here are the only place those strings are produced or
//! parsed, so every transport agrees on the exact shape.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{Method, NativeQuery, Query, WebViewFrame};

/// Errors that can occur while encoding or decoding bridge strings.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The string is not valid JSON, or not the expected JSON shape.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The native query names a method the backend does not route.
    #[error("unsupported method: {0:?} (only GET and POST are routed)")]
    UnsupportedMethod(String),

    /// A WebView frame line was empty or whitespace only.
    #[error("empty frame")]
    EmptyFrame,
}

// ── Native query map ──────────────────────────────────────────────────────────

/// Encodes a [`Query`] as the JSON string map the native bridge expects.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if the body cannot be serialized.
///
/// # Examples
///
/// ```rust
/// use wallet_bridge_core::protocol::{decode_native_query, encode_native_query, Query};
///
/// let query = Query::get("accounts");
/// let wire = encode_native_query(&query).unwrap();
/// assert_eq!(decode_native_query(&wire).unwrap(), query);
/// ```
pub fn encode_native_query(query: &Query) -> Result<String, ProtocolError> {
    let body = match &query.body {
        Some(value) => serde_json::to_string(value)?,
        None => String::new(),
    };
    let native = NativeQuery {
        method: query.method.as_str().to_string(),
        endpoint: query.endpoint.clone(),
        body,
    };
    Ok(serde_json::to_string(&native)?)
}

/// Decodes the JSON string map produced by [`encode_native_query`].
///
/// An empty `body` decodes to `None`.
///
/// # Errors
///
/// - [`ProtocolError::Json`] if the input or its embedded body is not JSON.
/// - [`ProtocolError::UnsupportedMethod`] for anything other than GET/POST.
pub fn decode_native_query(input: &str) -> Result<Query, ProtocolError> {
    let native: NativeQuery = serde_json::from_str(input)?;
    let method = match native.method.as_str() {
        "GET" => Method::Get,
        "POST" => Method::Post,
        other => return Err(ProtocolError::UnsupportedMethod(other.to_string())),
    };
    let body = if native.body.is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(&native.body)?)
    };
    Ok(Query {
        method,
        endpoint: native.endpoint,
        body,
    })
}

// ── WebView frames ────────────────────────────────────────────────────────────

/// Encodes one WebView frame.  The trailing newline is the writer's job.
pub fn encode_frame(frame: &WebViewFrame) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decodes one WebView frame line.  Surrounding whitespace (including the
/// line terminator) is ignored.
pub fn decode_frame(line: &str) -> Result<WebViewFrame, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    Ok(serde_json::from_str(trimmed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_native_query_get_has_empty_body() {
        // Arrange
        let query = Query::get("account/btc-0/status");

        // Act
        let wire = encode_native_query(&query).unwrap();
        let parsed: Value = serde_json::from_str(&wire).unwrap();

        // Assert
        assert_eq!(parsed["method"], "GET");
        assert_eq!(parsed["endpoint"], "account/btc-0/status");
        assert_eq!(parsed["body"], "");
    }

    #[test]
    fn test_encode_native_query_post_body_is_json_string() {
        let query = Query::post("notify-user", Some(json!({"text": "hello"})));

        let wire = encode_native_query(&query).unwrap();
        let parsed: Value = serde_json::from_str(&wire).unwrap();

        // The body is itself a string containing JSON.
        let body = parsed["body"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(body).unwrap(), json!({"text": "hello"}));
    }

    #[test]
    fn test_decode_native_query_rejects_put() {
        let wire = r#"{"method":"PUT","endpoint":"config","body":""}"#;

        let result = decode_native_query(wire);

        assert!(matches!(result, Err(ProtocolError::UnsupportedMethod(m)) if m == "PUT"));
    }

    #[test]
    fn test_decode_native_query_missing_body_is_none() {
        let wire = r#"{"method":"GET","endpoint":"version"}"#;

        let query = decode_native_query(wire).unwrap();

        assert_eq!(query, Query::get("version"));
    }

    #[test]
    fn test_decode_native_query_rejects_invalid_embedded_body() {
        let wire = r#"{"method":"POST","endpoint":"config","body":"{not json"}"#;

        assert!(matches!(decode_native_query(wire), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_frame_trims_line_terminator() {
        let line = "{\"type\":\"response\",\"queryID\":4,\"response\":\"null\"}\r\n";

        let frame = decode_frame(line).unwrap();

        assert_eq!(
            frame,
            WebViewFrame::Response {
                query_id: 4,
                response: "null".to_string()
            }
        );
    }

    #[test]
    fn test_decode_frame_empty_line_is_error() {
        assert!(matches!(decode_frame("   \n"), Err(ProtocolError::EmptyFrame)));
    }

    #[test]
    fn test_decode_frame_unknown_type_is_json_error() {
        let line = r#"{"type":"hello"}"#;

        assert!(matches!(decode_frame(line), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_encode_frame_push_has_no_newline() {
        let frame = WebViewFrame::Push {
            notification: "{}".to_string(),
        };

        let line = encode_frame(&frame).unwrap();

        assert!(!line.contains('\n'));
        assert_eq!(line, r#"{"type":"push","notification":"{}"}"#);
    }
}
