//! Uniform command response
//!
//! Every administrative handler and both sync paths produce a
//! [`Response`] triple of (payload, content type, status code), so the
//! HTTP server has exactly one formatting path.

use serde_json::Value;

/// Response payload variants.
///
/// JSON payloads carry structured data, text payloads carry plain
/// messages, binary payloads carry raw bytes (e.g. a screenshot image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

/// A (payload, content-type, status-code) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Payload,
    content_type: String,
    status: u16,
}

impl Response {
    /// A 200 response with a JSON payload.
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self {
            payload: Payload::Json(value),
            content_type: "application/json".to_string(),
            status: 200,
        }
    }

    /// A 200 JSON response of the form `{"message": ...}`.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::json(serde_json::json!({ "message": text.into() }))
    }

    /// A plain-text response with the given status code.
    #[must_use]
    pub fn text(text: impl Into<String>, status: u16) -> Self {
        Self {
            payload: Payload::Text(text.into()),
            content_type: "text/plain".to_string(),
            status,
        }
    }

    /// A binary response with an explicit content type.
    #[must_use]
    pub fn binary(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            payload: Payload::Binary(bytes),
            content_type: content_type.into(),
            status: 200,
        }
    }

    /// An error response of the form `{"message": ...}` with the given
    /// status code.
    #[must_use]
    pub fn error(text: impl Into<String>, status: u16) -> Self {
        Self::message(text).with_status(status)
    }

    /// Replace the status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// The HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Render the payload as response body bytes.
    ///
    /// JSON payloads are serialized compactly; a payload that cannot be
    /// serialized (which would require non-string map keys) degrades to
    /// `null` rather than panicking.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        match self.payload {
            Payload::Json(value) => {
                serde_json::to_vec(&value).unwrap_or_else(|_| b"null".to_vec())
            }
            Payload::Text(text) => text.into_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }
}
