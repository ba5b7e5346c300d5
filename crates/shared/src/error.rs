use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure body returned by the backend for any non-success response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// Server-supplied detail, or `fallback` when the body carried none.
    pub fn detail_or(&self, fallback: &str) -> String {
        match self.detail.as_deref().map(str::trim) {
            Some(detail) if !detail.is_empty() => detail.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamIdError {
    #[error("exam id must not be empty")]
    Empty,
    #[error("exam id must contain only digits: {0:?}")]
    NotNumeric(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported file format {0:?} (expected csv, xlsx, json or xml)")]
pub struct UnsupportedFormat(pub String);

/// An inbound frame that could not be turned into an event.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("frame has no string `type` field")]
    MissingType,
    #[error("invalid payload for `{kind}` event: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
