use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    domain::{ExamId, FileFormat, SessionId},
    error::FrameError,
};

pub const START_CRAWLING_PATH: &str = "/api/start-crawling";
pub const STOP_CRAWLING_PATH: &str = "/api/stop-crawling";
pub const STATUS_PATH: &str = "/api/status";
pub const LOGS_PATH: &str = "/api/logs";
pub const DOWNLOAD_PATH: &str = "/api/download";
pub const EVENT_STREAM_PATH: &str = "/ws";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCrawlRequest {
    pub exam_id: ExamId,
    pub file_format: FileFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCrawlResponse {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCrawlResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    pub is_running: bool,
    #[serde(default)]
    pub current_exam_id: Option<String>,
    #[serde(default)]
    pub collected_count: u64,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collected_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Events pushed by the backend over the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Log {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Progress {
        #[serde(default, deserialize_with = "null_as_default")]
        progress: f64,
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Status {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Complete(CompletePayload),
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Stopped {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    /// A `type` this client does not know yet. Never produced by serde directly.
    #[serde(skip)]
    Unknown { kind: String },
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ServerEvent {
    pub const KNOWN_KINDS: [&'static str; 6] =
        ["log", "progress", "status", "complete", "error", "stopped"];

    /// Decodes one text frame.
    ///
    /// Objects with an unrecognised `type` decode to [`ServerEvent::Unknown`];
    /// everything else that does not fit the schema is a [`FrameError`].
    pub fn from_frame(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text).map_err(FrameError::Json)?;
        let kind = value
            .as_object()
            .ok_or(FrameError::NotAnObject)?
            .get("type")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingType)?
            .to_string();

        if !Self::KNOWN_KINDS.contains(&kind.as_str()) {
            return Ok(Self::Unknown { kind });
        }

        serde_json::from_value(value).map_err(|source| FrameError::Payload { kind, source })
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Log { .. } => "log",
            Self::Progress { .. } => "progress",
            Self::Status { .. } => "status",
            Self::Complete(_) => "complete",
            Self::Error { .. } => "error",
            Self::Stopped { .. } => "stopped",
            Self::Unknown { kind } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_each_known_event_kind() {
        let progress = ServerEvent::from_frame(r#"{"type":"progress","progress":0.25,"message":"page 1"}"#)
            .expect("progress");
        assert_eq!(
            progress,
            ServerEvent::Progress {
                progress: 0.25,
                message: "page 1".into()
            }
        );

        let status = ServerEvent::from_frame(r#"{"type":"status","message":"logging in"}"#)
            .expect("status");
        assert_eq!(status.kind(), "status");

        let stopped = ServerEvent::from_frame(r#"{"type":"stopped","message":"halted"}"#)
            .expect("stopped");
        assert_eq!(
            stopped,
            ServerEvent::Stopped {
                message: "halted".into()
            }
        );
    }

    #[test]
    fn complete_event_carries_download_metadata() {
        let frame = json!({
            "type": "complete",
            "message": "done",
            "collected_count": 42,
            "download_ready": true,
            "filename": "results.csv",
        })
        .to_string();

        let ServerEvent::Complete(payload) = ServerEvent::from_frame(&frame).expect("complete")
        else {
            panic!("expected complete event");
        };
        assert_eq!(payload.collected_count, 42);
        assert!(payload.download_ready);
        assert_eq!(payload.filename.as_deref(), Some("results.csv"));
        assert_eq!(payload.file_path, None);
    }

    #[test]
    fn missing_payload_fields_fall_back_to_defaults() {
        let event = ServerEvent::from_frame(r#"{"type":"progress"}"#).expect("progress");
        assert_eq!(
            event,
            ServerEvent::Progress {
                progress: 0.0,
                message: String::new()
            }
        );

        let ServerEvent::Complete(payload) =
            ServerEvent::from_frame(r#"{"type":"complete","collected_count":3}"#).expect("complete")
        else {
            panic!("expected complete event");
        };
        assert!(!payload.download_ready);
        assert_eq!(payload.filename, None);
    }

    #[test]
    fn null_payload_fields_fall_back_to_defaults() {
        let event = ServerEvent::from_frame(r#"{"type":"error","message":null}"#).expect("error");
        assert_eq!(
            event,
            ServerEvent::Error {
                message: String::new()
            }
        );

        let event = ServerEvent::from_frame(r#"{"type":"stopped","message":null}"#).expect("stopped");
        assert_eq!(event.kind(), "stopped");

        let frame = json!({
            "type": "complete",
            "message": null,
            "collected_count": null,
            "download_ready": null,
            "filename": null,
            "file_path": null,
        })
        .to_string();
        let ServerEvent::Complete(payload) = ServerEvent::from_frame(&frame).expect("complete")
        else {
            panic!("expected complete event");
        };
        assert_eq!(payload, CompletePayload::default());

        let event =
            ServerEvent::from_frame(r#"{"type":"progress","progress":null,"message":"page 2"}"#)
                .expect("progress");
        assert_eq!(
            event,
            ServerEvent::Progress {
                progress: 0.0,
                message: "page 2".into()
            }
        );
    }

    #[test]
    fn unknown_kind_is_preserved_for_diagnostics() {
        let event = ServerEvent::from_frame(r#"{"type":"heartbeat","seq":7}"#).expect("unknown");
        assert_eq!(
            event,
            ServerEvent::Unknown {
                kind: "heartbeat".into()
            }
        );
        assert_eq!(event.kind(), "heartbeat");
    }

    #[test]
    fn malformed_frames_are_reported_not_panicked() {
        assert!(matches!(
            ServerEvent::from_frame("{not json"),
            Err(FrameError::Json(_))
        ));
        assert!(matches!(
            ServerEvent::from_frame("[1,2,3]"),
            Err(FrameError::NotAnObject)
        ));
        assert!(matches!(
            ServerEvent::from_frame(r#"{"message":"no type"}"#),
            Err(FrameError::MissingType)
        ));
        assert!(matches!(
            ServerEvent::from_frame(r#"{"type":"progress","progress":"half"}"#),
            Err(FrameError::Payload { kind, .. }) if kind == "progress"
        ));
    }

    #[test]
    fn start_request_uses_backend_field_names() {
        let request = StartCrawlRequest {
            exam_id: ExamId::parse("1001").expect("exam id"),
            file_format: FileFormat::Xlsx,
        };
        assert_eq!(
            serde_json::to_value(&request).expect("json"),
            json!({"exam_id": "1001", "file_format": "xlsx"})
        );
    }

    #[test]
    fn status_response_tolerates_null_fields() {
        let status: StatusResponse = serde_json::from_value(json!({
            "is_running": false,
            "current_exam_id": null,
            "collected_count": 0,
            "session_id": null,
        }))
        .expect("status");
        assert_eq!(status, StatusResponse::default());
    }
}
