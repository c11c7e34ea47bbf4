//! Wire protocol between the chat widget and the assistant backend
//!
//! Every frame is one JSON text message on a single WebSocket:
//! - outbound: `{"type":"message","message":...,"session_id":...}`
//! - inbound: `status`, `chunk` and `error` frames, each carrying a `data` payload

use std::fmt;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Session
// ============================================================================

const SESSION_PREFIX: &str = "session";
const SESSION_SUFFIX_LEN: usize = 9;

/// Opaque per-page-load session identifier attached to every outbound frame.
///
/// Shaped `session_<unix-millis>_<9 base36 chars>`. The backend may use it to
/// group messages, the widget assigns it no other meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let entropy = uuid::Uuid::new_v4().as_u128() as u64;
        Self::from_parts(Utc::now().timestamp_millis(), entropy)
    }

    pub fn from_parts(millis: i64, entropy: u64) -> Self {
        let mut suffix = String::with_capacity(SESSION_SUFFIX_LEN);
        let mut rest = entropy;
        for _ in 0..SESSION_SUFFIX_LEN {
            let digit = (rest % 36) as u32;
            suffix.push(char::from_digit(digit, 36).unwrap_or('0'));
            rest /= 36;
        }
        Self(format!("{SESSION_PREFIX}_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// Frames sent by the widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Message {
        message: String,
        session_id: SessionId,
    },
}

impl ClientFrame {
    pub fn message(text: impl Into<String>, session_id: &SessionId) -> Self {
        Self::Message {
            message: text.into(),
            session_id: session_id.clone(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Inbound
// ============================================================================

pub const STATUS_PROCESSING: &str = "processing";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusPayload {
    pub status: String,
}

impl StatusPayload {
    /// `processing` is the only status the backend is known to send.
    pub fn is_processing(&self) -> bool {
        self.status == STATUS_PROCESSING
    }
}

/// One fragment of a streamed reply, or the end-of-stream marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub is_final: bool,
}

impl ChunkPayload {
    /// Chunk text, `None` when absent or empty.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|content| !content.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
}

/// Frames received from the backend, demultiplexed by their `type` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Status(StatusPayload),
    Chunk(ChunkPayload),
    Error(ErrorPayload),
    /// A `type` this client does not understand; callers log and skip it.
    Unknown { kind: String },
}

impl InboundFrame {
    pub fn kind(&self) -> &str {
        match self {
            Self::Status(_) => "status",
            Self::Chunk(_) => "chunk",
            Self::Error(_) => "error",
            Self::Unknown { kind } => kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn decode_frame(raw: &str) -> Result<InboundFrame, FrameError> {
    let json = serde_json::from_str::<serde_json::Value>(raw)?;
    let kind = json
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(FrameError::MissingType)?;
    let data = json.get("data").cloned().unwrap_or_default();

    match kind {
        "status" => decode_payload(kind, data).map(InboundFrame::Status),
        "chunk" => decode_payload(kind, data).map(InboundFrame::Chunk),
        "error" => decode_payload(kind, data).map(InboundFrame::Error),
        other => Ok(InboundFrame::Unknown {
            kind: other.to_string(),
        }),
    }
}

fn decode_payload<T: DeserializeOwned>(kind: &str, data: serde_json::Value) -> Result<T, FrameError> {
    serde_json::from_value(data).map_err(|source| FrameError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_prefix_timestamp_and_base36_suffix() {
        let id = SessionId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SESSION_SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn session_id_from_parts_is_deterministic() {
        assert_eq!(
            SessionId::from_parts(1_700_000_000_000, 0).as_str(),
            "session_1700000000000_000000000"
        );
        assert_eq!(
            SessionId::from_parts(5, 35).as_str(),
            "session_5_z00000000"
        );
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn message_frame_encodes_with_type_tag_first() {
        let session = SessionId::from_parts(1, 0);
        let json = ClientFrame::message("Hello", &session).encode().unwrap();

        assert_eq!(
            json,
            r#"{"type":"message","message":"Hello","session_id":"session_1_000000000"}"#
        );
    }

    #[test]
    fn decodes_status_chunk_and_error_frames() {
        let status = decode_frame(r#"{"type":"status","data":{"status":"processing"}}"#).unwrap();
        assert!(matches!(&status, InboundFrame::Status(s) if s.is_processing()));

        let chunk =
            decode_frame(r#"{"type":"chunk","data":{"content":"Hi","is_final":false}}"#).unwrap();
        assert_eq!(
            chunk,
            InboundFrame::Chunk(ChunkPayload {
                content: Some("Hi".to_string()),
                is_final: false,
            })
        );

        let error = decode_frame(r#"{"type":"error","data":{"error":"boom"}}"#).unwrap();
        assert_eq!(
            error,
            InboundFrame::Error(ErrorPayload {
                error: "boom".to_string()
            })
        );
    }

    #[test]
    fn final_chunk_may_omit_content() {
        let frame = decode_frame(r#"{"type":"chunk","data":{"is_final":true}}"#).unwrap();
        let InboundFrame::Chunk(chunk) = frame else {
            panic!("expected chunk frame");
        };
        assert!(chunk.is_final);
        assert_eq!(chunk.text(), None);
    }

    #[test]
    fn empty_chunk_content_has_no_text() {
        let chunk = ChunkPayload {
            content: Some(String::new()),
            is_final: false,
        };
        assert_eq!(chunk.text(), None);
    }

    #[test]
    fn other_status_values_are_not_processing() {
        let frame = decode_frame(r#"{"type":"status","data":{"status":"queued"}}"#).unwrap();
        assert!(matches!(frame, InboundFrame::Status(s) if !s.is_processing()));
    }

    #[test]
    fn unknown_type_is_reported_not_rejected() {
        let frame = decode_frame(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Unknown {
                kind: "pong".to_string()
            }
        );
        assert_eq!(frame.kind(), "pong");
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(decode_frame("not json"), Err(FrameError::Json(_))));
        assert!(matches!(
            decode_frame(r#"{"data":{}}"#),
            Err(FrameError::MissingType)
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"chunk"}"#),
            Err(FrameError::InvalidPayload { kind, .. }) if kind == "chunk"
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"error","data":{"message":"x"}}"#),
            Err(FrameError::InvalidPayload { .. })
        ));
    }
}
