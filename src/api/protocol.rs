use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_PLAYER_ID: &str = "player";
pub const SYSTEM_SPEAKER: &str = "system";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Dialogue message requires a string 'content' field")]
    MissingContent,

    #[error("Binary frames are not supported")]
    BinaryFrame,
}

/// Inbound envelope, discriminated by `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Dialogue {
        speaker: String,
        content: String,
        extra: Map<String, Value>,
    },
    /// Any other or missing `type`. Logged, never answered.
    Ignored { kind: Option<String> },
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let kind = match object.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => return Ok(InboundMessage::Ignored { kind: Some(other.to_string()) }),
            None => return Ok(InboundMessage::Ignored { kind: None }),
        };

        if kind != "dialogue" {
            return Ok(InboundMessage::Ignored { kind: Some(kind) });
        }

        let content = match object.remove("content") {
            Some(Value::String(content)) => content,
            _ => return Err(ProtocolError::MissingContent),
        };

        let speaker = match object.remove("speaker") {
            Some(Value::String(speaker)) if !speaker.trim().is_empty() => speaker,
            _ => DEFAULT_PLAYER_ID.to_string(),
        };

        Ok(InboundMessage::Dialogue {
            speaker,
            content,
            extra: object,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    Dialogue,
    Error,
}

/// Outbound envelope: `{type, speaker, content, is_player}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    pub speaker: String,
    pub content: String,
    pub is_player: bool,
}

impl OutboundMessage {
    pub fn dialogue(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: OutboundKind::Dialogue,
            speaker: speaker.into(),
            content: content.into(),
            is_player: false,
        }
    }

    pub fn error(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: OutboundKind::Error,
            speaker: speaker.into(),
            content: content.into(),
            is_player: false,
        }
    }

    pub fn protocol_error(error: &ProtocolError) -> Self {
        Self::error(SYSTEM_SPEAKER, format!("Malformed message: {}", error))
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutboundKind::Error
    }
}
