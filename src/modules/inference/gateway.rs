use crate::modules::inference::{IntentRecord, StrategyRecord};
use crate::modules::memory::MemoryRecord;
use crate::modules::snapshot::InferenceInput;
use crate::modules::state::ChannelType;
use crate::utils::parse_embedded_object;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

/// Raw gateway answer: either already-structured data or free text that embeds it.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutput {
    Structured(Value),
    Text(String),
}

impl GatewayOutput {
    /// Resolves the answer to a JSON object, cleaning free text first.
    pub fn into_object(self) -> Result<Map<String, Value>, InferenceError> {
        match self {
            GatewayOutput::Structured(Value::Object(map)) => Ok(map),
            GatewayOutput::Structured(Value::String(text)) | GatewayOutput::Text(text) => {
                parse_embedded_object(&text).map_err(|e| InferenceError::InvalidResponse(e.to_string()))
            }
            GatewayOutput::Structured(other) => Err(InferenceError::InvalidResponse(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }
}

/// Second-stage input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub intent: IntentRecord,
    pub current_context: Map<String, Value>,
    pub npc_state: Value,
    pub available_strategies: Value,
    pub target_relationship: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub npc_name: String,
    pub player_line: String,
    pub intent: IntentRecord,
    pub strategy: StrategyRecord,
    pub channel: ChannelType,
    pub recent_conversations: Vec<MemoryRecord>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentGateway: Send + Sync {
    async fn infer_intent(&self, input: &InferenceInput) -> Result<GatewayOutput, InferenceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StrategyGateway: Send + Sync {
    async fn select_strategy(&self, request: &StrategyRequest) -> Result<GatewayOutput, InferenceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DialogueGateway: Send + Sync {
    async fn compose_line(&self, request: &DialogueRequest) -> Result<GatewayOutput, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::{GatewayOutput, InferenceError};
    use serde_json::json;

    #[test]
    fn test_structured_object_passes_through() {
        let map = GatewayOutput::Structured(json!({"strategy_id": "s1"})).into_object().unwrap();
        assert_eq!(map["strategy_id"], json!("s1"));
    }

    #[test]
    fn test_text_is_cleaned() {
        let output = GatewayOutput::Text("```json\n{\"strategy_id\": \"s2\"}\n```".to_string());
        assert_eq!(output.into_object().unwrap()["strategy_id"], json!("s2"));
    }

    #[test]
    fn test_non_object_is_invalid() {
        let result = GatewayOutput::Structured(json!([1, 2])).into_object();
        assert!(matches!(result, Err(InferenceError::InvalidResponse(_))));

        let result = GatewayOutput::Text("no braces at all".to_string()).into_object();
        assert!(matches!(result, Err(InferenceError::InvalidResponse(_))));
    }
}
