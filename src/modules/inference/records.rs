use crate::modules::inference::InferenceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ERROR_INTENT_TYPE: &str = "error";

/// Structured answer of the intent pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent_type: String,
    pub intent_description: String,
    pub emotion: String,
    pub target: String,
    pub confidence: f32,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntentRecord {
    /// The fallback record carried in place of a failed evaluation.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            intent_type: ERROR_INTENT_TYPE.to_string(),
            intent_description: "Intent evaluation failed".to_string(),
            emotion: "neutral".to_string(),
            target: String::new(),
            confidence: 0.0,
            reasoning: String::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.intent_type == ERROR_INTENT_TYPE
    }

    /// `intent_type` and `confidence` are required; other text fields default to empty.
    pub fn from_object(map: &Map<String, Value>) -> Result<Self, InferenceError> {
        if let Some(error) = map.get("error") {
            return Err(InferenceError::InvalidResponse(format!(
                "gateway reported an error: {}",
                text_of(error)
            )));
        }

        let intent_type = map
            .get("intent_type")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| InferenceError::InvalidResponse("missing intent_type".to_string()))?;

        let confidence = map
            .get("confidence")
            .and_then(number_of)
            .ok_or_else(|| InferenceError::InvalidResponse("missing or non-numeric confidence".to_string()))?;

        Ok(Self {
            intent_type: intent_type.to_string(),
            intent_description: string_field(map, "intent_description", ""),
            emotion: string_field(map, "emotion", "neutral"),
            target: string_field(map, "target", ""),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: string_field(map, "reasoning", ""),
            error: None,
        })
    }
}

/// How the NPC should voice its intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub strategy_id: String,
    pub expression_type: String,
    pub context_type: String,
    pub reason: String,
}

impl Default for StrategyRecord {
    fn default() -> Self {
        Self {
            strategy_id: "default".to_string(),
            expression_type: "neutral".to_string(),
            context_type: "casual".to_string(),
            reason: "Strategy output could not be parsed".to_string(),
        }
    }
}

impl StrategyRecord {
    pub fn from_object(map: &Map<String, Value>) -> Result<Self, InferenceError> {
        if let Some(error) = map.get("error") {
            return Err(InferenceError::InvalidResponse(format!(
                "gateway reported an error: {}",
                text_of(error)
            )));
        }

        let strategy_id = map
            .get("strategy_id")
            .map(text_of)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| InferenceError::InvalidResponse("missing strategy_id".to_string()))?;

        Ok(Self {
            strategy_id,
            expression_type: string_field(map, "expression_type", "neutral"),
            context_type: string_field(map, "context_type", "casual"),
            reason: string_field(map, "reason", ""),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub content: String,
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
        }
    }

    pub fn from_object(map: &Map<String, Value>, default_speaker: &str) -> Result<Self, InferenceError> {
        let content = map
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| InferenceError::InvalidResponse("missing content".to_string()))?;

        Ok(Self::new(string_field(map, "speaker", default_speaker), content))
    }
}

fn string_field(map: &Map<String, Value>, key: &str, default: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => text_of(value),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_of(value: &Value) -> Option<f32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.is_finite() {
        Some(number as f32)
    } else {
        None
    }
}
