use crate::config::npc_config::read_json;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub emotion_expression_strategies: Map<String, Value>,
}

impl StrategyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = read_json(path)?;
        serde_json::from_value(document).map_err(|e| ConfigError::parse(path, e))
    }

    /// Strategies are optional; an unreadable file leaves the NPC without any.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load strategy config");
                Self::default()
            }
        }
    }

    pub fn available_strategies(&self) -> Value {
        Value::Object(self.emotion_expression_strategies.clone())
    }
}
