use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub npc: NpcSourceConfig,
    pub llm: LlmConfig,
    pub greeting: Option<GreetingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcSourceConfig {
    pub npc_id: String,
    pub identity_file: PathBuf,
    pub scene_file: PathBuf,
    pub memory_file: PathBuf,
    pub strategy_file: Option<PathBuf>,
}

impl Default for NpcSourceConfig {
    fn default() -> Self {
        Self {
            npc_id: "merchant".to_string(),
            identity_file: PathBuf::from("config/npc_configs/default_npcs.json"),
            scene_file: PathBuf::from("config/scene_configs/market_scene.json"),
            memory_file: PathBuf::from("memory/memories.json"),
            strategy_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolved_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreetingConfig {
    pub speaker: String,
    pub content: String,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::parse(path, message),
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::parse("<inline>", e))
    }

    /// Applies the process environment: `OPENAI_API_KEY` fills an unset API key, while
    /// `NPC_LLM_BASE_URL` and `NPC_LLM_MODEL` replace whatever the file set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.llm.api_key.is_none() {
            self.llm.api_key = lookup("OPENAI_API_KEY");
        }
        if let Some(base_url) = lookup("NPC_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = lookup("NPC_LLM_MODEL") {
            self.llm.model = model;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.npc.npc_id.trim().is_empty() {
            return Err(ConfigError::Invalid("npc.npc_id must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.base_url must not be empty".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature is {}, but must be between 0.0 and 2.0",
                self.llm.temperature
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::config::ConfigError;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.npc.npc_id, "merchant");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(config.greeting.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9001

            [llm]
            model = "gpt-4o-mini"
            timeout_secs = 5

            [greeting]
            speaker = "Merchant"
            content = "Welcome!"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 5);
        assert_eq!(config.greeting.unwrap().content, "Welcome!");
    }

    #[test]
    fn test_app_config_invalid_toml() {
        let result = AppConfig::from_toml_str("[server\nport = ");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_app_config_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_resolved_api_key() {
        let mut config = AppConfig::default();
        assert!(matches!(config.llm.resolved_api_key(), Err(ConfigError::MissingApiKey)));

        config.llm.api_key = Some("sk-test".to_string());
        assert_eq!(config.llm.resolved_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_environment_fills_key_and_replaces_endpoint() {
        let lookup = |key: &str| match key {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "NPC_LLM_MODEL" => Some("env-model".to_string()),
            _ => None,
        };

        let from_file = AppConfig::from_toml_str(
            r#"
            [llm]
            model = "file-model"
            api_key = "sk-file"
            "#,
        )
        .unwrap()
        .with_overrides_from(lookup);
        assert_eq!(from_file.llm.model, "env-model");
        assert_eq!(from_file.llm.api_key.as_deref(), Some("sk-file"));
        assert_eq!(from_file.llm.base_url, "https://api.openai.com/v1");

        let bare = AppConfig::default().with_overrides_from(lookup);
        assert_eq!(bare.llm.api_key.as_deref(), Some("sk-env"));
    }
}
