pub mod app_config;
pub mod error;
pub mod npc_config;
pub mod strategy_config;

pub use app_config::{AppConfig, GreetingConfig, LlmConfig, NpcSourceConfig, ServerConfig};
pub use error::ConfigError;
pub use npc_config::{IdentityInfo, NpcDefinition, PersonalityValue, SceneConfig, SocialRelation};
pub use strategy_config::StrategyConfig;
