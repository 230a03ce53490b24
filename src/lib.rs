pub mod config;
pub mod modules;
pub mod api;
pub mod utils;

#[cfg(test)]
mod _test_mock;

pub use config::{
    AppConfig, ConfigError, IdentityInfo, LlmConfig, NpcDefinition, SceneConfig, SocialRelation,
    StrategyConfig,
};
pub use modules::state::{ChannelProfile, ChannelType, EmotionalState, NpcState, StateError};
pub use modules::memory::{
    ExperienceKind, Importance, MemoryKind, MemoryLedger, MemoryRecord, NpcMemory, StorageError,
};
pub use modules::snapshot::{assemble, InferenceInput, NpcSnapshot, SceneSnapshot};
pub use modules::inference::{
    ChatModelGateway, DialogueGateway, DialogueLine, DialogueRequest, GatewayOutput,
    InferenceError, IntentGateway, IntentRecord, ScriptedGateway, StrategyGateway,
    StrategyRecord, StrategyRequest,
};
pub use modules::pipeline::{
    DialogueTurn, IntentEvaluator, IntentReport, NpcAgent, StrategySelector, TurnDecision,
};
pub use api::{
    ConnectionRegistry, DialogueHandler, InboundMessage, OutboundMessage, ProtocolError,
    SessionServer, SessionState,
};
