use crate::api::{OutboundMessage, SessionError, SessionServer};
use crate::config::{AppConfig, ConfigError, StrategyConfig};
use crate::modules::inference::{ChatModelGateway, DialogueGateway, InferenceError, IntentGateway, StrategyGateway};
use crate::modules::memory::{MemoryLedger, StorageError};
use crate::modules::pipeline::{IntentEvaluator, NpcAgent, StrategySelector};
use crate::modules::state::NpcState;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Wires the NPC against the configured chat model.
pub fn build_agent(config: &AppConfig) -> Result<Arc<NpcAgent>, BootstrapError> {
    let api_key = config.llm.resolved_api_key()?;
    let gateway = Arc::new(ChatModelGateway::new(&config.llm, api_key)?);
    build_agent_with(config, gateway)
}

/// Wires the NPC against any gateway that covers all three inference passes.
pub fn build_agent_with<G>(config: &AppConfig, gateway: Arc<G>) -> Result<Arc<NpcAgent>, BootstrapError>
where
    G: IntentGateway + StrategyGateway + DialogueGateway + 'static,
{
    config.validate()?;

    let npc = &config.npc;
    let state = NpcState::initialize(&npc.identity_file, &npc.scene_file, &npc.npc_id)?;
    let ledger = MemoryLedger::open(&npc.memory_file, npc.npc_id.clone())?;
    let strategies = StrategyConfig::load_or_default(npc.strategy_file.as_deref());
    let timeout = config.llm.timeout();

    let selector = StrategySelector::new(
        IntentEvaluator::new(gateway.clone(), timeout),
        gateway.clone(),
        strategies,
        ledger.clone(),
        timeout,
    );

    tracing::info!(npc_id = %npc.npc_id, memory_file = %npc.memory_file.display(), "NPC initialized");
    Ok(Arc::new(NpcAgent::new(state, ledger, selector, gateway, timeout)))
}

pub fn greeting_message(config: &AppConfig) -> Option<OutboundMessage> {
    config
        .greeting
        .as_ref()
        .map(|greeting| OutboundMessage::dialogue(greeting.speaker.clone(), greeting.content.clone()))
}

/// Builds the agent and serves sessions until `shutdown` fires.
pub async fn serve(config: &AppConfig, shutdown: CancellationToken) -> Result<(), BootstrapError> {
    let agent = build_agent(config)?;
    let mut server = SessionServer::bind(config.server.address(), config.npc.npc_id.clone(), agent).await?;
    if let Some(greeting) = greeting_message(config) {
        server = server.with_greeting(greeting);
    }

    server.run_until(shutdown).await?;
    Ok(())
}
