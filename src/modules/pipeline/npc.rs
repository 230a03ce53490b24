use crate::api::{DialogueHandler, OutboundMessage};
use crate::modules::inference::{
    DialogueGateway, DialogueLine, DialogueRequest, InferenceError, IntentRecord,
};
use crate::modules::memory::{MemoryLedger, MemoryRecord};
use crate::modules::pipeline::{StrategySelector, TurnDecision};
use crate::modules::snapshot::{NpcSnapshot, SceneSnapshot};
use crate::modules::state::{ChannelType, DebugTrace, NpcState, NpcStatus};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const RECENT_CONVERSATION_WINDOW: usize = 5;
const FALLBACK_LINE: &str = "...";

/// Result of one full dialogue turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub decision: TurnDecision,
    pub line: DialogueLine,
}

/// One intent evaluation together with its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentReport {
    pub npc_snapshot: NpcSnapshot,
    pub scene_snapshot: SceneSnapshot,
    pub intent: IntentRecord,
}

impl DialogueTurn {
    pub fn is_error(&self) -> bool {
        self.decision.intent.is_error()
    }
}

/// One NPC shared by every session that talks to it.
///
/// State sits behind an async lock that is never held across a gateway call; ledger writes
/// are serialized by the ledger's writer task.
pub struct NpcAgent {
    state: RwLock<NpcState>,
    ledger: MemoryLedger,
    selector: StrategySelector,
    dialogue: Arc<dyn DialogueGateway>,
    timeout: Duration,
}

impl NpcAgent {
    pub fn new(
        state: NpcState,
        ledger: MemoryLedger,
        selector: StrategySelector,
        dialogue: Arc<dyn DialogueGateway>,
        timeout: Duration,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            ledger,
            selector,
            dialogue,
            timeout,
        }
    }

    pub fn npc_id(&self) -> &str {
        self.ledger.npc_id()
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub async fn status(&self) -> NpcStatus {
        self.state.read().await.status()
    }

    pub async fn debug_trace(&self) -> DebugTrace {
        self.state.read().await.debug_trace()
    }

    pub async fn set_channel(&self, channel: ChannelType) {
        self.state.write().await.set_channel(channel);
    }

    /// Single intent pass over the current state. The result becomes the last intent.
    pub async fn evaluate_intent(&self) -> IntentRecord {
        self.inspect_intent().await.intent
    }

    /// Like `evaluate_intent`, but also returns the snapshots the gateway was given.
    pub async fn inspect_intent(&self) -> IntentReport {
        let (npc_snapshot, scene_snapshot) = {
            let state = self.state.read().await;
            (state.snapshot_identity(), state.snapshot_scene())
        };

        let intent = self.selector.intents().evaluate(&npc_snapshot, &scene_snapshot).await;

        let mut state = self.state.write().await;
        let last_output = state.last_output().map(str::to_string);
        state.record_turn(intent.clone(), last_output);

        IntentReport {
            npc_snapshot,
            scene_snapshot,
            intent,
        }
    }

    pub async fn respond(&self, player_id: &str, content: &str) -> DialogueTurn {
        let _ = self
            .ledger
            .add_conversation(MemoryRecord::conversation(player_id, content, "input"))
            .await;

        let (npc, scene, npc_name, channel) = {
            let mut state = self.state.write().await;
            state.record_memory_event(json!({
                "time": Utc::now().to_rfc3339(),
                "speaker": player_id,
                "content": content,
            }));
            (
                state.snapshot_identity(),
                state.snapshot_scene(),
                state.identity().name.clone(),
                state.channel(),
            )
        };

        let decision = self.selector.process(&npc, &scene, content, Some(player_id)).await;

        let line = if decision.intent.is_error() {
            let reason = decision
                .intent
                .error
                .clone()
                .unwrap_or_else(|| decision.intent.intent_description.clone());
            DialogueLine::new(npc_name, reason)
        } else {
            self.compose(npc_name, content, &decision, channel).await
        };

        let line = {
            let mut state = self.state.write().await;
            let adapted = DialogueLine::new(line.speaker, state.adapt_response_style(&line.content));
            state.record_turn(decision.intent.clone(), Some(adapted.content.clone()));
            if !decision.intent.is_error() && !state.apply_emotion(&decision.intent.emotion) {
                tracing::debug!(npc_id = %self.npc_id(), emotion = %decision.intent.emotion, "No affect profile for emotion");
            }
            adapted
        };

        let reply = MemoryRecord::conversation(self.npc_id(), line.content.clone(), "response")
            .with_field("intent", serde_json::to_value(&decision.intent).unwrap_or(Value::Null))
            .with_field("strategy", serde_json::to_value(&decision.strategy).unwrap_or(Value::Null));
        let _ = self.ledger.add_conversation(reply).await;

        tracing::info!(
            npc_id = %self.npc_id(),
            player_id,
            intent_type = %decision.intent.intent_type,
            strategy_id = %decision.strategy.strategy_id,
            "Dialogue turn complete"
        );

        DialogueTurn { decision, line }
    }

    async fn compose(
        &self,
        npc_name: String,
        player_line: &str,
        decision: &TurnDecision,
        channel: ChannelType,
    ) -> DialogueLine {
        let recent_conversations = self
            .ledger
            .get_recent_conversations(RECENT_CONVERSATION_WINDOW)
            .await
            .unwrap_or_default();

        let request = DialogueRequest {
            npc_name: npc_name.clone(),
            player_line: player_line.to_string(),
            intent: decision.intent.clone(),
            strategy: decision.strategy.clone(),
            channel,
            recent_conversations,
        };

        match self.try_compose(&request).await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(npc_id = %self.npc_id(), error = %e, "Dialogue composition failed, using intent description");
                DialogueLine::new(npc_name, fallback_content(&decision.intent))
            }
        }
    }

    async fn try_compose(&self, request: &DialogueRequest) -> Result<DialogueLine, InferenceError> {
        let output = tokio::time::timeout(self.timeout, self.dialogue.compose_line(request))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        DialogueLine::from_object(&output.into_object()?, &request.npc_name)
    }
}

fn fallback_content(intent: &IntentRecord) -> String {
    if intent.intent_description.trim().is_empty() {
        FALLBACK_LINE.to_string()
    } else {
        intent.intent_description.clone()
    }
}

#[async_trait]
impl DialogueHandler for NpcAgent {
    async fn handle_dialogue(&self, speaker: &str, content: &str) -> OutboundMessage {
        let turn = self.respond(speaker, content).await;
        if turn.is_error() {
            OutboundMessage::error(turn.line.speaker, turn.line.content)
        } else {
            OutboundMessage::dialogue(turn.line.speaker, turn.line.content)
        }
    }
}
