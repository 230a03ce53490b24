use crate::config::StrategyConfig;
use crate::modules::inference::{InferenceError, IntentRecord, StrategyGateway, StrategyRecord, StrategyRequest};
use crate::modules::memory::MemoryLedger;
use crate::modules::pipeline::IntentEvaluator;
use crate::modules::snapshot::{NpcSnapshot, SceneSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDecision {
    pub intent: IntentRecord,
    pub strategy: StrategyRecord,
}

/// Two-stage pipeline: intent pass, then strategy pass.
#[derive(Clone)]
pub struct StrategySelector {
    intents: IntentEvaluator,
    gateway: Arc<dyn StrategyGateway>,
    strategies: StrategyConfig,
    ledger: MemoryLedger,
    timeout: Duration,
}

impl StrategySelector {
    pub fn new(
        intents: IntentEvaluator,
        gateway: Arc<dyn StrategyGateway>,
        strategies: StrategyConfig,
        ledger: MemoryLedger,
        timeout: Duration,
    ) -> Self {
        Self {
            intents,
            gateway,
            strategies,
            ledger,
            timeout,
        }
    }

    pub fn intents(&self) -> &IntentEvaluator {
        &self.intents
    }

    /// Runs both stages for one turn.
    ///
    /// When the intent is usable, the ledger's current context takes `current_topic` and the
    /// intent's emotion. Ledger failures are logged and never fail the turn.
    pub async fn process(
        &self,
        npc: &NpcSnapshot,
        scene: &SceneSnapshot,
        current_topic: &str,
        target_id: Option<&str>,
    ) -> TurnDecision {
        let intent = self.intents.evaluate(npc, scene).await;

        let current_context = self.ledger.get_current_context().await.unwrap_or_else(|e| {
            tracing::warn!(npc_id = %self.ledger.npc_id(), error = %e, "Current context unavailable");
            Map::new()
        });

        let request = StrategyRequest {
            intent: intent.clone(),
            current_context,
            npc_state: json!({
                "emotional_state": npc.emotional_state,
                "current_goal": npc.current_goal,
                "personality": npc.identity.personality,
            }),
            available_strategies: self.strategies.available_strategies(),
            target_relationship: self.target_relationship(npc, target_id).await,
        };

        let strategy = self.select(&request).await;

        if !intent.is_error() {
            let mut patch = Map::new();
            patch.insert("current_topic".to_string(), Value::String(current_topic.to_string()));
            patch.insert("emotional_state".to_string(), Value::String(intent.emotion.clone()));
            let _ = self.ledger.update_current_context(patch).await;
        }

        TurnDecision { intent, strategy }
    }

    /// Second stage alone. Any failure yields `StrategyRecord::default()`.
    pub async fn select(&self, request: &StrategyRequest) -> StrategyRecord {
        match self.try_select(request).await {
            Ok(strategy) => strategy,
            Err(e) => {
                tracing::warn!(error = %e, "Strategy selection failed, using default strategy");
                StrategyRecord::default()
            }
        }
    }

    async fn try_select(&self, request: &StrategyRequest) -> Result<StrategyRecord, InferenceError> {
        let output = tokio::time::timeout(self.timeout, self.gateway.select_strategy(request))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        StrategyRecord::from_object(&output.into_object()?)
    }

    /// Ledger relationship first, then the live social graph.
    async fn target_relationship(&self, npc: &NpcSnapshot, target_id: Option<&str>) -> Option<Value> {
        let target_id = target_id?;

        match self.ledger.get_relationship(target_id).await {
            Ok(Some(relationship)) => return Some(relationship),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(npc_id = %self.ledger.npc_id(), target_id, error = %e, "Relationship lookup failed");
            }
        }

        npc.social_context
            .iter()
            .find(|relation| relation.target_id == target_id)
            .and_then(|relation| serde_json::to_value(relation).ok())
    }
}
