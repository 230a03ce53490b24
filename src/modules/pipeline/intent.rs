use crate::modules::inference::{InferenceError, IntentGateway, IntentRecord};
use crate::modules::snapshot::{assemble, InferenceInput, NpcSnapshot, SceneSnapshot};
use std::sync::Arc;
use std::time::Duration;

/// First pipeline stage. Always yields a record; failures become the error variant.
#[derive(Clone)]
pub struct IntentEvaluator {
    gateway: Arc<dyn IntentGateway>,
    timeout: Duration,
}

impl IntentEvaluator {
    pub fn new(gateway: Arc<dyn IntentGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn evaluate(&self, npc: &NpcSnapshot, scene: &SceneSnapshot) -> IntentRecord {
        match assemble(npc, scene) {
            Ok(input) => self.evaluate_input(&input).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to assemble inference input");
                IntentRecord::error(format!("Failed to assemble inference input: {}", e))
            }
        }
    }

    /// One gateway call, bounded by the configured timeout. No retries.
    pub async fn evaluate_input(&self, input: &InferenceInput) -> IntentRecord {
        match self.try_evaluate(input).await {
            Ok(intent) => {
                tracing::debug!(intent_type = %intent.intent_type, confidence = intent.confidence, "Intent evaluated");
                intent
            }
            Err(e) => {
                tracing::warn!(error = %e, "Intent evaluation failed, using error intent");
                IntentRecord::error(e.to_string())
            }
        }
    }

    async fn try_evaluate(&self, input: &InferenceInput) -> Result<IntentRecord, InferenceError> {
        let output = tokio::time::timeout(self.timeout, self.gateway.infer_intent(input))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        IntentRecord::from_object(&output.into_object()?)
    }
}
