use crate::modules::inference::{
    DialogueGateway, DialogueRequest, GatewayOutput, InferenceError, IntentGateway, StrategyGateway,
    StrategyRequest,
};
use crate::modules::snapshot::InferenceInput;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

type Scripted = Result<GatewayOutput, InferenceError>;

/// Deterministic gateway that replays queued answers in order.
///
/// An exhausted queue answers `InferenceError::NotConfigured`. Every request is recorded so
/// callers can assert on what the pipeline sent.
#[derive(Default)]
pub struct ScriptedGateway {
    intents: Mutex<VecDeque<Scripted>>,
    strategies: Mutex<VecDeque<Scripted>>,
    lines: Mutex<VecDeque<Scripted>>,
    intent_calls: Mutex<Vec<InferenceInput>>,
    strategy_calls: Mutex<Vec<StrategyRequest>>,
    dialogue_calls: Mutex<Vec<DialogueRequest>>,
    delay: Option<Duration>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every answer waits `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_intent(&self, value: Value) -> &Self {
        guard(&self.intents).push_back(Ok(GatewayOutput::Structured(value)));
        self
    }

    pub fn push_intent_text(&self, text: impl Into<String>) -> &Self {
        guard(&self.intents).push_back(Ok(GatewayOutput::Text(text.into())));
        self
    }

    pub fn push_intent_error(&self, error: InferenceError) -> &Self {
        guard(&self.intents).push_back(Err(error));
        self
    }

    pub fn push_strategy(&self, value: Value) -> &Self {
        guard(&self.strategies).push_back(Ok(GatewayOutput::Structured(value)));
        self
    }

    pub fn push_strategy_text(&self, text: impl Into<String>) -> &Self {
        guard(&self.strategies).push_back(Ok(GatewayOutput::Text(text.into())));
        self
    }

    pub fn push_strategy_error(&self, error: InferenceError) -> &Self {
        guard(&self.strategies).push_back(Err(error));
        self
    }

    pub fn push_line(&self, value: Value) -> &Self {
        guard(&self.lines).push_back(Ok(GatewayOutput::Structured(value)));
        self
    }

    pub fn push_line_error(&self, error: InferenceError) -> &Self {
        guard(&self.lines).push_back(Err(error));
        self
    }

    pub fn intent_calls(&self) -> Vec<InferenceInput> {
        guard(&self.intent_calls).clone()
    }

    pub fn strategy_calls(&self) -> Vec<StrategyRequest> {
        guard(&self.strategy_calls).clone()
    }

    pub fn dialogue_calls(&self) -> Vec<DialogueRequest> {
        guard(&self.dialogue_calls).clone()
    }

    async fn answer(&self, queue: &Mutex<VecDeque<Scripted>>, what: &str) -> Scripted {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = guard(queue).pop_front();
        next.unwrap_or_else(|| Err(InferenceError::NotConfigured(format!("no scripted {} answer left", what))))
    }
}

#[async_trait]
impl IntentGateway for ScriptedGateway {
    async fn infer_intent(&self, input: &InferenceInput) -> Result<GatewayOutput, InferenceError> {
        guard(&self.intent_calls).push(input.clone());
        self.answer(&self.intents, "intent").await
    }
}

#[async_trait]
impl StrategyGateway for ScriptedGateway {
    async fn select_strategy(&self, request: &StrategyRequest) -> Result<GatewayOutput, InferenceError> {
        guard(&self.strategy_calls).push(request.clone());
        self.answer(&self.strategies, "strategy").await
    }
}

#[async_trait]
impl DialogueGateway for ScriptedGateway {
    async fn compose_line(&self, request: &DialogueRequest) -> Result<GatewayOutput, InferenceError> {
        guard(&self.dialogue_calls).push(request.clone());
        self.answer(&self.lines, "dialogue").await
    }
}
