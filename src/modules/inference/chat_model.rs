use crate::config::LlmConfig;
use crate::modules::inference::prompts::{render, DIALOGUE_PROMPT, INTENT_PROMPT, STRATEGY_PROMPT};
use crate::modules::inference::{
    DialogueGateway, DialogueRequest, GatewayOutput, InferenceError, IntentGateway, StrategyGateway,
    StrategyRequest,
};
use crate::modules::snapshot::InferenceInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Gateway backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatModelGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatModelGateway {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, InferenceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(InferenceError::NotConfigured("API key is empty".to_string()));
        }

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::NotConfigured(e.to_string()))?;

        tracing::info!(model = %config.model, base_url = %config.base_url, "Chat model gateway ready");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<GatewayOutput, InferenceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InferenceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(GatewayOutput::Text)
            .ok_or_else(|| InferenceError::InvalidResponse("response carried no choices".to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> InferenceError {
        if error.is_timeout() {
            InferenceError::Timeout(self.timeout)
        } else {
            InferenceError::Transport(error.to_string())
        }
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, InferenceError> {
    match serde_json::to_value(value).map_err(|e| InferenceError::InvalidResponse(e.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[async_trait]
impl IntentGateway for ChatModelGateway {
    async fn infer_intent(&self, input: &InferenceInput) -> Result<GatewayOutput, InferenceError> {
        self.complete(&render(INTENT_PROMPT, input.as_map())).await
    }
}

#[async_trait]
impl StrategyGateway for ChatModelGateway {
    async fn select_strategy(&self, request: &StrategyRequest) -> Result<GatewayOutput, InferenceError> {
        self.complete(&render(STRATEGY_PROMPT, &to_object(request)?)).await
    }
}

#[async_trait]
impl DialogueGateway for ChatModelGateway {
    async fn compose_line(&self, request: &DialogueRequest) -> Result<GatewayOutput, InferenceError> {
        self.complete(&render(DIALOGUE_PROMPT, &to_object(request)?)).await
    }
}
