pub mod chat_model;
pub mod gateway;
pub mod prompts;
pub mod records;
pub mod scripted;

pub use chat_model::ChatModelGateway;
pub use gateway::{
    DialogueGateway, DialogueRequest, GatewayOutput, InferenceError, IntentGateway, StrategyGateway,
    StrategyRequest,
};
pub use records::{DialogueLine, IntentRecord, StrategyRecord};
pub use scripted::ScriptedGateway;

#[cfg(test)]
pub use gateway::{MockDialogueGateway, MockIntentGateway, MockStrategyGateway};
