use crate::config::{IdentityInfo, SocialRelation};
use crate::modules::inference::IntentRecord;
use crate::modules::state::{ChannelType, EmotionalState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Point-in-time copy of one NPC's own state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSnapshot {
    pub identity: IdentityInfo,
    pub emotional_state: EmotionalState,
    pub current_goal: String,
    pub social_context: Vec<SocialRelation>,
    pub memory_content: Vec<Value>,
    pub channel_type: ChannelType,
}

/// Point-in-time copy of the scene around the NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub location: String,
    pub time: String,
    pub nearby_entities: Vec<Value>,
    pub environment_state: Map<String, Value>,
    pub current_channel: ChannelType,
    pub last_intent: Option<IntentRecord>,
    pub last_output: Option<String>,
}

/// Flat input handed to the intent gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceInput(Map<String, Value>);

impl InferenceInput {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl From<Map<String, Value>> for InferenceInput {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Merges NPC fields first and scene fields second, so the scene wins on a shared key.
pub fn assemble(npc: &NpcSnapshot, scene: &SceneSnapshot) -> Result<InferenceInput, serde_json::Error> {
    Ok(merge(
        into_object(serde_json::to_value(npc)?),
        into_object(serde_json::to_value(scene)?),
    ))
}

pub fn merge(npc: Map<String, Value>, scene: Map<String, Value>) -> InferenceInput {
    let mut merged = npc;
    merged.extend(scene);
    InferenceInput(merged)
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
