use crate::config::{ConfigError, IdentityInfo, NpcDefinition, SceneConfig, SocialRelation};
use crate::modules::inference::IntentRecord;
use crate::modules::snapshot::{NpcSnapshot, SceneSnapshot};
use crate::modules::state::{ChannelProfile, ChannelType, EmotionalState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

const EMOTION_BLEND: f32 = 0.5;

/// Most recent scratch-log entries kept; older ones are dropped.
pub const SCRATCH_LOG_WINDOW: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("Operation not implemented: {0}")]
    NotImplemented(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcStatus {
    pub identity: IdentityInfo,
    pub current_goal: String,
    pub emotional_state: EmotionalState,
    pub current_channel: ChannelType,
    pub current_location: String,
    pub current_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub npc_state: NpcSnapshot,
    pub scene_state: SceneSnapshot,
}

/// State of a single NPC: identity, affect, social graph, goal and the scene it stands in.
#[derive(Debug, Clone)]
pub struct NpcState {
    npc_id: String,
    identity: IdentityInfo,
    social_graph: Vec<SocialRelation>,
    scratch_log: VecDeque<Value>,
    goal: String,
    emotional_state: EmotionalState,
    channel: ChannelType,
    last_intent: Option<IntentRecord>,
    last_output: Option<String>,
    location: String,
    time: String,
    nearby_entities: Vec<Value>,
    environment_state: Map<String, Value>,
}

impl NpcState {
    pub fn initialize(
        identity_path: impl AsRef<Path>,
        scene_path: impl AsRef<Path>,
        npc_id: &str,
    ) -> Result<Self, ConfigError> {
        let definition = NpcDefinition::load(identity_path, npc_id)?;
        let scene = SceneConfig::load(scene_path)?;
        Ok(Self::from_sources(npc_id, definition, scene))
    }

    pub fn from_sources(npc_id: impl Into<String>, definition: NpcDefinition, scene: SceneConfig) -> Self {
        let mut state = Self {
            npc_id: npc_id.into(),
            identity: definition.identity,
            social_graph: Vec::new(),
            scratch_log: VecDeque::with_capacity(SCRATCH_LOG_WINDOW),
            goal: definition.initial_goal,
            emotional_state: EmotionalState::default(),
            channel: ChannelType::default(),
            last_intent: None,
            last_output: None,
            location: scene.location,
            time: scene.time,
            nearby_entities: scene.nearby_entities,
            environment_state: scene.environment_state,
        };

        for relation in scene.social_relations {
            state.upsert_relation(relation);
        }

        state
    }

    pub fn npc_id(&self) -> &str {
        &self.npc_id
    }

    pub fn identity(&self) -> &IdentityInfo {
        &self.identity
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) {
        self.goal = goal.into();
    }

    pub fn emotional_state(&self) -> EmotionalState {
        self.emotional_state
    }

    pub fn set_emotional_state(&mut self, state: EmotionalState) {
        self.emotional_state = state.clamped();
    }

    /// Moves the affect vector part of the way toward the profile of an intent's emotion
    /// label. Unknown labels leave it unchanged.
    pub fn apply_emotion(&mut self, label: &str) -> bool {
        match EmotionalState::from_label(label) {
            Some(target) => {
                self.set_emotional_state(self.emotional_state.toward(target, EMOTION_BLEND));
                true
            }
            None => false,
        }
    }

    pub fn channel(&self) -> ChannelType {
        self.channel
    }

    pub fn set_channel(&mut self, channel: ChannelType) {
        self.channel = channel;
    }

    pub fn channel_profile(&self) -> ChannelProfile {
        self.channel.profile()
    }

    pub fn adapt_response_style(&self, output: &str) -> String {
        self.channel_profile().adapt(output)
    }

    /// Keyed by `target_id`; an existing relation keeps its position and takes the new values.
    pub fn upsert_relation(&mut self, relation: SocialRelation) {
        match self
            .social_graph
            .iter_mut()
            .find(|existing| existing.target_id == relation.target_id)
        {
            Some(existing) => *existing = relation,
            None => self.social_graph.push(relation),
        }
    }

    pub fn relation(&self, target_id: &str) -> Option<&SocialRelation> {
        self.social_graph.iter().find(|relation| relation.target_id == target_id)
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn set_time(&mut self, time: impl Into<String>) {
        self.time = time.into();
    }

    pub fn set_nearby_entities(&mut self, entities: Vec<Value>) {
        self.nearby_entities = entities;
    }

    pub fn set_environment_state(&mut self, environment: Map<String, Value>) {
        self.environment_state = environment;
    }

    /// In-process scratch log only; it is not persisted and keeps the last
    /// `SCRATCH_LOG_WINDOW` entries.
    pub fn record_memory_event(&mut self, event: Value) {
        if self.scratch_log.len() == SCRATCH_LOG_WINDOW {
            self.scratch_log.pop_front();
        }
        self.scratch_log.push_back(event);
    }

    pub fn scratch_log(&self) -> impl Iterator<Item = &Value> {
        self.scratch_log.iter()
    }

    pub fn record_turn(&mut self, intent: IntentRecord, output: Option<String>) {
        self.last_intent = Some(intent);
        self.last_output = output;
    }

    pub fn last_intent(&self) -> Option<&IntentRecord> {
        self.last_intent.as_ref()
    }

    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    pub fn snapshot_identity(&self) -> NpcSnapshot {
        NpcSnapshot {
            identity: self.identity.clone(),
            emotional_state: self.emotional_state,
            current_goal: self.goal.clone(),
            social_context: self.social_graph.clone(),
            memory_content: self.scratch_log.iter().cloned().collect(),
            channel_type: self.channel,
        }
    }

    pub fn snapshot_scene(&self) -> SceneSnapshot {
        SceneSnapshot {
            location: self.location.clone(),
            time: self.time.clone(),
            nearby_entities: self.nearby_entities.clone(),
            environment_state: self.environment_state.clone(),
            current_channel: self.channel,
            last_intent: self.last_intent.clone(),
            last_output: self.last_output.clone(),
        }
    }

    pub fn generate_response(&self) -> Result<String, StateError> {
        Err(StateError::NotImplemented("generate_response"))
    }

    pub fn status(&self) -> NpcStatus {
        NpcStatus {
            identity: self.identity.clone(),
            current_goal: self.goal.clone(),
            emotional_state: self.emotional_state,
            current_channel: self.channel,
            current_location: self.location.clone(),
            current_time: self.time.clone(),
        }
    }

    pub fn debug_trace(&self) -> DebugTrace {
        DebugTrace {
            npc_state: self.snapshot_identity(),
            scene_state: self.snapshot_scene(),
        }
    }
}
