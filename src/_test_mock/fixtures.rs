use crate::config::{AppConfig, NpcDefinition, SceneConfig};
use crate::modules::snapshot::{NpcSnapshot, SceneSnapshot};
use crate::modules::state::NpcState;
use serde_json::json;
use std::path::Path;

pub fn identity_document() -> serde_json::Value {
    json!({
        "merchant": {
            "identity": {
                "name": "A",
                "race": "human",
                "faction": "guild",
                "personality": {"greed": 0.6}
            },
            "initial_goal": "sell goods"
        }
    })
}

pub fn scene_document() -> serde_json::Value {
    json!({
        "social_relations": [
            {"target_id": "guard_1", "relationship_type": "acquaintance", "trust_level": 0.5, "familiarity": 0.3}
        ],
        "location": "market",
        "time": "morning"
    })
}

pub fn sample_state() -> NpcState {
    let definition = NpcDefinition::from_document(&identity_document(), "merchant").unwrap();
    let scene: SceneConfig = serde_json::from_value(scene_document()).unwrap();
    NpcState::from_sources("merchant", definition, scene)
}

pub fn sample_npc_snapshot() -> NpcSnapshot {
    sample_state().snapshot_identity()
}

pub fn sample_scene_snapshot() -> SceneSnapshot {
    sample_state().snapshot_scene()
}

/// Writes identity and scene files under `dir` and returns a config pointing at them.
pub fn write_npc_files(dir: &Path) -> AppConfig {
    let identity_file = dir.join("npcs.json");
    let scene_file = dir.join("scene.json");
    std::fs::write(&identity_file, identity_document().to_string()).unwrap();
    std::fs::write(&scene_file, scene_document().to_string()).unwrap();

    let mut config = AppConfig::default();
    config.npc.identity_file = identity_file;
    config.npc.scene_file = scene_file;
    config.npc.memory_file = dir.join("memory").join("memories.json");
    config
}
