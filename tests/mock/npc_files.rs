use npc_intent_engine::config::AppConfig;
use std::path::PathBuf;
use tempfile::TempDir;

pub const IDENTITY_JSON: &str = r#"{
    "merchant": {
        "identity": {"name": "A", "race": "human", "faction": "guild", "personality": {"greed": 0.6}},
        "initial_goal": "sell goods"
    }
}"#;

pub const SCENE_JSON: &str = r#"{
    "social_relations": [
        {"target_id": "guard_1", "relationship_type": "acquaintance", "trust_level": 0.5, "familiarity": 0.3}
    ]
}"#;

/// Identity, scene and ledger files in a fresh temp dir.
pub struct NpcFiles {
    pub dir: TempDir,
    pub identity: PathBuf,
    pub scene: PathBuf,
    pub memory: PathBuf,
}

impl NpcFiles {
    pub fn new() -> Self {
        Self::with_documents(IDENTITY_JSON, SCENE_JSON)
    }

    pub fn with_documents(identity_json: &str, scene_json: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let identity = dir.path().join("default_npcs.json");
        let scene = dir.path().join("market_scene.json");
        let memory = dir.path().join("memory").join("memories.json");

        std::fs::write(&identity, identity_json).unwrap();
        std::fs::write(&scene, scene_json).unwrap();

        Self {
            dir,
            identity,
            scene,
            memory,
        }
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.npc.identity_file = self.identity.clone();
        config.npc.scene_file = self.scene.clone();
        config.npc.memory_file = self.memory.clone();
        config.llm.timeout_secs = 5;
        config
    }

    pub fn ledger_document(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(&self.memory).unwrap()).unwrap()
    }
}
