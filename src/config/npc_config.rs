use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

pub type PersonalityValue = f32;

const REQUIRED_IDENTITY_FIELDS: [&str; 4] = ["name", "race", "faction", "personality"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityInfo {
    pub name: String,
    pub race: String,
    pub faction: String,
    pub personality: BTreeMap<String, PersonalityValue>,
}

impl IdentityInfo {
    pub fn new(name: impl Into<String>, race: impl Into<String>, faction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            race: race.into(),
            faction: faction.into(),
            personality: BTreeMap::new(),
        }
    }

    pub fn with_trait(mut self, name: impl Into<String>, intensity: PersonalityValue) -> Self {
        self.personality.insert(name.into(), intensity);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in &self.personality {
            if !(0.0..=1.0).contains(value) {
                return Err(format!(
                    "Personality trait '{}' has value {}, but must be between 0.0 and 1.0",
                    name, value
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialRelation {
    pub target_id: String,
    pub relationship_type: String,
    pub trust_level: f32,
    pub familiarity: f32,
}

impl SocialRelation {
    pub fn new(
        target_id: impl Into<String>,
        relationship_type: impl Into<String>,
        trust_level: f32,
        familiarity: f32,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            trust_level,
            familiarity,
        }
    }
}

/// One entry of the identity config file, keyed by NPC id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDefinition {
    pub identity: IdentityInfo,
    #[serde(default)]
    pub initial_goal: String,
}

impl NpcDefinition {
    pub fn load(path: impl AsRef<Path>, npc_id: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = read_json(path)?;
        Self::from_document(&document, npc_id).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::parse(path, message),
            other => other,
        })
    }

    pub fn from_document(document: &Value, npc_id: &str) -> Result<Self, ConfigError> {
        let entry = document
            .get(npc_id)
            .ok_or_else(|| ConfigError::UnknownNpc(npc_id.to_string()))?;

        let identity = entry.get("identity").ok_or(ConfigError::MissingField {
            npc_id: npc_id.to_string(),
            field: "identity",
        })?;

        for field in REQUIRED_IDENTITY_FIELDS {
            if identity.get(field).is_none() {
                return Err(ConfigError::MissingField {
                    npc_id: npc_id.to_string(),
                    field,
                });
            }
        }

        let definition: NpcDefinition = serde_json::from_value(entry.clone())
            .map_err(|e| ConfigError::parse(npc_id, e))?;

        definition.identity.validate().map_err(ConfigError::Invalid)?;

        Ok(definition)
    }
}

/// Scene config file: the social graph plus optional initial scene state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub social_relations: Vec<SocialRelation>,
    pub location: String,
    pub time: String,
    pub nearby_entities: Vec<Value>,
    pub environment_state: Map<String, Value>,
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = read_json(path)?;
        serde_json::from_value(document).map_err(|e| ConfigError::parse(path, e))
    }
}

pub(crate) fn read_json(path: &Path) -> Result<Value, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::parse(path, e))
}

#[cfg(test)]
mod tests {
    use super::{IdentityInfo, NpcDefinition, SceneConfig};
    use crate::config::ConfigError;
    use serde_json::json;

    #[test]
    fn test_identity_validate() {
        let identity = IdentityInfo::new("Alice", "human", "guild").with_trait("greed", 0.6);
        assert!(identity.validate().is_ok());

        let identity = identity.with_trait("wrath", 1.5);
        assert!(identity.validate().is_err());
    }

    #[test]
    fn test_definition_from_document() {
        let document = json!({
            "merchant": {
                "identity": {"name": "A", "race": "human", "faction": "guild", "personality": {"greed": 0.6}},
                "initial_goal": "sell goods"
            }
        });

        let definition = NpcDefinition::from_document(&document, "merchant").unwrap();
        assert_eq!(definition.identity.name, "A");
        assert_eq!(definition.identity.personality.get("greed"), Some(&0.6));
        assert_eq!(definition.initial_goal, "sell goods");
    }

    #[test]
    fn test_definition_unknown_npc() {
        let document = json!({"merchant": {}});
        let result = NpcDefinition::from_document(&document, "guard");
        assert!(matches!(result, Err(ConfigError::UnknownNpc(id)) if id == "guard"));
    }

    #[test]
    fn test_definition_missing_identity() {
        let document = json!({"merchant": {"initial_goal": "sell goods"}});
        let result = NpcDefinition::from_document(&document, "merchant");
        assert!(matches!(result, Err(ConfigError::MissingField { field: "identity", .. })));
    }

    #[test]
    fn test_definition_missing_identity_field() {
        let document = json!({
            "merchant": {"identity": {"name": "A", "race": "human", "personality": {}}}
        });
        let result = NpcDefinition::from_document(&document, "merchant");
        assert!(matches!(result, Err(ConfigError::MissingField { field: "faction", .. })));
    }

    #[test]
    fn test_definition_goal_defaults_to_empty() {
        let document = json!({
            "merchant": {"identity": {"name": "A", "race": "human", "faction": "guild", "personality": {}}}
        });
        let definition = NpcDefinition::from_document(&document, "merchant").unwrap();
        assert_eq!(definition.initial_goal, "");
    }

    #[test]
    fn test_scene_config_defaults() {
        let scene: SceneConfig = serde_json::from_value(json!({
            "social_relations": [
                {"target_id": "guard_1", "relationship_type": "acquaintance", "trust_level": 0.5, "familiarity": 0.3}
            ]
        }))
        .unwrap();

        assert_eq!(scene.social_relations.len(), 1);
        assert_eq!(scene.location, "");
        assert!(scene.nearby_entities.is_empty());
        assert!(scene.environment_state.is_empty());
    }
}
