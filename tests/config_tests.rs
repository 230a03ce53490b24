pub mod mock;

use npc_intent_engine::config::{AppConfig, ConfigError, NpcDefinition, SceneConfig, StrategyConfig};
use serde_json::json;

use mock::{NpcFiles, IDENTITY_JSON};

#[test]
fn test_definition_loads_from_file() {
    let files = NpcFiles::new();
    let definition = NpcDefinition::load(&files.identity, "merchant").unwrap();

    assert_eq!(definition.identity.name, "A");
    assert_eq!(definition.identity.faction, "guild");
    assert_eq!(definition.identity.personality.get("greed"), Some(&0.6));
    assert_eq!(definition.initial_goal, "sell goods");
}

#[test]
fn test_definition_unknown_npc() {
    let files = NpcFiles::new();
    let result = NpcDefinition::load(&files.identity, "blacksmith");
    assert!(matches!(result, Err(ConfigError::UnknownNpc(id)) if id == "blacksmith"));
}

#[test]
fn test_definition_missing_identity() {
    let files = NpcFiles::with_documents(r#"{"merchant": {"initial_goal": "sell goods"}}"#, "{}");
    let result = NpcDefinition::load(&files.identity, "merchant");
    assert!(matches!(result, Err(ConfigError::MissingField { field: "identity", .. })));
}

#[test]
fn test_definition_missing_required_identity_field() {
    let files = NpcFiles::with_documents(
        r#"{"merchant": {"identity": {"name": "A", "race": "human", "personality": {}}}}"#,
        "{}",
    );
    let result = NpcDefinition::load(&files.identity, "merchant");
    assert!(matches!(result, Err(ConfigError::MissingField { field: "faction", .. })));
}

#[test]
fn test_definition_personality_out_of_range() {
    let files = NpcFiles::with_documents(
        r#"{"merchant": {"identity": {"name": "A", "race": "human", "faction": "guild", "personality": {"greed": 1.7}}}}"#,
        "{}",
    );
    let result = NpcDefinition::load(&files.identity, "merchant");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_definition_missing_and_unparseable_files() {
    let files = NpcFiles::new();
    let missing = files.dir.path().join("nope.json");
    assert!(matches!(NpcDefinition::load(&missing, "merchant"), Err(ConfigError::NotFound(_))));

    std::fs::write(&files.identity, "{ not json").unwrap();
    assert!(matches!(
        NpcDefinition::load(&files.identity, "merchant"),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_scene_loads_relations_and_defaults() {
    let files = NpcFiles::new();
    let scene = SceneConfig::load(&files.scene).unwrap();

    assert_eq!(scene.social_relations.len(), 1);
    assert_eq!(scene.social_relations[0].target_id, "guard_1");
    assert_eq!(scene.social_relations[0].trust_level, 0.5);
    assert_eq!(scene.location, "");
    assert!(scene.nearby_entities.is_empty());
}

#[test]
fn test_strategy_config_optional() {
    let files = NpcFiles::new();
    let missing = files.dir.path().join("strategies.json");
    assert_eq!(StrategyConfig::load_or_default(Some(&missing)), StrategyConfig::default());
    assert_eq!(StrategyConfig::load_or_default(None).available_strategies(), json!({}));

    std::fs::write(
        &missing,
        r#"{"emotion_expression_strategies": {"happy": {"casual": ["smile"]}}}"#,
    )
    .unwrap();
    let loaded = StrategyConfig::load_or_default(Some(&missing));
    assert_eq!(loaded.available_strategies()["happy"]["casual"], json!(["smile"]));
}

#[test]
fn test_app_config_from_file() {
    let files = NpcFiles::new();
    let path = files.dir.path().join("engine.toml");
    std::fs::write(
        &path,
        format!(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9100

            [npc]
            npc_id = "merchant"
            identity_file = "{}"

            [llm]
            temperature = 0.2
            "#,
            files.identity.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.server.address(), "0.0.0.0:9100");
    assert_eq!(config.npc.identity_file, files.identity);
    assert_eq!(config.llm.temperature, 0.2);
    assert_eq!(config.llm.model, "gpt-4o");
    assert!(config.validate().is_ok());
}

#[test]
fn test_app_config_rejects_bad_temperature() {
    let config = AppConfig::from_toml_str("[llm]\ntemperature = 3.5\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_identity_fixture_is_valid_json() {
    let document: serde_json::Value = serde_json::from_str(IDENTITY_JSON).unwrap();
    assert!(NpcDefinition::from_document(&document, "merchant").is_ok());
}
