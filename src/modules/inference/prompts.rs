use serde_json::{Map, Value};

pub const INTENT_PROMPT: &str = r#"Analyze the current intent of the NPC from the information below.

NPC identity: {identity}
Emotional state: {emotional_state}
Current goal: {current_goal}
Social relations: {social_context}
Memory: {memory_content}
Channel: {channel_type}

Scene:
Location: {location}
Time: {time}
Nearby entities: {nearby_entities}
Environment: {environment_state}
Current channel: {current_channel}
Previous intent: {last_intent}
Previous output: {last_output}

Based on the NPC's personality, memory, current state and scene, decide its most likely intent and emotion.
Answer with a single JSON object:
{{
    "intent_type": "intent category such as deflect, attack or agree",
    "intent_description": "what the NPC intends to do",
    "emotion": "emotional state",
    "target": "who the intent is aimed at",
    "confidence": "confidence between 0 and 1",
    "reasoning": "short reasoning"
}}
"#;

pub const STRATEGY_PROMPT: &str = r#"Choose the most fitting response strategy from the information below.

Current intent: {intent}
Current context: {current_context}
NPC state: {npc_state}
Available expression strategies: {available_strategies}
Relationship with the other party: {target_relationship}

Pick one strategy id and an expression style.
Answer with a single JSON object:
{{
    "strategy_id": "chosen strategy id",
    "expression_type": "happy, neutral or sad",
    "context_type": "formal, casual or intimate",
    "reason": "why this strategy fits"
}}
"#;

pub const DIALOGUE_PROMPT: &str = r#"You are {npc_name}. Reply to the player in character.

Player said: {player_line}
Your intent: {intent}
Expression strategy: {strategy}
Channel: {channel}
Recent conversation: {recent_conversations}

Keep the reply short and consistent with the intent and strategy.
Answer with a single JSON object:
{{
    "speaker": "{npc_name}",
    "content": "what you say"
}}
"#;

/// Fills `{key}` placeholders from `values`.
///
/// String values are inserted raw, everything else as compact JSON. `{{` and `}}` render as
/// literal braces; unknown placeholders are left untouched.
pub fn render(template: &str, values: &Map<String, Value>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            output.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            output.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail.find('}') {
                Some(end) => {
                    let key = &tail[1..end];
                    match values.get(key) {
                        Some(Value::String(s)) => output.push_str(s),
                        Some(value) => output.push_str(&value.to_string()),
                        None => output.push_str(&tail[..=end]),
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    output.push_str(tail);
                    rest = "";
                }
            }
        } else {
            output.push('}');
            rest = &tail[1..];
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::{render, INTENT_PROMPT};
    use serde_json::{json, Map};

    #[test]
    fn test_render_substitutes_and_unescapes() {
        let mut values = Map::new();
        values.insert("name".to_string(), json!("A"));
        values.insert("traits".to_string(), json!({"greed": 0.6}));

        let rendered = render("{name} has {traits} {{literal}} {missing}", &values);
        assert_eq!(rendered, r#"A has {"greed":0.6} {literal} {missing}"#);
    }

    #[test]
    fn test_intent_prompt_keeps_json_skeleton() {
        let mut values = Map::new();
        values.insert("current_goal".to_string(), json!("sell goods"));

        let rendered = render(INTENT_PROMPT, &values);
        assert!(rendered.contains("Current goal: sell goods"));
        assert!(rendered.contains("\"intent_type\""));
        assert!(!rendered.contains("{{"));
    }
}
