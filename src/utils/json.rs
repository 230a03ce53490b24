use serde_json::{Map, Value};

/// Strips code-fence markers and isolates the outermost `{...}` span.
///
/// When no braces are found the trimmed text is returned as is.
pub fn clean_json_block(raw: &str) -> String {
    let stripped = raw.replace("```json", "").replace("```", "");
    let trimmed = stripped.trim();

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Parses model output that should contain exactly one JSON object.
pub fn parse_embedded_object(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    let cleaned = clean_json_block(raw);
    match serde_json::from_str::<Value>(&cleaned)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, found {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
