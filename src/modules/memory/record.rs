use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Conversation,
    Event,
    Experience,
}

/// One ledger entry. Payload fields are stored flat next to `timestamp` and `kind`.
///
/// Any JSON value loads: a missing or unreadable `timestamp` or `kind` stays in the
/// payload untouched, `time` is read as the timestamp, timestamps without an offset are
/// taken as UTC, and a non-object entry is kept under `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct MemoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemoryKind>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl From<Value> for MemoryRecord {
    fn from(value: Value) -> Self {
        let mut payload = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        let timestamp = take_parsed(&mut payload, "timestamp", |raw| raw.as_str().and_then(parse_timestamp))
            .or_else(|| take_parsed(&mut payload, "time", |raw| raw.as_str().and_then(parse_timestamp)));
        let kind = take_parsed(&mut payload, "kind", |raw| serde_json::from_value(raw.clone()).ok());

        Self {
            timestamp,
            kind,
            payload,
        }
    }
}

/// Removes `key` only when `parse` accepts its value.
fn take_parsed<T>(payload: &mut Map<String, Value>, key: &str, parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let parsed = payload.get(key).and_then(parse)?;
    payload.remove(key);
    Some(parsed)
}

/// RFC 3339, or a naive ISO 8601 date-time read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

impl MemoryRecord {
    pub fn new(kind: MemoryKind) -> Self {
        Self {
            timestamp: Some(Utc::now()),
            kind: Some(kind),
            payload: Map::new(),
        }
    }

    pub fn conversation(speaker: impl Into<String>, content: impl Into<String>, role: &str) -> Self {
        Self::new(MemoryKind::Conversation)
            .with_field("speaker", Value::String(speaker.into()))
            .with_field("content", Value::String(content.into()))
            .with_field("role", Value::String(role.to_string()))
    }

    pub fn event(description: impl Into<String>) -> Self {
        Self::new(MemoryKind::Event).with_field("description", Value::String(description.into()))
    }

    pub fn experience(description: impl Into<String>) -> Self {
        Self::new(MemoryKind::Experience).with_field("description", Value::String(description.into()))
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn content(&self) -> Option<&str> {
        self.payload.get("content").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    #[default]
    Normal,
    Low,
}

impl FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Importance::High),
            "normal" => Ok(Importance::Normal),
            "low" => Ok(Importance::Low),
            other => Err(format!("Unknown importance '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceKind {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl FromStr for ExperienceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(ExperienceKind::Positive),
            "negative" => Ok(ExperienceKind::Negative),
            "neutral" => Ok(ExperienceKind::Neutral),
            other => Err(format!("Unknown experience kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortTermMemory {
    pub recent_conversations: Vec<MemoryRecord>,
    pub current_context: Map<String, Value>,
    pub recent_events: Vec<MemoryRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalExperiences {
    pub positive_experiences: Vec<MemoryRecord>,
    pub negative_experiences: Vec<MemoryRecord>,
    pub neutral_experiences: Vec<MemoryRecord>,
}

impl PersonalExperiences {
    pub fn bucket(&self, kind: ExperienceKind) -> &[MemoryRecord] {
        match kind {
            ExperienceKind::Positive => &self.positive_experiences,
            ExperienceKind::Negative => &self.negative_experiences,
            ExperienceKind::Neutral => &self.neutral_experiences,
        }
    }

    fn bucket_mut(&mut self, kind: ExperienceKind) -> &mut Vec<MemoryRecord> {
        match kind {
            ExperienceKind::Positive => &mut self.positive_experiences,
            ExperienceKind::Negative => &mut self.negative_experiences,
            ExperienceKind::Neutral => &mut self.neutral_experiences,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongTermMemory {
    pub relationships: BTreeMap<String, Value>,
    pub important_events: Vec<MemoryRecord>,
    pub personal_experiences: PersonalExperiences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryMetadata {
    pub total_conversations: u64,
    pub total_events: u64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Everything the ledger file holds for one NPC id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcMemory {
    pub short_term_memory: ShortTermMemory,
    pub long_term_memory: LongTermMemory,
    pub memory_metadata: MemoryMetadata,
}

impl NpcMemory {
    pub fn add_conversation(&mut self, record: MemoryRecord) {
        self.short_term_memory.recent_conversations.push(record);
        self.memory_metadata.total_conversations += 1;
    }

    pub fn add_event(&mut self, record: MemoryRecord, importance: Importance) {
        if importance == Importance::High {
            self.long_term_memory.important_events.push(record.clone());
        }
        self.short_term_memory.recent_events.push(record);
        self.memory_metadata.total_events += 1;
    }

    pub fn update_relationship(&mut self, target_id: impl Into<String>, data: Value) {
        self.long_term_memory.relationships.insert(target_id.into(), data);
    }

    pub fn add_experience(&mut self, record: MemoryRecord, kind: ExperienceKind) {
        self.long_term_memory
            .personal_experiences
            .bucket_mut(kind)
            .push(record);
    }

    pub fn update_current_context(&mut self, patch: Map<String, Value>) {
        self.short_term_memory.current_context.extend(patch);
    }

    /// The last `limit` conversations, oldest first.
    pub fn recent_conversations(&self, limit: usize) -> Vec<MemoryRecord> {
        let conversations = &self.short_term_memory.recent_conversations;
        let start = conversations.len().saturating_sub(limit);
        conversations[start..].to_vec()
    }

    pub fn relationship(&self, target_id: &str) -> Option<&Value> {
        self.long_term_memory.relationships.get(target_id)
    }
}
