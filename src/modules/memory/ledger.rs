use crate::modules::memory::{
    ExperienceKind, Importance, LedgerOp, LedgerStore, MemoryRecord, NpcMemory, StorageError,
};
use serde_json::{Map, Value};
use std::path::Path;

/// Durable memory of one NPC id inside a shared ledger file.
///
/// Writes are best-effort: a failed write is logged, reported to the caller, and leaves
/// the stored entry untouched.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    npc_id: String,
    store: LedgerStore,
}

impl MemoryLedger {
    pub fn open(path: impl AsRef<Path>, npc_id: impl Into<String>) -> Result<Self, StorageError> {
        Ok(Self::with_store(LedgerStore::for_path(path)?, npc_id))
    }

    pub fn with_store(store: LedgerStore, npc_id: impl Into<String>) -> Self {
        Self {
            npc_id: npc_id.into(),
            store,
        }
    }

    pub fn npc_id(&self) -> &str {
        &self.npc_id
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub async fn add_conversation(&self, record: MemoryRecord) -> Result<(), StorageError> {
        self.write(LedgerOp::AddConversation(record), "add_conversation").await
    }

    pub async fn add_event(&self, record: MemoryRecord, importance: Importance) -> Result<(), StorageError> {
        self.write(LedgerOp::AddEvent { record, importance }, "add_event").await
    }

    pub async fn update_relationship(&self, target_id: &str, data: Value) -> Result<(), StorageError> {
        let op = LedgerOp::UpdateRelationship {
            target_id: target_id.to_string(),
            data,
        };
        self.write(op, "update_relationship").await
    }

    pub async fn add_experience(&self, record: MemoryRecord, kind: ExperienceKind) -> Result<(), StorageError> {
        self.write(LedgerOp::AddExperience { record, kind }, "add_experience").await
    }

    pub async fn update_current_context(&self, patch: Map<String, Value>) -> Result<(), StorageError> {
        self.write(LedgerOp::UpdateCurrentContext(patch), "update_current_context").await
    }

    /// Last `limit` conversations, oldest first.
    pub async fn get_recent_conversations(&self, limit: usize) -> Result<Vec<MemoryRecord>, StorageError> {
        Ok(self.store.read(&self.npc_id).await?.recent_conversations(limit))
    }

    pub async fn get_current_context(&self) -> Result<Map<String, Value>, StorageError> {
        Ok(self.store.read(&self.npc_id).await?.short_term_memory.current_context)
    }

    /// `Ok(None)` for a target that was never recorded.
    pub async fn get_relationship(&self, target_id: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.store.read(&self.npc_id).await?.relationship(target_id).cloned())
    }

    pub async fn get_all_memories(&self) -> Result<NpcMemory, StorageError> {
        self.store.read(&self.npc_id).await
    }

    async fn write(&self, op: LedgerOp, operation: &'static str) -> Result<(), StorageError> {
        match self.store.mutate(&self.npc_id, op).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(npc_id = %self.npc_id, operation, error = %e, "Memory write not persisted");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryLedger;
    use crate::modules::memory::{ExperienceKind, Importance, MemoryRecord};
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_unknown_relationship_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MemoryLedger::open(dir.path().join("memories.json"), "merchant").unwrap();

        assert_eq!(ledger.get_relationship("nobody").await.unwrap(), None);

        ledger
            .update_relationship("guard_1", json!({"trust": 0.4}))
            .await
            .unwrap();
        assert_eq!(
            ledger.get_relationship("guard_1").await.unwrap(),
            Some(json!({"trust": 0.4}))
        );
    }

    #[tokio::test]
    async fn test_entries_are_partitioned_by_npc_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");
        let merchant = MemoryLedger::open(&path, "merchant").unwrap();
        let guard = MemoryLedger::open(&path, "guard").unwrap();

        merchant
            .add_conversation(MemoryRecord::conversation("player", "hello", "input"))
            .await
            .unwrap();
        guard
            .add_event(MemoryRecord::event("shift change"), Importance::High)
            .await
            .unwrap();

        assert_eq!(merchant.get_recent_conversations(5).await.unwrap().len(), 1);
        assert!(guard.get_recent_conversations(5).await.unwrap().is_empty());

        let guard_memory = guard.get_all_memories().await.unwrap();
        assert_eq!(guard_memory.long_term_memory.important_events.len(), 1);
        assert_eq!(merchant.get_all_memories().await.unwrap().memory_metadata.total_events, 0);
    }

    #[tokio::test]
    async fn test_context_and_experience_round_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memories.json");
        let ledger = MemoryLedger::open(&path, "merchant").unwrap();

        let mut patch = Map::new();
        patch.insert("current_topic".to_string(), json!("trade"));
        ledger.update_current_context(patch).await.unwrap();
        ledger
            .add_experience(MemoryRecord::experience("good haggle"), ExperienceKind::Positive)
            .await
            .unwrap();

        assert_eq!(ledger.get_current_context().await.unwrap()["current_topic"], json!("trade"));

        let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let positive = &on_disk["merchant"]["long_term_memory"]["personal_experiences"]["positive_experiences"];
        assert_eq!(positive.as_array().unwrap().len(), 1);
    }
}
