use crate::modules::memory::{ExperienceKind, Importance, MemoryRecord, NpcMemory, StorageError};
use chrono::Utc;
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 64;

lazy_static! {
    static ref LEDGER_STORES: Mutex<HashMap<PathBuf, LedgerStore>> = Mutex::new(HashMap::new());
}

/// A single logical mutation of one NPC's ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    AddConversation(MemoryRecord),
    AddEvent { record: MemoryRecord, importance: Importance },
    UpdateRelationship { target_id: String, data: Value },
    AddExperience { record: MemoryRecord, kind: ExperienceKind },
    UpdateCurrentContext(Map<String, Value>),
}

impl LedgerOp {
    pub fn apply(self, memory: &mut NpcMemory) {
        match self {
            LedgerOp::AddConversation(record) => memory.add_conversation(record),
            LedgerOp::AddEvent { record, importance } => memory.add_event(record, importance),
            LedgerOp::UpdateRelationship { target_id, data } => memory.update_relationship(target_id, data),
            LedgerOp::AddExperience { record, kind } => memory.add_experience(record, kind),
            LedgerOp::UpdateCurrentContext(patch) => memory.update_current_context(patch),
        }
    }
}

enum Command {
    Mutate {
        npc_id: String,
        op: LedgerOp,
        reply: oneshot::Sender<Result<NpcMemory, StorageError>>,
    },
    Read {
        npc_id: String,
        reply: oneshot::Sender<Result<NpcMemory, StorageError>>,
    },
}

/// Handle to the one writer task that owns a ledger file.
///
/// Every mutation is a read-whole-file, mutate, write-whole-file cycle run inside the
/// writer task, so cycles against the same file never interleave.
#[derive(Clone, Debug)]
pub struct LedgerStore {
    path: Arc<PathBuf>,
    tx: mpsc::Sender<Command>,
}

impl LedgerStore {
    /// Returns the writer for `path`, starting one if none is running in this process.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let key = absolute(path.as_ref());
        let mut stores = LEDGER_STORES.lock().map_err(|_| StorageError::WriterUnavailable)?;

        if let Some(store) = stores.get(&key) {
            if !store.tx.is_closed() {
                return Ok(store.clone());
            }
        }

        let store = Self::spawn(key.clone())?;
        stores.insert(key, store.clone());
        Ok(store)
    }

    fn spawn(path: PathBuf) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StorageError::NoRuntime)?;
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

        let writer = LedgerWriter {
            path: path.clone(),
            cache: HashMap::new(),
            rx,
        };
        runtime.spawn(writer.run());

        tracing::debug!(path = %path.display(), "Ledger writer started");

        Ok(Self {
            path: Arc::new(path),
            tx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn mutate(&self, npc_id: &str, op: LedgerOp) -> Result<NpcMemory, StorageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Mutate {
                npc_id: npc_id.to_string(),
                op,
                reply,
            })
            .await
            .map_err(|_| StorageError::WriterUnavailable)?;

        rx.await.map_err(|_| StorageError::WriterUnavailable)?
    }

    pub async fn read(&self, npc_id: &str) -> Result<NpcMemory, StorageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Read {
                npc_id: npc_id.to_string(),
                reply,
            })
            .await
            .map_err(|_| StorageError::WriterUnavailable)?;

        rx.await.map_err(|_| StorageError::WriterUnavailable)?
    }
}

struct LedgerWriter {
    path: PathBuf,
    cache: HashMap<String, NpcMemory>,
    rx: mpsc::Receiver<Command>,
}

impl LedgerWriter {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Mutate { npc_id, op, reply } => {
                    let result = self.apply(&npc_id, op).await;
                    if let Err(e) = &result {
                        tracing::warn!(npc_id = %npc_id, path = %self.path.display(), error = %e, "Ledger write failed");
                    }
                    let _ = reply.send(result);
                }
                Command::Read { npc_id, reply } => {
                    let _ = reply.send(self.read(&npc_id).await);
                }
            }
        }

        tracing::debug!(path = %self.path.display(), "Ledger writer stopped");
    }

    async fn apply(&mut self, npc_id: &str, op: LedgerOp) -> Result<NpcMemory, StorageError> {
        let mut document = self.load_document().await?;

        let mut memory = match document.remove(npc_id) {
            Some(entry) => serde_json::from_value(entry)?,
            None => NpcMemory::default(),
        };

        op.apply(&mut memory);
        memory.memory_metadata.last_updated = Some(Utc::now());

        document.insert(npc_id.to_string(), serde_json::to_value(&memory)?);
        self.persist(&document).await?;

        self.cache.insert(npc_id.to_string(), memory.clone());
        Ok(memory)
    }

    async fn read(&mut self, npc_id: &str) -> Result<NpcMemory, StorageError> {
        if let Some(memory) = self.cache.get(npc_id) {
            return Ok(memory.clone());
        }

        let mut document = self.load_document().await?;
        let memory = match document.remove(npc_id) {
            Some(entry) => serde_json::from_value(entry)?,
            None => NpcMemory::default(),
        };

        self.cache.insert(npc_id.to_string(), memory.clone());
        Ok(memory)
    }

    async fn load_document(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&raw)? {
            Value::Object(document) => Ok(document),
            _ => Err(StorageError::InvalidDocument),
        }
    }

    /// Writes a sibling temp file and renames it over the ledger.
    async fn persist(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(document)?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        tokio::fs::write(&temp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    std::env::current_dir()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
