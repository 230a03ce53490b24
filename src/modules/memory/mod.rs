pub mod error;
pub mod ledger;
pub mod record;
pub mod store;

pub use error::StorageError;
pub use ledger::MemoryLedger;
pub use record::{
    ExperienceKind, Importance, LongTermMemory, MemoryKind, MemoryMetadata, MemoryRecord, NpcMemory,
    PersonalExperiences, ShortTermMemory,
};
pub use store::{LedgerOp, LedgerStore};
