pub mod store;
pub mod types;

pub use store::{DebugTrace, NpcState, NpcStatus, StateError, SCRATCH_LOG_WINDOW};
pub use types::{ChannelProfile, ChannelType, EmotionalState};
