pub mod inference;
pub mod memory;
pub mod pipeline;
pub mod snapshot;
pub mod state;
