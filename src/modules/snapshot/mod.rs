pub mod assembler;

pub use assembler::{assemble, merge, InferenceInput, NpcSnapshot, SceneSnapshot};
