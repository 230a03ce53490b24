#![allow(dead_code)]

pub mod dialogue_mock;
pub mod npc_files;

pub use dialogue_mock::{EchoHandler, SlowHandler, TestClient, TestServer};
pub use npc_files::{NpcFiles, IDENTITY_JSON, SCENE_JSON};
