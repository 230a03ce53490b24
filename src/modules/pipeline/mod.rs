pub mod intent;
pub mod npc;
pub mod strategy;

pub use intent::IntentEvaluator;
pub use npc::{DialogueTurn, IntentReport, NpcAgent};
pub use strategy::{StrategySelector, TurnDecision};
