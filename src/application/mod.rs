//! Application layer - per-turn orchestration over the ports.

mod chat;
mod classifier;
mod coordinator;
pub mod workflow;

pub use chat::{ChatReply, ChatResponder, FALLBACK_REPLY};
pub use classifier::{Classification, IntentClassifier, SUMMARY_WORD_LIMIT};
pub use coordinator::{TurnCoordinator, DEFAULT_SESSION_TTL};
