//! Agent runtime: the turn loop and its supporting pieces.
//!
//! - [`orchestrator::ChatOrchestrator`]: the tool-calling turn loop. Start here.
//! - [`config::OrchestratorConfig`]: system prompt, tool-round cap, retry policy.
//! - [`history::ConversationHistory`]: the append-only message record.
//! - [`events`]: [`EventHandler`] and [`ChatEvent`] for observing turns.

pub mod config;
pub mod events;
pub mod history;
pub mod orchestrator;

pub use config::{DEFAULT_MAX_TOOL_ROUNDS, OrchestratorConfig};
pub use events::{ChatEvent, EventHandler, FnEventHandler, LoggingHandler, NoopHandler};
pub use history::{ConversationHistory, HistoryError};
pub use orchestrator::{ChatOrchestrator, TurnError, TurnOutcome};
