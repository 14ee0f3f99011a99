//! Convenience re-exports for common `logsage` types.
//!
//! ```ignore
//! use logsage::prelude::*;
//! ```
//!
//! Pulls in the client, message types, orchestrator and config, the tool
//! registry, and the collector pieces. Event types beyond the handlers and
//! the cache error types stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    ChatCompletion, Message, MessageRole, OpenAiClient, ToolCall, ToolDef, json_schema_for,
};

// ── Completion and retry ────────────────────────────────────────────
pub use crate::api::{
    Attempt, CompletionError, CompletionService, RetryOutcome, RetryPolicy, Sleeper, TokioSleeper,
};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    ChatEvent, ChatOrchestrator, ConversationHistory, EventHandler, LoggingHandler, NoopHandler,
    OrchestratorConfig, TurnError, TurnOutcome,
};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{FnTool, Tool, ToolError, ToolFuture, ToolSet, ToolSpec, parse_tool_args};

// ── Collection ──────────────────────────────────────────────────────
pub use crate::collect::{
    CollectError, ExternalCollector, FileCache, LogSource, MemoryCache, PayloadCache, SourceError,
};
