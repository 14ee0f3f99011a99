//! Events emitted by the [`ChatOrchestrator`](super::orchestrator::ChatOrchestrator).
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget sessions |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures, e.g. counting tool calls in tests |

use tracing::{debug, info, warn};

/// Lifecycle events for one user turn.
#[derive(Debug)]
pub enum ChatEvent<'a> {
    /// A user message was accepted and appended.
    TurnStarted { input: &'a str },
    /// A completion round is starting (1-based).
    RoundStart { round: u32, max_rounds: u32 },
    /// The model returned text (may be alongside tool calls).
    Text(&'a str),
    /// The model requested tool calls this round.
    ToolCallsReceived { round: u32, count: usize },
    ToolExecuting { name: &'a str, arguments: &'a str },
    ToolResult {
        name: &'a str,
        call_id: &'a str,
        result: &'a str,
        is_error: bool,
    },
    TokenUsage {
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// Every completion attempt was throttled; the turn yields no reply.
    RetriesExhausted { attempts: u32 },
    /// The turn produced a final reply.
    Finished,
    /// The model kept requesting tools past the round cap.
    RoundLimitReached { max_rounds: u32 },
}

/// Observer for [`ChatEvent`]s. The default implementation ignores them.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &ChatEvent<'_>) {
        let _ = event;
    }
}

pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&ChatEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&ChatEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&ChatEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &ChatEvent<'_>) {
        (self.0)(event)
    }
}

/// Logs every event through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &ChatEvent<'_>) {
        match event {
            ChatEvent::TurnStarted { input } => {
                info!("User turn: {} chars", input.chars().count());
            }
            ChatEvent::RoundStart { round, max_rounds } => {
                debug!("[round {round}/{max_rounds}]");
            }
            ChatEvent::Text(text) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "LLM text: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            ChatEvent::ToolCallsReceived { round, count } => {
                debug!("{count} tool call(s) in round {round}");
            }
            ChatEvent::ToolExecuting { name, .. } => {
                debug!("Executing tool: {name}");
            }
            ChatEvent::ToolResult {
                name,
                call_id,
                result,
                is_error,
            } => {
                if *is_error {
                    warn!("Tool {name} ({call_id}) failed: {result}");
                } else {
                    debug!("Tool {name} ({call_id}) result: {} bytes", result.len());
                }
            }
            ChatEvent::TokenUsage {
                prompt_tokens,
                completion_tokens,
            } => {
                debug!("Tokens: prompt={prompt_tokens}, completion={completion_tokens}");
            }
            ChatEvent::RetriesExhausted { attempts } => {
                warn!("Completion throttled on all {attempts} attempt(s); no reply this turn");
            }
            ChatEvent::Finished => {
                info!("Turn finished (no more tool calls)");
            }
            ChatEvent::RoundLimitReached { max_rounds } => {
                warn!("Tool round limit reached ({max_rounds})");
            }
        }
    }
}
