//! The completion service contract.

use crate::{ChatCompletion, Message, ToolDef};
use futures::future::BoxFuture;
use std::time::Duration;

/// Boxed future returned by [`CompletionService::complete`].
pub type CompletionFuture<'a> = BoxFuture<'a, Result<ChatCompletion, CompletionError>>;

/// Failure of a single completion call.
///
/// Only [`RateLimited`](CompletionError::RateLimited) is transient; the
/// orchestrator retries it and treats every other variant as fatal for the
/// turn.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("rate limited by completion service")]
    RateLimited {
        /// Server-suggested wait, when the response carried `Retry-After`.
        retry_after: Option<Duration>,
    },
    #[error("completion service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to parse completion response: {0}")]
    Parse(String),
    #[error("completion service error: {0}")]
    Api(String),
}

impl CompletionError {
    /// Whether the failure is transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::RateLimited { .. })
    }
}

/// Produces the next assistant message given the history and the tools the
/// model may call.
///
/// Uses a boxed future so the trait stays dyn-compatible and can be held as
/// `&dyn CompletionService`.
pub trait CompletionService: Send + Sync {
    fn complete<'a>(&'a self, messages: &'a [Message], tools: &'a [ToolDef])
    -> CompletionFuture<'a>;
}
