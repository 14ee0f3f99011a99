//! Completion service seam and the retry policy wrapped around it.
//!
//! - [`completion`]: the [`CompletionService`] trait the orchestrator talks
//!   to, and the [`CompletionError`] classification it relies on. The HTTP
//!   implementation is [`OpenAiClient`](crate::OpenAiClient).
//! - [`retry`]: bounded exponential backoff over a tri-state [`Attempt`].
//!   Generic over the operation, so it is usable outside the chat loop.

pub mod completion;
pub mod retry;

pub use completion::{CompletionError, CompletionFuture, CompletionService};
pub use retry::{Attempt, RetryOutcome, RetryPolicy, Sleeper, TokioSleeper};
