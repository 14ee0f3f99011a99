//! Configuration for the [`ChatOrchestrator`](super::orchestrator::ChatOrchestrator).
//!
//! ```ignore
//! let config = OrchestratorConfig::new(Some("You are a log analyst.".into()))
//!     .with_max_tool_rounds(4)
//!     .with_retry(RetryPolicy::new(5, 2.0));
//! ```

use crate::api::retry::RetryPolicy;

/// Default cap on completion rounds that may request tools in one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;

/// Keyword that ends a session (compared case-insensitively).
pub const EXIT_KEYWORD: &str = "exit";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Appended as the first history entry when set.
    pub system_prompt: Option<String>,
    /// Maximum rounds of tool calls dispatched in one turn. A response that
    /// requests tools after the last round ends the turn with `ToolRoundLimit`.
    pub max_tool_rounds: u32,
    /// Policy wrapped around every completion call.
    pub retry: RetryPolicy,
    /// Expose registered tools to the model. Disabled for plain chat agents.
    pub tools_enabled: bool,
    /// Discard earlier turns before each new one, keeping only the system
    /// prompt. Used for single-shot agents such as a translator.
    pub independent_turns: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

impl OrchestratorConfig {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            system_prompt,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            retry: RetryPolicy::default(),
            tools_enabled: true,
            independent_turns: false,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_tools_enabled(mut self, enabled: bool) -> Self {
        self.tools_enabled = enabled;
        self
    }

    pub fn with_independent_turns(mut self, independent: bool) -> Self {
        self.independent_turns = independent;
        self
    }
}
