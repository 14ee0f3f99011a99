//! Tool abstraction for LLM function-calling agents.
//!
//! The [`Tool`] trait defines the interface every tool implements: a static
//! API definition (name, description, JSON schema) and an async `execute`
//! method. Tools are collected into a [`ToolSet`], the registry the
//! orchestrator dispatches through by name.

use crate::ToolDef;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = BoxFuture<'a, Result<String, ToolError>>;

// ── ToolError ──────────────────────────────────────────────────────

/// Failure of a single tool invocation.
///
/// The orchestrator renders these into the Tool message (see
/// [`ToolError::render`]) so the model can react; they never abort a turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("tool '{tool}' timed out after {secs} seconds")]
    TimedOut { tool: String, secs: u64 },
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }

    /// Text placed in the Tool message in place of a result.
    pub fn render(&self) -> String {
        match self {
            ToolError::InvalidArguments { .. } => format!(
                "Error: {self}. Please provide valid JSON matching the tool's parameter schema."
            ),
            _ => format!("Error: {self}"),
        }
    }
}

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that an LLM agent can invoke via function-calling.
///
/// Implementors provide a static [`definition`](Tool::definition) and an
/// async [`execute`](Tool::execute) that receives the raw JSON arguments.
/// Tools only return data; they never touch the conversation.
///
/// Uses a boxed future so that the trait is dyn-compatible.
pub trait Tool: Send + Sync {
    /// The tool definition sent to the LLM API.
    fn definition(&self) -> ToolDef;

    /// Execute the tool with the given raw JSON arguments string.
    fn execute(&self, arguments: &str) -> ToolFuture<'_>;

    /// The tool's name (delegates to definition).
    fn name(&self) -> String {
        self.definition().function.name
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// Explicit registry of tools, dispatched by name.
///
/// Built once at startup with [`with`](ToolSet::with); there is no runtime
/// discovery.
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_arg_validation(true)
///     .with(GetLogsSummary::new(store.clone()))
///     .with(KustoLogs::new(source, collector));
///
/// let defs = tools.definitions();
/// let text = tools.invoke("get_logs_summary", "{}").await?;
/// ```
pub struct ToolSet {
    tools: HashMap<String, Box<dyn Tool>>,
    /// `None` passes results through whole.
    max_result_bytes: Option<usize>,
    /// Whether to validate tool arguments against JSON Schema before execution.
    validate_args: bool,
    /// `None` disables timeouts.
    default_timeout: Option<Duration>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("max_result_bytes", &self.max_result_bytes)
            .field("validate_args", &self.validate_args)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            max_result_bytes: None,
            validate_args: false,
            default_timeout: None,
        }
    }

    /// Truncate results longer than `max` bytes. `None` (the default)
    /// returns them unchanged.
    pub fn with_max_result_bytes(mut self, max: Option<usize>) -> Self {
        self.max_result_bytes = max;
        self
    }

    /// Enable JSON Schema argument validation before tool execution.
    pub fn with_arg_validation(mut self, enabled: bool) -> Self {
        self.validate_args = enabled;
        self
    }

    /// Set a timeout applied to every tool call. `None` disables it.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name();
        if self.tools.insert(name.clone(), Box::new(tool)).is_some() {
            debug!("Tool {name} re-registered; previous handler replaced");
        }
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// All tool definitions for the LLM API, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDef> {
        let mut defs: Vec<ToolDef> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name with optional validation, timeout, and truncation.
    pub async fn invoke(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        if self.validate_args {
            validate_tool_arguments(tool.as_ref(), arguments)?;
        }

        log_tool_call(name, arguments);
        let start = Instant::now();

        let result = match self.default_timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.execute(arguments)).await {
                Ok(r) => r,
                Err(_) => {
                    info!(
                        "Tool {name} timed out after {:.1}s (limit: {:.0}s)",
                        start.elapsed().as_secs_f64(),
                        limit.as_secs_f64(),
                    );
                    Err(ToolError::TimedOut {
                        tool: name.to_string(),
                        secs: limit.as_secs(),
                    })
                }
            },
            None => tool.execute(arguments).await,
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(text) => {
                debug!("Tool {name} completed in {elapsed_ms:.0}ms ({} bytes)", text.len());
                trace!(
                    "Tool {name} result preview: {}",
                    text.chars().take(300).collect::<String>()
                );
            }
            Err(e) => debug!("Tool {name} failed in {elapsed_ms:.0}ms: {e}"),
        }

        match self.max_result_bytes {
            Some(max) => result.map(|text| truncate_result(text, max)),
            None => result,
        }
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── FnTool ────────────────────────────────────────────────────────

type ErasedToolHandler = Box<dyn Fn(String) -> ToolFuture<'static> + Send + Sync>;

/// A closure-based tool that auto-parses arguments and delegates to a handler.
///
/// Use for stateless tools; tools that hold shared state (stores, clients,
/// configuration) are clearer as a struct implementing [`Tool`].
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct EchoArgs { text: String }
///
/// let tool = FnTool::new(
///     ToolDef::new("echo", "Echo the input", json_schema_for::<EchoArgs>()),
///     |args: EchoArgs| async move { Ok(args.text) },
/// );
/// ```
pub struct FnTool {
    def: ToolDef,
    handler: ErasedToolHandler,
}

impl FnTool {
    /// Create a closure-based tool. Arguments that fail to deserialize into
    /// `A` produce [`ToolError::InvalidArguments`] without calling `handler`.
    pub fn new<A, F, Fut>(def: ToolDef, handler: F) -> Self
    where
        A: serde::de::DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let tool_name = def.function.name.clone();
        let erased = move |raw: String| -> ToolFuture<'static> {
            match parse_tool_args::<A>(&tool_name, &raw) {
                Ok(args) => Box::pin(handler(args)),
                Err(e) => Box::pin(async move { Err(e) }),
            }
        };
        Self {
            def,
            handler: Box::new(erased),
        }
    }
}

impl Tool for FnTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        (self.handler)(arguments.to_string())
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.def.function.name)
            .finish()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate tool arguments against the tool's declared JSON Schema.
///
/// Blank arguments are validated as `{}`. A schema that fails to compile
/// skips validation.
pub fn validate_tool_arguments(tool: &dyn Tool, arguments: &str) -> Result<(), ToolError> {
    let def = tool.definition();
    let name = def.function.name;
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    let args_value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
            tool: name.clone(),
            reason: format!("invalid JSON: {e}"),
        })?;

    let Ok(validator) = jsonschema::validator_for(&def.function.parameters) else {
        return Ok(());
    };

    let errors: Vec<String> = validator
        .iter_errors(&args_value)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments {
            tool: name,
            reason: errors.join("; "),
        })
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, arguments: &str) {
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Truncate a string to at most `max` bytes (backing off to a char
/// boundary), appending a notice if trimmed.
pub fn truncate_result(s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...\n[truncated: {} bytes total]", s.get(..cut).unwrap_or(""), s.len())
}

/// Parse raw JSON arguments into a typed struct.
///
/// Empty argument strings are read as `{}`; some models send nothing for
/// tools without parameters.
pub fn parse_tool_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: &str,
) -> Result<T, ToolError> {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}
