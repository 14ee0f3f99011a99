//! Tool-calling chat agent core.
//!
//! `logsage` drives a multi-turn conversation with an LLM that can call
//! locally registered tools. The pieces:
//!
//! - [`ChatOrchestrator`](agent::orchestrator::ChatOrchestrator): the turn
//!   loop. Appends user input to the [`ConversationHistory`](agent::history::ConversationHistory),
//!   calls the [`CompletionService`](api::completion::CompletionService)
//!   through a [`RetryPolicy`](api::retry::RetryPolicy), dispatches any
//!   requested tool calls through the [`ToolSet`](tools::core::ToolSet), and
//!   repeats until the model answers in plain text.
//! - [`RetryPolicy`](api::retry::RetryPolicy): bounded exponential backoff
//!   over a tri-state [`Attempt`](api::retry::Attempt).
//! - [`collect`]: an [`ExternalCollector`](collect::process::ExternalCollector)
//!   that runs a command and captures its output, gated by a
//!   [`LogSource`](collect::source::LogSource) that consults a
//!   presence-only cache first.
//!
//! # Example
//!
//! ```ignore
//! use logsage::prelude::*;
//!
//! let client = OpenAiClient::new(api_key)?.with_model("gpt-4o-mini");
//! let tools = ToolSet::new().with(MyTool);
//! let config = OrchestratorConfig::new(Some("You are a log analyst.".into()));
//!
//! let mut chat = ChatOrchestrator::new(&client, &tools, config);
//! match chat.turn("How many errors today?").await? {
//!     TurnOutcome::Reply(text) => println!("{text}"),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod agent;
pub mod api;
pub mod collect;
pub mod prelude;
pub mod tools;

use api::completion::{CompletionError, CompletionFuture, CompletionService};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// API version used for Azure OpenAI deployments unless overridden.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type implementing
/// `schemars::JsonSchema`, for use as tool parameters.
///
/// ```
/// use logsage::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct LevelArgs {
///     level: String,
/// }
///
/// let schema = json_schema_for::<LevelArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"level".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body (OpenAI-compatible).
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
    /// `"auto"` lets the model decide whether to call tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A message in the conversation.
///
/// Assistant messages carry the tool calls they requested; Tool messages
/// carry the id of the call they answer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// An assistant message requesting tool calls, optionally with
    /// accompanying text.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    /// The text content, or `""` when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Tool calls requested by this message (empty for non-assistant messages).
    pub fn requested_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

// ── Tool types ─────────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition sent to the API (OpenAI function-calling format).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A tool call requested by the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FunctionCallData {
    pub name: String,
    /// JSON-encoded arguments as emitted by the model.
    pub arguments: String,
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// One assistant response from the completion service.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// A text-only completion.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A completion requesting the given tool calls.
    pub fn with_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the assistant message to record in history.
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant_text(self.content.unwrap_or_default())
        } else {
            Message::assistant_tool_calls(self.content, self.tool_calls)
        }
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// How the client authenticates against the endpoint.
#[derive(Clone)]
enum Auth {
    /// `Authorization: Bearer <key>` (OpenAI and compatible gateways).
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI).
    ApiKey(String),
}

/// Async HTTP client for OpenAI-compatible chat completions endpoints,
/// including Azure OpenAI deployments.
pub struct OpenAiClient {
    client: reqwest::Client,
    url: String,
    auth: Auth,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl OpenAiClient {
    /// Client for the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        Self::with_url(OPENAI_URL, api_key)
    }

    /// Client for any OpenAI-compatible endpoint that takes a bearer token.
    pub fn with_url(
        url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: build_http_client()?,
            url: url.into(),
            auth: Auth::Bearer(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 0,
            temperature: None,
        })
    }

    /// Client for an Azure OpenAI deployment.
    ///
    /// `endpoint` is the resource URL (`https://<name>.openai.azure.com/`).
    pub fn azure(
        endpoint: &str,
        deployment: &str,
        api_key: impl Into<String>,
        api_version: Option<&str>,
    ) -> Result<Self, CompletionError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version.unwrap_or(DEFAULT_AZURE_API_VERSION),
        );
        Ok(Self {
            client: build_http_client()?,
            url,
            auth: Auth::ApiKey(api_key.into()),
            model: deployment.to_string(),
            max_tokens: 0,
            temperature: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The endpoint URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, CompletionError> {
        let tool_count = body.tools.as_ref().map_or(0, |t| t.len());
        debug!(
            "LLM request: model={}, messages={}, tools={}",
            body.model.as_deref().unwrap_or("(deployment)"),
            body.messages.len(),
            tool_count,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let request = self.client.post(&self.url).json(body);
        let request = match &self.auth {
            Auth::Bearer(key) => request.header("Authorization", format!("Bearer {key}")),
            Auth::ApiKey(key) => request.header("api-key", key),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = resp
            .text()
            .await
            .map_err(|e| CompletionError::Request(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

impl CompletionService for OpenAiClient {
    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolDef],
    ) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: Some(self.model.clone()),
                messages: messages.to_vec(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
                tools: (!tools.is_empty()).then(|| tools.to_vec()),
            };
            self.chat(&body).await
        })
    }
}

fn build_http_client() -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .user_agent(concat!("logsage/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| CompletionError::Request(format!("failed to build HTTP client: {e}")))
}

/// Parse a successful response body into a [`ChatCompletion`].
fn parse_completion(text: &str) -> Result<ChatCompletion, CompletionError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| CompletionError::Parse(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(CompletionError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let completion = match parsed.choices.and_then(|c| c.into_iter().next()) {
        Some(c) => ChatCompletion {
            content: c.message.content,
            tool_calls: c.message.tool_calls.unwrap_or_default(),
            usage: parsed.usage,
            finish_reason: c.finish_reason,
        },
        None => ChatCompletion {
            usage: parsed.usage,
            ..Default::default()
        },
    };
    debug!(
        "LLM output: {} chars text, {} tool call(s)",
        completion.content.as_ref().map_or(0, |s| s.len()),
        completion.tool_calls.len()
    );
    Ok(completion)
}
