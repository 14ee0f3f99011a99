//! The turn loop.
//!
//! One call to [`ChatOrchestrator::turn`] takes a user message through:
//!
//! 1. append the User message;
//! 2. call the completion service through the [`RetryPolicy`](crate::api::retry::RetryPolicy)
//!    (rate limits retried, everything else fatal);
//! 3. if the response requests tools, append it, run each call in order and
//!    append one Tool message per call, then go back to 2;
//! 4. otherwise append the assistant text and return it.
//!
//! The loop is capped at `max_tool_rounds` tool rounds. Tool handlers never
//! see the history; only the orchestrator appends to it. With
//! `independent_turns` set, each turn starts over from the system prompt.

use crate::agent::config::{EXIT_KEYWORD, OrchestratorConfig};
use crate::agent::events::{ChatEvent, EventHandler, NoopHandler};
use crate::agent::history::{ConversationHistory, HistoryError};
use crate::api::completion::{CompletionError, CompletionService};
use crate::api::retry::{Attempt, RetryOutcome, Sleeper, TokioSleeper};
use crate::tools::core::ToolSet;
use crate::{ChatCompletion, Message};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered; the text is already in the history.
    Reply(String),
    /// Every completion attempt was throttled. Nothing beyond the User
    /// message was appended and the session may continue.
    NoResult,
    /// The model was still requesting tools after `max_tool_rounds` rounds.
    ToolRoundLimit,
    /// Empty input or the exit keyword. Nothing was appended.
    Ended,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("conversation history rejected a message: {0}")]
    History(#[from] HistoryError),
}

/// Drives a multi-turn, tool-calling conversation.
pub struct ChatOrchestrator<'a> {
    client: &'a dyn CompletionService,
    tools: &'a ToolSet,
    config: OrchestratorConfig,
    history: ConversationHistory,
    event_handler: &'a dyn EventHandler,
    sleeper: &'a dyn Sleeper,
}

impl<'a> ChatOrchestrator<'a> {
    /// Start a session. The system prompt, if any, becomes the first message.
    pub fn new(
        client: &'a dyn CompletionService,
        tools: &'a ToolSet,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            tools,
            history: seeded_history(&config),
            config,
            event_handler: &NoopHandler,
            sleeper: &TokioSleeper,
        }
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one user turn.
    pub async fn turn(&mut self, input: &str) -> Result<TurnOutcome, TurnError> {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case(EXIT_KEYWORD) {
            return Ok(TurnOutcome::Ended);
        }

        if self.config.independent_turns {
            self.history = seeded_history(&self.config);
        }
        self.history.append_user(input);
        self.event_handler.on_event(&ChatEvent::TurnStarted { input });

        let tool_defs = if self.config.tools_enabled {
            self.tools.definitions()
        } else {
            Vec::new()
        };
        let max_tool_rounds = self.config.max_tool_rounds;
        let mut tool_rounds = 0;

        loop {
            self.event_handler.on_event(&ChatEvent::RoundStart {
                round: tool_rounds + 1,
                max_rounds: max_tool_rounds + 1,
            });

            let completion = match self.complete_with_retry(&tool_defs).await {
                RetryOutcome::Success(c) => c,
                RetryOutcome::Fatal(e) => {
                    error!("Completion failed: {e}");
                    return Err(e.into());
                }
                RetryOutcome::Exhausted { attempts, .. } => {
                    self.event_handler
                        .on_event(&ChatEvent::RetriesExhausted { attempts });
                    return Ok(TurnOutcome::NoResult);
                }
            };

            if let Some(usage) = &completion.usage {
                self.event_handler.on_event(&ChatEvent::TokenUsage {
                    prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                    completion_tokens: usage.completion_tokens.unwrap_or(0),
                });
            }
            if let Some(text) = completion.content.as_deref().filter(|t| !t.is_empty()) {
                self.event_handler.on_event(&ChatEvent::Text(text));
            }

            if !completion.has_tool_calls() {
                let text = completion.content.unwrap_or_default();
                self.history
                    .append_assistant(Message::assistant_text(text.clone()))?;
                self.event_handler.on_event(&ChatEvent::Finished);
                return Ok(TurnOutcome::Reply(text));
            }

            // Past the cap the request is dropped rather than recorded, so no
            // tool call is left without a result.
            if tool_rounds >= max_tool_rounds {
                self.event_handler.on_event(&ChatEvent::RoundLimitReached {
                    max_rounds: max_tool_rounds,
                });
                return Ok(TurnOutcome::ToolRoundLimit);
            }
            tool_rounds += 1;

            self.dispatch_tool_calls(tool_rounds, completion).await?;
        }
    }

    /// Record the assistant's tool request, then run each call in order and
    /// append its result.
    async fn dispatch_tool_calls(
        &mut self,
        round: u32,
        completion: ChatCompletion,
    ) -> Result<(), HistoryError> {
        let calls = completion.tool_calls.clone();
        self.event_handler.on_event(&ChatEvent::ToolCallsReceived {
            round,
            count: calls.len(),
        });
        self.history.append_assistant(completion.into_message())?;

        for call in &calls {
            let name = call.function.name.as_str();
            let arguments = call.function.arguments.as_str();
            self.event_handler
                .on_event(&ChatEvent::ToolExecuting { name, arguments });

            let (text, is_error) = match self.tools.invoke(name, arguments).await {
                Ok(text) => (text, false),
                Err(e) => (e.render(), true),
            };

            self.event_handler.on_event(&ChatEvent::ToolResult {
                name,
                call_id: &call.id,
                result: &text,
                is_error,
            });
            self.history.append_tool_result(&call.id, text)?;
        }
        Ok(())
    }

    async fn complete_with_retry(
        &self,
        tool_defs: &[crate::ToolDef],
    ) -> RetryOutcome<ChatCompletion, CompletionError> {
        let client = self.client;
        let messages = self.history.messages();
        self.config
            .retry
            .execute_with(self.sleeper, move || async move {
                match client.complete(messages, tool_defs).await {
                    Ok(c) => Attempt::Success(c),
                    Err(e) if e.is_retryable() => {
                        if let CompletionError::RateLimited {
                            retry_after: Some(wait),
                        } = &e
                        {
                            debug!("Server asked to retry after {}s", wait.as_secs());
                        }
                        Attempt::Retryable(e)
                    }
                    Err(e) => Attempt::Fatal(e),
                }
            })
            .await
    }

    /// Prompt loop: read a line, run a turn, print the outcome. Stops on the
    /// exit keyword, empty input, or end of input. Completion errors are
    /// printed and the session continues.
    pub async fn run_session<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output
            .write_all(b"Enter your message (type 'exit' to quit):\n")
            .await?;

        loop {
            output.write_all(b"User > ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let rendered = match self.turn(&line).await {
                Ok(TurnOutcome::Ended) => break,
                Ok(TurnOutcome::Reply(text)) => format!("Assistant > {text}\n"),
                Ok(TurnOutcome::NoResult) => {
                    "Assistant > (no result: the service is rate limiting requests, try again shortly)\n"
                        .to_string()
                }
                Ok(TurnOutcome::ToolRoundLimit) => {
                    "Assistant > (stopped: too many consecutive tool calls)\n".to_string()
                }
                Err(e) => format!("Error: {e}\n"),
            };
            output.write_all(rendered.as_bytes()).await?;
        }

        info!("Session ended after {} message(s)", self.history.len());
        output.write_all(b"Exiting agent.\n").await?;
        output.flush().await
    }
}

/// A history holding only the system prompt, if any.
fn seeded_history(config: &OrchestratorConfig) -> ConversationHistory {
    let mut history = ConversationHistory::new();
    if let Some(prompt) = &config.system_prompt {
        history.append_system(prompt.clone());
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::completion::CompletionFuture;
    use crate::api::retry::RetryPolicy;
    use crate::api::retry::tests::RecordingSleeper;
    use crate::tools::core::{FnTool, ToolError};
    use crate::{MessageRole, ToolCall, ToolDef};
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Replays canned responses and records the history seen on each call.
    struct ScriptedCompletion {
        responses: Mutex<VecDeque<Result<ChatCompletion, CompletionError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedCompletion {
        fn new(responses: Vec<Result<ChatCompletion, CompletionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn seen(&self, call: usize) -> Vec<Message> {
            self.seen.lock().unwrap()[call].clone()
        }
    }

    impl CompletionService for ScriptedCompletion {
        fn complete<'a>(
            &'a self,
            messages: &'a [Message],
            _tools: &'a [ToolDef],
        ) -> CompletionFuture<'a> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Api("script exhausted".into())));
            Box::pin(async move { next })
        }
    }

    #[derive(Deserialize, JsonSchema)]
    struct LevelArgs {
        level: String,
    }

    fn counting_level_tool(counter: Arc<AtomicU32>) -> FnTool {
        FnTool::new(
            ToolDef::new(
                "get_logs_by_level",
                "Filter logs by level",
                crate::json_schema_for::<LevelArgs>(),
            ),
            move |args: LevelArgs| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ToolError>(format!("Found 2 {} logs", args.level))
                }
            },
        )
    }

    fn level_call(id: &str) -> ChatCompletion {
        ChatCompletion::with_tool_calls(vec![ToolCall::new(
            id,
            "get_logs_by_level",
            r#"{"level":"Error"}"#,
        )])
    }

    fn rate_limited() -> Result<ChatCompletion, CompletionError> {
        Err(CompletionError::RateLimited { retry_after: None })
    }

    #[tokio::test]
    async fn single_tool_call_is_resolved_before_next_completion() {
        let counter = Arc::new(AtomicU32::new(0));
        let tools = ToolSet::new().with(counting_level_tool(counter.clone()));
        let client = ScriptedCompletion::new(vec![
            Ok(level_call("c1")),
            Ok(ChatCompletion::text("There are 2 errors.")),
        ]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        let outcome = chat.turn("How many errors?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("There are 2 errors.".into()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(client.calls(), 2);

        let second = client.seen(1);
        let tool_msgs: Vec<&Message> = second
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .collect();
        assert_eq!(tool_msgs.len(), 1);
        assert_eq!(tool_msgs[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(tool_msgs[0].text(), "Found 2 Error logs");
        assert_eq!(second.last().unwrap().role, MessageRole::Tool);

        let roles: Vec<MessageRole> = chat
            .history()
            .messages()
            .iter()
            .map(|m| m.role.clone())
            .collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant
            ]
        );
    }

    #[tokio::test]
    async fn events_report_tool_activity() {
        use crate::agent::events::FnEventHandler;

        let executed = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicU32::new(0));
        let (e, f) = (executed.clone(), finished.clone());
        let handler = FnEventHandler::new(move |event: &ChatEvent<'_>| match event {
            ChatEvent::ToolExecuting { .. } => {
                e.fetch_add(1, Ordering::SeqCst);
            }
            ChatEvent::Finished => {
                f.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        });

        let tools = ToolSet::new().with(counting_level_tool(Arc::new(AtomicU32::new(0))));
        let client = ScriptedCompletion::new(vec![
            Ok(level_call("c1")),
            Ok(ChatCompletion::text("ok")),
        ]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default())
            .with_event_handler(&handler);
        chat.turn("errors?").await.unwrap();

        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn multiple_calls_run_in_request_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let recorder = order.clone();
        let tool = FnTool::new(
            ToolDef::new(
                "get_logs_by_level",
                "Filter logs by level",
                crate::json_schema_for::<LevelArgs>(),
            ),
            move |args: LevelArgs| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(args.level.clone());
                    Ok::<_, ToolError>(args.level)
                }
            },
        );
        let tools = ToolSet::new().with(tool);
        let client = ScriptedCompletion::new(vec![
            Ok(ChatCompletion::with_tool_calls(vec![
                ToolCall::new("a", "get_logs_by_level", r#"{"level":"Error"}"#),
                ToolCall::new("b", "get_logs_by_level", r#"{"level":"Warning"}"#),
            ])),
            Ok(ChatCompletion::text("done")),
        ]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        chat.turn("errors and warnings?").await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["Error", "Warning"]);
        let ids: Vec<Option<String>> = client
            .seen(1)
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .map(|m| m.tool_call_id.clone())
            .collect();
        assert_eq!(ids, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[tokio::test]
    async fn tool_errors_become_tool_messages() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![
            Ok(ChatCompletion::with_tool_calls(vec![ToolCall::new(
                "c9", "missing", "{}",
            )])),
            Ok(ChatCompletion::text("Sorry, that tool is unavailable.")),
        ]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        let outcome = chat.turn("do something").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Reply(_)));
        let tool_msg = &client.seen(1)[2];
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("c9"));
        assert_eq!(tool_msg.text(), "Error: unknown tool 'missing'");
    }

    #[tokio::test]
    async fn rate_limit_is_retried_with_backoff() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![
            rate_limited(),
            Ok(ChatCompletion::text("hello")),
        ]);
        let sleeper = RecordingSleeper::default();
        let config = OrchestratorConfig::default().with_retry(RetryPolicy::new(3, 2.0));
        let mut chat = ChatOrchestrator::new(&client, &tools, config).with_sleeper(&sleeper);

        let outcome = chat.turn("hi").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("hello".into()));
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2)]);
        assert_eq!(chat.history().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_yield_no_result_and_append_nothing_more() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let sleeper = RecordingSleeper::default();
        let config = OrchestratorConfig::new(Some("system".into()))
            .with_retry(RetryPolicy::new(3, 2.0));
        let mut chat = ChatOrchestrator::new(&client, &tools, config).with_sleeper(&sleeper);

        let outcome = chat.turn("hi").await.unwrap();
        assert_eq!(outcome, TurnOutcome::NoResult);
        assert_eq!(client.calls(), 3);
        let roles: Vec<MessageRole> = chat
            .history()
            .messages()
            .iter()
            .map(|m| m.role.clone())
            .collect();
        assert_eq!(roles, vec![MessageRole::System, MessageRole::User]);
    }

    #[tokio::test]
    async fn exhaustion_after_a_tool_round_leaves_tool_result_last() {
        let counter = Arc::new(AtomicU32::new(0));
        let tools = ToolSet::new().with(counting_level_tool(counter.clone()));
        let client = ScriptedCompletion::new(vec![
            Ok(level_call("c1")),
            rate_limited(),
            rate_limited(),
            rate_limited(),
        ]);
        let sleeper = RecordingSleeper::default();
        let config = OrchestratorConfig::default().with_retry(RetryPolicy::new(3, 2.0));
        let mut chat = ChatOrchestrator::new(&client, &tools, config).with_sleeper(&sleeper);

        let outcome = chat.turn("How many errors?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::NoResult);
        assert_eq!(client.calls(), 4);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );

        let roles: Vec<MessageRole> = chat
            .history()
            .messages()
            .iter()
            .map(|m| m.role.clone())
            .collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool]
        );
        let last = chat.history().messages().last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn independent_turns_start_from_the_system_prompt() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![
            Ok(ChatCompletion::text("Tengo hambre")),
            Ok(ChatCompletion::text("Estoy cansado")),
        ]);
        let config = OrchestratorConfig::new(Some("Translate to Spanish.".into()))
            .with_tools_enabled(false)
            .with_independent_turns(true);
        let mut chat = ChatOrchestrator::new(&client, &tools, config);

        chat.turn("I am hungry").await.unwrap();
        chat.turn("I am tired").await.unwrap();

        let second = client.seen(1);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].role, MessageRole::System);
        assert_eq!(second[1].text(), "I am tired");
        assert_eq!(chat.history().len(), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_returned_without_retry() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![Err(CompletionError::Http {
            status: 401,
            body: "bad key".into(),
        })]);
        let sleeper = RecordingSleeper::default();
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default())
            .with_sleeper(&sleeper);

        let err = chat.turn("hi").await.unwrap_err();
        assert!(matches!(
            err,
            TurnError::Completion(CompletionError::Http { status: 401, .. })
        ));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn exit_and_blank_input_end_the_session() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        assert_eq!(chat.turn("EXIT").await.unwrap(), TurnOutcome::Ended);
        assert_eq!(chat.turn("  exit ").await.unwrap(), TurnOutcome::Ended);
        assert_eq!(chat.turn("   ").await.unwrap(), TurnOutcome::Ended);
        assert_eq!(client.calls(), 0);
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn round_cap_stops_endless_tool_requests() {
        let counter = Arc::new(AtomicU32::new(0));
        let tools = ToolSet::new().with(counting_level_tool(counter.clone()));
        let client = ScriptedCompletion::new(vec![
            Ok(level_call("r1")),
            Ok(level_call("r2")),
            Ok(level_call("r3")),
        ]);
        let config = OrchestratorConfig::default().with_max_tool_rounds(2);
        let mut chat = ChatOrchestrator::new(&client, &tools, config);

        let outcome = chat.turn("loop forever").await.unwrap();
        assert_eq!(outcome, TurnOutcome::ToolRoundLimit);
        assert_eq!(client.calls(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        // Every recorded request has its result.
        let msgs = chat.history().messages();
        let requested: usize = msgs.iter().map(|m| m.requested_calls().len()).sum();
        let answered = msgs.iter().filter(|m| m.role == MessageRole::Tool).count();
        assert_eq!(requested, answered);
        assert_eq!(msgs.last().unwrap().role, MessageRole::Tool);
    }

    #[tokio::test]
    async fn tools_hidden_when_disabled() {
        struct AssertNoTools;
        impl CompletionService for AssertNoTools {
            fn complete<'a>(
                &'a self,
                _messages: &'a [Message],
                tools: &'a [ToolDef],
            ) -> CompletionFuture<'a> {
                let count = tools.len();
                Box::pin(async move { Ok(ChatCompletion::text(format!("{count} tools"))) })
            }
        }

        let tools = ToolSet::new().with(counting_level_tool(Arc::new(AtomicU32::new(0))));
        let config = OrchestratorConfig::new(Some("Translate.".into())).with_tools_enabled(false);
        let mut chat = ChatOrchestrator::new(&AssertNoTools, &tools, config);
        assert_eq!(
            chat.turn("hello").await.unwrap(),
            TurnOutcome::Reply("0 tools".into())
        );
    }

    #[tokio::test]
    async fn run_session_prints_replies_until_exit() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![
            Ok(ChatCompletion::text("hello")),
            Err(CompletionError::Request("connection reset".into())),
        ]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        let input = tokio::io::BufReader::new(&b"hi\nagain\nexit\nnever read\n"[..]);
        let mut output = Vec::new();
        chat.run_session(input, &mut output).await.unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Assistant > hello\n"));
        assert!(printed.contains("Error: request failed: connection reset"));
        assert!(printed.ends_with("Exiting agent.\n"));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn run_session_stops_at_end_of_input() {
        let tools = ToolSet::new();
        let client = ScriptedCompletion::new(vec![Ok(ChatCompletion::text("hello"))]);
        let mut chat = ChatOrchestrator::new(&client, &tools, OrchestratorConfig::default());

        let input = tokio::io::BufReader::new(&b"hi"[..]);
        let mut output = Vec::new();
        chat.run_session(input, &mut output).await.unwrap();
        assert_eq!(client.calls(), 1);
    }
}
