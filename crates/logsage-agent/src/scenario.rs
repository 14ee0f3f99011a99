//! The numbered scenarios offered by the menu.
//!
//! Scenarios 1 to 3 send fixed prompts and print the replies. Scenarios 4 to
//! 6 run an interactive chat session until the user types `exit` or sends
//! an empty line. Every scenario builds its own [`ToolSet`] and history; no
//! state carries over from one to the next.

use crate::config::{AppConfig, ConfigError};
use crate::prompt;
use crate::tools::{LogStore, LogToolsExt, MemoryLogStore, StoreError};
use logsage::agent::{
    ChatOrchestrator, EventHandler, NoopHandler, OrchestratorConfig, TurnError, TurnOutcome,
};
use logsage::api::{CompletionService, Sleeper, TokioSleeper};
use logsage::collect::LogSource;
use logsage::tools::ToolSet;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    BasicPrompts,
    ToolPrompts,
    JsonPrompt,
    Translator,
    LogStoreAgent,
    KustoAgent,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::BasicPrompts,
        Scenario::ToolPrompts,
        Scenario::JsonPrompt,
        Scenario::Translator,
        Scenario::LogStoreAgent,
        Scenario::KustoAgent,
    ];

    /// Menu number, starting at 1.
    pub fn number(self) -> u8 {
        match self {
            Scenario::BasicPrompts => 1,
            Scenario::ToolPrompts => 2,
            Scenario::JsonPrompt => 3,
            Scenario::Translator => 4,
            Scenario::LogStoreAgent => 5,
            Scenario::KustoAgent => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::BasicPrompts => "Send basic prompts",
            Scenario::ToolPrompts => "Send a prompt that needs the time tool",
            Scenario::JsonPrompt => "Send a prompt with a JSON instruction",
            Scenario::Translator => "Chat with the Yoda translator",
            Scenario::LogStoreAgent => "Chat with the log store agent",
            Scenario::KustoAgent => "Chat with the Kusto log agent",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.number(), self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Run(Scenario),
    Quit,
}

/// Parse a menu selection. `None` means the input matched nothing.
pub fn parse_selection(input: &str) -> Option<MenuChoice> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Some(MenuChoice::Quit);
    }
    input
        .parse::<u8>()
        .ok()
        .and_then(Scenario::from_number)
        .map(MenuChoice::Run)
}

pub fn render_menu() -> String {
    let mut menu = String::from("Select a step to run:\n");
    for scenario in Scenario::ALL {
        menu.push_str(&format!("{scenario}\n"));
    }
    menu.push_str("q: Quit\n");
    menu
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs scenarios against one completion service and configuration.
pub struct ScenarioRunner<'a> {
    client: &'a dyn CompletionService,
    config: &'a AppConfig,
    event_handler: &'a dyn EventHandler,
    sleeper: &'a dyn Sleeper,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(client: &'a dyn CompletionService, config: &'a AppConfig) -> Self {
        Self {
            client,
            config,
            event_handler: &NoopHandler,
            sleeper: &TokioSleeper,
        }
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn orchestrator<'t>(
        &'t self,
        tools: &'t ToolSet,
        system_prompt: Option<String>,
    ) -> ChatOrchestrator<'t> {
        self.orchestrator_with(tools, self.config.agent.orchestrator_config(system_prompt))
    }

    fn orchestrator_with<'t>(
        &'t self,
        tools: &'t ToolSet,
        config: OrchestratorConfig,
    ) -> ChatOrchestrator<'t> {
        ChatOrchestrator::new(self.client, tools, config)
            .with_event_handler(self.event_handler)
            .with_sleeper(self.sleeper)
    }

    /// Run `scenario`, reading chat input from `input` and writing to `output`.
    ///
    /// Configuration for the log store and Kusto scenarios is checked here,
    /// before any session starts.
    pub async fn run<R, W>(
        &self,
        scenario: Scenario,
        input: R,
        output: &mut W,
    ) -> Result<(), ScenarioError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Running scenario {scenario}");
        match scenario {
            Scenario::BasicPrompts => {
                let tools = ToolSet::new();
                for text in prompt::basic_prompts() {
                    self.one_shot(&tools, None, &text, output).await?;
                }
            }
            Scenario::ToolPrompts => {
                let none = ToolSet::new();
                let with_time = self.config.agent.tool_set().with_time_tool();
                self.one_shot(&none, None, prompt::DATE_PROMPT, output).await?;
                self.one_shot(&with_time, None, prompt::DATE_PROMPT, output)
                    .await?;
            }
            Scenario::JsonPrompt => {
                let tools = ToolSet::new();
                let system = Some(prompt::JSON_INSTRUCTION.to_string());
                self.one_shot(&tools, system, prompt::JSON_PROMPT, output)
                    .await?;
            }
            Scenario::Translator => {
                // Each line is translated on its own, without earlier turns.
                let tools = ToolSet::new();
                let config = self
                    .config
                    .agent
                    .orchestrator_config(Some(prompt::translator_system_prompt()))
                    .with_tools_enabled(false)
                    .with_independent_turns(true);
                self.orchestrator_with(&tools, config)
                    .run_session(input, &mut *output)
                    .await?;
            }
            Scenario::LogStoreAgent => {
                let settings = self.config.cosmos()?;
                let store: Arc<dyn LogStore> =
                    Arc::new(MemoryLogStore::load(&settings.logs_file)?);
                let tools = self.config.agent.tool_set().with_log_tools(store);
                let system = Some(prompt::log_store_system_prompt());
                self.orchestrator(&tools, system)
                    .run_session(input, &mut *output)
                    .await?;
            }
            Scenario::KustoAgent => {
                let settings = self.config.kusto()?;
                let source = Arc::new(LogSource::new(Arc::new(self.config.agent.cache())));
                let tools = self
                    .config
                    .agent
                    .tool_set()
                    .with_kusto_tools(source, settings.collector());
                let system = Some(prompt::kusto_system_prompt());
                self.orchestrator(&tools, system)
                    .run_session(input, &mut *output)
                    .await?;
            }
        }
        Ok(())
    }

    /// Send a single prompt in a fresh conversation and print the reply.
    async fn one_shot<W>(
        &self,
        tools: &ToolSet,
        system_prompt: Option<String>,
        text: &str,
        output: &mut W,
    ) -> Result<(), ScenarioError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut chat = self.orchestrator(tools, system_prompt);
        let line = match chat.turn(text).await? {
            TurnOutcome::Reply(reply) => reply,
            TurnOutcome::NoResult => {
                "(no result: the service is rate limiting requests)".to_string()
            }
            TurnOutcome::ToolRoundLimit => "(stopped: too many consecutive tool calls)".to_string(),
            TurnOutcome::Ended => return Ok(()),
        };
        output.write_all(format!("{line}\n").as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }
}
