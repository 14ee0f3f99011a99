//! Console log-analysis assistant built on logsage.
//!
//! `logsage-agent` wires the logsage runtime to concrete tools (a log store,
//! a cached Kusto export, a UTC clock) and offers them through a numbered
//! menu of scenarios.
//!
//! # Library usage
//!
//! ```ignore
//! use logsage::tools::ToolSet;
//! use logsage_agent::{AppConfig, LogToolsExt, MemoryLogStore};
//!
//! let config = AppConfig::load("appsettings.json".as_ref())?;
//! let store = Arc::new(MemoryLogStore::load(&config.cosmos()?.logs_file)?);
//! let tools = ToolSet::new().with_log_tools(store).with_time_tool();
//! ```
//!
//! # Binary
//!
//! ```sh
//! # Interactive menu
//! logsage --config appsettings.json
//!
//! # Jump straight to the Kusto agent
//! logsage --scenario 6 --verbose
//! ```

pub mod config;
pub mod prompt;
pub mod scenario;
pub mod tools;

pub use config::{AppConfig, ConfigError};
pub use prompt::{kusto_system_prompt, log_store_system_prompt, translator_system_prompt};
pub use scenario::{MenuChoice, Scenario, ScenarioError, ScenarioRunner};
pub use tools::{LogToolsExt, MemoryLogStore};
