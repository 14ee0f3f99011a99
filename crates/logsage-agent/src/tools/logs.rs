//! Log store queries exposed to the model.
//!
//! | Tool | Name | Purpose |
//! |------|------|---------|
//! | [`GetLogsSummary`] | `get_logs_summary` | Count entries per log level |
//! | [`GetLogsByLevel`] | `get_logs_by_level` | List entries of one level |
//! | [`QueryLogs`] | `query_logs` | Run a store-native query |
//!
//! The handlers ([`summarize`], [`filter_by_level`], [`run_raw_query`]) only
//! read from a [`LogStore`]; the tools render their results as text.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use logsage::ToolDef;
use logsage::tools::{Tool, ToolError, ToolFuture, ToolSpec, parse_tool_args};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One entry in the log store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "logLevel", default)]
    pub log_level: String,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Timestamp in round-trip ISO 8601 form.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogQuery {
    All,
    /// Exact, case-sensitive match on `logLevel`.
    Level(String),
    /// A query in the store's own language, passed through unchanged.
    Raw(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("log data is not a JSON array of log records: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("this log store does not support {0}")]
    Unsupported(&'static str),
}

/// A queryable source of [`LogRecord`]s.
pub trait LogStore: Send + Sync {
    fn execute_query<'a>(
        &'a self,
        query: &'a LogQuery,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, StoreError>>;
}

/// Records held in memory, typically loaded from a JSON array file.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    records: Vec<LogRecord>,
}

impl MemoryLogStore {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json(&text)?;
        debug!("Loaded {} log records from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LogStore for MemoryLogStore {
    fn execute_query<'a>(
        &'a self,
        query: &'a LogQuery,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, StoreError>> {
        let result = match query {
            LogQuery::All => Ok(self.records.clone()),
            LogQuery::Level(level) => Ok(self
                .records
                .iter()
                .filter(|r| r.log_level == *level)
                .cloned()
                .collect()),
            LogQuery::Raw(_) => Err(StoreError::Unsupported("raw queries")),
        };
        Box::pin(async move { result })
    }
}

// ── Query handlers ──────────────────────────────────────────────────

/// Entry counts per level, in order of first appearance.
pub async fn summarize(store: &dyn LogStore) -> Result<Vec<(String, usize)>, StoreError> {
    let records = store.execute_query(&LogQuery::All).await?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in &records {
        match counts.iter_mut().find(|(level, _)| *level == record.log_level) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.log_level.clone(), 1)),
        }
    }
    Ok(counts)
}

pub async fn filter_by_level(
    store: &dyn LogStore,
    level: &str,
) -> Result<Vec<LogRecord>, StoreError> {
    store
        .execute_query(&LogQuery::Level(level.to_string()))
        .await
}

pub async fn run_raw_query(
    store: &dyn LogStore,
    query: &str,
) -> Result<Vec<LogRecord>, StoreError> {
    store.execute_query(&LogQuery::Raw(query.to_string())).await
}

// ── Rendering ───────────────────────────────────────────────────────

pub fn render_summary(counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return "No logs found.".to_string();
    }
    let mut out = String::from("Here's the summary of the logs:\n\n");
    for (level, n) in counts {
        let _ = writeln!(out, "- **{level}**: {n} entries");
    }
    out
}

pub fn render_level(level: &str, records: &[LogRecord]) -> String {
    if records.is_empty() {
        return format!("There are no {level} logs found in the database.");
    }
    let mut out = format!("Found {} {level} logs:\n", records.len());
    for r in records {
        let _ = writeln!(out, "- {} (at {})", r.message, r.timestamp_iso());
    }
    out
}

pub fn render_query(records: &[LogRecord]) -> String {
    if records.is_empty() {
        return "No logs found for the given query.".to_string();
    }
    let mut out = String::from("Query Results:\n");
    for r in records {
        let _ = writeln!(
            out,
            "- {} (Level: {}, Timestamp: {})",
            r.message,
            r.log_level,
            r.timestamp_iso()
        );
    }
    out
}

fn store_failure(e: StoreError) -> ToolError {
    ToolError::failed(e.to_string())
}

// ── GetLogsSummary ──────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
pub struct GetLogsSummaryArgs {}

pub struct GetLogsSummary {
    store: Arc<dyn LogStore>,
}

impl GetLogsSummary {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}

impl Tool for GetLogsSummary {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            super::GET_LOGS_SUMMARY,
            "Retrieves log entries from the log store and returns a summary grouped by log level",
        )
        .when_to_use("For an overview of how many entries exist at each level")
        .parameters_for::<GetLogsSummaryArgs>()
        .example(
            "get_logs_summary()",
            "Here's the summary of the logs:\n\n- **Error**: 2 entries",
        )
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<GetLogsSummaryArgs>(super::GET_LOGS_SUMMARY, arguments);
        Box::pin(async move {
            parsed?;
            let counts = summarize(self.store.as_ref()).await.map_err(store_failure)?;
            Ok(render_summary(&counts))
        })
    }
}

// ── GetLogsByLevel ──────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
pub struct GetLogsByLevelArgs {
    /// Represents Log Level, e.g. "Error" or "Warning".
    #[serde(rename = "logLevel")]
    pub log_level: String,
}

pub struct GetLogsByLevel {
    store: Arc<dyn LogStore>,
}

impl GetLogsByLevel {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}

impl Tool for GetLogsByLevel {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            super::GET_LOGS_BY_LEVEL,
            "Retrieves log entries for a specific log level from the log store",
        )
        .when_not_to_use("For counts only; use get_logs_summary instead")
        .parameters_for::<GetLogsByLevelArgs>()
        .example(
            r#"get_logs_by_level(logLevel="Error")"#,
            "Found 1 Error logs:\n- Disk full (at 2024-05-01T10:00:00Z)",
        )
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<GetLogsByLevelArgs>(super::GET_LOGS_BY_LEVEL, arguments);
        Box::pin(async move {
            let args = parsed?;
            let records = filter_by_level(self.store.as_ref(), &args.log_level)
                .await
                .map_err(store_failure)?;
            Ok(render_level(&args.log_level, &records))
        })
    }
}

// ── QueryLogs ───────────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
pub struct QueryLogsArgs {
    /// Query in the log store's own language.
    pub query: String,
}

pub struct QueryLogs {
    store: Arc<dyn LogStore>,
}

impl QueryLogs {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}

impl Tool for QueryLogs {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            super::QUERY_LOGS,
            "Executes a custom log store query and returns matching log entries",
        )
        .when_to_use("When neither the summary nor a level filter answers the question")
        .parameters_for::<QueryLogsArgs>()
        .output_format("Query Results: one line per entry with level and timestamp")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<QueryLogsArgs>(super::QUERY_LOGS, arguments);
        Box::pin(async move {
            let args = parsed?;
            let records = run_raw_query(self.store.as_ref(), &args.query)
                .await
                .map_err(store_failure)?;
            Ok(render_query(&records))
        })
    }
}
