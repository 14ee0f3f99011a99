//! Log analysis tools for the agent scenarios.
//!
//! Provides the log store, Kusto, and time tools, and the [`LogToolsExt`]
//! trait for registering them on a [`ToolSet`].

pub mod kusto;
pub mod logs;
pub mod time;

pub use kusto::{KUSTO_CACHE_KEY, KustoLogs};
pub use logs::{
    GetLogsByLevel, GetLogsSummary, LogQuery, LogRecord, LogStore, MemoryLogStore, QueryLogs,
    StoreError,
};
pub use time::CurrentUtcTime;

use logsage::collect::{ExternalCollector, LogSource};
use logsage::tools::ToolSet;
use std::sync::Arc;

// ── Tool name constants ─────────────────────────────────────────────

pub const GET_LOGS_SUMMARY: &str = "get_logs_summary";
pub const GET_LOGS_BY_LEVEL: &str = "get_logs_by_level";
pub const QUERY_LOGS: &str = "query_logs";
pub const GET_KUSTO_LOGS: &str = "get_1000_kusto_logs";
pub const CURRENT_UTC_TIME: &str = "current_utc_time";

// ── Extension trait ─────────────────────────────────────────────────

/// Extension trait for registering log tools on a [`ToolSet`].
///
/// ```ignore
/// let store: Arc<dyn LogStore> = Arc::new(MemoryLogStore::load(&path)?);
/// let tools = ToolSet::new().with_log_tools(store).with_time_tool();
/// ```
pub trait LogToolsExt {
    fn with_log_tools(self, store: Arc<dyn LogStore>) -> Self;
    fn with_kusto_tools(self, source: Arc<LogSource>, collector: ExternalCollector) -> Self;
    fn with_time_tool(self) -> Self;
}

impl LogToolsExt for ToolSet {
    fn with_log_tools(self, store: Arc<dyn LogStore>) -> Self {
        self.with(GetLogsSummary::new(store.clone()))
            .with(GetLogsByLevel::new(store.clone()))
            .with(QueryLogs::new(store))
    }

    fn with_kusto_tools(self, source: Arc<LogSource>, collector: ExternalCollector) -> Self {
        self.with(KustoLogs::new(source, collector))
    }

    fn with_time_tool(self) -> Self {
        self.with(CurrentUtcTime::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsage::collect::MemoryCache;

    #[test]
    fn registers_expected_names() {
        let store: Arc<dyn LogStore> = Arc::new(MemoryLogStore::default());
        let source = Arc::new(LogSource::new(Arc::new(MemoryCache::new())));
        let tools = ToolSet::new()
            .with_log_tools(store)
            .with_kusto_tools(source, ExternalCollector::new("true"))
            .with_time_tool();
        assert_eq!(
            tools.names(),
            vec![
                CURRENT_UTC_TIME,
                GET_KUSTO_LOGS,
                GET_LOGS_BY_LEVEL,
                GET_LOGS_SUMMARY,
                QUERY_LOGS
            ]
        );
    }

    #[tokio::test]
    async fn invoke_dispatches_through_registry() {
        let store: Arc<dyn LogStore> = Arc::new(
            MemoryLogStore::from_json(
                r#"[{"message": "boom", "logLevel": "Error", "timestamp": "2024-01-01T00:00:00Z"}]"#,
            )
            .unwrap(),
        );
        let tools = ToolSet::new().with_arg_validation(true).with_log_tools(store);
        let out = tools
            .invoke(GET_LOGS_BY_LEVEL, r#"{"logLevel": "Error"}"#)
            .await
            .unwrap();
        assert_eq!(out, "Found 1 Error logs:\n- boom (at 2024-01-01T00:00:00Z)\n");

        let err = tools.invoke(GET_LOGS_BY_LEVEL, "{}").await.unwrap_err();
        assert!(err.render().contains("valid JSON"), "{}", err.render());
    }
}
