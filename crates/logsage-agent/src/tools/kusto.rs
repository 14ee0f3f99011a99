//! `get_1000_kusto_logs`: Kusto export through the external collector,
//! cached so the script runs once per cache lifetime.

use logsage::ToolDef;
use logsage::collect::{ExternalCollector, LogSource};
use logsage::tools::{Tool, ToolError, ToolFuture, ToolSpec, parse_tool_args};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Cache key; the file cache stores it as `kusto_logs_cache.json`.
pub const KUSTO_CACHE_KEY: &str = "kusto_logs";

#[derive(Deserialize, JsonSchema)]
pub struct KustoLogsArgs {}

pub struct KustoLogs {
    source: Arc<LogSource>,
    collector: ExternalCollector,
}

impl KustoLogs {
    pub fn new(source: Arc<LogSource>, collector: ExternalCollector) -> Self {
        Self { source, collector }
    }
}

impl Tool for KustoLogs {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(
            super::GET_KUSTO_LOGS,
            "Retrieves 1000 log entries from Kusto using a cache to preserve results",
        )
        .when_to_use("Once per conversation; the result is a JSON array of log rows")
        .when_not_to_use("When the conversation already contains the Kusto logs; reuse them")
        .parameters_for::<KustoLogsArgs>()
        .output_format("JSON array of log rows, or \"No logs found.\"")
        .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<KustoLogsArgs>(super::GET_KUSTO_LOGS, arguments);
        Box::pin(async move {
            parsed?;
            let payload = self
                .source
                .fetch(KUSTO_CACHE_KEY, || self.collector.collect())
                .await
                .map_err(|e| ToolError::failed(e.to_string()))?;
            if payload.trim().is_empty() {
                return Ok("No logs found.".to_string());
            }
            Ok(payload)
        })
    }
}
