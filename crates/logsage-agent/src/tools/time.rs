//! `current_utc_time`: lets the model answer date arithmetic questions.

use chrono::{DateTime, Utc};
use logsage::ToolDef;
use logsage::tools::{Tool, ToolFuture, ToolSpec, parse_tool_args};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
pub struct CurrentUtcTimeArgs {}

/// Format as RFC 1123, e.g. `Sun, 19 Oct 2026 08:30:00 GMT`.
pub fn format_rfc1123(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub struct CurrentUtcTime {
    clock: fn() -> DateTime<Utc>,
}

impl CurrentUtcTime {
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// Use a fixed clock instead of the system time.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl Default for CurrentUtcTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurrentUtcTime {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::CURRENT_UTC_TIME, "Retrieves the current time in UTC")
            .parameters_for::<CurrentUtcTimeArgs>()
            .example("current_utc_time()", "Sun, 19 Oct 2026 08:30:00 GMT")
            .to_tool_def()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let parsed = parse_tool_args::<CurrentUtcTimeArgs>(super::CURRENT_UTC_TIME, arguments);
        let now = (self.clock)();
        Box::pin(async move {
            parsed?;
            Ok(format_rfc1123(now))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use logsage::tools::ToolError;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 1, 9, 5, 3).unwrap()
    }

    #[tokio::test]
    async fn formats_as_rfc1123() {
        let tool = CurrentUtcTime::with_clock(fixed);
        assert_eq!(tool.execute("{}").await.unwrap(), "Sun, 01 Dec 2024 09:05:03 GMT");
    }

    #[tokio::test]
    async fn rejects_non_object_arguments() {
        let err = CurrentUtcTime::new().execute("42").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
