//! Application configuration loaded from `appsettings.json`.
//!
//! The file is read once at startup into an [`AppConfig`] that is passed to
//! whatever needs it; there is no global accessor. The `OpenAI` section is
//! validated on load. `Cosmos` and `Kusto` are validated when a scenario
//! that uses them is selected, so a chat-only run does not need them.
//!
//! ```json
//! {
//!   "OpenAI": { "DeploymentName": "gpt-4o", "ModelId": "gpt-4o",
//!               "Endpoint": "https://example.openai.azure.com/", "ApiKey": "..." },
//!   "Cosmos": { "LogsFile": "logs.json" },
//!   "Kusto":  { "Uri": "https://cluster.kusto.windows.net", "BearerToken": "..." },
//!   "Agent":  { "MaxToolRounds": 8, "MaxAttempts": 3, "BaseDelaySecs": 2.0,
//!               "ToolTimeoutSecs": 600, "MaxToolResultBytes": 30000 }
//! }
//! ```

use logsage::OpenAiClient;
use logsage::agent::config::{DEFAULT_MAX_TOOL_ROUNDS, OrchestratorConfig};
use logsage::api::completion::CompletionError;
use logsage::api::retry::{DEFAULT_BASE_DELAY_SECS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use logsage::collect::{DEFAULT_COLLECT_TIMEOUT, ExternalCollector, FileCache};
use logsage::tools::ToolSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

/// Environment variable that overrides `OpenAI:ApiKey`.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_KUSTO_PROGRAM: &str = "pwsh";
pub const DEFAULT_KUSTO_SCRIPT: &str = "GetKustoLogs.ps1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Configuration value for '{key}' was not found.")]
    Missing { key: &'static str },
    #[error("Configuration value for '{key}' is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ── Raw file shape ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSettings {
    #[serde(rename = "OpenAI", default)]
    openai: RawOpenAi,
    #[serde(default)]
    cosmos: RawCosmos,
    #[serde(default)]
    kusto: RawKusto,
    #[serde(default)]
    agent: RawAgent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawOpenAi {
    deployment_name: Option<String>,
    model_id: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCosmos {
    logs_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawKusto {
    uri: Option<String>,
    bearer_token: Option<String>,
    program: Option<String>,
    script_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAgent {
    max_tool_rounds: Option<u32>,
    max_attempts: Option<u32>,
    base_delay_secs: Option<f64>,
    cache_dir: Option<PathBuf>,
    tool_timeout_secs: Option<u64>,
    max_tool_result_bytes: Option<usize>,
}

/// Treat absent and blank values alike.
fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing { key })
}

// ── Validated settings ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub deployment_name: String,
    pub model_id: String,
    pub endpoint: String,
    pub api_key: String,
    pub api_version: Option<String>,
}

impl OpenAiSettings {
    /// Build the completion client.
    ///
    /// An endpoint that already ends in `/chat/completions` is used as-is
    /// with bearer auth; anything else is an Azure OpenAI resource URL.
    pub fn build_client(&self) -> Result<OpenAiClient, CompletionError> {
        let client = if self.endpoint.trim_end_matches('/').ends_with("/chat/completions") {
            OpenAiClient::with_url(self.endpoint.clone(), self.api_key.clone())?
                .with_model(self.model_id.clone())
        } else {
            OpenAiClient::azure(
                &self.endpoint,
                &self.deployment_name,
                self.api_key.clone(),
                self.api_version.as_deref(),
            )?
        };
        debug!("Completion endpoint: {}", client.url());
        Ok(client)
    }
}

#[derive(Debug, Clone)]
pub struct CosmosSettings {
    /// JSON array of log records standing in for the document store.
    pub logs_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct KustoSettings {
    pub uri: String,
    pub bearer_token: String,
    pub program: String,
    pub script_path: PathBuf,
    pub timeout: Duration,
}

impl KustoSettings {
    /// The collector that runs the Kusto export script. The bearer token is
    /// passed as a secret argument so it never reaches the logs.
    pub fn collector(&self) -> ExternalCollector {
        ExternalCollector::new(&self.program)
            .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"])
            .arg(&self.script_path)
            .args(["-KustoUri", self.uri.as_str()])
            .arg("-BearerToken")
            .secret_arg(&self.bearer_token)
            .timeout(self.timeout)
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_tool_rounds: u32,
    pub retry: RetryPolicy,
    /// Directory for collector caches. Defaults to the system temp dir.
    pub cache_dir: Option<PathBuf>,
    /// Bound on a single tool call. Unset means tools run to completion.
    pub tool_timeout: Option<Duration>,
    /// Cap on tool output handed to the model. Unset means no truncation,
    /// so large payloads such as the Kusto export arrive whole.
    pub max_tool_result_bytes: Option<usize>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            retry: RetryPolicy::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY_SECS),
            cache_dir: None,
            tool_timeout: None,
            max_tool_result_bytes: None,
        }
    }
}

impl AgentSettings {
    pub fn orchestrator_config(&self, system_prompt: Option<String>) -> OrchestratorConfig {
        OrchestratorConfig::new(system_prompt)
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_retry(self.retry.clone())
    }

    /// An empty registry with argument validation and the configured tool
    /// timeout and result cap applied.
    pub fn tool_set(&self) -> ToolSet {
        ToolSet::new()
            .with_arg_validation(true)
            .with_default_timeout(self.tool_timeout)
            .with_max_result_bytes(self.max_tool_result_bytes)
    }

    pub fn cache(&self) -> FileCache {
        match &self.cache_dir {
            Some(dir) => FileCache::new(dir),
            None => FileCache::in_temp_dir(),
        }
    }
}

/// Settings for one process run.
#[derive(Debug)]
pub struct AppConfig {
    pub openai: OpenAiSettings,
    pub agent: AgentSettings,
    cosmos: RawCosmos,
    kusto: RawKusto,
    /// Directory of the settings file; relative paths resolve against it.
    base_dir: PathBuf,
}

impl AppConfig {
    /// Read and validate the settings file, applying the `OPENAI_API_KEY`
    /// override from the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let env_key = std::env::var(API_KEY_ENV).ok();
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&text, env_key, base_dir)
    }

    /// Validate settings from JSON text. `env_api_key`, when non-blank,
    /// replaces `OpenAI:ApiKey`.
    pub fn parse(
        text: &str,
        env_api_key: Option<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut raw: RawSettings = serde_json::from_str(text)?;
        if let Some(key) = env_api_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {API_KEY_ENV}");
            raw.openai.api_key = Some(key);
        }

        let openai = OpenAiSettings {
            deployment_name: required(&raw.openai.deployment_name, "OpenAI:DeploymentName")?,
            model_id: required(&raw.openai.model_id, "OpenAI:ModelId")?,
            endpoint: required(&raw.openai.endpoint, "OpenAI:Endpoint")?,
            api_key: required(&raw.openai.api_key, "OpenAI:ApiKey")?,
            api_version: raw.openai.api_version.filter(|v| !v.trim().is_empty()),
        };

        let defaults = AgentSettings::default();
        let base_delay_secs = raw.agent.base_delay_secs.unwrap_or(DEFAULT_BASE_DELAY_SECS);
        if !base_delay_secs.is_finite() || base_delay_secs < 0.0 {
            return Err(ConfigError::Invalid {
                key: "Agent:BaseDelaySecs",
                reason: format!("{base_delay_secs} is not a non-negative number"),
            });
        }
        let agent = AgentSettings {
            max_tool_rounds: raw.agent.max_tool_rounds.unwrap_or(defaults.max_tool_rounds),
            retry: RetryPolicy::new(
                raw.agent.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                base_delay_secs,
            ),
            cache_dir: raw.agent.cache_dir,
            tool_timeout: raw.agent.tool_timeout_secs.map(Duration::from_secs),
            max_tool_result_bytes: raw.agent.max_tool_result_bytes,
        };

        Ok(Self {
            openai,
            agent,
            cosmos: raw.cosmos,
            kusto: raw.kusto,
            base_dir: base_dir.into(),
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// The `Cosmos` section, validated.
    pub fn cosmos(&self) -> Result<CosmosSettings, ConfigError> {
        let logs_file = self
            .cosmos
            .logs_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::Missing {
                key: "Cosmos:LogsFile",
            })?;
        Ok(CosmosSettings {
            logs_file: self.resolve(logs_file),
        })
    }

    /// The `Kusto` section, validated.
    pub fn kusto(&self) -> Result<KustoSettings, ConfigError> {
        let script = self
            .kusto
            .script_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KUSTO_SCRIPT));
        Ok(KustoSettings {
            uri: required(&self.kusto.uri, "Kusto:Uri")?,
            bearer_token: required(&self.kusto.bearer_token, "Kusto:BearerToken")?,
            program: self
                .kusto
                .program
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_KUSTO_PROGRAM.to_string()),
            script_path: self.resolve(&script),
            timeout: self
                .kusto
                .timeout_secs
                .map_or(DEFAULT_COLLECT_TIMEOUT, Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "OpenAI": {
            "DeploymentName": "gpt4o",
            "ModelId": "gpt-4o",
            "Endpoint": "https://example.openai.azure.com/",
            "ApiKey": "file-key"
        },
        "Cosmos": { "LogsFile": "logs.json" },
        "Kusto": { "Uri": "https://cluster.kusto.windows.net", "BearerToken": "tok", "TimeoutSecs": 30 },
        "Agent": { "MaxToolRounds": 4, "MaxAttempts": 5, "BaseDelaySecs": 1.5, "CacheDir": "/var/cache/logsage",
                   "ToolTimeoutSecs": 60 }
    }"#;

    #[test]
    fn parses_all_sections() {
        let config = AppConfig::parse(FULL, None, "/etc/logsage").unwrap();
        assert_eq!(config.openai.deployment_name, "gpt4o");
        assert_eq!(config.openai.api_key, "file-key");
        assert_eq!(config.agent.max_tool_rounds, 4);
        assert_eq!(config.agent.retry, RetryPolicy::new(5, 1.5));
        assert_eq!(config.agent.tool_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.agent.max_tool_result_bytes, None);

        let cosmos = config.cosmos().unwrap();
        assert_eq!(cosmos.logs_file, PathBuf::from("/etc/logsage/logs.json"));

        let kusto = config.kusto().unwrap();
        assert_eq!(kusto.program, DEFAULT_KUSTO_PROGRAM);
        assert_eq!(kusto.timeout, Duration::from_secs(30));
        assert_eq!(
            kusto.script_path,
            PathBuf::from("/etc/logsage").join(DEFAULT_KUSTO_SCRIPT)
        );
    }

    #[test]
    fn env_key_overrides_file_key() {
        let config = AppConfig::parse(FULL, Some("env-key".into()), "").unwrap();
        assert_eq!(config.openai.api_key, "env-key");

        let config = AppConfig::parse(FULL, Some("  ".into()), "").unwrap();
        assert_eq!(config.openai.api_key, "file-key");
    }

    #[test]
    fn missing_api_key_names_the_setting() {
        let json = r#"{"OpenAI": {"DeploymentName": "d", "ModelId": "m", "Endpoint": "https://e"}}"#;
        let err = AppConfig::parse(json, None, "").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "OpenAI:ApiKey" }));
        assert_eq!(
            err.to_string(),
            "Configuration value for 'OpenAI:ApiKey' was not found."
        );
    }

    #[test]
    fn scenario_sections_are_checked_on_demand() {
        let json = r#"{"OpenAI": {"DeploymentName": "d", "ModelId": "m", "Endpoint": "https://e", "ApiKey": "k"}}"#;
        let config = AppConfig::parse(json, None, "").unwrap();
        assert_eq!(config.agent.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert!(matches!(
            config.cosmos().unwrap_err(),
            ConfigError::Missing { key: "Cosmos:LogsFile" }
        ));
        assert!(matches!(
            config.kusto().unwrap_err(),
            ConfigError::Missing { key: "Kusto:Uri" }
        ));
    }

    fn text_tool(name: &str, secs: u64, len: usize) -> logsage::tools::FnTool {
        logsage::tools::FnTool::new(
            logsage::ToolDef::new(name, "Test output", serde_json::json!({"type": "object"})),
            move |_: serde_json::Value| async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                Ok::<_, logsage::tools::ToolError>("x".repeat(len))
            },
        )
    }

    #[tokio::test]
    async fn tool_set_passes_large_results_through_by_default() {
        let json = r#"{"OpenAI": {"DeploymentName": "d", "ModelId": "m", "Endpoint": "https://e", "ApiKey": "k"}}"#;
        let config = AppConfig::parse(json, None, "").unwrap();
        assert_eq!(config.agent.tool_timeout, None);

        let tools = config.agent.tool_set().with(text_tool("big", 0, 60_000));
        assert_eq!(tools.invoke("big", "{}").await.unwrap().len(), 60_000);
    }

    #[tokio::test]
    async fn tool_set_applies_configured_result_cap() {
        let json = r#"{"OpenAI": {"DeploymentName": "d", "ModelId": "m", "Endpoint": "https://e", "ApiKey": "k"},
                       "Agent": {"MaxToolResultBytes": 10}}"#;
        let config = AppConfig::parse(json, None, "").unwrap();

        let tools = config.agent.tool_set().with(text_tool("big", 0, 100));
        let out = tools.invoke("big", "{}").await.unwrap();
        assert!(out.contains("[truncated: 100 bytes total]"), "{out}");
    }

    #[tokio::test(start_paused = true)]
    async fn tool_set_applies_configured_timeout() {
        let config = AppConfig::parse(FULL, None, "").unwrap();

        let tools = config.agent.tool_set().with(text_tool("slow", 3600, 1));
        let err = tools.invoke("slow", "{}").await.unwrap_err();
        assert!(
            matches!(err, logsage::tools::ToolError::TimedOut { .. }),
            "{err}"
        );
    }

    #[test]
    fn negative_delay_is_rejected() {
        let json = r#"{"OpenAI": {"DeploymentName": "d", "ModelId": "m", "Endpoint": "https://e", "ApiKey": "k"},
                       "Agent": {"BaseDelaySecs": -1}}"#;
        assert!(matches!(
            AppConfig::parse(json, None, "").unwrap_err(),
            ConfigError::Invalid { key: "Agent:BaseDelaySecs", .. }
        ));
    }

    #[test]
    fn kusto_collector_redacts_token() {
        let config = AppConfig::parse(FULL, None, "/etc/logsage").unwrap();
        let shown = config.kusto().unwrap().collector().display_command();
        assert!(shown.starts_with("pwsh -NoProfile -ExecutionPolicy Bypass -File "));
        assert!(shown.ends_with("-KustoUri https://cluster.kusto.windows.net -BearerToken ***"));
        assert!(!shown.contains("tok "));
    }

    #[test]
    fn client_uses_azure_deployment_url() {
        let config = AppConfig::parse(FULL, None, "").unwrap();
        let client = config.openai.build_client().unwrap();
        assert!(client.url().contains("/openai/deployments/gpt4o/chat/completions"));
    }

    #[test]
    fn load_reads_file_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, FULL).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.cosmos().unwrap().logs_file, dir.path().join("logs.json"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/appsettings.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
