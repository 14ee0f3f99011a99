//! Console log-analysis assistant.
//!
//! Reads `appsettings.json` (see [`logsage_agent::config`]) and offers a
//! numbered menu of scenarios. `OPENAI_API_KEY` overrides the configured
//! API key. Logs go to stderr; set `RUST_LOG` or pass `--verbose`.
//!
//! # Examples
//!
//! ```sh
//! logsage
//! logsage --config /etc/logsage/appsettings.json --scenario 5
//! ```

use std::path::PathBuf;
use std::sync::Once;

use clap::Parser;
use logsage::agent::LoggingHandler;
use logsage_agent::config::DEFAULT_CONFIG_FILE;
use logsage_agent::scenario::{parse_selection, render_menu};
use logsage_agent::{AppConfig, MenuChoice, Scenario, ScenarioError, ScenarioRunner};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Console assistant for analysing logs with an LLM.
#[derive(Parser)]
#[command(name = "logsage")]
struct Cli {
    /// Settings file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Run this scenario (1-6) instead of showing the menu.
    #[arg(long)]
    scenario: Option<u8>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short)]
    verbose: bool,
}

static TRACING: Once = Once::new();

fn init_tracing(verbose: bool) {
    TRACING.call_once(|| {
        let default = if verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(&cli.config).unwrap_or_else(|e| fail(e));
    let client = config
        .openai
        .build_client()
        .unwrap_or_else(|e| fail(format!("failed to create API client: {e}")));

    let runner = ScenarioRunner::new(&client, &config).with_event_handler(&LoggingHandler);
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    if let Some(n) = cli.scenario {
        let scenario = Scenario::from_number(n)
            .unwrap_or_else(|| fail(format!("no scenario numbered {n}")));
        if let Err(e) = runner.run(scenario, &mut stdin, &mut stdout).await {
            fail(e);
        }
        return;
    }

    if let Err(e) = menu_loop(&runner, &mut stdin, &mut stdout).await {
        fail(e);
    }
}

/// Show the menu until the user quits or input ends. Configuration errors
/// end the program; other scenario failures are reported and the menu is
/// shown again.
async fn menu_loop<R, W>(
    runner: &ScenarioRunner<'_>,
    stdin: &mut R,
    stdout: &mut W,
) -> Result<(), ScenarioError>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    loop {
        stdout.write_all(render_menu().as_bytes()).await?;
        stdout.write_all(b"Enter selection: ").await?;
        stdout.flush().await?;

        let mut line = String::new();
        if stdin.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        match parse_selection(&line) {
            Some(MenuChoice::Quit) => {
                stdout.write_all(b"Exiting...\n").await?;
                return Ok(());
            }
            Some(MenuChoice::Run(scenario)) => {
                match runner.run(scenario, &mut *stdin, stdout).await {
                    Ok(()) => {}
                    Err(e @ ScenarioError::Config(_)) => return Err(e),
                    Err(e) => {
                        stdout.write_all(format!("Error: {e}\n").as_bytes()).await?;
                    }
                }
            }
            None => stdout.write_all(b"Invalid selection.\n").await?,
        }
    }
}
