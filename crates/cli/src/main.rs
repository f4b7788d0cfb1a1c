//! WebInstall CLI - Main Entry Point
//!
//! Drives a site's setup wizard in a real browser and reports how the run went.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};

use webinstall_browser::Browser;
use webinstall_core::InstallConfig;

mod commands;
mod output;
mod session;

use commands::Commands;
use output::{print_error, print_summary, OutputFormat, RunSummary};
use session::{Session, SessionOptions};

/// Exit code for a run that started but did not finish the flow
const EXIT_RUN_FAILED: u8 = 1;
/// Exit code for problems found before the browser touched the site
const EXIT_SETUP_FAILED: u8 = 2;

/// WebInstall CLI - unattended setup-wizard installs
#[derive(Parser, Debug)]
#[command(name = "webinstall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Site root the wizard is served under
    #[arg(long, env = "WEBINSTALL_BASE_URL", default_value = "http://localhost", global = true)]
    base_url: String,

    /// Install configuration (TOML or YAML)
    #[arg(short, long, default_value = "install.toml", global = true)]
    config: PathBuf,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium", global = true)]
    browser: Browser,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Directory whose node_modules provides playwright
    #[arg(long, env = "WEBINSTALL_PLAYWRIGHT_DIR", default_value = ".", global = true)]
    playwright_dir: PathBuf,

    /// Ambient wait for element actions and assertions, in seconds
    #[arg(long, default_value_t = 4, global = true)]
    action_timeout: u64,

    /// Deadline for the installer's backend calls, in seconds
    #[arg(long, default_value_t = 120, global = true)]
    sync_timeout: u64,

    /// Deadline for content language installation, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    language_timeout: u64,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            base_url: self.base_url.clone(),
            browser: self.browser,
            headed: self.headed,
            playwright_dir: self.playwright_dir.clone(),
            action_timeout: Duration::from_secs(self.action_timeout),
            sync_timeout: Duration::from_secs(self.sync_timeout),
            language_timeout: Duration::from_secs(self.language_timeout),
        }
    }
}

fn load_config(path: &Path) -> Result<InstallConfig> {
    InstallConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    let session = match Session::start(&cli.session_options()).await {
        Ok(session) => session,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    let flow = cli.command.flow();
    info!("Running {} against {}", flow, cli.base_url);
    let started = Instant::now();
    let result = cli.command.execute(&session, &config).await;
    let elapsed = started.elapsed();
    session.close().await;

    let failure = result.err();
    if let Some(e) = &failure {
        error!("{} failed: {}", flow, e);
    }
    let code = match &failure {
        None => ExitCode::SUCCESS,
        Some(e) if e.is_run_failure() => ExitCode::from(EXIT_RUN_FAILED),
        Some(webinstall_core::InstallError::InvalidConfig(_)) => ExitCode::from(EXIT_SETUP_FAILED),
        Some(_) => ExitCode::from(EXIT_RUN_FAILED),
    };

    let summary = RunSummary::new(
        &flow,
        &config.site_name,
        &cli.base_url,
        elapsed,
        failure.map(|e| e.to_string()),
    );
    print_summary(&summary, cli.format);
    code
}
