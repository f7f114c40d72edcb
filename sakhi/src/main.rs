//! Arth Sakhi - personal financial guide
//!
//! CLI entry point for the interactive flow and the one-shot commands.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use arthsakhi::app::{AppState, Orchestrator};
use arthsakhi::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use arthsakhi::config::{Config, LlmConfig};
use arthsakhi::domain::{Category, Language, UserProfile};
use arthsakhi::repl::{self, render};

fn setup_logging(verbose: bool) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows credential status
    let cmd = Cli::command().after_help(generate_after_help(&LlmConfig::default().api_key_env));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Arth Sakhi loaded config: model={}", config.llm.model);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Start) => {
            debug!("main: starting interactive flow");
            config.validate()?;
            repl::run_interactive(&config).await
        }
        Some(Command::Plan { profile, format }) => {
            debug!(?profile, %format, "main: matched Plan command");
            cmd_plan(&config, &profile, format).await
        }
        Some(Command::News { category, language }) => {
            debug!(%category, %language, "main: matched News command");
            cmd_news(&config, category, language).await
        }
        Some(Command::Logs { lines }) => {
            debug!(lines, "main: matched Logs command");
            cmd_logs(lines)
        }
    }
}

/// Generate a plan for a profile file and print it
async fn cmd_plan(config: &Config, profile_path: &Path, format: OutputFormat) -> Result<()> {
    debug!(?profile_path, "cmd_plan: called");
    let content = fs::read_to_string(profile_path)
        .context(format!("Failed to read profile {}", profile_path.display()))?;
    let profile: UserProfile = serde_yaml::from_str(&content).context("Failed to parse profile")?;
    profile.validate().context("Invalid profile")?;

    config.validate()?;
    let gateway = repl::build_gateway(config)?;
    let mut orchestrator = Orchestrator::new(gateway);

    if orchestrator.submit_profile(profile).await? != AppState::Result {
        let message = orchestrator.session().error().unwrap_or_default().to_string();
        return Err(eyre::eyre!(message));
    }

    let session = orchestrator.session();
    let (Some(profile), Some(plan)) = (session.profile(), session.plan()) else {
        return Err(eyre::eyre!("Plan missing after a successful submission"));
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "profile": profile,
                "plan": plan,
                "news": session.news(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print!("{}", render::summary(profile, plan));
            print!("{}", render::plan(plan));
            print!("{}", render::concepts(plan));
            if let Some(news) = session.news() {
                print!("{}", render::news(news, true, false));
            }
        }
    }
    Ok(())
}

/// Fetch one news digest and print it
async fn cmd_news(config: &Config, category: Category, language: Language) -> Result<()> {
    debug!(%category, %language, "cmd_news: called");
    config.validate()?;
    let gateway = repl::build_gateway(config)?;
    let digest = gateway.request_news(category, language).await;
    print!("{}", render::news(&digest, true, false));
    Ok(())
}

/// Print the last `lines` lines of the log file
fn cmd_logs(lines: usize) -> Result<()> {
    debug!(lines, "cmd_logs: called");
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    let file = fs::File::open(&log_path).context("Failed to open log file")?;
    let reader = BufReader::new(file);
    let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    let start = all_lines.len().saturating_sub(lines);
    for line in &all_lines[start..] {
        println!("{}", line);
    }
    Ok(())
}
