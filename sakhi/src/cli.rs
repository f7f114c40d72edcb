//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{Category, Language};

/// Arth Sakhi - personal financial guide for everyday Indians
#[derive(Parser)]
#[command(
    name = "sakhi",
    about = "Personalised money plans, finance news and guidance from Gemini",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `start`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fill in the form and explore your plan interactively
    Start,

    /// Generate a plan and news digest for a profile file
    Plan {
        /// YAML file with the profile fields
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Fetch the latest news for a category
    News {
        /// User category, e.g. "Farmer" or "small-business-owner"
        #[arg(short, long, default_value = "Student")]
        category: Category,

        /// Answer language (en, hi, mr)
        #[arg(short, long, default_value = "en")]
        language: Language,
    },

    /// Show the log file
    Logs {
        /// Number of lines to show
        #[arg(short, long, default_value = "50")]
        lines: usize,
    },
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("arthsakhi")
        .join("logs")
        .join("arthsakhi.log")
}

/// Generate the after_help text with credential status and log location
pub fn generate_after_help(api_key_env: &str) -> String {
    debug!(%api_key_env, "generate_after_help: called");
    let key_set = std::env::var(api_key_env).is_ok_and(|v| !v.trim().is_empty());
    let icon = if key_set { "\u{2705}" } else { "\u{274C}" };
    let status = if key_set { "set" } else { "not set" };

    let mut help = String::new();
    help.push_str("Credentials:\n");
    help.push_str(&format!("  {} {:<10} {}\n", icon, api_key_env, status));
    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for one-shot commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_start() {
        let cli = Cli::try_parse_from(["sakhi"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_news_command() {
        let cli = Cli::try_parse_from(["sakhi", "news", "--category", "senior-citizen", "--language", "hi"]).unwrap();
        match cli.command {
            Some(Command::News { category, language }) => {
                assert_eq!(category, Category::SeniorCitizen);
                assert_eq!(language, Language::Hi);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from(["sakhi", "-v", "plan", "--profile", "me.yml", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Plan { profile, format }) => {
                assert_eq!(profile, PathBuf::from("me.yml"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("arthsakhi/logs/arthsakhi.log"));
    }
}
