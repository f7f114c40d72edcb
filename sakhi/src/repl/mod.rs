//! Interactive terminal front end for Arth Sakhi
//!
//! Walks the user through the profile form, shows the plan and news, and
//! hosts the two chat assistants, all driven by slash commands.

mod form;
pub mod render;
mod session;

pub use form::{parse_age, parse_amount};
pub use session::{ChatCommand, ReplSession, ResultCommand};

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::debug;

use crate::app::Orchestrator;
use crate::config::Config;
use crate::gateway::ModelGateway;
use crate::llm::create_client;
use crate::prompts::PromptLoader;

/// Build the gateway the interactive flow and the one-shot commands share
///
/// Fails before any network traffic when the credential is missing.
pub fn build_gateway(config: &Config) -> Result<Arc<ModelGateway>> {
    debug!("build_gateway: called");
    let client = create_client(&config.llm).context("Failed to create model client")?;
    let prompts = PromptLoader::new(config.prompts.expanded_dir().as_deref());
    Ok(Arc::new(ModelGateway::new(client, Arc::new(prompts))))
}

/// Run the interactive flow
///
/// This is the main entry point for `sakhi` and `sakhi start`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    debug!("run_interactive: called");
    let gateway = build_gateway(config)?;
    let mut session = ReplSession::new(Orchestrator::new(gateway), config.chat.show_suggestions);
    session.run().await
}
