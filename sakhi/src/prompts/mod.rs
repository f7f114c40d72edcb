//! Prompt Template System
//!
//! Loads and renders the `.pmt` (prompt template) files behind every model
//! call: the plan system instruction, the news query, the two chat personas
//! and the profile context they share.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override, when configured)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

use thiserror::Error;

pub use loader::PromptLoader;

/// Errors from loading or rendering a template
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Failed to read prompt {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },
}
