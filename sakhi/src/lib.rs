//! Arth Sakhi - personal financial guide for everyday Indians
//!
//! Turns a short profile (category, income, expenses, age, location, risk
//! appetite, goal, language) into a personalised money plan, a digest of
//! recent finance news, and two chat assistants that know the plan.
//!
//! # Modules
//!
//! - [`llm`] - Model client trait and the Gemini implementation
//! - [`gateway`] - Plan, news and chat-session requests
//! - [`chat`] - Chat sessions with client-side transcripts
//! - [`app`] - Application state machine and plan/news orchestrator
//! - [`domain`] - Profile, plan and news types
//! - [`prompts`] - Handlebars prompt templates
//! - [`config`] - Configuration types and loading
//! - [`repl`] - Interactive terminal front end
//! - [`cli`] - Command-line interface

pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod llm;
pub mod prompts;
pub mod repl;

// Re-export commonly used types
pub use app::{AppError, AppSession, AppState, Orchestrator, StateError};
pub use chat::{ChatSession, QuickAction, SessionKind};
pub use config::{Config, LlmConfig};
pub use domain::{Category, FinancialPlan, Language, NewsDigest, RiskLevel, UserProfile};
pub use gateway::ModelGateway;
pub use llm::{GeminiClient, LlmError, ModelClient, create_client};
pub use prompts::PromptLoader;
