//! Application session and the plan/news orchestrator

mod orchestrator;
mod state;

pub use orchestrator::{AppError, Orchestrator, PLAN_FAILED_MESSAGE};
pub use state::{AppSession, AppState, StateError};
