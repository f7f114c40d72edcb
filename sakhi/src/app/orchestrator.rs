//! Plan/news orchestrator
//!
//! Owns the application session and the open chats. A submission fetches
//! the plan and the news concurrently and waits for both; only the plan
//! decides between Result and Error.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use super::{AppSession, AppState, StateError};
use crate::chat::{ChatSession, ChatSessions, SessionKind};
use crate::domain::{ProfileError, UserProfile};
use crate::gateway::ModelGateway;
use crate::llm::LlmError;

/// Shown in the Error state whatever actually went wrong
pub const PLAN_FAILED_MESSAGE: &str =
    "Failed to generate plan. Please check your internet connection or API Key and try again.";

/// Errors returned to the caller of an orchestrator operation
///
/// Plan failures are not among them: they move the app into the Error
/// state instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid profile: {0}")]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Could not open chat: {0}")]
    Chat(#[from] LlmError),
}

/// Drives the app through its states
pub struct Orchestrator {
    gateway: Arc<ModelGateway>,
    session: AppSession,
    chats: ChatSessions,
}

impl Orchestrator {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        debug!("Orchestrator::new: called");
        Self {
            gateway,
            session: AppSession::new(),
            chats: ChatSessions::new(),
        }
    }

    /// Read-only view of the current session
    pub fn session(&self) -> &AppSession {
        &self.session
    }

    pub fn state(&self) -> AppState {
        self.session.state()
    }

    /// Submit the form and wait for plan and news
    ///
    /// Ends in Result when the plan arrives, otherwise in Error with
    /// `PLAN_FAILED_MESSAGE`; a good news digest is dropped in that case.
    pub async fn submit_profile(&mut self, profile: UserProfile) -> Result<AppState, AppError> {
        debug!(category = %profile.category, "Orchestrator::submit_profile: called");
        profile.validate()?;
        self.session.begin_loading(&profile)?;

        let gateway = self.gateway.clone();
        let (plan, news) = tokio::join!(
            gateway.request_plan(&profile),
            gateway.request_news(profile.category, profile.language)
        );

        match plan {
            Ok(plan) => {
                info!("Submission succeeded");
                self.chats.clear();
                self.session.complete(plan, news)?;
            }
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "Plan generation failed");
                self.session.fail(PLAN_FAILED_MESSAGE)?;
            }
        }
        Ok(self.session.state())
    }

    /// Re-fetch news for the held profile
    ///
    /// Does nothing without a profile. Never changes the app state or the
    /// plan; a failed fetch replaces the digest with the fallback.
    pub async fn refresh_news(&mut self) {
        debug!("Orchestrator::refresh_news: called");
        let Some((category, language)) = self
            .session
            .begin_news_refresh()
            .map(|p| (p.category, p.language))
        else {
            debug!("Orchestrator::refresh_news: no profile held");
            return;
        };

        let digest = self.gateway.request_news(category, language).await;
        self.session.finish_news_refresh(digest);
    }

    /// Clear everything and go back to the form
    pub fn reset(&mut self) -> Result<(), AppError> {
        debug!("Orchestrator::reset: called");
        self.session.reset()?;
        self.chats.clear();
        Ok(())
    }

    /// Leave the Error state for the form
    pub fn retry(&mut self) -> Result<(), AppError> {
        debug!("Orchestrator::retry: called");
        self.session.retry()?;
        Ok(())
    }

    /// Chat session for a persona, built from the current profile and plan
    ///
    /// Repeated calls return the same session until the plan changes.
    pub fn chat(&mut self, kind: SessionKind) -> Result<Arc<ChatSession>, AppError> {
        debug!(?kind, "Orchestrator::chat: called");
        let (Some(profile), Some(plan)) = (self.session.profile(), self.session.plan()) else {
            return Err(StateError {
                action: "open a chat",
                state: self.session.state(),
            }
            .into());
        };

        let context = self.gateway.prompts().chat_context(profile, plan).map_err(LlmError::from)?;
        if let Some(existing) = self.chats.get(kind, &context) {
            debug!("Orchestrator::chat: reusing session");
            return Ok(existing);
        }

        let session = Arc::new(self.gateway.create_session(kind, &context)?);
        info!(session = %session.id(), ?kind, "Chat session opened");
        self.chats.insert(kind, &context, session.clone());
        Ok(session)
    }
}
