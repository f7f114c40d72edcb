//! Top-level application state
//!
//! ```text
//! Form --submit--> Loading --plan ok--> Result --reset--> Form
//!                          \--plan failed--> Error --retry/reset--> Form
//! ```

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{FinancialPlan, NewsDigest, UserProfile};

/// Which screen the app is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Form,
    Loading,
    Result,
    Error,
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Loading => write!(f, "loading"),
            Self::Result => write!(f, "result"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A transition the current state does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} in {state} state")]
pub struct StateError {
    pub action: &'static str,
    pub state: AppState,
}

/// Everything the app holds between screens
///
/// `profile`, `plan` and `news` are set together on a successful
/// submission and cleared together on reset. A rejected transition leaves
/// every field untouched.
#[derive(Debug, Clone)]
pub struct AppSession {
    state: AppState,
    profile: Option<UserProfile>,
    plan: Option<FinancialPlan>,
    news: Option<NewsDigest>,
    error: Option<String>,
    refreshing_news: bool,
    /// Last submitted profile, used to pre-fill the form after a failure
    draft: Option<UserProfile>,
}

impl Default for AppSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSession {
    pub fn new() -> Self {
        Self {
            state: AppState::Form,
            profile: None,
            plan: None,
            news: None,
            error: None,
            refreshing_news: false,
            draft: None,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn plan(&self) -> Option<&FinancialPlan> {
        self.plan.as_ref()
    }

    pub fn news(&self) -> Option<&NewsDigest> {
        self.news.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_refreshing_news(&self) -> bool {
        self.refreshing_news
    }

    pub fn draft(&self) -> Option<&UserProfile> {
        self.draft.as_ref()
    }

    fn require(&self, action: &'static str, allowed: &[AppState]) -> Result<(), StateError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StateError {
                action,
                state: self.state,
            })
        }
    }

    fn set_state(&mut self, next: AppState) {
        info!(from = %self.state, to = %next, "App state transition");
        self.state = next;
    }

    /// Form -> Loading
    pub fn begin_loading(&mut self, profile: &UserProfile) -> Result<(), StateError> {
        debug!("AppSession::begin_loading: called");
        self.require("submit a profile", &[AppState::Form])?;
        self.draft = Some(profile.clone());
        self.error = None;
        self.set_state(AppState::Loading);
        Ok(())
    }

    /// Loading -> Result, storing plan and news together
    pub fn complete(&mut self, plan: FinancialPlan, news: NewsDigest) -> Result<(), StateError> {
        debug!("AppSession::complete: called");
        self.require("show a result", &[AppState::Loading])?;
        self.profile = self.draft.clone();
        self.plan = Some(plan);
        self.news = Some(news);
        self.set_state(AppState::Result);
        Ok(())
    }

    /// Loading -> Error; nothing from the attempt is kept
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StateError> {
        debug!("AppSession::fail: called");
        self.require("fail a submission", &[AppState::Loading])?;
        self.profile = None;
        self.plan = None;
        self.news = None;
        self.error = Some(message.into());
        self.set_state(AppState::Error);
        Ok(())
    }

    /// Error -> Form; the user resubmits from there
    pub fn retry(&mut self) -> Result<(), StateError> {
        debug!("AppSession::retry: called");
        self.require("retry", &[AppState::Error])?;
        self.error = None;
        self.set_state(AppState::Form);
        Ok(())
    }

    /// Result, Error or Form -> Form with everything cleared
    pub fn reset(&mut self) -> Result<(), StateError> {
        debug!("AppSession::reset: called");
        self.require("reset", &[AppState::Form, AppState::Result, AppState::Error])?;
        *self = Self::new();
        info!("App session reset");
        Ok(())
    }

    /// Mark a news refresh as started; returns what to fetch
    ///
    /// `None` when there is no profile to refresh for.
    pub fn begin_news_refresh(&mut self) -> Option<&UserProfile> {
        debug!("AppSession::begin_news_refresh: called");
        let profile = self.profile.as_ref()?;
        self.refreshing_news = true;
        Some(profile)
    }

    /// Replace the digest and clear the refreshing flag
    pub fn finish_news_refresh(&mut self, news: NewsDigest) {
        debug!("AppSession::finish_news_refresh: called");
        if self.profile.is_some() {
            self.news = Some(news);
        }
        self.refreshing_news = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;

    fn profile() -> UserProfile {
        UserProfile {
            location: "Pune".to_string(),
            goal: "Emergency fund".to_string(),
            ..Default::default()
        }
    }

    fn news() -> NewsDigest {
        NewsDigest {
            summary: "Repo rate unchanged".to_string(),
            sources: vec![],
        }
    }

    fn in_result() -> AppSession {
        let mut session = AppSession::new();
        session.begin_loading(&profile()).unwrap();
        session.complete(fixtures::sample_plan(), news()).unwrap();
        session
    }

    #[test]
    fn test_happy_path() {
        let session = in_result();
        assert_eq!(session.state(), AppState::Result);
        assert_eq!(session.profile(), Some(&profile()));
        assert!(session.plan().is_some());
        assert_eq!(session.news(), Some(&news()));
    }

    #[test]
    fn test_failure_keeps_nothing_but_draft() {
        let mut session = AppSession::new();
        session.begin_loading(&profile()).unwrap();
        session.fail("nope").unwrap();

        assert_eq!(session.state(), AppState::Error);
        assert_eq!(session.error(), Some("nope"));
        assert!(session.profile().is_none());
        assert!(session.plan().is_none());
        assert!(session.news().is_none());
        assert_eq!(session.draft(), Some(&profile()));

        session.retry().unwrap();
        assert_eq!(session.state(), AppState::Form);
        assert!(session.error().is_none());
        assert_eq!(session.draft(), Some(&profile()));
    }

    #[test]
    fn test_only_form_enters_loading() {
        let mut session = in_result();
        let err = session.begin_loading(&profile()).unwrap_err();
        assert_eq!(err.state, AppState::Result);
        assert_eq!(session.state(), AppState::Result);
        assert!(session.plan().is_some());

        let mut loading = AppSession::new();
        loading.begin_loading(&profile()).unwrap();
        assert!(loading.begin_loading(&profile()).is_err());
        assert_eq!(loading.state(), AppState::Loading);
    }

    #[test]
    fn test_loading_has_no_user_exit() {
        let mut session = AppSession::new();
        session.begin_loading(&profile()).unwrap();
        assert!(session.reset().is_err());
        assert!(session.retry().is_err());
        assert_eq!(session.state(), AppState::Loading);
    }

    #[test]
    fn test_retry_only_from_error() {
        let mut session = in_result();
        assert!(session.retry().is_err());
        assert!(AppSession::new().retry().is_err());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = in_result();
        session.begin_news_refresh();
        session.reset().unwrap();

        assert_eq!(session.state(), AppState::Form);
        assert!(session.profile().is_none());
        assert!(session.plan().is_none());
        assert!(session.news().is_none());
        assert!(session.draft().is_none());
        assert!(!session.is_refreshing_news());
    }

    #[test]
    fn test_news_refresh_without_profile_is_noop() {
        let mut session = AppSession::new();
        assert!(session.begin_news_refresh().is_none());
        assert!(!session.is_refreshing_news());

        session.finish_news_refresh(news());
        assert!(session.news().is_none());
    }

    #[test]
    fn test_news_refresh_replaces_digest() {
        let mut session = in_result();
        assert!(session.begin_news_refresh().is_some());
        assert!(session.is_refreshing_news());

        session.finish_news_refresh(NewsDigest::unavailable());
        assert!(!session.is_refreshing_news());
        assert_eq!(session.news(), Some(&NewsDigest::unavailable()));
        assert_eq!(session.state(), AppState::Result);
    }

    #[test]
    fn test_state_error_message() {
        let err = StateError {
            action: "retry",
            state: AppState::Result,
        };
        assert_eq!(err.to_string(), "Cannot retry in result state");
    }
}
