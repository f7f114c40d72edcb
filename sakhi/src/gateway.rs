//! Model gateway
//!
//! The three kinds of model interaction the app needs: a schema-constrained
//! plan, a search-grounded news digest and persona chat sessions. Plan
//! failures propagate; news failures degrade to a fallback digest.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chat::{ChatSession, SessionKind};
use crate::domain::{Category, FinancialPlan, Language, NewsDigest, UserProfile};
use crate::llm::{GenerateRequest, LlmError, Message, ModelClient};
use crate::prompts::PromptLoader;

/// Entry point for every model call
pub struct ModelGateway {
    client: Arc<dyn ModelClient>,
    prompts: Arc<PromptLoader>,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn ModelClient>, prompts: Arc<PromptLoader>) -> Self {
        debug!("ModelGateway::new: called");
        Self { client, prompts }
    }

    pub fn prompts(&self) -> &PromptLoader {
        &self.prompts
    }

    /// Generate a plan for the profile
    ///
    /// Fails with `LlmError::Generation` when the answer is empty or does
    /// not match the plan schema. No partial plan is ever returned.
    pub async fn request_plan(&self, profile: &UserProfile) -> Result<FinancialPlan, LlmError> {
        debug!(category = %profile.category, "ModelGateway::request_plan: called");
        let prompt = profile.to_prompt_json()?;
        let request = GenerateRequest::structured(
            self.prompts.plan_system()?,
            vec![Message::user(prompt)],
            FinancialPlan::response_schema(),
        );

        let response = self.client.generate(request).await?;
        let text = response
            .non_blank_text()
            .ok_or_else(|| LlmError::Generation("Empty response from model".to_string()))?;

        let plan = FinancialPlan::from_model_text(text)
            .map_err(|e| LlmError::Generation(format!("Plan did not match schema: {}", e)))?;
        info!(
            explanations = plan.explanations.len(),
            steps = plan.steps_to_start.len(),
            "Plan generated"
        );
        Ok(plan)
    }

    /// Fetch recent news for a category
    ///
    /// Never fails: any error is logged and replaced with the fallback digest.
    pub async fn request_news(&self, category: Category, language: Language) -> NewsDigest {
        debug!(%category, %language, "ModelGateway::request_news: called");
        match self.fetch_news(category, language).await {
            Ok(digest) => {
                info!(sources = digest.sources.len(), "News digest fetched");
                digest
            }
            Err(e) => {
                warn!(error = %e, "News request failed, using fallback digest");
                NewsDigest::unavailable()
            }
        }
    }

    async fn fetch_news(&self, category: Category, language: Language) -> Result<NewsDigest, LlmError> {
        let prompt = self.prompts.news(category.label(), language.code())?;
        let request = GenerateRequest::grounded(String::new(), vec![Message::user(prompt)]);
        let response = self.client.generate(request).await?;
        Ok(NewsDigest::from_grounded(response.non_blank_text(), &response.grounding))
    }

    /// Open a chat session for a persona, pinned to `context`
    ///
    /// Only renders the system instruction; no call is made until the first
    /// message.
    pub fn create_session(&self, kind: SessionKind, context: &str) -> Result<ChatSession, LlmError> {
        debug!(?kind, context_len = context.len(), "ModelGateway::create_session: called");
        let system_instruction = self.prompts.session_system(kind, context)?;
        Ok(ChatSession::new(kind, system_instruction, self.client.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;
    use crate::llm::client::mock::MockModelClient;
    use crate::llm::{GenerateResponse, GroundingSource, ResponseMode};

    fn gateway(client: Arc<MockModelClient>) -> ModelGateway {
        ModelGateway::new(client, Arc::new(PromptLoader::embedded_only()))
    }

    fn profile() -> UserProfile {
        UserProfile {
            category: Category::Farmer,
            monthly_income: 20000.0,
            monthly_expenses: 25000.0,
            location: "Nashik".to_string(),
            goal: "Buy a tractor".to_string(),
            ..Default::default()
        }
    }

    fn plan_json() -> String {
        serde_json::to_string(&fixtures::sample_plan()).unwrap()
    }

    #[tokio::test]
    async fn test_request_plan_success() {
        let client = Arc::new(MockModelClient::new());
        client.push_structured(Ok(GenerateResponse::from_text(plan_json())));
        let gateway = gateway(client.clone());

        let plan = gateway.request_plan(&profile()).await.unwrap();
        assert_eq!(plan, fixtures::sample_plan());

        let request = &client.requests()[0];
        assert!(request.system_instruction.starts_with("You are Arth Sakhi"));
        assert!(matches!(request.mode, ResponseMode::Structured { .. }));
        let sent: serde_json::Value = serde_json::from_str(request.last_user_text().unwrap()).unwrap();
        assert_eq!(sent["category"], "Farmer");
        assert_eq!(sent["monthly_expenses"], 25000.0);
    }

    #[tokio::test]
    async fn test_request_plan_empty_is_generation_error() {
        let client = Arc::new(MockModelClient::new());
        client.push_structured(Ok(GenerateResponse::default()));
        let result = gateway(client).request_plan(&profile()).await;
        assert!(matches!(result, Err(LlmError::Generation(_))));
    }

    #[tokio::test]
    async fn test_request_plan_malformed_is_generation_error() {
        let client = Arc::new(MockModelClient::new());
        client.push_structured(Ok(GenerateResponse::from_text(r#"{"summary": "only this"}"#)));
        let result = gateway(client).request_plan(&profile()).await;
        assert!(matches!(result, Err(LlmError::Generation(_))));
    }

    #[tokio::test]
    async fn test_request_plan_propagates_transport_error() {
        let client = Arc::new(MockModelClient::new());
        client.push_structured(Err(LlmError::ApiError {
            status: 500,
            message: "internal".to_string(),
        }));
        let err = gateway(client).request_plan(&profile()).await.unwrap_err();
        assert_eq!(err.kind(), crate::llm::ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_request_news_dedups_sources() {
        let client = Arc::new(MockModelClient::new());
        client.push_grounded(Ok(GenerateResponse {
            text: Some("- PM-Kisan 19th instalment released".to_string()),
            grounding: vec![
                GroundingSource::new(Some("PIB"), "https://pib.example/1"),
                GroundingSource::new(None, "https://news.example/2"),
                GroundingSource::new(Some("PIB again"), "https://pib.example/1"),
            ],
            ..Default::default()
        }));
        let gateway = gateway(client.clone());

        let digest = gateway.request_news(Category::Farmer, Language::Hi).await;

        assert_eq!(digest.summary, "- PM-Kisan 19th instalment released");
        assert_eq!(digest.sources.len(), 2);
        assert_eq!(digest.sources[0].title, "PIB");
        assert_eq!(digest.sources[1].title, "Source Link");

        let request = &client.requests()[0];
        assert_eq!(request.mode, ResponseMode::Grounded);
        let prompt = request.last_user_text().unwrap();
        assert!(prompt.contains("'Farmer'"));
        assert!(prompt.contains("'hi'"));
    }

    #[tokio::test]
    async fn test_request_news_empty_text() {
        let client = Arc::new(MockModelClient::new());
        client.push_grounded(Ok(GenerateResponse::default()));
        let digest = gateway(client).request_news(Category::Student, Language::En).await;
        assert_eq!(digest.summary, "No news found.");
    }

    #[tokio::test]
    async fn test_request_news_failure_degrades() {
        let client = Arc::new(MockModelClient::new());
        client.push_grounded(Err(LlmError::Stream("reset".to_string())));
        let digest = gateway(client).request_news(Category::Student, Language::En).await;
        assert_eq!(digest, NewsDigest::unavailable());
    }

    #[tokio::test]
    async fn test_create_session_makes_no_call() {
        let client = Arc::new(MockModelClient::new());
        let gateway = gateway(client.clone());

        let session = gateway
            .create_session(SessionKind::InvestmentExpert, "User Profile: test")
            .unwrap();

        assert_eq!(client.call_count(), 0);
        assert!(session.system_instruction().contains("User Profile: test"));
        assert!(session.system_instruction().contains("Investment Action Expert"));
    }
}
