//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::{Path, PathBuf};

use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use tracing::{debug, info};

use super::{PromptError, embedded};
use crate::chat::SessionKind;
use crate::domain::{FinancialPlan, UserProfile, format_amount};

/// Values for the `news` template
#[derive(Debug, Serialize)]
struct NewsContext<'a> {
    category: &'a str,
    language: &'a str,
}

/// Values for the persona templates
#[derive(Debug, Serialize)]
struct SessionContext<'a> {
    context: &'a str,
}

/// Profile fields pre-formatted for the `context` template
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    category: &'a str,
    age: u8,
    monthly_income: String,
    monthly_expenses: String,
    location: &'a str,
    risk_level: String,
    goal: &'a str,
    language: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatContext<'a> {
    profile: ProfileView<'a>,
    plan: &'a FinancialPlan,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (`prompts.dir` in the config)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates in `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = override_dir.filter(|dir| dir.is_dir()).map(Path::to_path_buf);
        if override_dir.is_none() {
            debug!("PromptLoader::new: no usable override directory");
        }

        // Prompts are plain text, not HTML
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(no_escape);

        Self { hbs, override_dir }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self::new(None)
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{override_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
            debug!(?path, "PromptLoader::load_template: not found in override directory");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Render a template with the given context
    fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String, PromptError> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);
        self.hbs
            .render_template(&template, context)
            .map(|rendered| rendered.trim().to_string())
            .map_err(|e| PromptError::Render {
                name: template_name.to_string(),
                message: e.to_string(),
            })
    }

    /// System instruction for plan generation
    pub fn plan_system(&self) -> Result<String, PromptError> {
        debug!("PromptLoader::plan_system: called");
        self.load_template("plan-system").map(|t| t.trim().to_string())
    }

    /// Grounded news query for a category, answered in `language`
    pub fn news(&self, category: &str, language: &str) -> Result<String, PromptError> {
        debug!(%category, %language, "PromptLoader::news: called");
        self.render("news", &NewsContext { category, language })
    }

    /// Persona system instruction with the user's context embedded
    pub fn session_system(&self, kind: SessionKind, context: &str) -> Result<String, PromptError> {
        debug!(?kind, context_len = context.len(), "PromptLoader::session_system: called");
        self.render(kind.template_name(), &SessionContext { context })
    }

    /// Profile and plan summary handed to both chat personas
    pub fn chat_context(&self, profile: &UserProfile, plan: &FinancialPlan) -> Result<String, PromptError> {
        debug!("PromptLoader::chat_context: called");
        let view = ProfileView {
            category: profile.category.label(),
            age: profile.age,
            monthly_income: format_amount(profile.monthly_income),
            monthly_expenses: format_amount(profile.monthly_expenses),
            location: &profile.location,
            risk_level: profile.risk_level.to_string(),
            goal: &profile.goal,
            language: profile.language.code(),
        };
        self.render("context", &ChatContext { profile: view, plan })
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Language, RiskLevel, fixtures};
    use tempfile::TempDir;

    fn farmer() -> UserProfile {
        UserProfile {
            category: Category::Farmer,
            monthly_income: 20000.0,
            monthly_expenses: 25000.0,
            age: 42,
            location: "Nashik".to_string(),
            risk_level: RiskLevel::Low,
            goal: "Buy a tractor".to_string(),
            language: Language::Mr,
        }
    }

    #[test]
    fn test_plan_system_is_raw_instruction() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.plan_system().unwrap();
        assert!(prompt.starts_with("You are Arth Sakhi"));
        assert!(prompt.contains("\"recommended_plan\""));
    }

    #[test]
    fn test_news_renders_category_and_language() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.news("Small Business Owner", "hi").unwrap();
        assert!(prompt.contains("specifically for a 'Small Business Owner'"));
        assert!(prompt.contains("Respond in the language code: 'hi'"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_chat_context_contents() {
        let loader = PromptLoader::embedded_only();
        let context = loader.chat_context(&farmer(), &fixtures::sample_plan()).unwrap();

        assert!(context.starts_with("User Profile:"));
        assert!(context.contains("- Role/Category: Farmer"));
        assert!(context.contains("- Age: 42"));
        assert!(context.contains("- Monthly Income: 20000"));
        assert!(context.contains("- Monthly Expenses: 25000"));
        assert!(context.contains("- Risk Level: Low"));
        assert!(context.contains("- Language: mr"));
        assert!(context.contains("You spend more than you earn right now."));
        assert!(context.contains("Recommended Savings: ₹0 until expenses drop"));
        assert!(context.contains("Investment Strategy: Recurring deposit"));
    }

    #[test]
    fn test_session_system_does_not_escape() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .session_system(SessionKind::Guide, "Goal: \"save\" & <grow>")
            .unwrap();
        assert!(prompt.contains("Goal: \"save\" & <grow>"));
        assert!(prompt.contains("friendly and knowledgeable AI financial guide"));

        let expert = loader.session_system(SessionKind::InvestmentExpert, "ctx").unwrap();
        assert!(expert.contains("Investment Action Expert"));
        assert!(expert.contains("ctx"));
    }

    #[test]
    fn test_override_directory_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("news.pmt"), "News for {{category}} in {{language}}").unwrap();

        let loader = PromptLoader::new(Some(dir.path()));
        assert_eq!(loader.news("Farmer", "en").unwrap(), "News for Farmer in en");

        // Templates missing from the directory still come from the binary
        assert!(loader.plan_system().unwrap().contains("Arth Sakhi"));
    }

    #[test]
    fn test_missing_override_directory_is_ignored() {
        let loader = PromptLoader::new(Some(Path::new("/nonexistent/arthsakhi/prompts")));
        assert!(loader.news("Farmer", "en").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(matches!(
            loader.load_template("nonexistent-template"),
            Err(PromptError::NotFound(_))
        ));
    }
}
