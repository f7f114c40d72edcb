//! Financial plan produced by the model

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The whole plan, replaced atomically on every generation
///
/// Every field is required: a model answer missing any of them does not
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPlan {
    pub summary: String,
    pub recommended_plan: RecommendedPlan,
    pub explanations: Vec<Explanation>,
    pub steps_to_start: Vec<String>,
    pub warnings: Vec<String>,
}

/// Concrete recommendations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedPlan {
    pub monthly_saving_amount: String,
    pub emergency_fund_plan: String,
    pub investment_plan: String,
    pub insurance_recommendation: String,
    pub govt_schemes: Vec<String>,
}

/// A financial concept explained for this user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub topic: String,
    pub description: String,
}

impl FinancialPlan {
    /// Response schema for structured generation
    ///
    /// Uses the Gemini OpenAPI-subset type names.
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "recommended_plan": {
                    "type": "OBJECT",
                    "properties": {
                        "monthly_saving_amount": { "type": "STRING" },
                        "emergency_fund_plan": { "type": "STRING" },
                        "investment_plan": { "type": "STRING" },
                        "insurance_recommendation": { "type": "STRING" },
                        "govt_schemes": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": [
                        "monthly_saving_amount",
                        "emergency_fund_plan",
                        "investment_plan",
                        "insurance_recommendation",
                        "govt_schemes"
                    ]
                },
                "explanations": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "topic": { "type": "STRING" },
                            "description": { "type": "STRING" }
                        },
                        "required": ["topic", "description"]
                    }
                },
                "steps_to_start": { "type": "ARRAY", "items": { "type": "STRING" } },
                "warnings": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["summary", "recommended_plan", "explanations", "steps_to_start", "warnings"]
        })
    }

    /// Parse the model's JSON answer
    pub fn from_model_text(text: &str) -> serde_json::Result<Self> {
        debug!(text_len = text.len(), "FinancialPlan::from_model_text: called");
        serde_json::from_str(text.trim())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_plan() {
        let text = serde_json::to_string(&fixtures::sample_plan()).unwrap();
        let plan = FinancialPlan::from_model_text(&format!("\n{}\n", text)).unwrap();
        assert_eq!(plan, fixtures::sample_plan());
    }

    #[test]
    fn test_parse_missing_top_level_field_fails() {
        let mut value = serde_json::to_value(fixtures::sample_plan()).unwrap();
        value.as_object_mut().unwrap().remove("warnings");
        let result = FinancialPlan::from_model_text(&value.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_nested_field_fails() {
        let mut value = serde_json::to_value(fixtures::sample_plan()).unwrap();
        value["recommended_plan"].as_object_mut().unwrap().remove("govt_schemes");
        assert!(FinancialPlan::from_model_text(&value.to_string()).is_err());
    }

    #[test]
    fn test_parse_wrong_type_fails() {
        let mut value = serde_json::to_value(fixtures::sample_plan()).unwrap();
        value["steps_to_start"] = serde_json::json!("just one string");
        assert!(FinancialPlan::from_model_text(&value.to_string()).is_err());
    }

    #[test]
    fn test_parse_not_json_fails() {
        assert!(FinancialPlan::from_model_text("Here is your plan: save more").is_err());
        assert!(FinancialPlan::from_model_text("").is_err());
    }

    #[test]
    fn test_schema_requires_all_top_level_fields() {
        let schema = FinancialPlan::response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["summary", "recommended_plan", "explanations", "steps_to_start", "warnings"]
        );
        assert_eq!(schema["properties"]["explanations"]["type"], "ARRAY");
    }
}
