//! User profile collected by the form

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Youngest age the form accepts
pub const MIN_AGE: u8 = 15;

/// Oldest age the form accepts
pub const MAX_AGE: u8 = 100;

/// Errors from profile validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("Age must be between 15 and 100, got {0}")]
    AgeOutOfRange(u8),

    #[error("{field} must be a non-negative number")]
    NegativeAmount { field: &'static str },

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Who the user is, which drives scheme eligibility and examples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    Student,
    #[serde(rename = "First Job Employee")]
    FirstJobEmployee,
    Homemaker,
    Farmer,
    #[serde(rename = "Small Business Owner")]
    SmallBusinessOwner,
    #[serde(rename = "Senior Citizen")]
    SeniorCitizen,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Student,
        Category::FirstJobEmployee,
        Category::Homemaker,
        Category::Farmer,
        Category::SmallBusinessOwner,
        Category::SeniorCitizen,
        Category::Other,
    ];

    /// Label shown to the user and sent to the model
    pub fn label(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::FirstJobEmployee => "First Job Employee",
            Self::Homemaker => "Homemaker",
            Self::Farmer => "Farmer",
            Self::SmallBusinessOwner => "Small Business Owner",
            Self::SeniorCitizen => "Senior Citizen",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == normalized)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Appetite for investment risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Longer description for the form
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low (Safe, No Loss)",
            Self::Medium => "Medium (Balanced)",
            Self::High => "High (Growth, High Risk)",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Language the model should answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Mr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Mr];

    /// Language code sent to the model
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Mr => "mr",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "Hindi (हिंदी)",
            Self::Mr => "Marathi (मराठी)",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "hi" | "hindi" => Ok(Self::Hi),
            "mr" | "marathi" => Ok(Self::Mr),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

/// Everything the user tells us about themselves
///
/// Field order matches the JSON the model receives as its prompt. Missing
/// fields in a profile file take the form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub category: Category,
    #[serde(serialize_with = "whole_amount")]
    pub monthly_income: f64,
    #[serde(serialize_with = "whole_amount")]
    pub monthly_expenses: f64,
    pub age: u8,
    pub location: String,
    pub risk_level: RiskLevel,
    pub goal: String,
    pub language: Language,
}

impl Default for UserProfile {
    /// Form defaults; location and goal still have to be filled in
    fn default() -> Self {
        Self {
            category: Category::Student,
            monthly_income: 25000.0,
            monthly_expenses: 15000.0,
            age: 25,
            location: String::new(),
            risk_level: RiskLevel::Low,
            goal: String::new(),
            language: Language::En,
        }
    }
}

impl UserProfile {
    /// Check the form constraints
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ProfileError::AgeOutOfRange(self.age));
        }
        if !is_amount(self.monthly_income) {
            return Err(ProfileError::NegativeAmount {
                field: "Monthly income",
            });
        }
        if !is_amount(self.monthly_expenses) {
            return Err(ProfileError::NegativeAmount {
                field: "Monthly expenses",
            });
        }
        if self.location.trim().is_empty() {
            return Err(ProfileError::MissingField("Location"));
        }
        if self.goal.trim().is_empty() {
            return Err(ProfileError::MissingField("Goal"));
        }
        Ok(())
    }

    /// Pretty JSON handed to the model as the plan prompt
    pub fn to_prompt_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whole rupee amounts go out as JSON integers (`25000`, not `25000.0`)
fn whole_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn is_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
