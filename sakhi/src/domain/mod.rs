//! Domain types for Arth Sakhi
//!
//! The user profile, the model-produced plan and news digest, and the local
//! cash-flow split drawn in the summary.

mod cashflow;
mod news;
mod plan;
mod profile;

pub use cashflow::{CashFlow, format_amount};
pub use news::{
    DEFAULT_SOURCE_TITLE, LONG_SUMMARY_CHARS, NEWS_UNAVAILABLE, NO_NEWS_FOUND, NewsDigest, NewsSource, SummaryLine,
    dedup_sources,
};
pub use plan::{Explanation, FinancialPlan, RecommendedPlan};
pub use profile::{Category, Language, MAX_AGE, MIN_AGE, ProfileError, RiskLevel, UserProfile};

#[cfg(test)]
pub(crate) use plan::fixtures;
