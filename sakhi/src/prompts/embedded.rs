//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Plan generation system instruction
pub const PLAN_SYSTEM: &str = include_str!("../../prompts/plan-system.pmt");

/// Grounded news query
pub const NEWS: &str = include_str!("../../prompts/news.pmt");

/// Guide persona system instruction
pub const GUIDE_SYSTEM: &str = include_str!("../../prompts/guide-system.pmt");

/// Investment expert persona system instruction
pub const INVESTMENT_SYSTEM: &str = include_str!("../../prompts/investment-system.pmt");

/// Profile and plan context shared by both chat personas
pub const CONTEXT: &str = include_str!("../../prompts/context.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "plan-system" => Some(PLAN_SYSTEM),
        "news" => Some(NEWS),
        "guide-system" => Some(GUIDE_SYSTEM),
        "investment-system" => Some(INVESTMENT_SYSTEM),
        "context" => Some(CONTEXT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
