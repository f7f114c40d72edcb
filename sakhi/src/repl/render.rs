//! Text rendering for the result, news, chat and error views
//!
//! Every function returns a `String` so the REPL decides where it goes and
//! tests can inspect it.

use std::fmt::Write;

use colored::Colorize;

use crate::chat::SessionKind;
use crate::domain::{
    CashFlow, FinancialPlan, LONG_SUMMARY_CHARS, NewsDigest, SummaryLine, UserProfile, format_amount,
};
use crate::llm::{Message, Role};

/// Width of the cash-flow bar in cells
const BAR_WIDTH: usize = 40;

fn heading(title: &str) -> String {
    format!("\n{}\n", title.bright_cyan().bold())
}

/// Summary card with the expenses/savings bar
pub fn summary(profile: &UserProfile, plan: &FinancialPlan) -> String {
    let mut out = heading("Your Financial Summary");
    let _ = writeln!(out, "{}", plan.summary);
    let _ = writeln!(
        out,
        "{}",
        format!("{} | {} | Age {}", profile.category, profile.location, profile.age).dimmed()
    );
    out.push('\n');
    out.push_str(&cash_flow(&CashFlow::from_profile(profile)));
    out
}

/// Horizontal bar split between expenses and potential savings
pub fn cash_flow(flow: &CashFlow) -> String {
    let saved_cells = (flow.savings_share() * BAR_WIDTH as f64).round() as usize;
    let spent_cells = if flow.expenses + flow.savings > 0.0 {
        BAR_WIDTH - saved_cells
    } else {
        0
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}{}",
        "█".repeat(spent_cells).red(),
        "█".repeat(saved_cells).green()
    );
    let _ = writeln!(out, "{}", format!("Expenses: ₹{}", format_amount(flow.expenses)).red());
    let _ = writeln!(
        out,
        "{}",
        format!("Potential Savings: ₹{}", format_amount(flow.savings)).green()
    );
    out
}

/// Savings, investment, insurance and scheme panels plus next steps
pub fn plan(plan: &FinancialPlan) -> String {
    let rec = &plan.recommended_plan;
    let mut out = heading("Savings & Investment");
    let _ = writeln!(out, "{} {}", "Monthly saving:".bold(), rec.monthly_saving_amount);
    let _ = writeln!(out, "{} {}", "Emergency fund:".bold(), rec.emergency_fund_plan);
    let _ = writeln!(out, "{} {}", "Investment plan:".bold(), rec.investment_plan);

    out.push_str(&heading("Insurance & Government Schemes"));
    let _ = writeln!(out, "{} {}", "Insurance:".bold(), rec.insurance_recommendation);
    for scheme in &rec.govt_schemes {
        let _ = writeln!(out, "  • {}", scheme);
    }

    out.push_str(&heading("Steps to Start"));
    for (i, step) in plan.steps_to_start.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }

    out.push_str(&warnings(plan));
    out
}

pub fn warnings(plan: &FinancialPlan) -> String {
    let mut out = heading("Warnings");
    for warning in &plan.warnings {
        let _ = writeln!(out, "  {} {}", "!".yellow().bold(), warning.yellow());
    }
    out
}

/// Concepts the model chose to explain for this user
pub fn concepts(plan: &FinancialPlan) -> String {
    let mut out = heading("Financial Concepts");
    for explanation in &plan.explanations {
        let _ = writeln!(out, "{}", explanation.topic.bright_white().bold());
        let _ = writeln!(out, "  {}", explanation.description);
    }
    out
}

/// News digest; long summaries are cut unless `expanded`
pub fn news(digest: &NewsDigest, expanded: bool, refreshing: bool) -> String {
    let mut out = heading("Latest Financial News");
    if refreshing {
        let _ = writeln!(out, "{}", "Refreshing...".dimmed());
        return out;
    }

    let collapsed = digest.is_long() && !expanded;
    let mut budget = if collapsed { LONG_SUMMARY_CHARS } else { usize::MAX };

    for line in digest.lines() {
        if budget == 0 {
            break;
        }
        let (text, styled) = match line {
            SummaryLine::Blank => {
                out.push('\n');
                continue;
            }
            SummaryLine::Heading(text) => (text.clone(), text.bold().to_string()),
            SummaryLine::ListItem(text) => (text.clone(), format!("  • {}", text)),
            SummaryLine::Paragraph(text) => (text.clone(), text),
        };
        let len = text.chars().count();
        if len > budget {
            let cut: String = text.chars().take(budget).collect();
            let _ = writeln!(out, "{}...", cut);
            budget = 0;
        } else {
            let _ = writeln!(out, "{}", styled);
            budget -= len;
        }
    }

    if collapsed {
        let _ = writeln!(out, "{}", "(type /news to read more)".dimmed());
    }

    if !digest.sources.is_empty() {
        let _ = writeln!(out, "\n{}", "Sources:".bold());
        for source in &digest.sources {
            let _ = writeln!(out, "  {} {}", source.title, source.url.dimmed());
        }
    }
    out
}

/// One chat bubble
pub fn chat_message(kind: SessionKind, message: &Message) -> String {
    match message.role {
        Role::User => format!("{} {}", "You:".bright_green().bold(), message.text),
        Role::Model => {
            let name = match kind {
                SessionKind::Guide => "Sakhi:",
                SessionKind::InvestmentExpert => "Expert:",
            };
            format!("{} {}", name.bright_blue().bold(), message.text)
        }
    }
}

/// The Error view
pub fn error(message: &str) -> String {
    format!(
        "\n{} {}\nType {} to go back to the form or {} to exit.\n",
        "Something went wrong.".red().bold(),
        message,
        "/retry".yellow(),
        "/quit".yellow()
    )
}
