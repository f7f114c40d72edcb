//! Profile form
//!
//! Asks for each field in turn. Enter keeps the value shown in brackets;
//! invalid answers are explained and asked again.

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::domain::{Category, Language, MAX_AGE, MIN_AGE, RiskLevel, UserProfile};

/// Outcome of reading one answer
enum Answer {
    Line(String),
    Cancelled,
}

fn ask(rl: &mut DefaultEditor, label: &str, current: &str) -> Result<Answer> {
    let prompt = if current.is_empty() {
        format!("{} ", format!("{}:", label).bright_green())
    } else {
        format!("{} [{}] ", format!("{}:", label).bright_green(), current)
    };
    match rl.readline(&prompt) {
        Ok(line) => Ok(Answer::Line(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Answer::Cancelled),
        Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
    }
}

/// Ask until `parse` accepts the answer; `None` if the user cancels
fn ask_until<T>(
    rl: &mut DefaultEditor,
    label: &str,
    current: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>> {
    loop {
        match ask(rl, label, current)? {
            Answer::Cancelled => return Ok(None),
            Answer::Line(line) => {
                let input = if line.is_empty() { current } else { line.as_str() };
                match parse(input) {
                    Ok(value) => return Ok(Some(value)),
                    Err(message) => println!("  {} {}", "!".red(), message),
                }
            }
        }
    }
}

/// Collect a profile, starting from `defaults`
///
/// Returns `None` when the user presses Ctrl+C or Ctrl+D.
pub fn read_profile(rl: &mut DefaultEditor, defaults: &UserProfile) -> Result<Option<UserProfile>> {
    debug!("read_profile: called");
    println!();
    println!("{}", "Tell us about yourself".bright_cyan().bold());
    println!(
        "{}",
        format!(
            "Categories: {}",
            Category::ALL.map(|c| c.label()).join(", ")
        )
        .dimmed()
    );

    let Some(category) = ask_until(rl, "Category", defaults.category.label(), |s| s.parse::<Category>())? else {
        return Ok(None);
    };
    let Some(monthly_income) = ask_until(rl, "Monthly income (₹)", &amount(defaults.monthly_income), parse_amount)?
    else {
        return Ok(None);
    };
    let Some(monthly_expenses) =
        ask_until(rl, "Monthly expenses (₹)", &amount(defaults.monthly_expenses), parse_amount)?
    else {
        return Ok(None);
    };
    let Some(age) = ask_until(rl, "Age", &defaults.age.to_string(), parse_age)? else {
        return Ok(None);
    };
    let Some(location) = ask_until(rl, "City / location", &defaults.location, |s| required(s, "Location"))? else {
        return Ok(None);
    };

    println!(
        "{}",
        RiskLevel::ALL
            .map(|r| r.description())
            .join(", ")
            .dimmed()
    );
    let Some(risk_level) = ask_until(rl, "Risk level", &defaults.risk_level.to_string(), |s| {
        s.parse::<RiskLevel>()
    })?
    else {
        return Ok(None);
    };
    let Some(goal) = ask_until(rl, "Main goal", &defaults.goal, |s| required(s, "Goal"))? else {
        return Ok(None);
    };

    println!(
        "{}",
        Language::ALL
            .map(|l| format!("{} = {}", l.code(), l.label()))
            .join(", ")
            .dimmed()
    );
    let Some(language) = ask_until(rl, "Language", defaults.language.code(), |s| s.parse::<Language>())? else {
        return Ok(None);
    };

    Ok(Some(UserProfile {
        category,
        monthly_income,
        monthly_expenses,
        age,
        location,
        risk_level,
        goal,
        language,
    }))
}

fn amount(value: f64) -> String {
    crate::domain::format_amount(value)
}

/// Non-negative rupee amount, commas allowed
pub fn parse_amount(input: &str) -> Result<f64, String> {
    let cleaned: String = input.chars().filter(|c| *c != ',' && *c != '₹').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Ok(_) => Err("Amount must be zero or more".to_string()),
        Err(_) => Err(format!("'{}' is not a number", input)),
    }
}

pub fn parse_age(input: &str) -> Result<u8, String> {
    match input.trim().parse::<u8>() {
        Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Ok(age),
        _ => Err(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE)),
    }
}

fn required(input: &str, field: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(trimmed.to_string())
    }
}
