//! News digest produced by a grounded search

use serde::{Deserialize, Serialize};

use crate::llm::GroundingSource;

/// Summary shown when the news call fails
pub const NEWS_UNAVAILABLE: &str = "Unable to load news at this time.";

/// Summary used when the model answered with no text at all
pub const NO_NEWS_FOUND: &str = "No news found.";

/// Title for citations the service returned without one
pub const DEFAULT_SOURCE_TITLE: &str = "Source Link";

/// Summaries longer than this are collapsed behind "read more"
pub const LONG_SUMMARY_CHARS: usize = 400;

/// A cited article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSource {
    pub title: String,
    pub url: String,
}

/// Recent news relevant to the user's category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub summary: String,
    pub sources: Vec<NewsSource>,
}

/// One display line of a news summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryLine {
    Blank,
    Heading(String),
    ListItem(String),
    Paragraph(String),
}

impl NewsDigest {
    /// Digest returned in place of an error
    pub fn unavailable() -> Self {
        Self {
            summary: NEWS_UNAVAILABLE.to_string(),
            sources: Vec::new(),
        }
    }

    /// Build a digest from raw model output
    pub fn from_grounded(text: Option<&str>, grounding: &[GroundingSource]) -> Self {
        Self {
            summary: text.unwrap_or(NO_NEWS_FOUND).to_string(),
            sources: dedup_sources(grounding),
        }
    }

    /// Whether the summary should start collapsed
    pub fn is_long(&self) -> bool {
        self.summary.chars().count() > LONG_SUMMARY_CHARS
    }

    /// Split the summary into display lines, stripping list/heading markers
    pub fn lines(&self) -> Vec<SummaryLine> {
        self.summary.lines().map(classify_line).collect()
    }
}

/// Turn citations into sources, keeping the first occurrence of each URL
pub fn dedup_sources(grounding: &[GroundingSource]) -> Vec<NewsSource> {
    let mut sources: Vec<NewsSource> = Vec::with_capacity(grounding.len());
    for chunk in grounding {
        if sources.iter().any(|s| s.url == chunk.uri) {
            continue;
        }
        sources.push(NewsSource {
            title: chunk
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_TITLE.to_string()),
            url: chunk.uri.clone(),
        });
    }
    sources
}

fn classify_line(line: &str) -> SummaryLine {
    let clean = line.trim();
    if clean.is_empty() {
        return SummaryLine::Blank;
    }

    let is_heading = clean.starts_with('#') || clean.starts_with("**");
    let is_list_item = clean.starts_with('-') || clean.starts_with('•') || starts_with_ordinal(clean);
    let text = strip_markers(clean).to_string();

    if is_heading {
        SummaryLine::Heading(text)
    } else if is_list_item {
        SummaryLine::ListItem(text)
    } else {
        SummaryLine::Paragraph(text)
    }
}

/// `1.`, `12.` and so on
fn starts_with_ordinal(line: &str) -> bool {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Drop leading `-`, `•`, `#`, `*` runs and the whitespace after them
fn strip_markers(line: &str) -> &str {
    line.trim_start_matches(['-', '•', '#', '*']).trim_start()
}
