//! Session personas and quick actions

use tracing::debug;

/// Which assistant a chat session talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Mentor that explains the plan and builds roadmaps
    Guide,
    /// Action-oriented expert behind the investment journey
    InvestmentExpert,
}

impl SessionKind {
    /// Prompt template holding this persona's system instruction
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Guide => "guide-system",
            Self::InvestmentExpert => "investment-system",
        }
    }

    /// Heading shown above the conversation
    pub fn title(&self) -> &'static str {
        match self {
            Self::Guide => "Arth Sakhi Guide",
            Self::InvestmentExpert => "Investment Journey",
        }
    }

    /// First model message; displayed but never sent
    pub fn greeting(&self) -> &'static str {
        match self {
            Self::Guide => {
                "Namaste! I am your personal guide. Ask me anything about your plan or request a roadmap to start your journey."
            }
            Self::InvestmentExpert => {
                "Welcome to your Investment Cockpit. I am here to help you take action. Select a goal below to get specific recommendations and fund names."
            }
        }
    }

    /// Reply appended when a free-text send fails
    pub fn apology(&self) -> &'static str {
        match self {
            Self::Guide => "Sorry, I'm having trouble connecting right now. Please try again.",
            Self::InvestmentExpert => "Connection error. Please try again.",
        }
    }

    /// Starter prompts offered while the conversation is empty
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::Guide => &["Create a 6-month roadmap", "Explain SIP in detail", "How to save tax?"],
            Self::InvestmentExpert => &[],
        }
    }
}

/// Canned investment-journey requests
///
/// The user sees only the short label; the model receives the detailed
/// prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Sip,
    Insurance,
    Tax,
}

/// Reply appended when a quick action fails
pub(crate) const QUICK_ACTION_FAILED: &str = "Error fetching specific advice.";

impl QuickAction {
    pub const ALL: [QuickAction; 3] = [QuickAction::Sip, QuickAction::Insurance, QuickAction::Tax];

    /// Stable identifier, also the REPL command name
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Insurance => "insurance",
            Self::Tax => "tax",
        }
    }

    /// Look up an action by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        debug!(%id, "QuickAction::from_id: called");
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Card title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Sip => "Start First SIP",
            Self::Insurance => "Get Best Insurance",
            Self::Tax => "Save Tax (ELSS/PPF)",
        }
    }

    /// Detailed request sent to the model
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Sip => {
                "I want to start my first SIP. Based on my risk profile, suggest 3 specific mutual funds (with names like HDFC/SBI/etc), explain why they fit me, and list the exact steps to buy them online."
            }
            Self::Insurance => {
                "I need insurance. Analyze my age and income. Suggest specifically: 1) How much Term Cover I need, 2) How much Health Cover, and 3) What specific features (riders) I should look for when comparing policies."
            }
            Self::Tax => {
                "Help me save tax. Compare ELSS Mutual Funds vs PPF for me. Suggest 2 top performing ELSS funds currently and explain the lock-in rules."
            }
        }
    }

    /// What the visible history shows for this action
    pub fn label(&self) -> String {
        format!("Selected: {}", self.title())
    }
}
