//! REPL session management

use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{form, render};
use crate::app::{AppError, AppState, Orchestrator};
use crate::chat::{ChatSession, QuickAction, SessionKind};
use crate::domain::UserProfile;
use crate::llm::{Message, StreamChunk};

/// Commands accepted on the result screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCommand {
    Refresh,
    Guide,
    Journey,
    Concepts,
    Plan,
    News,
    Reset,
    Retry,
    Help,
    Quit,
}

impl ResultCommand {
    pub fn parse(input: &str) -> Option<Self> {
        let cmd = input.split_whitespace().next().unwrap_or("");
        match cmd {
            "/refresh" | "/r" => Some(Self::Refresh),
            "/guide" | "/g" => Some(Self::Guide),
            "/journey" | "/j" => Some(Self::Journey),
            "/concepts" => Some(Self::Concepts),
            "/plan" | "/p" => Some(Self::Plan),
            "/news" | "/n" => Some(Self::News),
            "/reset" => Some(Self::Reset),
            "/retry" => Some(Self::Retry),
            "/help" | "/h" => Some(Self::Help),
            "/quit" | "/q" | "/exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Commands accepted inside a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Back,
    History,
    Help,
    Quick(QuickAction),
    /// Pick the n-th starter suggestion (1-based)
    Suggestion(usize),
    Unknown,
}

impl ChatCommand {
    /// `None` means the input is a message to send
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>()
            && n >= 1
        {
            return Some(Self::Suggestion(n));
        }
        let name = input.strip_prefix('/')?;
        Some(match name {
            "back" | "b" => Self::Back,
            "history" => Self::History,
            "help" | "h" => Self::Help,
            other => QuickAction::from_id(other).map(Self::Quick).unwrap_or(Self::Unknown),
        })
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// Interactive Arth Sakhi session
pub struct ReplSession {
    orchestrator: Orchestrator,
    show_suggestions: bool,
}

impl ReplSession {
    pub fn new(orchestrator: Orchestrator, show_suggestions: bool) -> Self {
        debug!(show_suggestions, "ReplSession::new: called");
        Self {
            orchestrator,
            show_suggestions,
        }
    }

    /// Run until the user quits
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let result = match self.orchestrator.state() {
                AppState::Form => self.form_screen(&mut rl).await?,
                AppState::Result => {
                    self.print_result();
                    self.command_loop(&mut rl).await?
                }
                AppState::Error => {
                    let message = self.orchestrator.session().error().unwrap_or_default().to_string();
                    print!("{}", render::error(&message));
                    self.command_loop(&mut rl).await?
                }
                // Submission runs to completion inside form_screen
                AppState::Loading => SlashResult::Continue,
            };
            if let SlashResult::Quit = result {
                break;
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Arth Sakhi - your personal money guide".bright_cyan().bold());
        println!("Press {} on any question to keep the suggested value.", "Enter".yellow());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
    }

    async fn form_screen(&mut self, rl: &mut DefaultEditor) -> Result<SlashResult> {
        let defaults = self.orchestrator.session().draft().cloned().unwrap_or_default();
        let Some(profile) = form::read_profile(rl, &defaults)? else {
            return Ok(SlashResult::Quit);
        };
        self.submit(profile).await;
        Ok(SlashResult::Continue)
    }

    async fn submit(&mut self, profile: UserProfile) {
        println!();
        println!("{}", "Analyzing your finances and fetching the latest news...".dimmed());
        match self.orchestrator.submit_profile(profile).await {
            Ok(state) => info!(%state, "Submission finished"),
            Err(AppError::Profile(e)) => println!("{} {}", "!".red(), e),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    fn print_result(&self) {
        let session = self.orchestrator.session();
        let (Some(profile), Some(plan)) = (session.profile(), session.plan()) else {
            return;
        };
        print!("{}", render::summary(profile, plan));
        print!("{}", render::plan(plan));
        if let Some(news) = session.news() {
            print!("{}", render::news(news, false, session.is_refreshing_news()));
        }
        println!();
        println!(
            "Type {} to chat with your guide, {} for the investment journey, {} for all commands",
            "/guide".yellow(),
            "/journey".yellow(),
            "/help".yellow()
        );
    }

    /// Read commands until the state changes or the user quits
    async fn command_loop(&mut self, rl: &mut DefaultEditor) -> Result<SlashResult> {
        let entered = self.orchestrator.state();
        while self.orchestrator.state() == entered {
            let line = match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => return Ok(SlashResult::Quit),
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(input);

            let Some(command) = ResultCommand::parse(input) else {
                println!("{} Unknown command: {}", "?".yellow(), input);
                println!("Type {} for available commands", "/help".yellow());
                continue;
            };
            if let SlashResult::Quit = self.handle_command(command, rl).await? {
                return Ok(SlashResult::Quit);
            }
        }
        Ok(SlashResult::Continue)
    }

    async fn handle_command(&mut self, command: ResultCommand, rl: &mut DefaultEditor) -> Result<SlashResult> {
        debug!(?command, "ReplSession::handle_command: called");
        let session = self.orchestrator.session();
        match command {
            ResultCommand::Help => self.print_help(),
            ResultCommand::Quit => return Ok(SlashResult::Quit),
            ResultCommand::Plan => {
                if let (Some(profile), Some(plan)) = (session.profile(), session.plan()) {
                    print!("{}", render::summary(profile, plan));
                    print!("{}", render::plan(plan));
                }
            }
            ResultCommand::Concepts => {
                if let Some(plan) = session.plan() {
                    print!("{}", render::concepts(plan));
                }
            }
            ResultCommand::News => {
                if let Some(news) = session.news() {
                    print!("{}", render::news(news, true, false));
                }
            }
            ResultCommand::Refresh => {
                if session.profile().is_none() {
                    println!("{}", "Nothing to refresh yet.".dimmed());
                } else {
                    println!("{}", "Refreshing news...".dimmed());
                    self.orchestrator.refresh_news().await;
                    if let Some(news) = self.orchestrator.session().news() {
                        print!("{}", render::news(news, false, false));
                    }
                }
            }
            ResultCommand::Guide => self.open_chat(SessionKind::Guide, rl).await?,
            ResultCommand::Journey => self.open_chat(SessionKind::InvestmentExpert, rl).await?,
            ResultCommand::Reset => match self.orchestrator.reset() {
                Ok(()) => println!("{}", "Starting over.".dimmed()),
                Err(e) => println!("{} {}", "Error:".red(), e),
            },
            ResultCommand::Retry => {
                if let Err(e) = self.orchestrator.retry() {
                    println!("{} {}", "Error:".red(), e);
                }
            }
        }
        Ok(SlashResult::Continue)
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Show the plan again", "/plan".yellow());
        println!("  {:14} Explain the financial concepts", "/concepts".yellow());
        println!("  {:14} Read the full news digest", "/news".yellow());
        println!("  {:14} Fetch the latest news again", "/refresh".yellow());
        println!("  {:14} Chat with your guide", "/guide".yellow());
        println!("  {:14} Investment journey with quick actions", "/journey".yellow());
        println!("  {:14} Back to the form after an error", "/retry".yellow());
        println!("  {:14} Clear everything and start over", "/reset".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!();
    }

    async fn open_chat(&mut self, kind: SessionKind, rl: &mut DefaultEditor) -> Result<()> {
        let chat = match self.orchestrator.chat(kind) {
            Ok(chat) => chat,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                return Ok(());
            }
        };
        ChatLoop::new(chat, self.show_suggestions).run(rl).await
    }
}

/// Conversation screen for one session
struct ChatLoop {
    chat: Arc<ChatSession>,
    show_suggestions: bool,
}

impl ChatLoop {
    fn new(chat: Arc<ChatSession>, show_suggestions: bool) -> Self {
        Self { chat, show_suggestions }
    }

    async fn run(&self, rl: &mut DefaultEditor) -> Result<()> {
        let kind = self.chat.kind();
        println!();
        println!("{}", kind.title().bright_cyan().bold());
        self.print_history().await;
        self.print_prompts().await;

        loop {
            let line = match rl.readline(&format!("{} ", "you>".bright_green())) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(input);

            match ChatCommand::parse(input) {
                None => self.send(input).await,
                Some(ChatCommand::Back) => return Ok(()),
                Some(ChatCommand::History) => self.print_history().await,
                Some(ChatCommand::Help) => self.print_help(),
                Some(ChatCommand::Quick(action)) => self.quick_action(action).await,
                Some(ChatCommand::Suggestion(n)) => {
                    let suggestions = self.suggestions().await;
                    match suggestions.get(n - 1) {
                        Some(text) => {
                            println!("{} {}", "You:".bright_green().bold(), text);
                            self.send(text).await;
                        }
                        // A plain number that is not a suggestion is just a message
                        None => self.send(input).await,
                    }
                }
                Some(ChatCommand::Unknown) => {
                    println!("{} Unknown command: {}", "?".yellow(), input);
                }
            }
        }
    }

    async fn suggestions(&self) -> &'static [&'static str] {
        if self.show_suggestions {
            self.chat.suggestions().await
        } else {
            &[]
        }
    }

    async fn print_history(&self) {
        for message in self.chat.history().await {
            println!("{}", render::chat_message(self.chat.kind(), &message));
        }
    }

    async fn print_prompts(&self) {
        for (i, suggestion) in self.suggestions().await.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).yellow(), suggestion);
        }
        if self.chat.kind() == SessionKind::InvestmentExpert {
            for action in QuickAction::ALL {
                println!("  {:12} {}", format!("/{}", action.id()).yellow(), action.title());
            }
        }
        println!("{}", "Type /back to return to your plan.".dimmed());
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Chat Commands:".bright_cyan());
        println!("  {:14} Return to the plan", "/back".yellow());
        println!("  {:14} Show the conversation", "/history".yellow());
        if self.chat.kind() == SessionKind::InvestmentExpert {
            for action in QuickAction::ALL {
                println!("  {:14} {}", format!("/{}", action.id()).yellow(), action.title());
            }
        }
        println!();
    }

    async fn quick_action(&self, action: QuickAction) {
        if self.chat.kind() != SessionKind::InvestmentExpert {
            println!("{}", "Quick actions are available in /journey.".dimmed());
            return;
        }
        println!("{} {}", "You:".bright_green().bold(), action.label());
        print!("{} ", "Expert:".bright_blue().bold());
        let _ = io::stdout().flush();
        if let Some(reply) = self.chat.send_quick_action(action).await {
            println!("{}", reply.text);
        }
    }

    /// Send a message, printing the answer as it streams in
    async fn send(&self, text: &str) {
        let name = match self.chat.kind() {
            SessionKind::Guide => "Sakhi:",
            SessionKind::InvestmentExpert => "Expert:",
        };
        print!("{} ", name.bright_blue().bold());
        let _ = io::stdout().flush();
        stream_reply(&self.chat, text, &mut io::stdout()).await;
    }
}

/// Stream one reply into `out` and return the message that was appended
///
/// Apologies never stream. When a stream breaks after some text arrived,
/// the apology goes on its own line so the screen matches the history.
async fn stream_reply<W: Write>(chat: &ChatSession, text: &str, out: &mut W) -> Option<Message> {
    let (tx, mut rx) = mpsc::channel::<StreamChunk>(100);
    let printer = async {
        let mut streamed = String::new();
        while let Some(chunk) = rx.recv().await {
            if let StreamChunk::TextDelta(delta) = chunk {
                let _ = write!(out, "{}", delta);
                let _ = out.flush();
                streamed.push_str(&delta);
            }
        }
        streamed
    };

    let (reply, streamed) = tokio::join!(chat.send_message_streaming(text, tx), printer);

    if let Some(reply) = &reply {
        if streamed.is_empty() {
            let _ = write!(out, "{}", reply.text);
        } else if streamed != reply.text {
            let _ = write!(out, "\n{}", reply.text);
        }
    }
    let _ = writeln!(out);
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockModelClient;
    use crate::llm::{GenerateResponse, LlmError};

    fn expert(client: Arc<MockModelClient>) -> ChatSession {
        ChatSession::new(SessionKind::InvestmentExpert, "You are an expert".to_string(), client)
    }

    #[tokio::test]
    async fn test_stream_reply_prints_streamed_text_once() {
        let client = Arc::new(MockModelClient::new());
        client.push_text(Ok(GenerateResponse::from_text("Start with a small SIP.")));
        let chat = expert(client);

        let mut out = Vec::new();
        let reply = stream_reply(&chat, "Where do I begin?", &mut out).await.unwrap();

        assert_eq!(reply.text, "Start with a small SIP.");
        assert_eq!(String::from_utf8(out).unwrap(), "Start with a small SIP.\n");
    }

    #[tokio::test]
    async fn test_stream_reply_broken_stream_shows_apology() {
        let client = Arc::new(MockModelClient::new());
        client.push_partial_stream("Step 1: open a dem");
        client.push_text(Err(LlmError::Stream("connection reset".to_string())));
        let chat = expert(client);

        let mut out = Vec::new();
        let reply = stream_reply(&chat, "How do I open a demat account?", &mut out)
            .await
            .unwrap();

        let apology = SessionKind::InvestmentExpert.apology();
        assert_eq!(reply.text, apology);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Step 1: open a dem\n{}\n", apology)
        );
        assert_eq!(chat.history().await.last().unwrap().text, apology);
    }

    #[tokio::test]
    async fn test_stream_reply_failure_without_deltas() {
        let client = Arc::new(MockModelClient::new());
        client.push_text(Err(LlmError::Generation("down".to_string())));
        let chat = expert(client);

        let mut out = Vec::new();
        stream_reply(&chat, "Hi", &mut out).await.unwrap();

        let apology = SessionKind::InvestmentExpert.apology();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", apology));
    }

    #[test]
    fn test_result_command_parse() {
        assert_eq!(ResultCommand::parse("/refresh"), Some(ResultCommand::Refresh));
        assert_eq!(ResultCommand::parse("/journey"), Some(ResultCommand::Journey));
        assert_eq!(ResultCommand::parse("/q"), Some(ResultCommand::Quit));
        assert_eq!(ResultCommand::parse("/news extra"), Some(ResultCommand::News));
        assert_eq!(ResultCommand::parse("/unknown"), None);
        assert_eq!(ResultCommand::parse("hello"), None);
    }

    #[test]
    fn test_chat_command_parse() {
        assert_eq!(ChatCommand::parse("/back"), Some(ChatCommand::Back));
        assert_eq!(ChatCommand::parse("/sip"), Some(ChatCommand::Quick(QuickAction::Sip)));
        assert_eq!(
            ChatCommand::parse("/insurance"),
            Some(ChatCommand::Quick(QuickAction::Insurance))
        );
        assert_eq!(ChatCommand::parse("2"), Some(ChatCommand::Suggestion(2)));
        assert_eq!(ChatCommand::parse("0"), None);
        assert_eq!(ChatCommand::parse("/nope"), Some(ChatCommand::Unknown));
        assert_eq!(ChatCommand::parse("What is a SIP?"), None);
    }
}
