//! Chat session with a client-side transcript

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::kind::QUICK_ACTION_FAILED;
use super::{QuickAction, SessionKind};
use crate::llm::{GenerateRequest, GenerateResponse, LlmError, Message, ModelClient, StreamChunk};

/// One conversation with a persona
///
/// The visible history is what the user sees: greeting, labels and
/// apologies included. The transcript is what the model sees: only the
/// exchanges that got an answer, with the full quick-action prompts.
pub struct ChatSession {
    id: String,
    kind: SessionKind,
    system_instruction: String,
    client: Arc<dyn ModelClient>,
    visible: Mutex<Vec<Message>>,
    transcript: Mutex<Vec<Message>>,
    busy: AtomicBool,
}

impl ChatSession {
    /// Open a session; nothing is sent until the first message
    pub fn new(kind: SessionKind, system_instruction: String, client: Arc<dyn ModelClient>) -> Self {
        let id = Uuid::now_v7().to_string();
        debug!(%id, ?kind, "ChatSession::new: called");
        Self {
            id,
            kind,
            system_instruction,
            client,
            visible: Mutex::new(vec![Message::model(kind.greeting())]),
            transcript: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// True while a call is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Everything shown to the user so far
    pub async fn history(&self) -> Vec<Message> {
        self.visible.lock().await.clone()
    }

    /// Starter prompts, offered only before the first exchange
    pub async fn suggestions(&self) -> &'static [&'static str] {
        if self.visible.lock().await.len() <= 1 {
            self.kind.suggestions()
        } else {
            &[]
        }
    }

    /// Send free text and return the reply that was appended
    ///
    /// Blank input is rejected without a call and returns `None`. A failed
    /// call appends this persona's apology instead of an error.
    pub async fn send_message(&self, text: &str) -> Option<Message> {
        debug!(session = %self.id, "ChatSession::send_message: called");
        let text = text.trim();
        if text.is_empty() {
            debug!("ChatSession::send_message: blank input ignored");
            return None;
        }
        Some(
            self.exchange(text, text.to_string(), self.kind.apology(), None)
                .await,
        )
    }

    /// Like `send_message`, forwarding text deltas as they arrive
    pub async fn send_message_streaming(&self, text: &str, chunk_tx: mpsc::Sender<StreamChunk>) -> Option<Message> {
        debug!(session = %self.id, "ChatSession::send_message_streaming: called");
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(
            self.exchange(text, text.to_string(), self.kind.apology(), Some(chunk_tx))
                .await,
        )
    }

    /// Send a quick action: the label is shown, the detailed prompt is sent
    ///
    /// Only the investment expert offers quick actions; other sessions
    /// return `None` without touching the history.
    pub async fn send_quick_action(&self, action: QuickAction) -> Option<Message> {
        debug!(session = %self.id, ?action, "ChatSession::send_quick_action: called");
        if self.kind != SessionKind::InvestmentExpert {
            debug!("ChatSession::send_quick_action: not an investment session");
            return None;
        }
        Some(
            self.exchange(action.prompt(), action.label(), QUICK_ACTION_FAILED, None)
                .await,
        )
    }

    async fn exchange(
        &self,
        payload: &str,
        label: String,
        fallback: &str,
        chunk_tx: Option<mpsc::Sender<StreamChunk>>,
    ) -> Message {
        // Shown before the call resolves
        self.visible.lock().await.push(Message::user(label));
        self.busy.store(true, Ordering::SeqCst);

        let mut contents = self.transcript.lock().await.clone();
        contents.push(Message::user(payload));
        let request = GenerateRequest::text(self.system_instruction.clone(), contents);

        let result = match chunk_tx {
            Some(tx) => self.client.stream(request, tx).await,
            None => self.client.generate(request).await,
        };

        let reply = match reply_text(result) {
            Ok(text) => {
                let mut transcript = self.transcript.lock().await;
                transcript.push(Message::user(payload));
                transcript.push(Message::model(text.clone()));
                info!(session = %self.id, turns = transcript.len(), "Chat reply received");
                Message::model(text)
            }
            Err(e) => {
                error!(session = %self.id, error = %e, "Chat call failed");
                Message::model(fallback)
            }
        };

        self.visible.lock().await.push(reply.clone());
        self.busy.store(false, Ordering::SeqCst);
        reply
    }
}

/// An answer with no usable text counts as a failure
fn reply_text(result: Result<GenerateResponse, LlmError>) -> Result<String, LlmError> {
    let response = result?;
    response
        .non_blank_text()
        .map(str::to_string)
        .ok_or_else(|| LlmError::Generation("Empty chat reply".to_string()))
}

/// Open sessions, reused while the chat context stays the same
#[derive(Default)]
pub struct ChatSessions {
    context: Option<String>,
    sessions: HashMap<SessionKind, Arc<ChatSession>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `kind` if one was opened with this exact context
    pub fn get(&self, kind: SessionKind, context: &str) -> Option<Arc<ChatSession>> {
        debug!(?kind, "ChatSessions::get: called");
        if self.context.as_deref() != Some(context) {
            return None;
        }
        self.sessions.get(&kind).cloned()
    }

    /// Remember a session; a new context drops every older session
    pub fn insert(&mut self, kind: SessionKind, context: &str, session: Arc<ChatSession>) {
        debug!(?kind, "ChatSessions::insert: called");
        if self.context.as_deref() != Some(context) {
            self.sessions.clear();
            self.context = Some(context.to_string());
        }
        self.sessions.insert(kind, session);
    }

    pub fn clear(&mut self) {
        debug!("ChatSessions::clear: called");
        self.context = None;
        self.sessions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
