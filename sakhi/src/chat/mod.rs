//! Chat assistants
//!
//! Two personas share one session type: the guide, which explains the plan
//! and builds roadmaps, and the investment expert, which also offers quick
//! actions. Sessions keep their own transcript because the model API is
//! stateless, and they never surface errors to the caller.

mod kind;
mod session;

pub use kind::{QuickAction, SessionKind};
pub use session::{ChatSession, ChatSessions};
