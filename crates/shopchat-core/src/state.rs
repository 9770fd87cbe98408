//! UI-agnostic conversation state types
//!
//! These structures are shared by every front end and don't depend on any
//! specific UI framework. Entries are append-only for the life of a session.

use serde::{Deserialize, Serialize};

/// Greeting the bot opens every session with.
pub const GREETING: &str = "Hi! 👋 I'm your e-commerce assistant. How can I help you today?";

/// Shown when the endpoint answers without a usable `message`.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";

/// Shown when the request fails for any reason.
pub const NETWORK_ERROR_REPLY: &str = "Network error. Please try again.";

/// Canned questions offered as one-key shortcuts.
pub const SUGGESTIONS: [&str; 4] = [
    "Show me the top 5 sold products",
    "What is the status of order ID 12345?",
    "How many Classic T-Shirts are left in stock?",
    "List all available product categories",
];

/// Who wrote a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    sender: Sender,
    text: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered conversation log plus the flag that gates new submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    entries: Vec<ChatEntry>,
    busy: bool,
}

impl ConversationState {
    /// Fresh session state, seeded with the bot greeting.
    pub fn new() -> Self {
        Self {
            entries: vec![ChatEntry::bot(GREETING)],
            busy: false,
        }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
