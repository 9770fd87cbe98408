pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use client::{ChatBackend, ChatReply, QueryClient, DEFAULT_ENDPOINT};
pub use config::Config;
pub use controller::ConversationController;
pub use error::{Error, Result};
pub use state::{
    ChatEntry, ConversationState, Sender, FALLBACK_REPLY, GREETING, NETWORK_ERROR_REPLY, SUGGESTIONS,
};
