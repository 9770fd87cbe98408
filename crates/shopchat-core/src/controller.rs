//! Conversation controller
//!
//! Owns the conversation state and the one request that may be in flight.
//! `submit` is the only way to add a user entry; the matching bot entry is
//! appended when the request resolves, either through [`poll_reply`] from an
//! event loop or by awaiting [`settle`].
//!
//! [`poll_reply`]: ConversationController::poll_reply
//! [`settle`]: ConversationController::settle

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::client::{ChatBackend, ChatReply};
use crate::error::Result;
use crate::state::{ChatEntry, ConversationState, NETWORK_ERROR_REPLY};

type Outcome = std::result::Result<Result<ChatReply>, JoinError>;

pub struct ConversationController<B: ChatBackend> {
    state: ConversationState,
    backend: Arc<B>,
    pending: Option<JoinHandle<Result<ChatReply>>>,
}

impl<B: ChatBackend> ConversationController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: ConversationState::new(),
            backend: Arc::new(backend),
            pending: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send `text` to the bot.
    ///
    /// Returns `false` without touching the state when `text` is blank or a
    /// reply is still outstanding. Must be called inside a tokio runtime.
    pub fn submit(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.state.is_busy() {
            return false;
        }

        self.state.push(ChatEntry::user(text));
        self.state.set_busy(true);

        let backend = Arc::clone(&self.backend);
        let question = text.to_string();
        debug!(chars = question.chars().count(), "submitting question");
        self.pending = Some(tokio::spawn(async move { backend.ask(&question).await }));
        true
    }

    /// Resolve the outstanding request if it has finished. Never blocks.
    pub fn poll_reply(&mut self) -> bool {
        let Some(handle) = self.pending.as_mut() else {
            return false;
        };
        if !handle.is_finished() {
            return false;
        }

        match handle.now_or_never() {
            Some(outcome) => {
                self.pending = None;
                self.resolve(outcome);
                true
            }
            None => false,
        }
    }

    /// Wait for the outstanding request, if any, and append its reply.
    pub async fn settle(&mut self) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };
        let outcome = handle.await;
        self.resolve(outcome);
        true
    }

    fn resolve(&mut self, outcome: Outcome) {
        let text = match outcome {
            Ok(Ok(reply)) => reply.text().to_string(),
            Ok(Err(err)) => {
                warn!(error = %err, "chat request failed");
                NETWORK_ERROR_REPLY.to_string()
            }
            Err(err) => {
                warn!(error = %err, "chat request task did not complete");
                NETWORK_ERROR_REPLY.to_string()
            }
        };

        self.state.push(ChatEntry::bot(text));
        self.state.set_busy(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::state::{Sender, FALLBACK_REPLY, GREETING};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Answers every question with the same scripted outcome, optionally
    /// holding the reply until the gate is opened.
    struct ScriptedBackend {
        reply: Option<ChatReply>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn replying(reply: ChatReply) -> Self {
            Self {
                reply: Some(reply),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn ask(&self, _question: &str) -> Result<ChatReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply
                .clone()
                .ok_or_else(|| Error::RequestFailed("connection refused".to_string()))
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl ChatBackend for PanickingBackend {
        async fn ask(&self, _question: &str) -> Result<ChatReply> {
            panic!("backend blew up");
        }
    }

    fn texts<B: ChatBackend>(controller: &ConversationController<B>) -> Vec<(Sender, String)> {
        controller
            .state()
            .entries()
            .iter()
            .map(|e| (e.sender(), e.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn submit_appends_user_entry_before_reply() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend::replying(ChatReply::with_message("Order shipped")).gated(gate.clone());
        let mut controller = ConversationController::new(backend);

        assert!(controller.submit("where is my order"));
        assert_eq!(controller.state().entries().len(), 2);
        assert_eq!(controller.state().entries()[1], ChatEntry::user("where is my order"));
        assert!(controller.state().is_busy());
        assert!(!controller.poll_reply());

        gate.notify_one();
        assert!(controller.settle().await);
        assert_eq!(controller.state().entries()[2], ChatEntry::bot("Order shipped"));
        assert!(!controller.state().is_busy());
    }

    #[tokio::test]
    async fn blank_text_is_ignored() {
        let mut controller = ConversationController::new(ScriptedBackend::replying(ChatReply::default()));
        let before = controller.state().clone();

        assert!(!controller.submit(""));
        assert!(!controller.submit("   "));
        assert!(!controller.submit("\n\t"));

        assert_eq!(controller.state(), &before);
        assert_eq!(controller.backend().calls.load(Ordering::SeqCst), 0);
        assert!(!controller.settle().await);
    }

    #[tokio::test]
    async fn submit_while_busy_is_ignored() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend::replying(ChatReply::with_message("first")).gated(gate.clone());
        let mut controller = ConversationController::new(backend);

        assert!(controller.submit("one"));
        let during = controller.state().clone();
        assert!(!controller.submit("two"));
        assert!(!controller.submit(crate::state::SUGGESTIONS[0]));
        assert_eq!(controller.state(), &during);

        gate.notify_one();
        controller.settle().await;
        assert_eq!(controller.backend().calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().entries().len(), 3);
    }

    #[tokio::test]
    async fn reply_without_message_uses_fallback() {
        let mut controller = ConversationController::new(ScriptedBackend::replying(ChatReply::default()));

        controller.submit("gibberish");
        controller.settle().await;

        assert_eq!(controller.state().entries().last(), Some(&ChatEntry::bot(FALLBACK_REPLY)));
        assert!(!controller.state().is_busy());
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_entry() {
        let mut controller = ConversationController::new(ScriptedBackend::failing());

        controller.submit("hello");
        controller.settle().await;

        assert_eq!(controller.state().entries().last(), Some(&ChatEntry::bot(NETWORK_ERROR_REPLY)));
        assert!(!controller.state().is_busy());
    }

    #[tokio::test]
    async fn panicked_request_becomes_error_entry() {
        let mut controller = ConversationController::new(PanickingBackend);

        controller.submit("hello");
        controller.settle().await;

        assert_eq!(controller.state().entries().last(), Some(&ChatEntry::bot(NETWORK_ERROR_REPLY)));
        assert!(!controller.state().is_busy());
    }

    #[tokio::test]
    async fn poll_reply_resolves_once_finished() {
        let mut controller =
            ConversationController::new(ScriptedBackend::replying(ChatReply::with_message("done")));
        controller.submit("hi");

        let mut resolved = false;
        for _ in 0..100 {
            if controller.poll_reply() {
                resolved = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(resolved);
        assert_eq!(controller.state().entries().last(), Some(&ChatEntry::bot("done")));
        assert!(!controller.poll_reply());
    }

    #[tokio::test]
    async fn greeting_then_question_then_reply() {
        let mut controller =
            ConversationController::new(ScriptedBackend::replying(ChatReply::with_message("Top sellers: ...")));

        controller.submit("top 5 products");
        controller.settle().await;

        assert_eq!(
            texts(&controller),
            vec![
                (Sender::Bot, GREETING.to_string()),
                (Sender::User, "top 5 products".to_string()),
                (Sender::Bot, "Top sellers: ...".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn user_text_is_kept_verbatim() {
        let mut controller = ConversationController::new(ScriptedBackend::replying(ChatReply::default()));

        controller.submit("  padded  ");
        assert_eq!(controller.state().entries()[1].text(), "  padded  ");
        controller.settle().await;
    }
}
