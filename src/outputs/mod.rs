//! Outbound side of the relay: what gets sent and where it goes.
//!
//! # Submodules
//!
//! - [`messages`]: HTML texts and the main menu keyboard
//! - [`json`]: writes scrape results to disk for the `scrape` subcommand
//!
//! The chat transport is reached only through [`ChatSink`], which has two
//! primitives: post a new message, or edit the message the interaction
//! started from.

pub mod json;
pub mod messages;

use crate::errors::SendError;
use async_trait::async_trait;

/// One inline button: visible label plus the callback payload it sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// HTML text with an optional keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Where outbound messages for one conversation go.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Post a new message to the conversation.
    async fn send(&self, message: OutboundMessage) -> Result<(), SendError>;

    /// Replace the text of the message this interaction started from.
    async fn edit(&self, message: OutboundMessage) -> Result<(), SendError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sink that records every call with its timestamp.

    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Kind {
        Send,
        Edit,
    }

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub kind: Kind,
        pub message: OutboundMessage,
        pub at: Instant,
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<Recorded>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<Recorded> {
            self.events.lock().unwrap().clone()
        }

        pub fn texts(&self) -> Vec<String> {
            self.events().into_iter().map(|e| e.message.text).collect()
        }

        fn record(&self, kind: Kind, message: OutboundMessage) {
            self.events.lock().unwrap().push(Recorded {
                kind,
                message,
                at: Instant::now(),
            });
        }
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send(&self, message: OutboundMessage) -> Result<(), SendError> {
            self.record(Kind::Send, message);
            Ok(())
        }

        async fn edit(&self, message: OutboundMessage) -> Result<(), SendError> {
            self.record(Kind::Edit, message);
            Ok(())
        }
    }
}
