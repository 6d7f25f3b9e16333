//! Conversational assistant over the aggregated data.
//!
//! The assistant is a remote streaming endpoint. This module only
//! ships the conversation plus a textual data snapshot to it and
//! relays the streamed reply.

pub mod client;
pub mod session;
pub mod sse;

pub use client::AssistantClient;
pub use session::ChatSession;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking to the assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The endpoint failed, refused, or broke the stream.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    /// The client could not be built from the configuration.
    #[error("assistant configuration error: {0}")]
    Config(String),
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
