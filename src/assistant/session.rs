//! Conversation state for the assistant panel.

use super::{AssistantClient, AssistantError, ChatMessage};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Text shown in place of a reply when the assistant cannot be reached.
const UNAVAILABLE_REPLY: &str =
    "Sorry, the feedback assistant is unavailable right now. The dashboard figures are unaffected; please try again later.";

/// Outcome of one question/answer exchange.
#[derive(Debug)]
pub struct ChatTurn {
    /// The assistant message appended to the history.
    pub reply: ChatMessage,
    pub cancelled: bool,
    /// Set when the reply is the unavailable notice.
    pub error: Option<AssistantError>,
}

/// A running conversation with the assistant.
pub struct ChatSession {
    client: AssistantClient,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: AssistantClient) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Ask a question about the data described by `data_context`.
    ///
    /// Failures never propagate: they become a single assistant message
    /// in the history, and the error is reported on the returned turn.
    pub async fn ask<F>(
        &mut self,
        question: &str,
        data_context: &str,
        cancel: &CancellationToken,
        on_delta: F,
    ) -> ChatTurn
    where
        F: FnMut(&str),
    {
        self.history.push(ChatMessage::user(question.trim()));

        let turn = match self
            .client
            .stream_reply(&self.history, data_context, cancel, on_delta)
            .await
        {
            Ok(reply) => ChatTurn {
                reply: ChatMessage::assistant(reply.content),
                cancelled: reply.cancelled,
                error: None,
            },
            Err(e) => {
                warn!("Assistant request failed: {}", e);
                ChatTurn {
                    reply: ChatMessage::assistant(UNAVAILABLE_REPLY),
                    cancelled: false,
                    error: Some(e),
                }
            }
        };

        // An empty reply leaves no answer; drop the question with it so
        // the history keeps alternating.
        if turn.reply.content.is_empty() {
            self.history.pop();
        } else {
            self.history.push(turn.reply.clone());
        }
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Role;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session_for(template: ResponseTemplate) -> (MockServer, ChatSession) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(template)
            .mount(&server)
            .await;

        let client = AssistantClient::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        (server, ChatSession::new(client))
    }

    #[tokio::test]
    async fn test_reply_is_appended_to_history() {
        let (_server, mut session) = session_for(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"content\":\"Bob\"}\n\ndata: [DONE]\n\n", "text/event-stream"),
        )
        .await;

        let mut buffer = String::new();
        let turn = session
            .ask("  Who is weakest? ", "ctx", &CancellationToken::new(), |d| {
                buffer.push_str(d)
            })
            .await;

        assert!(turn.error.is_none());
        assert_eq!(buffer, "Bob");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].content, "Who is weakest?");
        assert_eq!(session.history()[1].role, Role::Assistant);
        assert_eq!(session.history()[1].content, "Bob");
    }

    #[tokio::test]
    async fn test_failure_becomes_single_inline_message() {
        let (_server, mut session) = session_for(ResponseTemplate::new(500)).await;

        let turn = session
            .ask("Hello?", "ctx", &CancellationToken::new(), |_| {})
            .await;

        assert!(matches!(turn.error, Some(AssistantError::Unavailable(_))));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].content, UNAVAILABLE_REPLY);
    }

    #[tokio::test]
    async fn test_cancelled_empty_reply_is_not_recorded() {
        let (_server, mut session) = session_for(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"content\":\"Fine\"}\n\ndata: [DONE]\n\n", "text/event-stream"),
        )
        .await;
        let token = CancellationToken::new();
        token.cancel();

        let turn = session.ask("Hello?", "ctx", &token, |_| {}).await;

        assert!(turn.cancelled);
        assert!(session.history().is_empty());

        let turn = session
            .ask("And now?", "ctx", &CancellationToken::new(), |_| {})
            .await;
        assert!(turn.error.is_none());
        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.history()[0].content, "And now?");
    }
}
