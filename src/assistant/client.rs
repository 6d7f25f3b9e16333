//! HTTP client for the streaming assistant endpoint.

use super::sse::{SseDecoder, SseEvent};
use super::{AssistantError, ChatMessage};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Request body accepted by the assistant endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(rename = "dataContext")]
    data_context: &'a str,
}

/// A streamed reply, complete or cut short by cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub content: String,
    pub cancelled: bool,
}

/// Client for the assistant's event-stream endpoint.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    url: String,
}

impl AssistantClient {
    /// Create a client for `url`, authenticating with `api_key` when given.
    ///
    /// Only connecting is bounded by a timeout; an open stream may run as
    /// long as the endpoint keeps it alive.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<&str>,
        connect_timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| AssistantError::Config("invalid API key format".to_string()))?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Send the conversation and stream the reply.
    ///
    /// `on_delta` receives each piece of content as it arrives. When
    /// `cancel` fires the stream is dropped and the partial reply is
    /// returned with `cancelled` set.
    pub async fn stream_reply<F>(
        &self,
        messages: &[ChatMessage],
        data_context: &str,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<AssistantReply, AssistantError>
    where
        F: FnMut(&str),
    {
        let request = ChatRequest {
            messages,
            data_context,
        };

        debug!(
            "Sending {} messages to assistant ({} context chars)",
            messages.len(),
            data_context.len()
        );

        let send = self.client.post(&self.url).json(&request).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Assistant request cancelled before a response arrived");
                return Ok(AssistantReply { content: String::new(), cancelled: true });
            }
            result = send => result.map_err(|e| {
                if e.is_connect() {
                    AssistantError::Unavailable(format!("cannot connect to assistant at {}", self.url))
                } else {
                    AssistantError::Unavailable(format!("failed to send request: {e}"))
                }
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    AssistantError::Unavailable("rate limited, try again shortly".to_string())
                }
                StatusCode::PAYMENT_REQUIRED => {
                    AssistantError::Unavailable("usage credits exhausted".to_string())
                }
                _ => AssistantError::Unavailable(format!("endpoint returned {status}: {body}")),
            });
        }

        let mut stream = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::new();
        let mut content = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Assistant stream cancelled after {} chars", content.len());
                    return Ok(AssistantReply { content, cancelled: true });
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for event in decoder.push(&chunk) {
                        match event {
                            SseEvent::Delta(delta) => {
                                on_delta(&delta);
                                content.push_str(&delta);
                            }
                            SseEvent::Done => {
                                return Ok(AssistantReply {
                                    content,
                                    cancelled: false,
                                })
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!("Assistant stream interrupted: {}", e);
                    return Err(AssistantError::Unavailable(format!(
                        "stream interrupted: {e}"
                    )));
                }
                None => break,
            }
        }

        // Closed without the terminator; keep anything left in the buffer.
        if let Some(SseEvent::Delta(delta)) = decoder.finish() {
            on_delta(&delta);
            content.push_str(&delta);
        }

        Ok(AssistantReply {
            content,
            cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STREAM: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Alice \"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"leads.\"}}]}\n\n\
data: [DONE]\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n";

    fn client(server: &MockServer) -> AssistantClient {
        AssistantClient::new(
            format!("{}/chat", server.uri()),
            Some("anon"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_streams_deltas_until_done() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer anon"))
            .and(body_partial_json(serde_json::json!({
                "dataContext": "ctx",
                "messages": [{"role": "user", "content": "Who leads?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(STREAM, "text/event-stream"))
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let reply = client(&server)
            .stream_reply(
                &[ChatMessage::user("Who leads?")],
                "ctx",
                &CancellationToken::new(),
                |d| seen.push(d.to_string()),
            )
            .await
            .unwrap();

        assert_eq!(reply.content, "Alice leads.");
        assert!(!reply.cancelled);
        assert_eq!(seen, vec!["Alice ", "leads."]);
    }

    #[tokio::test]
    async fn test_rate_limit_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server)
            .stream_reply(&[ChatMessage::user("hi")], "", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Unavailable(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(STREAM, "text/event-stream"))
            .expect(0)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        token.cancel();

        let reply = client(&server)
            .stream_reply(&[ChatMessage::user("hi")], "", &token, |_| {})
            .await
            .unwrap();

        assert!(reply.cancelled);
        assert!(reply.content.is_empty());
    }

    /// Serve one chunked event-stream response that sends `body` and then
    /// holds the connection open without finishing.
    async fn stalled_stream(body: &'static str) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        (format!("http://{addr}/chat"), handle)
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_partial_reply() {
        let (url, server) = stalled_stream("data: {\"content\":\"Half\"}\n\n").await;
        let client = AssistantClient::new(url, None, Duration::from_secs(5)).unwrap();
        let token = CancellationToken::new();

        let reply = tokio::time::timeout(
            Duration::from_secs(10),
            client.stream_reply(&[ChatMessage::user("hi")], "", &token, |_| token.cancel()),
        )
        .await
        .expect("stream did not stop after cancellation")
        .unwrap();
        server.abort();

        assert_eq!(
            reply,
            AssistantReply {
                content: "Half".to_string(),
                cancelled: true,
            }
        );
    }

    #[tokio::test]
    async fn test_stream_without_terminator_keeps_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"content\":\"partial\"}", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let reply = client(&server)
            .stream_reply(&[ChatMessage::user("hi")], "", &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(reply.content, "partial");
    }
}
