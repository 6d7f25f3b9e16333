//! Incremental decoder for the assistant's event stream.
//!
//! Chunks arrive at arbitrary byte boundaries; only complete lines are
//! interpreted. Each `data:` line carries a JSON fragment with a content
//! delta, and `data: [DONE]` ends the stream.

use serde_json::Value;
use tracing::debug;

/// Stream terminator.
const DONE_MARKER: &str = "[DONE]";

/// A decoded stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Done,
}

/// Buffers partial lines between chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Interpret whatever is left once the stream has closed.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&line))
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?.trim();

    if payload == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(json) => extract_delta(&json).map(SseEvent::Delta),
        Err(e) => {
            debug!("Skipping undecodable stream fragment: {}", e);
            None
        }
    }
}

fn extract_delta(json: &Value) -> Option<String> {
    let content = json["choices"][0]["delta"]["content"]
        .as_str()
        .or_else(|| json["content"].as_str())?;

    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_openai_style_deltas() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
        );

        assert_eq!(
            events,
            vec![
                SseEvent::Delta("Hel".to_string()),
                SseEvent::Delta("lo".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"choices\":[{\"del").is_empty());
        assert!(decoder.push(b"ta\":{\"content\":\"Hi\"}}]}").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec![SseEvent::Delta("Hi".to_string())]);
    }

    #[test]
    fn test_ignores_comments_roles_and_garbage() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            b": keep-alive\nevent: message\ndata: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\ndata: not-json\ndata: {\"content\":\"plain\"}\n",
        );
        assert_eq!(events, vec![SseEvent::Delta("plain".to_string())]);
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some(SseEvent::Done));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multibyte_text_split_mid_character() {
        let line = "data: {\"content\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.len() - 4;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(
            decoder.push(&line[split..]),
            vec![SseEvent::Delta("caf\u{e9}".to_string())]
        );
    }
}
