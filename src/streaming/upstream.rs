use crate::models::anthropic::{AnthropicStreamEvent, ContentDelta};
use crate::streaming::framer::StreamFramer;

/// One event extracted from the provider's own SSE stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    TextDelta(String),
    Stop,
    Error(String),
}

/// Incremental decoder for the Anthropic Messages SSE stream.
///
/// The provider frames each event as `event: <name>\ndata: <json>\n\n`;
/// only the `data:` lines carry payloads, so the same line framer used on
/// the consumer side does the chunk reassembly here. Payloads that fail to
/// decode as a known event are skipped rather than failing the stream.
pub struct AnthropicStreamParser {
    framer: StreamFramer,
}

impl AnthropicStreamParser {
    pub fn new() -> Self {
        Self {
            framer: StreamFramer::new(),
        }
    }

    /// Feed raw bytes from the provider, returning the events the relay
    /// acts on (text deltas, end of message, in-band errors).
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<UpstreamEvent> {
        let mut events = Vec::new();

        for payload in self.framer.feed(chunk) {
            if payload.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AnthropicStreamEvent>(&payload) {
                Ok(AnthropicStreamEvent::ContentBlockDelta {
                    delta: ContentDelta::TextDelta { text },
                }) => events.push(UpstreamEvent::TextDelta(text)),
                Ok(AnthropicStreamEvent::MessageStop) => events.push(UpstreamEvent::Stop),
                Ok(AnthropicStreamEvent::Error { error }) => events.push(UpstreamEvent::Error(
                    format!("{}: {}", error.error_type, error.message),
                )),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping undecodable upstream event");
                }
            }
        }

        events
    }
}

impl Default for AnthropicStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_text_deltas() {
        let mut parser = AnthropicStreamParser::new();
        let chunk = b"event: content_block_delta\n\
            data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n";
        let events = parser.feed(chunk);
        assert_eq!(events, vec![UpstreamEvent::TextDelta("Hello".to_string())]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut parser = AnthropicStreamParser::new();
        let whole = b"data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"chunked\"}}\n\n";
        let (a, b) = whole.split_at(40);
        assert!(parser.feed(a).is_empty());
        assert_eq!(
            parser.feed(b),
            vec![UpstreamEvent::TextDelta("chunked".to_string())]
        );
    }

    #[test]
    fn test_ignores_housekeeping_events() {
        let mut parser = AnthropicStreamParser::new();
        let chunk = b"event: message_start\n\
            data: {\"type\":\"message_start\",\"message\":{}}\n\n\
            event: ping\n\
            data: {\"type\":\"ping\"}\n\n\
            event: content_block_start\n\
            data: {\"type\":\"content_block_start\",\"index\":0}\n\n";
        assert!(parser.feed(chunk).is_empty());
    }

    #[test]
    fn test_message_stop() {
        let mut parser = AnthropicStreamParser::new();
        let events = parser.feed(b"data: {\"type\":\"message_stop\"}\n\n");
        assert_eq!(events, vec![UpstreamEvent::Stop]);
    }

    #[test]
    fn test_error_event_carries_detail() {
        let mut parser = AnthropicStreamParser::new();
        let events = parser.feed(
            b"data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        );
        assert_eq!(
            events,
            vec![UpstreamEvent::Error(
                "overloaded_error: Overloaded".to_string()
            )]
        );
    }

    #[test]
    fn test_garbage_payload_skipped() {
        let mut parser = AnthropicStreamParser::new();
        let events = parser.feed(b"data: not json at all\n\ndata: {\"type\":\"message_stop\"}\n\n");
        assert_eq!(events, vec![UpstreamEvent::Stop]);
    }
}
