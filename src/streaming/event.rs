/// Terminal frame payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix of an in-band error frame payload
pub const ERROR_SENTINEL: &str = "[ERROR]";

/// One classified frame from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Ordinary generated text, appended verbatim to the result
    TextDelta(String),
    /// End of stream, no further frames expected
    Done,
    /// In-band failure; the carried message starts at the sentinel
    ErrorSignal(String),
}

/// Map a frame payload to its event.
///
/// The error sentinel is matched anywhere in the payload, not only at the
/// start: a producer that omits the separator before an error frame glues it
/// to the tail of the previous frame, and that payload must still abort the
/// stream. Text before the sentinel in such a frame is dropped.
pub fn classify(payload: &str) -> StreamEvent {
    if payload == DONE_SENTINEL {
        StreamEvent::Done
    } else if let Some(idx) = payload.find(ERROR_SENTINEL) {
        StreamEvent::ErrorSignal(payload[idx..].to_string())
    } else {
        StreamEvent::TextDelta(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_delta() {
        assert_eq!(
            classify("Hello world"),
            StreamEvent::TextDelta("Hello world".to_string())
        );
    }

    #[test]
    fn test_text_kept_verbatim() {
        // No trimming, no markdown interpretation
        assert_eq!(
            classify("  ## heading  "),
            StreamEvent::TextDelta("  ## heading  ".to_string())
        );
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(classify("[DONE]"), StreamEvent::Done);
    }

    #[test]
    fn test_done_must_match_exactly() {
        assert_eq!(
            classify("[DONE] trailing"),
            StreamEvent::TextDelta("[DONE] trailing".to_string())
        );
    }

    #[test]
    fn test_error_sentinel_at_start() {
        assert_eq!(
            classify("[ERROR] rate limited"),
            StreamEvent::ErrorSignal("[ERROR] rate limited".to_string())
        );
    }

    #[test]
    fn test_error_sentinel_glued_to_prior_frame() {
        assert_eq!(
            classify("partialdata: [ERROR] rate limited"),
            StreamEvent::ErrorSignal("[ERROR] rate limited".to_string())
        );
    }

    #[test]
    fn test_empty_payload_is_empty_delta() {
        assert_eq!(classify(""), StreamEvent::TextDelta(String::new()));
    }
}
