use crate::error::{RelayError, Result};
use crate::streaming::event::{StreamEvent, classify};
use crate::streaming::framer::StreamFramer;

/// Whether the stream is still producing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeStatus {
    Open,
    Done,
}

/// Folds a framed byte stream into one accumulated text result.
///
/// Owns exactly one result buffer for the lifetime of one request: a new
/// request gets a new consumer, so two streams can never interleave into
/// the same buffer. The buffer is append-only and never rolled back — text
/// already accumulated stays visible after a mid-stream failure.
pub struct StreamConsumer {
    framer: StreamFramer,
    text: String,
    done: bool,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            framer: StreamFramer::new(),
            text: String::new(),
            done: false,
        }
    }

    /// The accumulated result so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Take the accumulated result, consuming the buffer
    pub fn into_text(self) -> String {
        self.text
    }

    /// Feed one raw chunk. `on_delta` observes the full buffer synchronously
    /// after every appended delta. Returns `Done` once the terminal frame
    /// has been seen; an error frame short-circuits with `Err(Protocol)`.
    pub fn push_chunk(
        &mut self,
        chunk: &[u8],
        mut on_delta: impl FnMut(&str),
    ) -> Result<ConsumeStatus> {
        if self.done {
            return Ok(ConsumeStatus::Done);
        }

        for payload in self.framer.feed(chunk) {
            if self.apply(classify(&payload), &mut on_delta)? == ConsumeStatus::Done {
                return Ok(ConsumeStatus::Done);
            }
        }
        Ok(ConsumeStatus::Open)
    }

    /// Signal end-of-data. Flushes a trailing unterminated frame as one last
    /// event, then marks the stream finished. Idempotent.
    pub fn finish(&mut self, mut on_delta: impl FnMut(&str)) -> Result<()> {
        if self.done {
            return Ok(());
        }
        if let Some(payload) = self.framer.finish() {
            self.apply(classify(&payload), &mut on_delta)?;
        }
        self.done = true;
        Ok(())
    }

    fn apply(
        &mut self,
        event: StreamEvent,
        on_delta: &mut impl FnMut(&str),
    ) -> Result<ConsumeStatus> {
        match event {
            StreamEvent::TextDelta(delta) => {
                self.text.push_str(&delta);
                on_delta(&self.text);
                Ok(ConsumeStatus::Open)
            }
            StreamEvent::Done => {
                self.done = true;
                Ok(ConsumeStatus::Done)
            }
            StreamEvent::ErrorSignal(message) => {
                self.done = true;
                Err(RelayError::Protocol(message))
            }
        }
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}
