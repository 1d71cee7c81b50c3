use bytes::BytesMut;

/// Wire prefix of a text frame
pub const DATA_PREFIX: &str = "data: ";

/// Stateful framer for the line-delimited `data: ` wire format.
///
/// Raw chunks arrive with no alignment guarantee: one frame may be split
/// across reads, one read may carry several frames, and a chunk boundary may
/// fall inside a multi-byte character. Bytes are buffered and only decoded
/// once a full line is present, so a split multi-byte sequence is reassembled
/// before decoding ever happens (`\n` is a single byte and cannot occur
/// inside a multi-byte UTF-8 sequence).
pub struct StreamFramer {
    buffer: BytesMut,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Feed raw bytes, returning the payloads of all newly completed frames.
    ///
    /// Lines without the `data: ` prefix (blank separators, comments, any
    /// other wire noise) are discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            if let Some(payload) = parse_line(&line[..pos]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing unterminated frame once the stream has ended.
    ///
    /// A producer that dies mid-frame leaves a `data: ` line with no final
    /// separator; the text is surfaced rather than silently truncated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        parse_line(&rest)
    }

    /// Bytes currently held waiting for a line separator
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &[u8]) -> Option<String> {
    let line = match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    };
    // Invalid bytes inside a complete line decode lossily; the only split
    // the wire can legally produce (mid-character across reads) never
    // reaches this point un-reassembled.
    let text = String::from_utf8_lossy(line);
    text.strip_prefix(DATA_PREFIX).map(|payload| payload.to_string())
}
