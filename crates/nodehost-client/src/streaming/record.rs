//! Record parser for streamed response bodies
//!
//! Parses the wire framing into whole records as bytes arrive.

use tracing::trace;

/// Record delimiter used by a stream endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// One record per line (`/stream_logs`)
    Newline,
    /// Records separated by a blank line (`/stream`)
    BlankLine,
}

impl Delimiter {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            Delimiter::Newline => b"\n",
            Delimiter::BlankLine => b"\n\n",
        }
    }
}

/// Incremental parser state
///
/// Bytes are appended to an internal buffer and only complete records are
/// drained out; a partial record that spans chunk boundaries stays buffered
/// until its delimiter arrives. Drained content is never re-emitted.
#[derive(Debug)]
pub struct RecordParser {
    buffer: Vec<u8>,
    delimiter: Delimiter,
}

impl RecordParser {
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            buffer: Vec::new(),
            delimiter,
        }
    }

    /// Feed bytes into the parser and extract any complete records.
    ///
    /// A `data: ` prefix is stripped from each record; blank records are
    /// skipped. Feeding an empty chunk emits nothing.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let delimiter = self.delimiter.as_bytes();
        let mut records = Vec::new();

        while let Some(pos) = find(&self.buffer, delimiter) {
            let segment: Vec<u8> = self.buffer.drain(..pos + delimiter.len()).collect();
            if let Some(record) = normalize(&segment[..pos]) {
                records.push(record);
            }
        }

        records
    }

    /// Flush the trailing partial record, if any.
    ///
    /// Called once when the transport reports completion; the final record
    /// may legitimately lack a trailing delimiter.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        normalize(&rest)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Strip the `data:` marker and surrounding whitespace; `None` for records
/// with no content left.
fn normalize(segment: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(segment);
    let line = text.trim();
    if line.is_empty() {
        return None;
    }

    // Prefix first: a bare marker line trims to "data:" and must not
    // survive as a record of its own.
    let record = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if record.is_empty() {
        trace!("skipping empty record");
        return None;
    }

    Some(record.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_prefixed_lines() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        let records = parser.feed(b"data: starting node\ndata: syncing headers\n");
        assert_eq!(records, vec!["starting node", "syncing headers"]);
    }

    #[test]
    fn test_unprefixed_lines_delivered_trimmed() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        let records = parser.feed(b"  plain output  \n");
        assert_eq!(records, vec!["plain output"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        let records = parser.feed(b"data: one\n\n\ndata: two\n");
        assert_eq!(records, vec!["one", "two"]);
    }

    #[test]
    fn test_partial_record_buffers_across_chunks() {
        let mut parser = RecordParser::new(Delimiter::Newline);

        let first = parser.feed(b"data: 1\ndata: ");
        assert_eq!(first, vec!["1"]);

        let second = parser.feed(b"2\ndata: 3\n");
        assert_eq!(second, vec!["2", "3"]);
    }

    #[test]
    fn test_empty_feed_emits_nothing() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        let first = parser.feed(b"data: 1\ndata: ");
        assert_eq!(first, vec!["1"]);

        // No new suffix: already-seen content must not be re-emitted.
        assert!(parser.feed(b"").is_empty());
        assert!(parser.feed(b"").is_empty());
    }

    #[test]
    fn test_blank_line_delimiter() {
        let mut parser = RecordParser::new(Delimiter::BlankLine);
        let records = parser.feed(b"data: 1\n\ndata: 2\n\n");
        assert_eq!(records, vec!["1", "2"]);
    }

    #[test]
    fn test_blank_line_delimiter_chunked() {
        let mut parser = RecordParser::new(Delimiter::BlankLine);
        assert!(parser.feed(b"data: 41\n").is_empty());
        assert_eq!(parser.feed(b"\ndata: 42"), vec!["41"]);
        assert_eq!(parser.finish(), Some("42".to_string()));
    }

    #[test]
    fn test_finish_flushes_trailing_record() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        assert!(parser.feed(b"data: tail").is_empty());
        assert_eq!(parser.finish(), Some("tail".to_string()));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_bare_data_marker_skipped() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        assert!(parser.feed(b"data: \n").is_empty());
        assert!(parser.feed(b"data:\n").is_empty());
    }

    #[test]
    fn test_bare_marker_between_records_not_emitted() {
        let mut parser = RecordParser::new(Delimiter::Newline);
        let records = parser.feed(b"data: 1\ndata: \ndata: 2\n");
        assert_eq!(records, vec!["1", "2"]);
    }
}
