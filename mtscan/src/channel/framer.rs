//! Line framer for the device terminal.
//!
//! The RouterOS console terminates lines with a bare carriage return. Line
//! feeds are dropped, escape sequences are stripped, and the output is cut
//! into logical lines at every `\r`. The last segment of a read is usually
//! incomplete and stays buffered until the rest arrives.

use bytes::BytesMut;
use memchr::memchr;
use vte::{Parser, Perform};

/// Buffers raw terminal bytes into logical lines.
pub struct LineFramer {
    /// Escape sequence parser, stateful across reads.
    parser: Parser,

    /// Printable output not yet terminated by a carriage return.
    pending: Printable,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            pending: Printable(BytesMut::with_capacity(4096)),
        }
    }

    /// Feed raw bytes read from the channel and return every completed line.
    ///
    /// Empty lines are not returned.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.parser.advance(&mut self.pending, data);

        let mut lines = Vec::new();
        while let Some(pos) = memchr(b'\r', &self.pending.0) {
            let line = self.pending.0.split_to(pos + 1);
            let text = String::from_utf8_lossy(&line[..pos]);
            if !text.is_empty() {
                lines.push(text.into_owned());
            }
        }
        lines
    }

    /// The incomplete segment retained from previous reads.
    pub fn tail(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.pending.0)
    }

    /// Consume the retained segment if `accept` recognizes it.
    ///
    /// The console leaves its idle prompt without a trailing carriage
    /// return, so an idle pass offers the tail to the prompt detector.
    pub fn take_tail_if(&mut self, accept: impl FnOnce(&str) -> bool) -> Option<String> {
        if self.pending.0.is_empty() || !accept(self.tail().as_ref()) {
            return None;
        }
        let line = self.pending.0.split();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects printable characters and carriage returns from the parser.
struct Printable(BytesMut);

impl Perform for Printable {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\r' | b'\t' => self.0.extend_from_slice(&[byte]),
            // Line feeds carry no information on this terminal.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &[u8] = b"\r\n\r\n  MikroTik RouterOS 6.48.6\r\n\r\n\
[admin@MikroTik] > :put [/interface get [find name=\"wlan1\"] mac-address]\r\n\
4C:5E:0C:11:22:33\r\n[admin@MikroTik] > ";

    fn feed_all(chunks: &[&[u8]]) -> (Vec<String>, String) {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.push(chunk));
        }
        let tail = framer.tail().into_owned();
        (lines, tail)
    }

    #[test]
    fn test_splits_on_carriage_return() {
        let (lines, tail) = feed_all(&[STREAM]);
        assert_eq!(
            lines,
            vec![
                "  MikroTik RouterOS 6.48.6",
                "[admin@MikroTik] > :put [/interface get [find name=\"wlan1\"] mac-address]",
                "4C:5E:0C:11:22:33",
            ]
        );
        assert_eq!(tail, "[admin@MikroTik] > ");
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let (whole, whole_tail) = feed_all(&[STREAM]);

        for size in 1..=STREAM.len() {
            let chunks: Vec<&[u8]> = STREAM.chunks(size).collect();
            let (lines, tail) = feed_all(&chunks);
            assert_eq!(lines, whole, "chunk size {size}");
            assert_eq!(tail, whole_tail, "chunk size {size}");
        }

        // Uneven split through the middle of a line
        let (lines, _) = feed_all(&[&STREAM[..7], &STREAM[7..60], &STREAM[60..]]);
        assert_eq!(lines, whole);
    }

    #[test]
    fn test_strips_escape_sequences() {
        let data: &[u8] = b"\x1b[32mGreen\x1b[0m text\r\x1b[2K\x1b[1;1Hnext\r";
        let (lines, _) = feed_all(&[data]);
        assert_eq!(lines, vec!["Green text", "next"]);

        // Split inside the escape sequence
        let (lines, _) = feed_all(&[&data[..3], &data[3..]]);
        assert_eq!(lines, vec!["Green text", "next"]);
    }

    #[test]
    fn test_multibyte_split() {
        let data = "SSID ż\r".as_bytes();
        let (lines, _) = feed_all(&[&data[..6], &data[6..]]);
        assert_eq!(lines, vec!["SSID ż"]);
    }

    #[test]
    fn test_take_tail_if() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"output\r[admin@MikroTik] > ").len(), 1);
        assert_eq!(framer.take_tail_if(|tail| tail == "[admin@MikroTik] >"), None);
        assert_eq!(framer.tail(), "[admin@MikroTik] > ");
        assert_eq!(
            framer.take_tail_if(|tail| tail == "[admin@MikroTik] > ").as_deref(),
            Some("[admin@MikroTik] > ")
        );
        assert!(framer.tail().is_empty());
        assert_eq!(framer.take_tail_if(|_| true), None);
    }
}
