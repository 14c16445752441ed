use std::collections::VecDeque;

/// Byte buffer that hands out complete `\n`-terminated lines.
///
/// Network reads rarely line up with SSE line boundaries, so an incomplete
/// trailing fragment stays buffered until the rest of it arrives.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete line without its `\n` / `\r\n` terminator.
    /// Returns None while only a partial line is buffered. Invalid UTF-8 is
    /// replaced with U+FFFD so the line still reaches the client.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        Some(String::from_utf8_lossy(&line_bytes).into_owned())
    }

    /// Bytes of the incomplete line still waiting for a terminator
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: one\ndata: two\n");

        assert_eq!(buffer.next_line().unwrap(), "data: one");
        assert_eq!(buffer.next_line().unwrap(), "data: two");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: {\"a\":");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 11);

        buffer.extend(b"1}\n");
        assert_eq!(buffer.next_line().unwrap(), "data: {\"a\":1}");
    }

    #[test]
    fn test_crlf_terminator() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(b"data: [DONE]\r\n");
        assert_eq!(buffer.next_line().unwrap(), "data: [DONE]");
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let text = "data: привет\n".as_bytes();

        buffer.extend(&text[..7]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&text[7..]);

        assert_eq!(buffer.next_line().unwrap(), "data: привет");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = CircularLineBuffer::with_capacity(16);
        buffer.extend(b"data: \xff\xfe\ndata: ok\n");

        assert_eq!(buffer.next_line().unwrap(), "data: \u{FFFD}\u{FFFD}");
        assert_eq!(buffer.next_line().unwrap(), "data: ok");
    }
}
