/// Splits a chunked byte stream into lines.
///
/// The trailing partial line of each chunk is carried over and prepended to
/// the next one. Bytes are kept undecoded until a line is complete so a
/// UTF-8 sequence split across chunks survives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    carry: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed, without
    /// terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.carry[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode(&self.carry[start..end]));
            start = end + 1;
        }
        self.carry.drain(..start);
        lines
    }

    /// Flushes whatever is left once the stream ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.carry);
        Some(decode(&rest))
    }

    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    pub fn clear(&mut self) {
        self.carry.clear();
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_is_carried_to_next_chunk() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"1  gw (10.0.0.1)  1."), Vec::<String>::new());
        assert_eq!(buf.pending(), 20);
        assert_eq!(
            buf.push(b"2 ms\n2 * * *\n3 "),
            vec!["1  gw (10.0.0.1)  1.2 ms".to_string(), "2 * * *".to_string()]
        );
        assert_eq!(buf.finish(), Some("3 ".to_string()));
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"Tracing route to x\r\n\r\n  1    <1 ms");
        assert_eq!(lines, vec!["Tracing route to x".to_string(), String::new()]);
        assert_eq!(buf.push(b"\r\n"), vec!["  1    <1 ms".to_string()]);
    }

    #[test]
    fn split_utf8_sequence_is_reassembled() {
        let text = "1  caf\u{e9}.example (10.0.0.1)  1 ms\n";
        let bytes = text.as_bytes();
        let split = text.find('\u{e9}').unwrap() + 1;

        let mut buf = LineBuffer::new();
        assert!(buf.push(&bytes[..split]).is_empty());
        let lines = buf.push(&bytes[split..]);
        assert_eq!(lines, vec![text.trim_end().to_string()]);
    }

    #[test]
    fn clear_drops_carry() {
        let mut buf = LineBuffer::new();
        buf.push(b"partial");
        buf.clear();
        assert_eq!(buf.finish(), None);
    }
}
