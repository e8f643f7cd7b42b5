//! Serial line framing for the command link.
//!
//! Bytes arrive one at a time from the transport; `\n` or `\r` terminates a
//! line. The buffer is a fixed 256 bytes — overflow resets it, dropping the
//! partial line.

use heapless::Vec;

/// Receive buffer size in bytes.
pub const LINE_BUFFER_SIZE: usize = 256;

/// Accumulates received bytes into newline-terminated lines.
pub struct LineAssembler {
    buffer: Vec<u8, LINE_BUFFER_SIZE>,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one received byte.
    ///
    /// When the byte completes a line, `on_line` is invoked with the line
    /// contents (terminator stripped). A CR/LF pair terminates on the CR; the
    /// following LF then closes an empty line, which is swallowed here rather
    /// than handed to the parser.
    pub fn push<F: FnMut(&[u8])>(&mut self, byte: u8, mut on_line: F) {
        match byte {
            b'\n' | b'\r' => {
                if !self.buffer.is_empty() {
                    on_line(&self.buffer);
                    self.buffer.clear();
                }
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    // Overflow: drop the partial line and start over.
                    self.buffer.clear();
                }
            }
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(assembler: &mut LineAssembler, bytes: &[u8]) -> std::vec::Vec<std::vec::Vec<u8>> {
        let mut lines = std::vec::Vec::new();
        for &byte in bytes {
            assembler.push(byte, |line| lines.push(line.to_vec()));
        }
        lines
    }

    #[test]
    fn test_line_terminated_by_newline() {
        let mut assembler = LineAssembler::new();
        let lines = feed(&mut assembler, b"P:3:80\n");
        assert_eq!(lines, [b"P:3:80".to_vec()]);
    }

    #[test]
    fn test_crlf_yields_one_line() {
        let mut assembler = LineAssembler::new();
        let lines = feed(&mut assembler, b"P:3:80\r\nR:3:0\r\n");
        assert_eq!(lines, [b"P:3:80".to_vec(), b"R:3:0".to_vec()]);
    }

    #[test]
    fn test_blank_lines_are_swallowed() {
        let mut assembler = LineAssembler::new();
        let lines = feed(&mut assembler, b"\n\r\n\n");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_overflow_resets_buffer() {
        let mut assembler = LineAssembler::new();

        // 300 bytes without a terminator: the 257th byte overflows and wipes
        // the buffer, so only the remaining 43 bytes survive to the newline.
        let mut input = std::vec::Vec::new();
        input.resize(300, b'A');
        input.push(b'\n');

        let lines = feed(&mut assembler, &input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 300 - (LINE_BUFFER_SIZE + 1));

        // The assembler keeps working after an overflow.
        let lines = feed(&mut assembler, b"R:0:0\n");
        assert_eq!(lines, [b"R:0:0".to_vec()]);
    }
}
