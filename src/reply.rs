//! # Reply parser
//!
//! Turns the raw control-connection byte stream into complete server
//! replies, independent of how the kernel chops the stream into reads.
//!
//! A reply is either a single `NNN<SP>text` line or a multi-line block
//! opened by `NNN-text` and closed by a line whose first four bytes repeat
//! `NNN<SP>`. Intermediate lines may be anything, including free-form
//! continuation lines without the repeated code.

use crate::types::Reply;

#[derive(Debug, Default)]
pub(crate) struct ReplyParser {
    /// Bytes past the last CRLF seen so far.
    residual: Vec<u8>,
    /// Accumulator for the currently open multi-line reply.
    open: Option<OpenReply>,
}

#[derive(Debug)]
struct OpenReply {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl ReplyParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consume `bytes` and return every reply completed by them, in arrival
    /// order. Feeding the same stream in different chunkings yields the same
    /// replies.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<Reply> {
        self.residual.extend_from_slice(bytes);
        let mut completed = Vec::new();
        while let Some(eol) = find_crlf(&self.residual) {
            let tail = self.residual.split_off(eol + 2);
            let mut line = std::mem::replace(&mut self.residual, tail);
            line.truncate(eol);
            if let Some(reply) = self.take_line(&line) {
                completed.push(reply);
            }
        }
        completed
    }

    fn take_line(&mut self, raw: &[u8]) -> Option<Reply> {
        if let Some(mut open) = self.open.take() {
            if raw.len() >= 4 && raw[..4] == open.end_prefix {
                open.lines.push(decode(&raw[4..]));
                return Some(Reply::new(open.code, open.lines.join("\r\n")));
            }
            open.lines.push(decode(raw));
            self.open = Some(open);
            return None;
        }
        match classify(raw) {
            Some((code, b' ')) => Some(Reply::new(code, decode(&raw[4..]))),
            Some((code, b'-')) => {
                self.open = Some(OpenReply {
                    code,
                    end_prefix: [raw[0], raw[1], raw[2], b' '],
                    lines: vec![decode(&raw[4..])],
                });
                None
            }
            _ => {
                warn!("ignoring stray control line: {:?}", decode(raw));
                None
            }
        }
    }
}

/// Match `NNN<SP>` or `NNN-` with a valid reply code; anything else is
/// unclassifiable.
fn classify(line: &[u8]) -> Option<(u16, u8)> {
    if line.len() < 4 {
        return None;
    }
    let sep = line[3];
    if sep != b' ' && sep != b'-' {
        return None;
    }
    if !line[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let code =
        (line[0] - b'0') as u16 * 100 + (line[1] - b'0') as u16 * 10 + (line[2] - b'0') as u16;
    if !(100..600).contains(&code) {
        return None;
    }
    Some((code, sep))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|pair| pair == b"\r\n")
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
