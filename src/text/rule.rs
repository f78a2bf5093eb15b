//! Header-line framing rule.

use crate::{
    codec::FramingError,
    frame::{BodyLength, FrameRule, ParsedHeader},
};

/// Default cap on the header section, terminator excluded (8 KiB).
pub const DEFAULT_MAX_HEADER_LENGTH: usize = 8 * 1024;

pub(crate) const CONTENT_LENGTH: &str = "content-length";

/// Parsed header section of a text message.
///
/// `content-length` is consumed here and never appears in `headers`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextHead {
    /// First line of the message with any trailing `\r` removed.
    pub start_line: String,
    /// Remaining `name: value` lines in order, trimmed.
    pub headers: Vec<(String, String)>,
    /// Declared body length, if a `content-length` header was present.
    pub content_length: Option<usize>,
}

/// Frame rule that scans for a blank line ending the header section.
///
/// Lines end in `\n`; a preceding `\r` is tolerated. Without a
/// `content-length` header the body is whatever else is buffered, so
/// senders relying on that must not pipeline messages in one chunk.
#[derive(Clone, Copy, Debug)]
pub struct TextRule {
    max_header_length: usize,
}

impl TextRule {
    /// Create a rule that rejects header sections longer than
    /// `max_header_length` bytes.
    #[must_use]
    pub const fn new(max_header_length: usize) -> Self { Self { max_header_length } }

    /// Return the header section limit.
    #[must_use]
    pub const fn max_header_length(&self) -> usize { self.max_header_length }
}

impl Default for TextRule {
    fn default() -> Self { Self::new(DEFAULT_MAX_HEADER_LENGTH) }
}

impl FrameRule for TextRule {
    type Header = TextHead;

    fn parse_header(&self, buf: &[u8]) -> Result<Option<ParsedHeader<TextHead>>, FramingError> {
        let Some((section_len, header_len)) = find_terminator(buf) else {
            if buf.len() > self.max_header_length {
                return Err(FramingError::HeaderTooLong {
                    limit: self.max_header_length,
                });
            }
            return Ok(None);
        };
        if section_len > self.max_header_length {
            return Err(FramingError::HeaderTooLong {
                limit: self.max_header_length,
            });
        }

        let head = parse_section(&buf[..section_len])?;
        let body = head
            .content_length
            .map_or(BodyLength::RestOfBuffer, BodyLength::Exact);
        Ok(Some(ParsedHeader {
            header: head,
            header_len,
            body,
        }))
    }
}

/// Locate the blank line ending the header section.
///
/// Returns the length of the section before the blank line and the offset
/// of the first body byte.
fn find_terminator(buf: &[u8]) -> Option<(usize, usize)> {
    buf.iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'\n')
        .find_map(|(at, _)| match buf.get(at + 1..) {
            Some([b'\n', ..]) => Some((at, at + 2)),
            Some([b'\r', b'\n', ..]) => Some((at, at + 3)),
            _ => None,
        })
}

fn parse_section(section: &[u8]) -> Result<TextHead, FramingError> {
    let text = std::str::from_utf8(section).map_err(|_| FramingError::MalformedHeader {
        reason: "header section is not UTF-8".to_owned(),
    })?;
    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let start_line = lines.next().unwrap_or_default();
    if start_line.trim().is_empty() {
        return Err(FramingError::MalformedHeader {
            reason: "empty start line".to_owned(),
        });
    }

    let mut head = TextHead {
        start_line: start_line.to_owned(),
        ..TextHead::default()
    };
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FramingError::MalformedHeader {
                reason: format!("header line without ':': {line:?}"),
            })?;
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() {
            return Err(FramingError::MalformedHeader {
                reason: format!("header line without a name: {line:?}"),
            });
        }
        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            let len = value
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidLength {
                    value: value.to_owned(),
                })?;
            head.content_length = Some(len);
        } else {
            head.headers.push((name.to_owned(), value.to_owned()));
        }
    }
    Ok(head)
}
