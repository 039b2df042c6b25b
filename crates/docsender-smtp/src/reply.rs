//! SMTP reply parsing.
//!
//! Replies are one or more lines carrying the same three-digit code.
//! Continuation lines separate code and text with `-`, the final line
//! with a space: `250-foo\r\n250 bar\r\n`.

use crate::error::{Error, Result};

/// A complete (possibly multi-line) server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit reply code from the first line.
    pub code: u16,
    /// Text of each reply line, code and separator stripped.
    pub lines: Vec<String>,
}

/// One parsed reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// Three-digit code.
    pub code: u16,
    /// True when this line terminates the reply.
    pub last: bool,
    /// Line text after the separator.
    pub text: String,
}

impl ReplyLine {
    /// Parses a single raw reply line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the line is shorter than a code
    /// or the code is not numeric.
    pub fn parse(raw: &str) -> Result<Self> {
        // Work on bytes so a garbled line with multibyte characters in
        // the code/separator positions errors instead of panicking on
        // a char-boundary slice.
        let bytes = raw.as_bytes();
        let code_bytes = bytes
            .get(..3)
            .ok_or_else(|| Error::Protocol(format!("reply line too short: {raw:?}")))?;
        if !code_bytes.iter().all(u8::is_ascii_digit) {
            return Err(Error::Protocol(format!("invalid reply code: {raw:?}")));
        }
        let code = code_bytes
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));

        // "250" alone is a valid final line with empty text. The first
        // four bytes are ASCII by now, so offset 4 is a char boundary.
        let (last, text) = match bytes.get(3) {
            None => (true, String::new()),
            Some(b' ') => (true, raw.get(4..).unwrap_or_default().to_string()),
            Some(b'-') => (false, raw.get(4..).unwrap_or_default().to_string()),
            Some(_) => {
                return Err(Error::Protocol(format!("malformed reply line: {raw:?}")));
            }
        };

        Ok(Self { code, last, text })
    }
}

impl Reply {
    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Returns true for 3xx codes (server expects more input).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Joins the reply lines into one diagnostic string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(" / ")
    }

    /// Converts a non-success reply into an [`Error::Smtp`].
    ///
    /// # Errors
    ///
    /// Returns the reply converted to an error unless `self` satisfies
    /// `accept`.
    pub fn expect(self, accept: impl Fn(&Self) -> bool) -> Result<Self> {
        if accept(&self) {
            Ok(self)
        } else {
            Err(Error::smtp(self.code, self.text()))
        }
    }
}
