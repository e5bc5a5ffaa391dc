//! Reply grammar and field parsing for the Tor control protocol.
//!
//! The control protocol is line-oriented ASCII over TCP. Every reply line
//! starts with a 3-digit status code followed by a separator byte that
//! tells the reader whether more lines follow:
//!
//! ```text
//! Reply         = *(MidReplyLine / DataReplyLine) EndReplyLine
//! MidReplyLine  = StatusCode "-" ReplyLine
//! DataReplyLine = StatusCode "+" ReplyLine CmdData
//! EndReplyLine  = StatusCode SP ReplyLine
//! ```
//!
//! This module parses single lines into [`ReplyLine`] and reply text into
//! `KEY=VALUE` parameter maps via [`parse_reply_fields`]. The line *loop*
//! (including the dot-terminated data blocks of `DataReplyLine`) lives in
//! [`crate::socket`], next to the buffered reader it drives.
//!
//! # Field format
//!
//! Parameters within a reply are of the form `KEY=VALUE` or `KEY="VALUE"`,
//! where quoted values may contain spaces, newlines, and quoted pairs.
//! Tokens that carry no `=` provide nothing that is not already known and
//! are dropped.
//!
//! # Example
//!
//! ```rust
//! use lnlink::protocol::parse_reply_fields;
//!
//! let reply = "AUTHCHALLENGE SERVERHASH=ab12 SERVERNONCE=cd34";
//! let fields = parse_reply_fields(reply);
//! assert_eq!(fields.get("SERVERHASH").map(String::as_str), Some("ab12"));
//! assert_eq!(fields.get("SERVERNONCE").map(String::as_str), Some("cd34"));
//! assert!(!fields.contains_key("AUTHCHALLENGE"));
//! ```

use std::collections::HashMap;

use crate::Error;

/// A single parsed reply line: status code, separator, and text.
///
/// The separator byte after the status code determines the line's role in
/// the reply:
///
/// | Separator | Meaning                                        |
/// |-----------|------------------------------------------------|
/// | `' '`     | End line, reply is complete                    |
/// | `'-'`     | Mid line, more lines follow                    |
/// | `'+'`     | Data line, a dot-terminated data block follows |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// The 3-digit status code (250 on success).
    pub code: u16,
    /// The separator byte following the status code.
    pub separator: char,
    /// Everything after the separator.
    pub text: String,
}

impl ReplyLine {
    /// Parses a raw reply line (without its CRLF terminator).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortLine`] for lines shorter than the 4-byte
    /// `NNNx` prefix and [`Error::Protocol`] when the first three bytes
    /// are not a decimal status code. The separator is *not* validated
    /// here; the read loop rejects unknown separators with
    /// [`Error::InvalidLinePrefix`] so the offending line is reported
    /// whole.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lnlink::protocol::ReplyLine;
    ///
    /// let line = ReplyLine::parse("250-version=0.4.8.10").unwrap();
    /// assert_eq!(line.code, 250);
    /// assert!(line.is_mid());
    /// assert_eq!(line.text, "version=0.4.8.10");
    ///
    /// assert!(ReplyLine::parse("250").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self, Error> {
        if line.len() < 4 {
            return Err(Error::ShortLine(line.to_string()));
        }
        if !line.as_bytes()[..4].is_ascii() {
            return Err(Error::Protocol(format!("non-ascii reply prefix: {:?}", line)));
        }

        let code: u16 = line[..3]
            .parse()
            .map_err(|_| Error::Protocol(format!("invalid status code: {:?}", &line[..3])))?;

        let separator = line.as_bytes()[3] as char;

        Ok(Self {
            code,
            separator,
            text: line[4..].to_string(),
        })
    }

    /// Whether this is the final line of the reply (`NNN SP`).
    pub fn is_end(&self) -> bool {
        self.separator == ' '
    }

    /// Whether more lines follow (`NNN-`).
    pub fn is_mid(&self) -> bool {
        self.separator == '-'
    }

    /// Whether a dot-terminated data block follows (`NNN+`).
    pub fn is_data(&self) -> bool {
        self.separator == '+'
    }
}

/// Parses the relevant `KEY=VALUE` parameters out of a reply.
///
/// Unquoted values terminate at whitespace, CR, LF, or a quote. Quoted
/// values keep everything up to the closing quote and are de-escaped with
/// [`unescape_value`]. Tokens containing no `=` are discarded. When a key
/// repeats, the last occurrence wins.
pub fn parse_reply_fields(reply: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let bytes = reply.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        // Skip separators and stray quotes; neither can start a key.
        if matches!(bytes[i], b' ' | b'\r' | b'\n' | b'"') {
            i += 1;
            continue;
        }

        let key_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b' ' | b'\r' | b'\n' | b'"') {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b'=' {
            // No value attached; nothing relevant in this token.
            continue;
        }

        let key = &reply[key_start..i];
        i += 1;

        let value = if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let value_start = i;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' if i + 1 < bytes.len() => i += 2,
                    b'"' => break,
                    _ => i += 1,
                }
            }
            let raw = &reply[value_start..i];
            if i < bytes.len() {
                // Closing quote.
                i += 1;
            }
            unescape_value(raw)
        } else {
            let value_start = i;
            while i < bytes.len() && !matches!(bytes[i], b' ' | b'\r' | b'\n' | b'"') {
                i += 1;
            }
            reply[value_start..i].to_string()
        };

        params.insert(key.to_string(), value);
    }

    params
}

/// Removes escape codes from a quoted reply value.
///
/// A backslash followed by any character represents that character, so
/// every backslash not itself preceded by a backslash is removed.
///
/// # Example
///
/// ```rust
/// use lnlink::protocol::unescape_value;
///
/// assert_eq!(unescape_value(r#"a\"b"#), "a\"b");
/// assert_eq!(unescape_value(r"C:\\tor\\cookie"), r"C:\tor\cookie");
/// ```
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut just_removed_backslash = false;

    for ch in value.chars() {
        if ch == '\\' && !just_removed_backslash {
            just_removed_backslash = true;
            continue;
        }
        out.push(ch);
        just_removed_backslash = false;
    }

    out
}
