//! Bracket notation decoder
//!
//! The audit log stores every entry as a brace-delimited list:
//!
//! ```text
//! {20240315103000,U,
//! {0,0},1,2,3,4,5,I,"Comment with ""quotes""",6,{"U"},"",1,2,3,4,0},
//! ```
//!
//! - lists open with `{`, close with `}`, fields are comma-separated
//! - quoted tokens are strings, `""` escapes a literal quote
//! - anything else is a bare token (numbers, codes, hex values)
//!
//! Two entry points are provided:
//!
//! - [`parse_block`] parses a complete piece of text into one node
//! - [`next_node`] extracts the next complete node from a byte buffer that a
//!   writer may still be appending to. An unfinished node yields `Ok(None)`
//!   so the caller can retry once more bytes arrive.

use crate::{FormatError, Node};

/// Parse a complete block of text into a node tree
///
/// Surrounding whitespace and one trailing `,` are accepted.
pub fn parse_block(text: &str) -> Result<Node, FormatError> {
    let mut parser = Parser { src: text, pos: 0 };

    parser.skip_ws();
    if parser.peek().is_none() {
        return Err(FormatError::Empty);
    }

    let node = parser.node()?;

    parser.skip_ws();
    if parser.peek() == Some(',') {
        parser.pos += 1;
        parser.skip_ws();
    }
    if let Some(c) = parser.peek() {
        return Err(FormatError::unexpected(parser.pos, c));
    }

    Ok(node)
}

/// Extract the next complete node from `buf`
///
/// Returns the node and the number of bytes consumed, or `None` when `buf`
/// does not yet hold a complete node. Consumed bytes cover any prefix before
/// the first `{` (headers, blank lines), the node itself, a trailing `,` and
/// the line break after it.
///
/// A node is complete when the brace depth, counted outside quoted strings,
/// returns to zero.
pub fn next_node(buf: &[u8]) -> Result<Option<(Node, usize)>, FormatError> {
    let Some(start) = buf.iter().position(|&b| b == b'{') else {
        return Ok(None);
    };
    let Some(len) = node_len(&buf[start..]) else {
        return Ok(None);
    };
    let end = start + len;

    let text = std::str::from_utf8(&buf[start..end]).map_err(|_| FormatError::InvalidUtf8)?;
    let node = parse_block(text)?;

    let mut consumed = end;
    if buf.get(consumed) == Some(&b',') {
        consumed += 1;
    }
    while matches!(buf.get(consumed), Some(b'\r' | b'\n')) {
        consumed += 1;
    }

    Ok(Some((node, consumed)))
}

/// True if `buf` holds the start of a node that is not finished yet
pub fn has_partial_node(buf: &[u8]) -> bool {
    buf.contains(&b'{')
}

/// Length of the node starting at `buf[0] == b'{'`, if it is complete
fn node_len(buf: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;

    for (i, &b) in buf.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'{' if !in_quotes => depth += 1,
            b'}' if !in_quotes => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

// =============================================================================
// Recursive descent parser
// =============================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn node(&mut self) -> Result<Node, FormatError> {
        match self.peek() {
            Some('{') => self.list(),
            Some('"') => self.text(),
            Some(c @ ('}' | ',')) => Err(FormatError::unexpected(self.pos, c)),
            _ => Ok(self.bare()),
        }
    }

    fn list(&mut self) -> Result<Node, FormatError> {
        let open = self.pos;
        self.pos += 1;
        self.skip_ws();

        let mut items = Vec::new();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Node::List(items));
        }

        loop {
            let item = match self.peek() {
                None => return Err(FormatError::Unbalanced { offset: open }),
                Some('{') => self.list()?,
                Some('"') => self.text()?,
                Some(_) => self.bare(),
            };
            items.push(item);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                }
                Some('}') => {
                    self.pos += 1;
                    return Ok(Node::List(items));
                }
                Some(c) => return Err(FormatError::unexpected(self.pos, c)),
                None => return Err(FormatError::Unbalanced { offset: open }),
            }
        }
    }

    fn text(&mut self) -> Result<Node, FormatError> {
        let open = self.pos;
        self.pos += 1;

        let mut out = String::new();
        loop {
            let rest = &self.src[self.pos..];
            let Some(quote) = rest.find('"') else {
                return Err(FormatError::UnterminatedString { offset: open });
            };
            out.push_str(&rest[..quote]);
            self.pos += quote + 1;

            if self.peek() == Some('"') {
                out.push('"');
                self.pos += 1;
            } else {
                return Ok(Node::Text(out));
            }
        }
    }

    /// Bare token, possibly empty; stops before any structural character
    fn bare(&mut self) -> Node {
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c| matches!(c, ',' | '{' | '}' | '"'))
            .unwrap_or(rest.len());
        self.pos += len;
        Node::Value(rest[..len].trim().to_string())
    }
}
