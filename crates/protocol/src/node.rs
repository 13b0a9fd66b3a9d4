//! Decoded node tree
//!
//! A node is either a bare token, a quoted string, or a brace-delimited list
//! of nodes. Field accessors take a positional index and report
//! [`FormatError`] values that carry it, so record mapping can say which
//! column was malformed.

use std::fmt;
use std::str::FromStr;

use crate::FormatError;

/// One element of the bracket notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Unquoted token (numbers, codes, hex values)
    Value(String),
    /// Quoted string with `""` escapes already removed
    Text(String),
    /// Brace-delimited, comma-separated list
    List(Vec<Node>),
}

impl Node {
    /// Children of a list node
    #[inline]
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Scalar content; lists have none and yield an empty string
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Value(s) | Self::Text(s) => s,
            Self::List(_) => "",
        }
    }

    /// Child at `index` of a list node
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Number of children (0 for scalars)
    #[inline]
    pub fn len(&self) -> usize {
        self.as_list().map_or(0, <[Node]>::len)
    }

    /// True for scalars and empty lists
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child at `index`, or a missing-field error
    pub fn field(&self, index: usize) -> Result<&Node, FormatError> {
        self.get(index)
            .ok_or_else(|| FormatError::missing_field(index))
    }

    /// Scalar child at `index`
    pub fn str_field(&self, index: usize) -> Result<&str, FormatError> {
        match self.field(index)? {
            Self::List(_) => Err(FormatError::invalid_field(index, "expected a scalar, got a list")),
            node => Ok(node.as_str()),
        }
    }

    /// Scalar child at `index` parsed as a decimal number
    pub fn int_field<T: FromStr>(&self, index: usize) -> Result<T, FormatError> {
        let raw = self.str_field(index)?;
        raw.trim()
            .parse()
            .map_err(|_| FormatError::invalid_field(index, format!("expected a number, got {raw:?}")))
    }

    /// List child at `index`
    pub fn list_field(&self, index: usize) -> Result<&Node, FormatError> {
        match self.field(index)? {
            node @ Self::List(_) => Ok(node),
            node => Err(FormatError::invalid_field(
                index,
                format!("expected a list, got {:?}", node.as_str()),
            )),
        }
    }
}

impl Node {
    /// Serialize back to bracket notation
    ///
    /// `parse_block` of the result yields an equal tree. Trees the parser
    /// can never produce are rejected instead of written ambiguously: bare
    /// values holding `,{}"` or surrounding whitespace, and an empty bare
    /// value at the top or as the only item of a list (`{}` is the empty
    /// list).
    pub fn to_notation(&self) -> Result<String, FormatError> {
        self.check_notation(true)?;
        Ok(self.to_string())
    }

    fn check_notation(&self, alone: bool) -> Result<(), FormatError> {
        match self {
            Self::Value(s) if s.is_empty() && alone => {
                Err(FormatError::unrepresentable(s, "an empty bare value needs a sibling"))
            }
            Self::Value(s) if s.contains([',', '{', '}', '"']) => {
                Err(FormatError::unrepresentable(s, "contains a structural character"))
            }
            Self::Value(s) if s.trim() != s => {
                Err(FormatError::unrepresentable(s, "surrounding whitespace is not kept"))
            }
            Self::Value(_) | Self::Text(_) => Ok(()),
            Self::List(items) => items
                .iter()
                .try_for_each(|item| item.check_notation(items.len() == 1)),
        }
    }
}

/// Writes the notation unchecked; see [`Node::to_notation`]
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(s) => f.write_str(s),
            Self::Text(s) => {
                f.write_str("\"")?;
                f.write_str(&s.replace('"', "\"\""))?;
                f.write_str("\"")
            }
            Self::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Value(s.to_string())
    }
}
