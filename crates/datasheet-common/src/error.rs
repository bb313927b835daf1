//! Spreadsheet error values.
//!
//! - **`ErrorKind`** : the canonical set of error codes a formula can yield
//! - **`CellError`** : kind plus an optional human message
//!
//! These are *values*, carried inside [`CellValue::Error`](crate::CellValue)
//! and propagated through further formulas like any other result. They are
//! never used as control flow.

use std::{error::Error, fmt};

use crate::CellValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised error codes.
///
/// **Note:** names are CamelCase while `Display` renders them the way a
/// sheet shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Type coercion failure.
    Value,
    /// Not available; also the kind native function faults are wrapped in.
    Na,
    /// Unresolved cyclic dependency.
    Circular,
    /// Reference to a cell, range or sheet that no longer exists.
    Ref,
    /// Unknown function or variable.
    Name,
    Div0,
    Num,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value => "#VALUE!",
            Self::Na => "#N/A",
            Self::Circular => "#CIRCULAR!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Div0 => "#DIV/0!",
            Self::Num => "#NUM!",
        })
    }
}

impl ErrorKind {
    /// Parse the displayed form of an error code. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "#value!" => Some(Self::Value),
            "#n/a" => Some(Self::Na),
            "#circular!" => Some(Self::Circular),
            "#ref!" => Some(Self::Ref),
            "#name?" => Some(Self::Name),
            "#div/0!" => Some(Self::Div0),
            "#num!" => Some(Self::Num),
            _ => None,
        }
    }
}

/// An error value with an optional explanation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellError {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

impl From<ErrorKind> for CellError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl CellError {
    pub fn new(kind: ErrorKind) -> Self {
        kind.into()
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn is_circular(&self) -> bool {
        self.kind == ErrorKind::Circular
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl Error for CellError {}

impl From<CellError> for CellValue {
    fn from(error: CellError) -> Self {
        CellValue::Error(error)
    }
}

impl From<ErrorKind> for CellValue {
    fn from(kind: ErrorKind) -> Self {
        CellValue::Error(CellError::new(kind))
    }
}

impl PartialEq<str> for CellError {
    fn eq(&self, other: &str) -> bool {
        self.kind.to_string() == other
    }
}

impl PartialEq<&str> for CellError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.to_string() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        for kind in [
            ErrorKind::Value,
            ErrorKind::Na,
            ErrorKind::Circular,
            ErrorKind::Ref,
            ErrorKind::Name,
            ErrorKind::Div0,
            ErrorKind::Num,
        ] {
            assert_eq!(ErrorKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(ErrorKind::parse("#bogus"), None);
    }

    #[test]
    fn message_is_rendered_after_code() {
        let e = CellError::new(ErrorKind::Na).with_message("boom");
        assert_eq!(e.to_string(), "#N/A: boom");
        assert!(e == "#N/A");
    }
}
