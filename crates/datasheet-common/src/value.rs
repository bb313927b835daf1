use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::{CellError, ErrorKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value held by a cell, produced by a formula or bound to a variable.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Row-major values of a range reference.
    Array(Vec<Vec<CellValue>>),
    Error(CellError),
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Empty => state.write_u8(0),
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::Text(s) => s.hash(state),
            CellValue::Boolean(b) => b.hash(state),
            CellValue::Array(a) => a.hash(state),
            CellValue::Error(e) => e.hash(state),
        }
    }
}

impl Eq for CellValue {}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(true) => write!(f, "TRUE"),
            CellValue::Boolean(false) => write!(f, "FALSE"),
            CellValue::Array(a) => write!(f, "{a:?}"),
            CellValue::Error(e) => write!(f, "{}", e.kind),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    pub fn as_error(&self) -> Option<&CellError> {
        match self {
            CellValue::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Collapse a 1x1 array to its element. Larger arrays take their top-left
    /// value; an empty array is `Empty`.
    pub fn into_scalar(self) -> CellValue {
        match self {
            CellValue::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|r| r.into_iter().next())
                .unwrap_or(CellValue::Empty),
            other => other,
        }
    }

    /// Numeric coercion used by arithmetic and unary operators.
    ///
    /// Empty is 0, booleans are 0/1, text must parse as a number.
    pub fn coerce_to_number(&self) -> Result<f64, CellError> {
        match self {
            CellValue::Number(n) => Ok(*n),
            CellValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            CellValue::Empty => Ok(0.0),
            CellValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                CellError::new(ErrorKind::Value)
                    .with_message(format!("Cannot convert '{s}' to a number"))
            }),
            CellValue::Error(e) => Err(e.clone()),
            CellValue::Array(_) => self.clone().into_scalar().coerce_to_number(),
        }
    }

    pub fn coerce_to_text(&self) -> Result<String, CellError> {
        match self {
            CellValue::Error(e) => Err(e.clone()),
            CellValue::Array(_) => self.clone().into_scalar().coerce_to_text(),
            other => Ok(other.to_string()),
        }
    }

    pub fn coerce_to_bool(&self) -> Result<bool, CellError> {
        match self {
            CellValue::Boolean(b) => Ok(*b),
            CellValue::Number(n) => Ok(*n != 0.0),
            CellValue::Empty => Ok(false),
            CellValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            CellValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            CellValue::Text(s) => Err(CellError::new(ErrorKind::Value)
                .with_message(format!("Cannot convert '{s}' to a logical"))),
            CellValue::Error(e) => Err(e.clone()),
            CellValue::Array(_) => self.clone().into_scalar().coerce_to_bool(),
        }
    }

    /// Flatten arrays row-major; scalars yield themselves.
    pub fn flatten(&self) -> Vec<&CellValue> {
        match self {
            CellValue::Array(rows) => rows.iter().flat_map(|r| r.iter()).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_rules() {
        assert_eq!(CellValue::Empty.coerce_to_number(), Ok(0.0));
        assert_eq!(CellValue::Boolean(true).coerce_to_number(), Ok(1.0));
        assert_eq!(CellValue::from(" 2.5 ").coerce_to_number(), Ok(2.5));
        let err = CellValue::from("abc").coerce_to_number().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
        assert_eq!(CellValue::from("TRUE").coerce_to_bool(), Ok(true));
        assert_eq!(CellValue::Number(3.0).coerce_to_text().unwrap(), "3");
    }

    #[test]
    fn array_collapses_to_top_left() {
        let arr = CellValue::Array(vec![
            vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            vec![CellValue::Number(3.0), CellValue::Number(4.0)],
        ]);
        assert_eq!(arr.flatten().len(), 4);
        assert_eq!(arr.into_scalar(), CellValue::Number(1.0));
        assert_eq!(CellValue::Array(vec![]).into_scalar(), CellValue::Empty);
    }
}
