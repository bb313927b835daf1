//! The contract every sheet function implements.

use datasheet_common::{CellError, CellValue, ErrorKind};

use crate::traits::{ArgumentHandle, FunctionContext};

/// What a parameter expects its argument to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Any,
    Number,
    Text,
    Logical,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub required: bool,
    /// Only meaningful on the last parameter: it may be given any number of times.
    pub repeating: bool,
}

impl ArgSpec {
    pub const fn required(kind: ArgKind) -> Self {
        Self {
            kind,
            required: true,
            repeating: false,
        }
    }

    pub const fn optional(kind: ArgKind) -> Self {
        Self {
            kind,
            required: false,
            repeating: false,
        }
    }

    pub const fn repeating(kind: ArgKind) -> Self {
        Self {
            kind,
            required: true,
            repeating: true,
        }
    }
}

/// Minimum and maximum argument count a schema allows. `None` is unbounded.
pub fn arity(schema: &[ArgSpec]) -> (usize, Option<usize>) {
    let min = schema.iter().filter(|s| s.required).count();
    let max = match schema.last() {
        Some(last) if last.repeating => None,
        _ => Some(schema.len()),
    };
    (min, max)
}

/// The schema entry that applies to argument `index`.
pub fn spec_for(schema: &[ArgSpec], index: usize) -> Option<&ArgSpec> {
    schema
        .get(index)
        .or_else(|| schema.last().filter(|s| s.repeating))
}

pub trait Function: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// An empty schema disables arity checking.
    fn arg_schema(&self) -> &'static [ArgSpec] {
        &[]
    }

    /// If false, an error in any argument is returned before the function
    /// sees it.
    fn accepts_errors(&self) -> bool {
        false
    }

    /// Volatile functions are recalculated on every pass.
    fn volatile(&self) -> bool {
        false
    }

    /// `Err` is the function's result as an error value. A panic is caught by
    /// the interpreter and turned into `#N/A`.
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError>;
}

pub(crate) fn check_arity(function: &dyn Function, given: usize) -> Result<(), CellError> {
    let schema = function.arg_schema();
    if schema.is_empty() {
        return Ok(());
    }
    let (min, max) = arity(schema);
    if given < min || max.is_some_and(|m| given > m) {
        return Err(CellError::new(ErrorKind::Value).with_message(format!(
            "{} takes {} argument(s), got {given}",
            function.name(),
            match max {
                Some(m) if m == min => min.to_string(),
                Some(m) => format!("{min} to {m}"),
                None => format!("at least {min}"),
            }
        )));
    }
    Ok(())
}
