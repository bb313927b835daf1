use std::sync::Arc;

use datasheet_common::{CellError, CellValue, ErrorKind};

use crate::function::{ArgKind, ArgSpec, Function};
use crate::traits::{ArgumentHandle, FunctionContext};

pub(crate) fn functions() -> Vec<Arc<dyn Function>> {
    vec![
        Arc::new(TrueFn),
        Arc::new(FalseFn),
        Arc::new(IfFn),
        Arc::new(AndFn),
        Arc::new(OrFn),
        Arc::new(NotFn),
        Arc::new(IfErrorFn),
    ]
}

/// Truth values for AND/OR: text and blanks inside references are skipped,
/// direct text is an error.
fn truth_values(args: &[ArgumentHandle<'_, '_>]) -> Result<Vec<bool>, CellError> {
    let mut out = Vec::new();
    for arg in args {
        if arg.is_collection() {
            for v in arg.values()? {
                match v {
                    CellValue::Boolean(b) => out.push(b),
                    CellValue::Number(n) => out.push(n != 0.0),
                    _ => {}
                }
            }
        } else {
            match arg.scalar()? {
                CellValue::Empty => {}
                v => out.push(v.coerce_to_bool()?),
            }
        }
    }
    if out.is_empty() {
        return Err(CellError::new(ErrorKind::Value).with_message("no logical values"));
    }
    Ok(out)
}

#[derive(Debug)]
pub struct TrueFn;

impl Function for TrueFn {
    fn name(&self) -> &'static str {
        "TRUE"
    }

    fn eval<'a, 'b>(
        &self,
        _args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(true))
    }
}

#[derive(Debug)]
pub struct FalseFn;

impl Function for FalseFn {
    fn name(&self) -> &'static str {
        "FALSE"
    }

    fn eval<'a, 'b>(
        &self,
        _args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(false))
    }
}

/// `IF(condition, then, [else])`. Only the chosen branch is evaluated.
#[derive(Debug)]
pub struct IfFn;

impl Function for IfFn {
    fn name(&self) -> &'static str {
        "IF"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[
            ArgSpec::required(ArgKind::Logical),
            ArgSpec::required(ArgKind::Any),
            ArgSpec::optional(ArgKind::Any),
        ];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        if args[0].boolean()? {
            args[1].value()
        } else {
            match args.get(2) {
                Some(otherwise) => otherwise.value(),
                None => Ok(CellValue::Boolean(false)),
            }
        }
    }
}

#[derive(Debug)]
pub struct AndFn;

impl Function for AndFn {
    fn name(&self) -> &'static str {
        "AND"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::repeating(ArgKind::Logical)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(truth_values(args)?.into_iter().all(|b| b)))
    }
}

#[derive(Debug)]
pub struct OrFn;

impl Function for OrFn {
    fn name(&self) -> &'static str {
        "OR"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::repeating(ArgKind::Logical)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(truth_values(args)?.into_iter().any(|b| b)))
    }
}

#[derive(Debug)]
pub struct NotFn;

impl Function for NotFn {
    fn name(&self) -> &'static str {
        "NOT"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Logical)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(!args[0].boolean()?))
    }
}

/// `IFERROR(value, fallback)`.
#[derive(Debug)]
pub struct IfErrorFn;

impl Function for IfErrorFn {
    fn name(&self) -> &'static str {
        "IFERROR"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[
            ArgSpec::required(ArgKind::Any),
            ArgSpec::required(ArgKind::Any),
        ];
        SCHEMA
    }

    fn accepts_errors(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        match args[0].scalar()? {
            CellValue::Error(_) => args[1].value(),
            v => Ok(v),
        }
    }
}
