use std::sync::Arc;

use datasheet_common::{CellError, CellValue};

use crate::function::{ArgKind, ArgSpec, Function};
use crate::traits::{ArgumentHandle, FunctionContext};

pub(crate) fn functions() -> Vec<Arc<dyn Function>> {
    vec![Arc::new(ConcatFn), Arc::new(LenFn)]
}

/// Joins every value of every argument, ranges row by row.
#[derive(Debug)]
pub struct ConcatFn;

impl Function for ConcatFn {
    fn name(&self) -> &'static str {
        "CONCAT"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::repeating(ArgKind::Any)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let mut out = String::new();
        for arg in args {
            for v in arg.values()? {
                out.push_str(&v.coerce_to_text()?);
            }
        }
        Ok(CellValue::Text(out))
    }
}

#[derive(Debug)]
pub struct LenFn;

impl Function for LenFn {
    fn name(&self) -> &'static str {
        "LEN"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Text)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Number(args[0].text()?.chars().count() as f64))
    }
}
