//! Volatile functions like RAND, RANDBETWEEN.

use std::sync::Arc;

use datasheet_common::{CellError, CellValue, ErrorKind};

use crate::function::{ArgKind, ArgSpec, Function};
use crate::traits::{ArgumentHandle, FunctionContext};

pub(crate) fn functions() -> Vec<Arc<dyn Function>> {
    vec![Arc::new(RandFn), Arc::new(RandBetweenFn)]
}

#[derive(Debug)]
pub struct RandFn;

impl Function for RandFn {
    fn name(&self) -> &'static str {
        "RAND"
    }

    fn volatile(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        _args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Number(ctx.random()))
    }
}

#[derive(Debug)]
pub struct RandBetweenFn;

impl Function for RandBetweenFn {
    fn name(&self) -> &'static str {
        "RANDBETWEEN"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[
            ArgSpec::required(ArgKind::Number),
            ArgSpec::required(ArgKind::Number),
        ];
        SCHEMA
    }

    fn volatile(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let lo = args[0].number()?.ceil();
        let hi = args[1].number()?.floor();
        if lo > hi {
            return Err(CellError::new(ErrorKind::Num));
        }
        Ok(CellValue::Number(
            (lo + ctx.random() * (hi - lo + 1.0)).floor().min(hi),
        ))
    }
}
