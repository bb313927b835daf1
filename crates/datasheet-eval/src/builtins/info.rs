use std::sync::Arc;

use datasheet_common::{CellError, CellValue, ErrorKind};
use datasheet_parse::ReferenceType;

use crate::function::{ArgKind, ArgSpec, Function};
use crate::traits::{ArgumentHandle, FunctionContext};

const ONE_ANY: &[ArgSpec] = &[ArgSpec::required(ArgKind::Any)];

pub(crate) fn functions() -> Vec<Arc<dyn Function>> {
    vec![Arc::new(IsErrorFn), Arc::new(IsBlankFn), Arc::new(IsFormulaFn)]
}

#[derive(Debug)]
pub struct IsErrorFn;

impl Function for IsErrorFn {
    fn name(&self) -> &'static str {
        "ISERROR"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        ONE_ANY
    }

    fn accepts_errors(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(args[0].scalar()?.is_error()))
    }
}

#[derive(Debug)]
pub struct IsBlankFn;

impl Function for IsBlankFn {
    fn name(&self) -> &'static str {
        "ISBLANK"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        ONE_ANY
    }

    fn accepts_errors(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Boolean(args[0].scalar()?.is_empty()))
    }
}

/// `ISFORMULA(ref)`: whether the referenced cell holds a formula.
#[derive(Debug)]
pub struct IsFormulaFn;

impl Function for IsFormulaFn {
    fn name(&self) -> &'static str {
        "ISFORMULA"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Range)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let (sheet, row, col) = match args[0].reference() {
            Some(ReferenceType::Cell { sheet, row, col, .. }) => (sheet, *row, *col),
            Some(r @ ReferenceType::Range { sheet, .. }) => {
                let Some(region) = r.region() else {
                    return Err(CellError::new(ErrorKind::Ref));
                };
                (sheet, region.top, region.left)
            }
            _ => {
                return Err(CellError::new(ErrorKind::Value)
                    .with_message("ISFORMULA expects a cell reference"));
            }
        };
        let sheet = sheet.as_deref().unwrap_or(ctx.current_sheet());
        if !ctx.env().sheet_exists(sheet) {
            return Err(CellError::new(ErrorKind::Ref));
        }
        Ok(CellValue::Boolean(
            ctx.env().get_formula(row, col, sheet).is_some(),
        ))
    }
}
