use std::sync::Arc;

use datasheet_common::{CellError, CellValue, ErrorKind};

use super::collect_numbers;
use crate::function::{ArgKind, ArgSpec, Function};
use crate::traits::{ArgumentHandle, FunctionContext};

const NUMBERS: &[ArgSpec] = &[ArgSpec::repeating(ArgKind::Any)];
const ONE_NUMBER: &[ArgSpec] = &[ArgSpec::required(ArgKind::Number)];

pub(crate) fn functions() -> Vec<Arc<dyn Function>> {
    vec![
        Arc::new(SumFn),
        Arc::new(MinFn),
        Arc::new(MaxFn),
        Arc::new(AverageFn),
        Arc::new(CountFn),
        Arc::new(AbsFn),
        Arc::new(SinFn),
        Arc::new(RoundFn),
    ]
}

#[derive(Debug)]
pub struct SumFn;

impl Function for SumFn {
    fn name(&self) -> &'static str {
        "SUM"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        NUMBERS
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Number(collect_numbers(args)?.into_iter().sum()))
    }
}

#[derive(Debug)]
pub struct MinFn;

impl Function for MinFn {
    fn name(&self) -> &'static str {
        "MIN"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        NUMBERS
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let min = collect_numbers(args)?.into_iter().reduce(f64::min);
        Ok(CellValue::Number(min.unwrap_or(0.0)))
    }
}

#[derive(Debug)]
pub struct MaxFn;

impl Function for MaxFn {
    fn name(&self) -> &'static str {
        "MAX"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        NUMBERS
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let max = collect_numbers(args)?.into_iter().reduce(f64::max);
        Ok(CellValue::Number(max.unwrap_or(0.0)))
    }
}

#[derive(Debug)]
pub struct AverageFn;

impl Function for AverageFn {
    fn name(&self) -> &'static str {
        "AVERAGE"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        NUMBERS
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let nums = collect_numbers(args)?;
        if nums.is_empty() {
            return Err(CellError::new(ErrorKind::Div0));
        }
        Ok(CellValue::Number(nums.iter().sum::<f64>() / nums.len() as f64))
    }
}

/// Counts numbers; errors and text are skipped rather than propagated.
#[derive(Debug)]
pub struct CountFn;

impl Function for CountFn {
    fn name(&self) -> &'static str {
        "COUNT"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        NUMBERS
    }

    fn accepts_errors(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let mut count = 0usize;
        for arg in args {
            if arg.is_collection() {
                count += arg
                    .values()?
                    .iter()
                    .filter(|v| matches!(v, CellValue::Number(_)))
                    .count();
            } else {
                match arg.scalar()? {
                    CellValue::Number(_) => count += 1,
                    CellValue::Text(s) if s.trim().parse::<f64>().is_ok() => count += 1,
                    _ => {}
                }
            }
        }
        Ok(CellValue::Number(count as f64))
    }
}

#[derive(Debug)]
pub struct AbsFn;

impl Function for AbsFn {
    fn name(&self) -> &'static str {
        "ABS"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        ONE_NUMBER
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Number(args[0].number()?.abs()))
    }
}

#[derive(Debug)]
pub struct SinFn;

impl Function for SinFn {
    fn name(&self) -> &'static str {
        "SIN"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        ONE_NUMBER
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        Ok(CellValue::Number(args[0].number()?.sin()))
    }
}

/// `ROUND(x, [digits])`, halves away from zero.
#[derive(Debug)]
pub struct RoundFn;

impl Function for RoundFn {
    fn name(&self) -> &'static str {
        "ROUND"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[
            ArgSpec::required(ArgKind::Number),
            ArgSpec::optional(ArgKind::Number),
        ];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        let x = args[0].number()?;
        let digits = match args.get(1) {
            Some(d) => d.number()?.trunc() as i32,
            None => 0,
        };
        let factor = 10f64.powi(digits);
        let rounded = (x * factor).round() / factor;
        if rounded.is_finite() {
            Ok(CellValue::Number(rounded))
        } else {
            Err(CellError::new(ErrorKind::Num))
        }
    }
}
