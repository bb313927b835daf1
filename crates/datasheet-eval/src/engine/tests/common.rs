//! Common test helpers
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use datasheet_common::{CellError, CellValue, parse_a1_cell};

use crate::engine::{EngineConfig, FormulaEngine, VertexKey};
use crate::function::{ArgKind, ArgSpec, Function};
use crate::test_env::TestEnvironment;
use crate::traits::{ArgumentHandle, Environment, FunctionContext};

pub const SHEET: &str = "Sheet1";

pub fn engine() -> FormulaEngine {
    let mut engine = FormulaEngine::new(EngineConfig::default()).with_seed(7);
    engine.add_sheet(SHEET).unwrap();
    engine
}

pub fn pos(a1: &str) -> (u32, u32) {
    let cell = parse_a1_cell(a1).unwrap();
    (cell.row, cell.col)
}

pub fn key(a1: &str) -> VertexKey {
    let (row, col) = pos(a1);
    VertexKey::cell(SHEET, row, col)
}

/// Store the formula in both the environment and the engine.
pub fn set_formula(engine: &mut FormulaEngine, env: &mut TestEnvironment, a1: &str, text: &str) {
    let ast = engine.parse_formula(text).unwrap();
    let (row, col) = pos(a1);
    env.set_formula(SHEET, row, col, Some(ast.clone()));
    engine.set_formula(&key(a1), Some(ast)).unwrap();
}

/// Overwrite a cell with a plain value the way a host would.
pub fn set_value(
    engine: &mut FormulaEngine,
    env: &mut TestEnvironment,
    a1: &str,
    value: impl Into<CellValue>,
) {
    let (row, col) = pos(a1);
    if env.get_formula(row, col, SHEET).is_some() {
        env.set_formula(SHEET, row, col, None);
        engine.set_formula(&key(a1), None).unwrap();
    }
    env.set_cell_value(row, col, SHEET, value.into());
    engine.on_cells_changed(SHEET, &[(row, col)], &[]);
}

pub fn formula_text(engine: &FormulaEngine, a1: &str) -> Option<String> {
    engine.graph().formula(&key(a1)).map(|f| f.to_formula())
}

/// `PROBE(x)` returns `x` and counts its calls.
#[derive(Debug, Default)]
pub struct ProbeFn {
    pub calls: Arc<AtomicUsize>,
}

impl Function for ProbeFn {
    fn name(&self) -> &'static str {
        "PROBE"
    }

    fn arg_schema(&self) -> &'static [ArgSpec] {
        const SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Any)];
        SCHEMA
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        args[0].scalar()
    }
}

/// `BOOM()` panics.
#[derive(Debug)]
pub struct BoomFn;

impl Function for BoomFn {
    fn name(&self) -> &'static str {
        "BOOM"
    }

    fn eval<'a, 'b>(
        &self,
        _args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &FunctionContext<'_>,
    ) -> Result<CellValue, CellError> {
        panic!("boom")
    }
}
