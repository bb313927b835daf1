use std::cell::RefCell;

use datasheet_common::{CellError, CellValue, ErrorKind, Region};
use datasheet_parse::{ASTNode, ASTNodeType, ReferenceType};
use rand::Rng;
use rand::rngs::SmallRng;

use crate::function::{ArgKind, ArgSpec};
use crate::interpreter::Interpreter;

/// The host a formula reads from and writes its result to.
///
/// Sheets are addressed by name; positions are 0-based. Implemented by the
/// workbook over its sheets, and by [`crate::test_env::TestEnvironment`] for
/// engine-level tests.
pub trait Environment {
    fn sheet_exists(&self, sheet: &str) -> bool;

    fn get_cell_value(&self, row: u32, col: u32, sheet: &str) -> CellValue;

    /// The formula stored in a cell, if any.
    fn get_formula(&self, row: u32, col: u32, sheet: &str) -> Option<ASTNode>;

    fn set_cell_value(&mut self, row: u32, col: u32, sheet: &str, value: CellValue);

    /// Values over `region` in row-major order. Unbounded edges are clipped
    /// to the extent of the sheet.
    fn get_range_values(&self, sheet: &str, region: &Region) -> Vec<Vec<CellValue>>;

    fn variable_exists(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    fn get_variable(&self, name: &str) -> Option<CellValue>;

    fn set_variable(&mut self, name: &str, value: CellValue);

    fn clear_variable(&mut self, name: &str);

    fn variable_names(&self) -> Vec<String>;
}

/// What a function sees of its surroundings besides its arguments.
pub struct FunctionContext<'a> {
    env: &'a dyn Environment,
    current_sheet: &'a str,
    rng: &'a RefCell<SmallRng>,
}

impl<'a> FunctionContext<'a> {
    pub(crate) fn new(
        env: &'a dyn Environment,
        current_sheet: &'a str,
        rng: &'a RefCell<SmallRng>,
    ) -> Self {
        Self {
            env,
            current_sheet,
            rng,
        }
    }

    pub fn env(&self) -> &dyn Environment {
        self.env
    }

    pub fn current_sheet(&self) -> &str {
        self.current_sheet
    }

    /// Uniform in `[0, 1)`.
    pub fn random(&self) -> f64 {
        self.rng.borrow_mut().r#gen::<f64>()
    }
}

/// A lazily evaluated function argument.
///
/// Unless the function accepts errors, an error value surfaces as `Err` so
/// that `?` propagates it unchanged.
pub struct ArgumentHandle<'a, 'b> {
    node: &'a ASTNode,
    interp: &'a Interpreter<'b>,
    accepts_errors: bool,
    spec: Option<&'a ArgSpec>,
}

impl<'a, 'b> ArgumentHandle<'a, 'b> {
    pub(crate) fn new(
        node: &'a ASTNode,
        interp: &'a Interpreter<'b>,
        accepts_errors: bool,
        spec: Option<&'a ArgSpec>,
    ) -> Self {
        Self {
            node,
            interp,
            accepts_errors,
            spec,
        }
    }

    pub fn node(&self) -> &ASTNode {
        self.node
    }

    pub fn reference(&self) -> Option<&ReferenceType> {
        match &self.node.node_type {
            ASTNodeType::Reference { reference, .. } => Some(reference),
            _ => None,
        }
    }

    /// References and array literals, whose cells are read as stored rather
    /// than coerced.
    pub fn is_collection(&self) -> bool {
        matches!(
            self.node.node_type,
            ASTNodeType::Reference { .. } | ASTNodeType::Array(_)
        )
    }

    fn check(&self, value: CellValue) -> Result<CellValue, CellError> {
        match value {
            CellValue::Error(e) if !self.accepts_errors => Err(e),
            v => Ok(v),
        }
    }

    /// The evaluated argument; arrays are kept whole.
    pub fn value(&self) -> Result<CellValue, CellError> {
        if let ASTNodeType::Literal(v) = &self.node.node_type {
            return self.check(v.clone());
        }
        self.check(self.interp.evaluate(self.node))
    }

    /// The evaluated argument reduced to one value.
    pub fn scalar(&self) -> Result<CellValue, CellError> {
        self.value().and_then(|v| self.check(v.into_scalar()))
    }

    /// Every value the argument holds, flattened row by row.
    pub fn values(&self) -> Result<Vec<CellValue>, CellError> {
        let value = self.value()?;
        let flat: Vec<CellValue> = value.flatten().into_iter().cloned().collect();
        if !self.accepts_errors
            && let Some(e) = flat.iter().find_map(|v| v.as_error())
        {
            return Err(e.clone());
        }
        Ok(flat)
    }

    pub fn number(&self) -> Result<f64, CellError> {
        self.scalar()?.coerce_to_number()
    }

    pub fn text(&self) -> Result<String, CellError> {
        self.scalar()?.coerce_to_text()
    }

    pub fn boolean(&self) -> Result<bool, CellError> {
        self.scalar()?.coerce_to_bool()
    }

    /// The scalar converted to the kind declared by the function's schema.
    pub fn coerced(&self) -> Result<CellValue, CellError> {
        match self.spec.map(|s| s.kind) {
            Some(ArgKind::Number) => self.number().map(CellValue::Number),
            Some(ArgKind::Text) => self.text().map(CellValue::Text),
            Some(ArgKind::Logical) => self.boolean().map(CellValue::Boolean),
            Some(ArgKind::Range) if !self.is_collection() => Err(CellError::new(ErrorKind::Value)
                .with_message("expected a range reference")),
            Some(ArgKind::Range) => self.value(),
            Some(ArgKind::Any) | None => self.scalar(),
        }
    }
}
