//! In-memory [`Environment`] for engine tests.
use std::collections::BTreeMap;

use datasheet_common::{CellValue, Region, UNBOUNDED, parse_a1_cell};
use datasheet_parse::ASTNode;
use rustc_hash::FxHashMap;

use crate::traits::Environment;

type CellKey = (u32, u32); // 0-based (row, col)

#[derive(Debug, Default, Clone)]
struct Sheet {
    name: String,
    cells: BTreeMap<CellKey, CellValue>,
    formulas: FxHashMap<CellKey, ASTNode>,
}

#[derive(Debug, Default, Clone)]
pub struct TestEnvironment {
    sheets: Vec<Sheet>,
    variables: FxHashMap<String, CellValue>,
}

impl TestEnvironment {
    /* ─────────────── constructors ─────────────── */
    /// An environment with one sheet named `Sheet1`.
    pub fn new() -> Self {
        Self::default().with_sheet("Sheet1")
    }

    pub fn with_sheet(mut self, name: &str) -> Self {
        self.add_sheet(name);
        self
    }

    pub fn add_sheet(&mut self, name: &str) {
        if self.sheet(name).is_none() {
            self.sheets.push(Sheet {
                name: name.to_string(),
                ..Sheet::default()
            });
        }
    }

    pub fn remove_sheet(&mut self, name: &str) {
        self.sheets.retain(|s| !s.name.eq_ignore_ascii_case(name));
    }

    pub fn rename_sheet(&mut self, old: &str, new: &str) {
        if let Some(sheet) = self.sheet_mut(old) {
            sheet.name = new.to_string();
        }
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /* ─────────────── cell helpers ─────────────── */
    pub fn with_cell(mut self, sheet: &str, row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        self.set_cell_value(row, col, sheet, value.into());
        self
    }

    /// `a1` must be a valid A1 address.
    pub fn with_cell_a1(self, sheet: &str, a1: &str, value: impl Into<CellValue>) -> Self {
        let cell = parse_a1_cell(a1).expect("bad A1 ref in with_cell_a1");
        self.with_cell(sheet, cell.row, cell.col, value)
    }

    pub fn value_a1(&self, sheet: &str, a1: &str) -> CellValue {
        let cell = parse_a1_cell(a1).expect("bad A1 ref in value_a1");
        self.get_cell_value(cell.row, cell.col, sheet)
    }

    pub fn set_formula(&mut self, sheet: &str, row: u32, col: u32, formula: Option<ASTNode>) {
        if let Some(s) = self.sheet_mut(sheet) {
            match formula {
                Some(f) => s.formulas.insert((row, col), f),
                None => s.formulas.remove(&(row, col)),
            };
        }
    }
}

impl Environment for TestEnvironment {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.sheet(sheet).is_some()
    }

    fn get_cell_value(&self, row: u32, col: u32, sheet: &str) -> CellValue {
        self.sheet(sheet)
            .and_then(|s| s.cells.get(&(row, col)).cloned())
            .unwrap_or_default()
    }

    fn get_formula(&self, row: u32, col: u32, sheet: &str) -> Option<ASTNode> {
        self.sheet(sheet)
            .and_then(|s| s.formulas.get(&(row, col)).cloned())
    }

    fn set_cell_value(&mut self, row: u32, col: u32, sheet: &str, value: CellValue) {
        if let Some(s) = self.sheet_mut(sheet) {
            if value.is_empty() {
                s.cells.remove(&(row, col));
            } else {
                s.cells.insert((row, col), value);
            }
        }
    }

    fn get_range_values(&self, sheet: &str, region: &Region) -> Vec<Vec<CellValue>> {
        let Some(s) = self.sheet(sheet) else {
            return Vec::new();
        };
        let max_row = s.cells.keys().map(|k| k.0).max().unwrap_or(0);
        let max_col = s.cells.keys().map(|k| k.1).max().unwrap_or(0);
        let bottom = if region.bottom == UNBOUNDED {
            max_row.max(region.top)
        } else {
            region.bottom
        };
        let right = if region.right == UNBOUNDED {
            max_col.max(region.left)
        } else {
            region.right
        };
        (region.top..=bottom)
            .map(|r| {
                (region.left..=right)
                    .map(|c| s.cells.get(&(r, c)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn get_variable(&self, name: &str) -> Option<CellValue> {
        self.variables.get(name).cloned()
    }

    fn set_variable(&mut self, name: &str, value: CellValue) {
        self.variables.insert(name.to_string(), value);
    }

    fn clear_variable(&mut self, name: &str) {
        self.variables.remove(name);
    }

    fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.sort();
        names
    }
}
