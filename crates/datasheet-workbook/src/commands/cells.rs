use datasheet_common::{CellValue, Region};
use serde_json::Value;

use super::{Command, UndoSlot, in_sheet};
use crate::data::{CopyOptions, WorkbookData};

#[derive(Debug)]
pub struct SetCellValue {
    sheet: String,
    row: u32,
    col: u32,
    value: CellValue,
    slot: UndoSlot,
}

impl SetCellValue {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
            value: value.into(),
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetCellValue {
    fn name(&self) -> &str {
        "SetCellValue"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        in_sheet(data, &self.sheet, self.row, self.col)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result =
            data.set_cell_values(&self.sheet, vec![(self.row, self.col, self.value.clone())]);
        self.slot.record("SetCellValue", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Several values on one sheet as a single step.
#[derive(Debug)]
pub struct SetCellValues {
    sheet: String,
    values: Vec<(u32, u32, CellValue)>,
    slot: UndoSlot,
}

impl SetCellValues {
    pub fn new(sheet: impl Into<String>, values: Vec<(u32, u32, CellValue)>) -> Self {
        Self {
            sheet: sheet.into(),
            values,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetCellValues {
    fn name(&self) -> &str {
        "SetCellValues"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        self.values
            .iter()
            .all(|&(row, col, _)| in_sheet(data, &self.sheet, row, col))
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.set_cell_values(&self.sheet, self.values.clone());
        self.slot.record("SetCellValues", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Formula text, with or without the leading `=`.
#[derive(Debug)]
pub struct SetFormula {
    sheet: String,
    row: u32,
    col: u32,
    formula: String,
    slot: UndoSlot,
}

impl SetFormula {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32, formula: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
            formula: formula.into(),
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetFormula {
    fn name(&self) -> &str {
        "SetFormula"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        in_sheet(data, &self.sheet, self.row, self.col)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let text = if self.formula.starts_with('=') {
            self.formula.clone()
        } else {
            format!("={}", self.formula)
        };
        let result = data
            .parse_formula(&text)
            .and_then(|ast| data.set_formula(&self.sheet, self.row, self.col, ast));
        self.slot.record("SetFormula", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

#[derive(Debug)]
pub struct ClearCells {
    sheet: String,
    regions: Vec<Region>,
    slot: UndoSlot,
}

impl ClearCells {
    pub fn new(sheet: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            sheet: sheet.into(),
            regions,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for ClearCells {
    fn name(&self) -> &str {
        "ClearCells"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        data.sheet(&self.sheet).is_some()
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.clear_cells(&self.sheet, &self.regions);
        self.slot.record("ClearCells", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Copy a block within a sheet; relative references in copied formulas
/// follow the move.
#[derive(Debug)]
pub struct CopyRange {
    sheet: String,
    from: Region,
    to: (u32, u32),
    options: CopyOptions,
    slot: UndoSlot,
}

impl CopyRange {
    pub fn new(sheet: impl Into<String>, from: Region, to: (u32, u32)) -> Self {
        Self {
            sheet: sheet.into(),
            from,
            to,
            options: CopyOptions::default(),
            slot: UndoSlot::default(),
        }
    }

    pub fn with_options(mut self, options: CopyOptions) -> Self {
        self.options = options;
        self
    }
}

impl Command for CopyRange {
    fn name(&self) -> &str {
        "CopyRange"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        in_sheet(data, &self.sheet, self.to.0, self.to.1)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.copy_range(&self.sheet, self.from, self.to, self.options);
        self.slot.record("CopyRange", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Tag a region with a cell type name.
#[derive(Debug)]
pub struct SetType {
    sheet: String,
    region: Region,
    cell_type: String,
    slot: UndoSlot,
}

impl SetType {
    pub fn new(sheet: impl Into<String>, region: Region, cell_type: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            region,
            cell_type: cell_type.into(),
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetType {
    fn name(&self) -> &str {
        "SetType"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        data.sheet(&self.sheet).is_some()
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.set_type(&self.sheet, self.region, &self.cell_type);
        self.slot.record("SetType", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

#[derive(Debug)]
pub struct SetMetaData {
    sheet: String,
    row: u32,
    col: u32,
    key: String,
    value: Option<Value>,
    slot: UndoSlot,
}

impl SetMetaData {
    /// `None` removes the entry.
    pub fn new(
        sheet: impl Into<String>,
        row: u32,
        col: u32,
        key: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
            key: key.into(),
            value,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetMetaData {
    fn name(&self) -> &str {
        "SetMetaData"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        in_sheet(data, &self.sheet, self.row, self.col)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result =
            data.set_metadata(&self.sheet, self.row, self.col, &self.key, self.value.clone());
        self.slot.record("SetMetaData", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}
