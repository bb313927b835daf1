use datasheet_common::{Axis, CellValue, Region, UNBOUNDED};
use datasheet_eval::Environment;
use datasheet_parse::ASTNode;
use rustc_hash::FxHashMap;

use crate::cell_store::CellStore;
use crate::config::WorkbookConfig;
use crate::error::WorkbookError;
use crate::row_col::RowColInfo;

/// One grid of cells with its row and column information.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    num_rows: u32,
    num_cols: u32,
    pub(crate) cells: CellStore,
    pub(crate) rows: RowColInfo,
    pub(crate) cols: RowColInfo,
}

impl Sheet {
    pub fn new(name: &str, config: &WorkbookConfig) -> Self {
        Self {
            name: name.to_string(),
            num_rows: config.default_rows,
            num_cols: config.default_cols,
            cells: CellStore::new(),
            rows: RowColInfo::new(config.default_row_height),
            cols: RowColInfo::new(config.default_col_width),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> u32 {
        self.num_rows
    }

    pub fn num_cols(&self) -> u32 {
        self.num_cols
    }

    pub fn count(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.num_rows,
            Axis::Col => self.num_cols,
        }
    }

    pub(crate) fn resize(&mut self, axis: Axis, delta: i64) {
        let n = match axis {
            Axis::Row => &mut self.num_rows,
            Axis::Col => &mut self.num_cols,
        };
        *n = (*n as i64 + delta).clamp(0, (UNBOUNDED - 1) as i64) as u32;
    }

    /// The whole sheet as a bounded region, `None` once either axis is empty.
    pub fn region(&self) -> Option<Region> {
        if self.num_rows == 0 || self.num_cols == 0 {
            return None;
        }
        Some(Region::new(0, 0, self.num_rows - 1, self.num_cols - 1))
    }

    /// `region` with unbounded edges clipped to the sheet.
    pub fn clip(&self, region: &Region) -> Option<Region> {
        self.region()?.intersection(region)
    }

    /// Whether `count` more rows or columns still leave every index below
    /// [`UNBOUNDED`].
    pub fn can_grow(&self, axis: Axis, count: u32) -> bool {
        self.count(axis)
            .checked_add(count)
            .is_some_and(|n| n <= UNBOUNDED - 1)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.num_rows && col < self.num_cols
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    pub fn info(&self, axis: Axis) -> &RowColInfo {
        match axis {
            Axis::Row => &self.rows,
            Axis::Col => &self.cols,
        }
    }

    pub(crate) fn info_mut(&mut self, axis: Axis) -> &mut RowColInfo {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Col => &mut self.cols,
        }
    }

    pub fn get_value(&self, row: u32, col: u32) -> CellValue {
        self.cells.get_value(row, col)
    }

    /// Formula text with the leading `=`.
    pub fn get_formula(&self, row: u32, col: u32) -> Option<String> {
        self.cells.get_formula(row, col).map(ASTNode::to_formula)
    }
}

/// The sheets of a workbook plus its variable values; what formulas read
/// from and write their results to.
#[derive(Debug, Default)]
pub struct Sheets {
    list: Vec<Sheet>,
    variables: FxHashMap<String, CellValue>,
    /// Cells written by the engine since the last drain.
    computed: Vec<(String, u32, u32)>,
}

impl Sheets {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.list
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn require(&self, name: &str) -> Result<usize, WorkbookError> {
        self.index_of(name)
            .ok_or_else(|| WorkbookError::UnknownSheet(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.index_of(name).map(|i| &self.list[i])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.index_of(name).map(|i| &mut self.list[i])
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> &mut Sheet {
        &mut self.list[index]
    }

    pub fn at(&self, index: usize) -> &Sheet {
        &self.list[index]
    }

    pub fn names(&self) -> Vec<&str> {
        self.list.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sheet> + '_ {
        self.list.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sheet> + '_ {
        self.list.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn push(&mut self, sheet: Sheet) {
        self.list.push(sheet);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Sheet {
        self.list.remove(index)
    }

    pub(crate) fn rename(&mut self, index: usize, name: &str) {
        self.list[index].name = name.to_string();
    }

    pub(crate) fn take_computed(&mut self) -> Vec<(String, u32, u32)> {
        std::mem::take(&mut self.computed)
    }
}

impl Environment for Sheets {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.index_of(sheet).is_some()
    }

    fn get_cell_value(&self, row: u32, col: u32, sheet: &str) -> CellValue {
        self.get(sheet)
            .map(|s| s.cells.get_value(row, col))
            .unwrap_or_default()
    }

    fn get_formula(&self, row: u32, col: u32, sheet: &str) -> Option<ASTNode> {
        self.get(sheet)
            .and_then(|s| s.cells.get_formula(row, col).cloned())
    }

    fn set_cell_value(&mut self, row: u32, col: u32, sheet: &str, value: CellValue) {
        if let Some(index) = self.index_of(sheet) {
            let s = &mut self.list[index];
            s.cells.put_value(row, col, value);
            self.computed.push((s.name.clone(), row, col));
        }
    }

    fn get_range_values(&self, sheet: &str, region: &Region) -> Vec<Vec<CellValue>> {
        let Some(s) = self.get(sheet) else {
            return Vec::new();
        };
        let Some(clipped) = s.clip(region) else {
            return Vec::new();
        };
        (clipped.top..=clipped.bottom)
            .map(|r| {
                (clipped.left..=clipped.right)
                    .map(|c| s.cells.get_value(r, c))
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
