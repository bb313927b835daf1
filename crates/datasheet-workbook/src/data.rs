//! Workbook state and the primitive mutations commands are built from.
//!
//! Every mutation validates first and changes nothing when it fails, then
//! returns a [`WorkbookRestoreData`] that reverts it exactly. Cell stores
//! and the dependency graph each rewrite their own copy of the formulas on
//! structural edits.

use datasheet_common::{Axis, CellValue, Region, UNBOUNDED};
use datasheet_eval::{FormulaEngine, VariableInfo, VariableValue, VertexKey};
use datasheet_parse::ASTNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell_store::CellStoreRestoreData;
use crate::config::WorkbookConfig;
use crate::error::WorkbookError;
use crate::events::{EventSink, SheetEvent};
use crate::restore::WorkbookRestoreData;
use crate::sheet::{Sheet, Sheets};
use crate::sort::{ColumnSortOptions, sorted_order};

/// What [`WorkbookData::copy_range`] carries over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    pub values: bool,
    /// Formulas are copied with their relative references moved.
    pub formulas: bool,
    pub types: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            values: true,
            formulas: true,
            types: true,
        }
    }
}

#[derive(Debug)]
pub struct WorkbookData {
    config: WorkbookConfig,
    sheets: Sheets,
    engine: FormulaEngine,
    events: EventSink,
    calculation_pending: bool,
}

impl WorkbookData {
    pub fn new(config: WorkbookConfig, engine: FormulaEngine) -> Self {
        Self {
            config,
            sheets: Sheets::default(),
            engine,
            events: EventSink::new(),
            calculation_pending: false,
        }
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    pub fn sheets(&self) -> &Sheets {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn engine(&self) -> &FormulaEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FormulaEngine {
        &mut self.engine
    }

    /// Parse formula text the way the engine classifies it.
    pub fn parse_formula(&self, text: &str) -> Result<ASTNode, WorkbookError> {
        Ok(self.engine.parse_formula(text)?)
    }

    fn sheet_name(&self, index: usize) -> String {
        self.sheets.at(index).name().to_string()
    }

    fn check_region(&self, index: usize, region: Region) -> Result<(), WorkbookError> {
        let sheet = self.sheets.at(index);
        if sheet.region().is_some_and(|r| r.contains_region(&region)) {
            Ok(())
        } else {
            Err(WorkbookError::OutOfBounds {
                sheet: sheet.name().to_string(),
                region,
            })
        }
    }

    /* ───────────────────────────── sheets ───────────────────────────── */

    pub fn add_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        if self.sheets.index_of(name).is_some() {
            return Err(WorkbookError::DuplicateSheet(name.to_string()));
        }
        self.engine.add_sheet(name)?;
        self.sheets.push(Sheet::new(name, &self.config));
        self.request_calculation();
        Ok(())
    }

    /// Remove a sheet. References to it elsewhere become `#REF!`.
    pub fn remove_sheet(&mut self, name: &str) -> Result<(), WorkbookError> {
        let index = self.sheets.require(name)?;
        let removed = self.sheet_name(index);
        self.engine.remove_sheet(&removed)?;
        self.sheets.remove(index);
        self.rewrite_formulas(|home, f| f.invalidate_sheet(home, &removed));
        self.request_calculation();
        Ok(())
    }

    pub fn rename_sheet(&mut self, old: &str, new: &str) -> Result<(), WorkbookError> {
        let index = self.sheets.require(old)?;
        if self.sheets.index_of(new).is_some_and(|i| i != index) {
            return Err(WorkbookError::DuplicateSheet(new.to_string()));
        }
        let old = self.sheet_name(index);
        self.engine.rename_sheet(&old, new)?;
        self.sheets.rename(index, new);
        self.rewrite_formulas(|_, f| f.rename_sheet(&old, new));
        self.request_calculation();
        Ok(())
    }

    /// Apply `rewrite` to every stored formula, outside of any undo record.
    fn rewrite_formulas(&mut self, mut rewrite: impl FnMut(&str, &mut ASTNode) -> bool) {
        for sheet in self.sheets.iter_mut() {
            let home = sheet.name().to_string();
            let updates: Vec<((u32, u32), ASTNode)> = sheet
                .cells
                .formulas()
                .filter_map(|(pos, f)| {
                    let mut f = f.clone();
                    rewrite(&home, &mut f).then_some((pos, f))
                })
                .collect();
            let mut scratch = CellStoreRestoreData::default();
            for ((row, col), f) in updates {
                sheet.cells.set_formula(row, col, Some(f), &mut scratch);
            }
        }
    }

    /* ──────────────────────── batches & calculation ─────────────────── */

    pub fn begin_batch(&mut self) {
        self.events.begin_batch();
    }

    /// Close a batch window. Closing the outermost one runs the pending
    /// recalculation and releases the held events.
    pub fn end_batch(&mut self) {
        if self.events.depth() == 1 && self.calculation_pending {
            self.calculate(false);
        }
        self.events.end_batch();
    }

    pub fn is_batching(&self) -> bool {
        self.events.is_batching()
    }

    pub fn set_screen_updating(&mut self, on: bool) {
        self.events.emit(SheetEvent::ScreenUpdating(on));
    }

    pub fn emit(&mut self, event: SheetEvent) {
        self.events.emit(event);
    }

    pub fn drain_events(&mut self) -> Vec<SheetEvent> {
        self.events.drain()
    }

    fn request_calculation(&mut self) {
        if !self.engine.config().auto_calculate {
            return;
        }
        if self.events.is_batching() {
            self.calculation_pending = true;
        } else {
            self.calculate(false);
        }
    }

    /// Recalculate pending formulas, or all of them.
    pub fn calculate(&mut self, all: bool) {
        self.calculation_pending = false;
        self.engine.calculate(&mut self.sheets, all);
        self.emit_computed();
    }

    fn emit_computed(&mut self) {
        let mut grouped: Vec<(String, Vec<(u32, u32)>)> = Vec::new();
        for (sheet, row, col) in self.sheets.take_computed() {
            match grouped.iter_mut().find(|(s, _)| *s == sheet) {
                Some((_, positions)) => positions.push((row, col)),
                None => grouped.push((sheet, vec![(row, col)])),
            }
        }
        for (sheet, mut positions) in grouped {
            positions.sort_unstable();
            positions.dedup();
            self.events.emit(SheetEvent::CellsChanged {
                sheet,
                positions,
                regions: Vec::new(),
            });
        }
    }

    /// Tell the engine and the host that plain contents changed.
    fn notify_changed(&mut self, sheet: &str, positions: &[(u32, u32)], regions: &[Region]) {
        self.engine.on_cells_changed(sheet, positions, regions);
        self.events.emit(SheetEvent::CellsChanged {
            sheet: sheet.to_string(),
            positions: positions.to_vec(),
            regions: regions.to_vec(),
        });
        self.request_calculation();
    }

    /* ──────────────────────────── variables ─────────────────────────── */

    pub fn set_variable(&mut self, name: &str, value: VariableValue) -> Result<(), WorkbookError> {
        self.engine.set_variable(&mut self.sheets, name, value)?;
        self.emit_computed();
        Ok(())
    }

    pub fn get_variable(&self, name: &str) -> Option<CellValue> {
        self.engine.get_variable(&self.sheets, name)
    }

    pub fn clear_variable(&mut self, name: &str) {
        self.engine.clear_variable(&mut self.sheets, name);
        self.emit_computed();
    }

    pub fn variables(&self) -> Vec<VariableInfo> {
        self.engine.variables(&self.sheets)
    }

    /* ──────────────────────────── cell edits ────────────────────────── */

    pub fn set_cell_values(
        &mut self,
        sheet: &str,
        values: Vec<(u32, u32, CellValue)>,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        for &(row, col, _) in &values {
            self.check_region(index, Region::cell(row, col))?;
        }
        let name = self.sheet_name(index);
        let mut restore = WorkbookRestoreData::default();
        let mut data = CellStoreRestoreData::default();
        let mut positions = Vec::with_capacity(values.len());
        for (row, col, value) in values {
            let cleared = self
                .sheets
                .at_mut(index)
                .cells
                .set_value(row, col, value, &mut data);
            if cleared.is_some() {
                let key = VertexKey::cell(name.as_str(), row, col);
                restore.push_graph(self.engine.set_formula(&key, None)?);
            }
            positions.push((row, col));
        }
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), positions.clone(), Vec::new()));
        self.notify_changed(&name, &positions, &[]);
        Ok(restore)
    }

    pub fn set_formula(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        formula: ASTNode,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        self.check_region(index, Region::cell(row, col))?;
        let name = self.sheet_name(index);
        let mut restore = WorkbookRestoreData::default();
        let key = VertexKey::cell(name.as_str(), row, col);
        restore.push_graph(self.engine.set_formula(&key, Some(formula.clone()))?);

        let mut data = CellStoreRestoreData::default();
        self.sheets
            .at_mut(index)
            .cells
            .set_formula(row, col, Some(formula), &mut data);
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), vec![(row, col)], Vec::new()));
        self.notify_changed(&name, &[(row, col)], &[]);
        Ok(restore)
    }

    /// Remove values and formulas inside `regions`.
    pub fn clear_cells(
        &mut self,
        sheet: &str,
        regions: &[Region],
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let name = self.sheet_name(index);
        let mut restore = WorkbookRestoreData::default();
        let mut data = CellStoreRestoreData::default();
        for region in regions {
            let cleared = self.sheets.at_mut(index).cells.clear(region, &mut data);
            for (row, col) in cleared {
                let key = VertexKey::cell(name.as_str(), row, col);
                restore.push_graph(self.engine.set_formula(&key, None)?);
            }
        }
        let positions = data.positions();
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), positions.clone(), regions.to_vec()));
        self.notify_changed(&name, &positions, regions);
        Ok(restore)
    }

    /// Copy the contents of `from` so its top-left lands on `to`.
    pub fn copy_range(
        &mut self,
        sheet: &str,
        from: Region,
        to: (u32, u32),
        options: CopyOptions,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let source = self.sheets.at(index);
        let from = source
            .clip(&from)
            .ok_or_else(|| WorkbookError::OutOfBounds {
                sheet: source.name().to_string(),
                region: from,
            })?;
        let drow = to.0 as i64 - from.top as i64;
        let dcol = to.1 as i64 - from.left as i64;
        let target = from.shift(drow, dcol);
        self.check_region(index, target)?;

        let name = self.sheet_name(index);
        let cells = &self.sheets.at(index).cells;
        let contents: Vec<((u32, u32), CellValue, Option<ASTNode>)> = cells
            .positions_in(&from)
            .into_iter()
            .map(|(r, c)| ((r, c), cells.get_value(r, c), cells.get_formula(r, c).cloned()))
            .collect();
        let types = cells.types_in(&from);

        let mut restore = WorkbookRestoreData::default();
        let mut data = CellStoreRestoreData::default();
        if options.values || options.formulas {
            let cleared = self.sheets.at_mut(index).cells.clear(&target, &mut data);
            for (row, col) in cleared {
                let key = VertexKey::cell(name.as_str(), row, col);
                restore.push_graph(self.engine.set_formula(&key, None)?);
            }
        }
        for ((r, c), value, formula) in contents {
            let row = (r as i64 + drow) as u32;
            let col = (c as i64 + dcol) as u32;
            match formula {
                Some(mut f) if options.formulas => {
                    f.offset_relative(drow, dcol);
                    let key = VertexKey::cell(name.as_str(), row, col);
                    restore.push_graph(self.engine.set_formula(&key, Some(f.clone()))?);
                    self.sheets
                        .at_mut(index)
                        .cells
                        .set_formula(row, col, Some(f), &mut data);
                }
                _ if options.values => {
                    self.sheets
                        .at_mut(index)
                        .cells
                        .set_value(row, col, value, &mut data);
                }
                _ => {}
            }
        }
        if options.types {
            for (region, cell_type) in types {
                self.sheets.at_mut(index).cells.set_type(
                    region.shift(drow, dcol),
                    &cell_type,
                    &mut data,
                );
            }
        }
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), Vec::new(), vec![target]));
        self.notify_changed(&name, &[], &[target]);
        Ok(restore)
    }

    /// Reorder the rows of `region` by `options`, compared on the cells'
    /// current values. Values and formulas move with their row; formulas keep
    /// their relative references pointing the same distance away. Also returns
    /// the sorted order as row offsets into `region`.
    pub fn sort_range(
        &mut self,
        sheet: &str,
        region: Region,
        options: &[ColumnSortOptions],
    ) -> Result<(WorkbookRestoreData, Vec<u32>), WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let target = self.sheets.at(index);
        let region = target
            .clip(&region)
            .ok_or_else(|| WorkbookError::OutOfBounds {
                sheet: target.name().to_string(),
                region,
            })?;
        let defaults = [ColumnSortOptions::default()];
        let width = region.width() as u32;
        let requested = if options.is_empty() { &defaults[..] } else { options };
        let options: Vec<ColumnSortOptions> = requested
            .iter()
            .copied()
            .filter(|o| o.column < width)
            .collect();

        let cells = &target.cells;
        let keys: Vec<Vec<CellValue>> = (region.top..=region.bottom)
            .map(|row| {
                options
                    .iter()
                    .map(|o| cells.get_value(row, region.left + o.column))
                    .collect()
            })
            .collect();
        let order = sorted_order(&keys, &options);
        if order.iter().enumerate().all(|(i, &src)| i as u32 == src) {
            return Ok((WorkbookRestoreData::default(), order));
        }
        let mut landing = vec![0u32; order.len()];
        for (i, &src) in order.iter().enumerate() {
            landing[src as usize] = i as u32;
        }
        let contents: Vec<((u32, u32), CellValue, Option<ASTNode>)> = cells
            .positions_in(&region)
            .into_iter()
            .map(|(r, c)| ((r, c), cells.get_value(r, c), cells.get_formula(r, c).cloned()))
            .collect();

        let name = self.sheet_name(index);
        let mut restore = WorkbookRestoreData::default();
        let mut data = CellStoreRestoreData::default();
        let cleared = self.sheets.at_mut(index).cells.clear(&region, &mut data);
        for (row, col) in cleared {
            let key = VertexKey::cell(name.as_str(), row, col);
            restore.push_graph(self.engine.set_formula(&key, None)?);
        }
        for ((r, c), value, formula) in contents {
            let row = region.top + landing[(r - region.top) as usize];
            match formula {
                Some(mut f) => {
                    f.offset_relative(row as i64 - r as i64, 0);
                    let key = VertexKey::cell(name.as_str(), row, c);
                    restore.push_graph(self.engine.set_formula(&key, Some(f.clone()))?);
                    self.sheets
                        .at_mut(index)
                        .cells
                        .set_formula(row, c, Some(f), &mut data);
                }
                None => {
                    self.sheets
                        .at_mut(index)
                        .cells
                        .set_value(row, c, value, &mut data);
                }
            }
        }
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), Vec::new(), vec![region]));
        self.notify_changed(&name, &[], &[region]);
        Ok((restore, order))
    }

    pub fn set_type(
        &mut self,
        sheet: &str,
        region: Region,
        cell_type: &str,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let name = self.sheet_name(index);
        let mut data = CellStoreRestoreData::default();
        self.sheets
            .at_mut(index)
            .cells
            .set_type(region, cell_type, &mut data);
        let mut restore = WorkbookRestoreData::default();
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), Vec::new(), vec![region]));
        self.events.emit(SheetEvent::CellsChanged {
            sheet: name,
            positions: Vec::new(),
            regions: vec![region],
        });
        Ok(restore)
    }

    /// Set (or remove, with `None`) one named metadata entry on a cell.
    pub fn set_metadata(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        key: &str,
        value: Option<Value>,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        self.check_region(index, Region::cell(row, col))?;
        let name = self.sheet_name(index);
        let mut data = CellStoreRestoreData::default();
        self.sheets
            .at_mut(index)
            .cells
            .set_metadata(row, col, key, value, &mut data);
        let mut restore = WorkbookRestoreData::default();
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), vec![(row, col)], Vec::new()));
        self.events.emit(SheetEvent::CellsChanged {
            sheet: name,
            positions: vec![(row, col)],
            regions: Vec::new(),
        });
        Ok(restore)
    }

    /* ──────────────────────────── structure ─────────────────────────── */

    /// Rewrite formulas on every sheet ahead of a structural edit of
    /// `target`. Changes are recorded at their current positions.
    fn rewrite_for_structure(
        &mut self,
        target: &str,
        restore_cells: &mut Vec<(String, CellStoreRestoreData)>,
        mut rewrite: impl FnMut(&str, &mut ASTNode) -> bool,
    ) {
        for sheet in self.sheets.iter_mut() {
            let home = sheet.name().to_string();
            let updates: Vec<((u32, u32), ASTNode)> = sheet
                .cells
                .formulas()
                .filter_map(|(pos, f)| {
                    let mut f = f.clone();
                    rewrite(&home, &mut f).then_some((pos, f))
                })
                .collect();
            if updates.is_empty() && !home.eq_ignore_ascii_case(target) {
                continue;
            }
            let mut data = CellStoreRestoreData::default();
            for ((row, col), f) in updates {
                sheet.cells.set_formula(row, col, Some(f), &mut data);
            }
            restore_cells.push((home, data));
        }
    }

    fn take_target_data(
        cells: &mut Vec<(String, CellStoreRestoreData)>,
        target: &str,
    ) -> CellStoreRestoreData {
        match cells.iter().position(|(s, _)| s == target) {
            Some(i) => cells.remove(i).1,
            None => CellStoreRestoreData::default(),
        }
    }

    pub fn insert_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let i = self.sheets.require(sheet)?;
        let name = self.sheet_name(i);
        let target = self.sheets.at(i);
        if count == 0 || index > target.count(axis) || !target.can_grow(axis, count) {
            return Err(WorkbookError::OutOfBounds {
                sheet: name,
                region: Region::span_of(axis, index, index.saturating_add(count)),
            });
        }
        let mut restore = WorkbookRestoreData::default();
        restore.push_graph(self.engine.on_rows_cols_inserted(&name, axis, index, count)?);

        let mut cells = Vec::new();
        self.rewrite_for_structure(&name, &mut cells, |home, f| {
            f.adjust_for_insert(home, &name, axis, index, count)
        });
        let mut data = Self::take_target_data(&mut cells, &name);
        let target = self.sheets.at_mut(i);
        target.cells.insert_row_col_at(index, count, axis, &mut data);
        let info = target.info_mut(axis).insert(index, count);
        target.resize(axis, count as i64);
        cells.push((name.clone(), data));
        for (s, d) in cells {
            restore.push_cells(&s, d);
        }
        restore.row_cols.push((name.clone(), axis, info));
        restore.resized.push((name.clone(), axis, count as i64));
        restore.changed.push((
            name.clone(),
            Vec::new(),
            vec![Region::span_of(axis, index, UNBOUNDED)],
        ));
        restore.undo_events.push(SheetEvent::RowColRemoved {
            sheet: name.clone(),
            axis,
            index,
            count,
        });
        self.events.emit(SheetEvent::RowColInserted {
            sheet: name,
            axis,
            index,
            count,
        });
        self.request_calculation();
        Ok(restore)
    }

    pub fn remove_rows_cols(
        &mut self,
        sheet: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let i = self.sheets.require(sheet)?;
        let name = self.sheet_name(i);
        let available = self.sheets.at(i).count(axis);
        if count == 0 || index.saturating_add(count) > available {
            return Err(WorkbookError::OutOfBounds {
                sheet: name,
                region: Region::span_of(axis, index, index.saturating_add(count)),
            });
        }
        let mut restore = WorkbookRestoreData::default();
        restore.push_graph(self.engine.on_rows_cols_removed(&name, axis, index, count)?);

        let mut cells = Vec::new();
        self.rewrite_for_structure(&name, &mut cells, |home, f| {
            f.adjust_for_remove(home, &name, axis, index, count)
        });
        let mut data = Self::take_target_data(&mut cells, &name);
        let target = self.sheets.at_mut(i);
        target.cells.remove_row_col_at(index, count, axis, &mut data);
        let info = target.info_mut(axis).remove(index, count);
        target.resize(axis, -(count as i64));
        cells.push((name.clone(), data));
        for (s, d) in cells {
            restore.push_cells(&s, d);
        }
        restore.row_cols.push((name.clone(), axis, info));
        restore.resized.push((name.clone(), axis, -(count as i64)));
        restore.changed.push((
            name.clone(),
            Vec::new(),
            vec![Region::span_of(axis, index, UNBOUNDED)],
        ));
        restore.undo_events.push(SheetEvent::RowColInserted {
            sheet: name.clone(),
            axis,
            index,
            count,
        });
        self.events.emit(SheetEvent::RowColRemoved {
            sheet: name.clone(),
            axis,
            index,
            count,
        });
        self.events.emit(SheetEvent::CellsChanged {
            sheet: name,
            positions: Vec::new(),
            regions: vec![Region::span_of(axis, index, UNBOUNDED)],
        });
        self.request_calculation();
        Ok(restore)
    }

    /// Merge `region`. Rejected without change when it overlaps an existing
    /// merge.
    pub fn merge_cells(
        &mut self,
        sheet: &str,
        region: Region,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        self.check_region(index, region)?;
        let name = self.sheet_name(index);
        let mut data = CellStoreRestoreData::default();
        if let Err(e) = self.sheets.at_mut(index).cells.merge(region, &mut data) {
            #[cfg(feature = "tracing")]
            tracing::debug!(sheet = %name, %region, error = %e, "merge rejected");
            return Err(e.into());
        }
        let mut restore = WorkbookRestoreData::default();
        restore.push_cells(&name, data);
        restore.changed.push((name.clone(), Vec::new(), vec![region]));
        restore.undo_events.push(SheetEvent::RegionUnmerged {
            sheet: name.clone(),
            region,
        });
        self.events.emit(SheetEvent::RegionMerged {
            sheet: name,
            region,
        });
        Ok(restore)
    }

    /// Remove every merge overlapping `region`.
    pub fn unmerge_cells(
        &mut self,
        sheet: &str,
        region: Region,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let name = self.sheet_name(index);
        let mut data = CellStoreRestoreData::default();
        let removed = self.sheets.at_mut(index).cells.unmerge(&region, &mut data);
        let mut restore = WorkbookRestoreData::default();
        restore.push_cells(&name, data);
        for merged in removed {
            restore.undo_events.push(SheetEvent::RegionMerged {
                sheet: name.clone(),
                region: merged,
            });
            self.events.emit(SheetEvent::RegionUnmerged {
                sheet: name.clone(),
                region: merged,
            });
        }
        restore.changed.push((name, Vec::new(), vec![region]));
        Ok(restore)
    }

    /// Row height or column width over `start..=end`.
    pub fn set_size(
        &mut self,
        sheet: &str,
        axis: Axis,
        start: u32,
        end: u32,
        size: f64,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let name = self.sheet_name(index);
        let info = self
            .sheets
            .at_mut(index)
            .info_mut(axis)
            .set_size(start, end, size);
        Ok(self.row_col_changed(name, axis, start, end, info))
    }

    pub fn set_hidden(
        &mut self,
        sheet: &str,
        axis: Axis,
        start: u32,
        end: u32,
        hidden: bool,
    ) -> Result<WorkbookRestoreData, WorkbookError> {
        let index = self.sheets.require(sheet)?;
        let name = self.sheet_name(index);
        let info = self.sheets.at_mut(index).info_mut(axis);
        let info = if hidden {
            info.hide(start, end)
        } else {
            info.unhide(start, end)
        };
        Ok(self.row_col_changed(name, axis, start, end, info))
    }

    fn row_col_changed(
        &mut self,
        sheet: String,
        axis: Axis,
        start: u32,
        end: u32,
        info: crate::row_col::RowColRestoreData,
    ) -> WorkbookRestoreData {
        let event = SheetEvent::RowColInfoChanged {
            sheet: sheet.clone(),
            axis,
            start,
            end,
        };
        let mut restore = WorkbookRestoreData::default();
        restore.row_cols.push((sheet, axis, info));
        restore.undo_events.push(event.clone());
        self.events.emit(event);
        restore
    }

    /* ──────────────────────────── restore ───────────────────────────── */

    /// Revert the mutation that produced `data`.
    pub fn restore(&mut self, data: WorkbookRestoreData) {
        for graph in data.graph.into_iter().rev() {
            self.engine.restore(graph);
        }
        for (sheet, cells) in data.cells.into_iter().rev() {
            if let Some(s) = self.sheets.get_mut(&sheet) {
                s.cells.restore(cells);
            }
        }
        for (sheet, axis, info) in data.row_cols.into_iter().rev() {
            if let Some(s) = self.sheets.get_mut(&sheet) {
                s.info_mut(axis).restore(info);
            }
        }
        for (sheet, axis, delta) in data.resized.into_iter().rev() {
            if let Some(s) = self.sheets.get_mut(&sheet) {
                s.resize(axis, -delta);
            }
        }
        for event in data.undo_events {
            self.events.emit(event);
        }
        for (sheet, positions, regions) in data.changed {
            self.notify_changed(&sheet, &positions, &regions);
        }
        self.request_calculation();
    }
}
