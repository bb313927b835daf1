use datasheet_common::{Axis, Region};

use super::{Command, UndoSlot};
use crate::data::WorkbookData;

/// Open `count` rows or columns at `index`.
#[derive(Debug)]
pub struct InsertRowsCols {
    sheet: String,
    axis: Axis,
    index: u32,
    count: u32,
    slot: UndoSlot,
}

impl InsertRowsCols {
    pub fn new(sheet: impl Into<String>, axis: Axis, index: u32, count: u32) -> Self {
        Self {
            sheet: sheet.into(),
            axis,
            index,
            count,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for InsertRowsCols {
    fn name(&self) -> &str {
        "InsertRowsCols"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        self.count > 0
            && data.sheet(&self.sheet).is_some_and(|s| {
                self.index <= s.count(self.axis) && s.can_grow(self.axis, self.count)
            })
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.insert_rows_cols(&self.sheet, self.axis, self.index, self.count);
        self.slot.record("InsertRowsCols", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Delete `count` rows or columns starting at `index`.
#[derive(Debug)]
pub struct RemoveRowsCols {
    sheet: String,
    axis: Axis,
    index: u32,
    count: u32,
    slot: UndoSlot,
}

impl RemoveRowsCols {
    pub fn new(sheet: impl Into<String>, axis: Axis, index: u32, count: u32) -> Self {
        Self {
            sheet: sheet.into(),
            axis,
            index,
            count,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for RemoveRowsCols {
    fn name(&self) -> &str {
        "RemoveRowsCols"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        self.count > 0
            && data
                .sheet(&self.sheet)
                .is_some_and(|s| self.index.saturating_add(self.count) <= s.count(self.axis))
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.remove_rows_cols(&self.sheet, self.axis, self.index, self.count);
        self.slot.record("RemoveRowsCols", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

#[derive(Debug)]
pub struct MergeCells {
    sheet: String,
    region: Region,
    slot: UndoSlot,
}

impl MergeCells {
    pub fn new(sheet: impl Into<String>, region: Region) -> Self {
        Self {
            sheet: sheet.into(),
            region,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for MergeCells {
    fn name(&self) -> &str {
        "MergeCells"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        data.sheet(&self.sheet).is_some_and(|s| {
            s.region().is_some_and(|r| r.contains_region(&self.region))
                && s.cells().get_merges(&self.region).is_empty()
        })
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.merge_cells(&self.sheet, self.region);
        self.slot.record("MergeCells", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Remove every merge overlapping a region.
#[derive(Debug)]
pub struct UnmergeCells {
    sheet: String,
    region: Region,
    slot: UndoSlot,
}

impl UnmergeCells {
    pub fn new(sheet: impl Into<String>, region: Region) -> Self {
        Self {
            sheet: sheet.into(),
            region,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for UnmergeCells {
    fn name(&self) -> &str {
        "UnmergeCells"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        data.sheet(&self.sheet).is_some()
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.unmerge_cells(&self.sheet, self.region);
        self.slot.record("UnmergeCells", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}
