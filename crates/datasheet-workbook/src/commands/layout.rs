use datasheet_common::Axis;

use super::{Command, UndoSlot};
use crate::data::WorkbookData;

fn valid_span(data: &WorkbookData, sheet: &str, start: u32, end: u32) -> bool {
    start <= end && data.sheet(sheet).is_some()
}

#[derive(Debug)]
pub struct HideRowsCols {
    sheet: String,
    axis: Axis,
    start: u32,
    end: u32,
    slot: UndoSlot,
}

impl HideRowsCols {
    /// Hide `start..=end`.
    pub fn new(sheet: impl Into<String>, axis: Axis, start: u32, end: u32) -> Self {
        Self {
            sheet: sheet.into(),
            axis,
            start,
            end,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for HideRowsCols {
    fn name(&self) -> &str {
        "HideRowsCols"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        valid_span(data, &self.sheet, self.start, self.end)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.set_hidden(&self.sheet, self.axis, self.start, self.end, true);
        self.slot.record("HideRowsCols", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

#[derive(Debug)]
pub struct UnhideRowsCols {
    sheet: String,
    axis: Axis,
    start: u32,
    end: u32,
    slot: UndoSlot,
}

impl UnhideRowsCols {
    pub fn new(sheet: impl Into<String>, axis: Axis, start: u32, end: u32) -> Self {
        Self {
            sheet: sheet.into(),
            axis,
            start,
            end,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for UnhideRowsCols {
    fn name(&self) -> &str {
        "UnhideRowsCols"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        valid_span(data, &self.sheet, self.start, self.end)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.set_hidden(&self.sheet, self.axis, self.start, self.end, false);
        self.slot.record("UnhideRowsCols", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}

/// Row height or column width.
#[derive(Debug)]
pub struct SetSize {
    sheet: String,
    axis: Axis,
    start: u32,
    end: u32,
    size: f64,
    slot: UndoSlot,
}

impl SetSize {
    pub fn new(sheet: impl Into<String>, axis: Axis, start: u32, end: u32, size: f64) -> Self {
        Self {
            sheet: sheet.into(),
            axis,
            start,
            end,
            size,
            slot: UndoSlot::default(),
        }
    }
}

impl Command for SetSize {
    fn name(&self) -> &str {
        "SetSize"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        self.size >= 0.0 && valid_span(data, &self.sheet, self.start, self.end)
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data.set_size(&self.sheet, self.axis, self.start, self.end, self.size);
        self.slot.record("SetSize", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}
