use datasheet_common::Region;

use super::{Command, UndoSlot};
use crate::data::WorkbookData;
use crate::sort::ColumnSortOptions;

/// Sort the rows of a region by one or more of its columns.
///
/// With no options the first column is sorted ascending.
#[derive(Debug)]
pub struct SortRange {
    sheet: String,
    region: Region,
    options: Vec<ColumnSortOptions>,
    order: Vec<u32>,
    slot: UndoSlot,
}

impl SortRange {
    pub fn new(sheet: impl Into<String>, region: Region, options: Vec<ColumnSortOptions>) -> Self {
        Self {
            sheet: sheet.into(),
            region,
            options,
            order: Vec::new(),
            slot: UndoSlot::default(),
        }
    }

    /// Row offsets, within the region, in the order the last run placed them.
    pub fn order(&self) -> &[u32] {
        &self.order
    }
}

impl Command for SortRange {
    fn name(&self) -> &str {
        "SortRange"
    }

    fn can_execute(&self, data: &WorkbookData) -> bool {
        data.sheet(&self.sheet)
            .is_some_and(|s| s.clip(&self.region).is_some())
    }

    fn execute(&mut self, data: &mut WorkbookData) -> bool {
        let result = data
            .sort_range(&self.sheet, self.region, &self.options)
            .map(|(restore, order)| {
                self.order = order;
                restore
            });
        self.slot.record("SortRange", result)
    }

    fn undo(&mut self, data: &mut WorkbookData) -> bool {
        self.slot.undo(data)
    }
}
