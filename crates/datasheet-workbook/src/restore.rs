use datasheet_common::{Axis, Region};
use datasheet_eval::GraphRestoreData;

use crate::cell_store::CellStoreRestoreData;
use crate::events::SheetEvent;
use crate::row_col::RowColRestoreData;

/// Reverts one [`crate::WorkbookData`] mutation across every store it
/// touched. Consumed by [`crate::WorkbookData::restore`].
#[derive(Debug, Default)]
pub struct WorkbookRestoreData {
    pub(crate) cells: Vec<(String, CellStoreRestoreData)>,
    pub(crate) row_cols: Vec<(String, Axis, RowColRestoreData)>,
    pub(crate) graph: Vec<GraphRestoreData>,
    pub(crate) resized: Vec<(String, Axis, i64)>,
    /// Reported as changed once restored.
    pub(crate) changed: Vec<(String, Vec<(u32, u32)>, Vec<Region>)>,
    /// Emitted once restored.
    pub(crate) undo_events: Vec<SheetEvent>,
}

impl WorkbookRestoreData {
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, d)| d.is_empty())
            && self.row_cols.iter().all(|(_, _, d)| d.is_empty())
            && self.graph.iter().all(GraphRestoreData::is_empty)
            && self.resized.is_empty()
    }

    pub(crate) fn push_cells(&mut self, sheet: &str, data: CellStoreRestoreData) {
        if !data.is_empty() {
            self.cells.push((sheet.to_string(), data));
        }
    }

    pub(crate) fn push_graph(&mut self, data: GraphRestoreData) {
        if !data.is_empty() {
            self.graph.push(data);
        }
    }
}
