//! Undoable units of work over [`WorkbookData`].
//!
//! A command captures the restore data of its last successful `execute` and
//! spends it on `undo`; undoing twice, or before executing, is refused.

mod cells;
mod group;
mod layout;
mod manager;
mod sort;
mod structure;

pub use cells::{ClearCells, CopyRange, SetCellValue, SetCellValues, SetFormula, SetMetaData, SetType};
pub use group::CommandGroup;
pub use layout::{HideRowsCols, SetSize, UnhideRowsCols};
pub use manager::CommandManager;
pub use sort::SortRange;
pub use structure::{InsertRowsCols, MergeCells, RemoveRowsCols, UnmergeCells};

use std::fmt;

use crate::data::WorkbookData;
use crate::error::WorkbookError;
use crate::restore::WorkbookRestoreData;

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Created,
    Executed,
    Undone,
}

pub trait Command: fmt::Debug {
    fn name(&self) -> &str;

    /// Cheap precheck; `execute` may still refuse.
    fn can_execute(&self, _data: &WorkbookData) -> bool {
        true
    }

    /// Apply the command. Returns `false`, with nothing changed, when it
    /// cannot be applied.
    fn execute(&mut self, data: &mut WorkbookData) -> bool;

    /// Revert the last successful `execute`.
    fn undo(&mut self, data: &mut WorkbookData) -> bool;
}

/// Restore data held between `execute` and `undo`.
#[derive(Debug, Default)]
pub(crate) struct UndoSlot(Option<WorkbookRestoreData>);

impl UndoSlot {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn record(
        &mut self,
        command: &str,
        result: Result<WorkbookRestoreData, WorkbookError>,
    ) -> bool {
        match result {
            Ok(data) => {
                self.0 = Some(data);
                true
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(command, %error, "command refused");
                false
            }
        }
    }

    pub(crate) fn undo(&mut self, data: &mut WorkbookData) -> bool {
        match self.0.take() {
            Some(restore) => {
                data.restore(restore);
                true
            }
            None => false,
        }
    }
}

/// Whether `sheet` exists and `(row, col)` lies inside it.
pub(crate) fn in_sheet(data: &WorkbookData, sheet: &str, row: u32, col: u32) -> bool {
    data.sheet(sheet).is_some_and(|s| s.contains(row, col))
}
