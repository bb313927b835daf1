//! Sheets, cell storage and an undoable command layer over the datasheet
//! formula engine.
//!
//! [`WorkbookData`] owns the sheets, the engine and the event queue and
//! exposes the primitive mutations, each returning restore data.
//! [`Workbook`] adds the [`CommandManager`] and is the entry point hosts use.

pub mod cell_store;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod restore;
pub mod row_col;
pub mod sheet;
pub mod sort;
pub mod workbook;

pub use cell_store::{CellStore, CellStoreRestoreData, DEFAULT_CELL_TYPE};
pub use commands::{
    ClearCells, Command, CommandGroup, CommandManager, CommandState, CopyRange, HideRowsCols,
    InsertRowsCols, MergeCells, RemoveRowsCols, SetCellValue, SetCellValues, SetFormula,
    SetMetaData, SetSize, SetType, SortRange, UnhideRowsCols, UnmergeCells,
};
pub use config::WorkbookConfig;
pub use data::{CopyOptions, WorkbookData};
pub use error::WorkbookError;
pub use events::{EventSink, SheetEvent};
pub use restore::WorkbookRestoreData;
pub use row_col::{RowColInfo, RowColRestoreData};
pub use sheet::{Sheet, Sheets};
pub use sort::ColumnSortOptions;
pub use workbook::Workbook;

pub use datasheet_common::{Axis, CellValue, Region, UNBOUNDED};
