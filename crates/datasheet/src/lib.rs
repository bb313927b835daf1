//! Meta crate that re-exports the datasheet building blocks. Downstream users
//! can depend on this crate and opt into specific layers via feature flags
//! while keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use datasheet_common as common;

#[cfg(feature = "parse")]
pub use datasheet_parse as parse;

#[cfg(feature = "store")]
pub use datasheet_store as store;

#[cfg(feature = "eval")]
pub use datasheet_eval as eval;

#[cfg(feature = "workbook")]
pub use datasheet_workbook as workbook;

#[cfg(feature = "common")]
pub use datasheet_common::{Axis, CellError, CellValue, ErrorKind, Region};

#[cfg(feature = "eval")]
pub use datasheet_eval::{EngineConfig, FormulaEngine, VariableValue};

#[cfg(feature = "workbook")]
pub use datasheet_workbook::{Command, CommandGroup, SheetEvent, Workbook, WorkbookConfig};

#[cfg(feature = "workbook")]
pub mod doc_examples;
