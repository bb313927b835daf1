use datasheet_common::Region;
use datasheet_eval::EngineError;
use datasheet_parse::ParserError;
use datasheet_store::StoreError;
use thiserror::Error;

/// Why a workbook mutation was refused. A refused mutation changes nothing.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),
    #[error("sheet '{0}' already exists")]
    DuplicateSheet(String),
    #[error("{region} is outside sheet '{sheet}'")]
    OutOfBounds { sheet: String, region: Region },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Parse(#[from] ParserError),
}
