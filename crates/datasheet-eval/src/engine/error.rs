use datasheet_parse::ParserError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),
    #[error("sheet '{0}' already exists")]
    DuplicateSheet(String),
    #[error("reference '{reference}' in variable '{name}' must name its sheet")]
    ImplicitSheetInVariable { name: String, reference: String },
    #[error("'{0}' is not a valid variable name")]
    InvalidName(String),
    #[error(transparent)]
    Parse(#[from] ParserError),
}
