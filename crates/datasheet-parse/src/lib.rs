mod adjust;
pub mod parser;
#[cfg(test)]
mod tests;
pub mod tokenizer;

pub use parser::{
    ASTNode, ASTNodeType, Parser, ParserError, RangeBound, ReferenceType, parse,
    parse_with_volatility_classifier,
};
pub use tokenizer::{Token, TokenSubType, TokenType, Tokenizer, TokenizerError};

pub use datasheet_common::{CellError, CellValue, ErrorKind};
