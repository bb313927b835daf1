use std::fmt::{self, Display};

use thiserror::Error;

const TOKEN_ENDERS: &str = ",;}) +-*/^&=><%";

const fn build_token_enders() -> [bool; 256] {
    let mut tbl = [false; 256];
    let bytes = TOKEN_ENDERS.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        tbl[bytes[i] as usize] = true;
        i += 1;
    }
    tbl
}
static TOKEN_ENDERS_TABLE: [bool; 256] = build_token_enders();

#[inline(always)]
fn is_token_ender(c: u8) -> bool {
    TOKEN_ENDERS_TABLE[c as usize]
}

static ERROR_CODES: &[&str] = &[
    "#CIRCULAR!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
];

/// Represents operator associativity.
#[derive(Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("TokenizerError at {pos}: {message}")]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Literal,
    Operand,
    Func,
    Array,
    Paren,
    Sep,
    OpPrefix,
    OpInfix,
    OpPostfix,
    Whitespace,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The subtype of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSubType {
    None,
    Text,
    Number,
    Logical,
    Error,
    Range,
    Open,
    Close,
    Arg,
    Row,
}

/// A token of a formula with its byte span.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub subtype: TokenSubType,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} subtype: {:?} value: {}>",
            self.token_type, self.subtype, self.value
        )
    }
}

fn operand_subtype(value: &str) -> TokenSubType {
    if value.starts_with('"') {
        TokenSubType::Text
    } else if value.starts_with('#') {
        TokenSubType::Error
    } else if value.eq_ignore_ascii_case("TRUE") || value.eq_ignore_ascii_case("FALSE") {
        TokenSubType::Logical
    } else if value.parse::<f64>().is_ok() {
        TokenSubType::Number
    } else {
        TokenSubType::Range
    }
}

impl Token {
    fn from_slice(
        source: &str,
        token_type: TokenType,
        subtype: TokenSubType,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            value: source[start..end].to_string(),
            token_type,
            subtype,
            start,
            end,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::OpPrefix | TokenType::OpInfix | TokenType::OpPostfix
        )
    }

    pub fn get_precedence(&self) -> Option<(u8, Associativity)> {
        // Prefix operators share the 'u' slot.
        let op = if self.token_type == TokenType::OpPrefix {
            "u"
        } else {
            self.value.as_str()
        };

        match op {
            ":" => Some((8, Associativity::Left)),
            "u" => Some((7, Associativity::Right)),
            "%" => Some((6, Associativity::Left)),
            "^" => Some((5, Associativity::Left)),
            "*" | "/" => Some((4, Associativity::Left)),
            "+" | "-" => Some((3, Associativity::Left)),
            "&" => Some((2, Associativity::Left)),
            "=" | "<" | ">" | "<=" | ">=" | "<>" => Some((1, Associativity::Left)),
            _ => None,
        }
    }

    fn operand_from_slice(source: &str, start: usize, end: usize) -> Self {
        let subtype = operand_subtype(&source[start..end]);
        Token::from_slice(source, TokenType::Operand, subtype, start, end)
    }

    fn subexp_from_slice(source: &str, func: bool, start: usize, end: usize) -> Self {
        let last = source.as_bytes()[end - 1];
        let token_type = if func {
            TokenType::Func
        } else if last == b'{' || last == b'}' {
            TokenType::Array
        } else {
            TokenType::Paren
        };
        let subtype = if last == b')' || last == b'}' {
            TokenSubType::Close
        } else {
            TokenSubType::Open
        };
        Token::from_slice(source, token_type, subtype, start, end)
    }
}

/// Splits a formula into tokens. Formulas start with `=`; anything else is a
/// single `Literal` token.
pub struct Tokenizer {
    formula: String,
    pub items: Vec<Token>,
    token_stack: Vec<Token>,
    offset: usize,
    token_start: usize,
    token_end: usize,
}

impl Tokenizer {
    pub fn new(formula: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            formula: formula.to_string(),
            items: Vec::with_capacity(formula.len() / 2),
            token_stack: Vec::with_capacity(16),
            offset: 0,
            token_start: 0,
            token_end: 0,
        };
        tokenizer.parse()?;
        Ok(tokenizer)
    }

    #[inline]
    fn byte(&self, i: usize) -> u8 {
        self.formula.as_bytes()[i]
    }

    #[inline]
    fn has_token(&self) -> bool {
        self.token_end > self.token_start
    }

    #[inline]
    fn start_token(&mut self) {
        self.token_start = self.offset;
        self.token_end = self.offset;
    }

    fn err(&self, message: impl Into<String>) -> TokenizerError {
        TokenizerError {
            message: message.into(),
            pos: self.offset,
        }
    }

    fn parse(&mut self) -> Result<(), TokenizerError> {
        if self.formula.is_empty() {
            return Ok(());
        }

        if self.byte(0) != b'=' {
            self.items.push(Token::from_slice(
                &self.formula,
                TokenType::Literal,
                TokenSubType::None,
                0,
                self.formula.len(),
            ));
            return Ok(());
        }

        self.offset = 1;
        self.start_token();

        while self.offset < self.formula.len() {
            if self.check_scientific_notation() {
                continue;
            }

            let curr = self.byte(self.offset);
            if is_token_ender(curr) && self.has_token() {
                self.save_token();
                self.start_token();
            }

            match curr {
                b'"' | b'\'' => self.parse_string()?,
                b'#' => self.parse_error()?,
                b' ' | b'\n' | b'\t' => self.parse_whitespace(),
                b'+' | b'-' | b'*' | b'/' | b'^' | b'&' | b'=' | b'>' | b'<' | b'%' => {
                    self.parse_operator()
                }
                b'{' | b'(' => self.parse_opener(),
                b')' | b'}' => self.parse_closer()?,
                b';' | b',' => self.parse_separator(),
                _ => {
                    if !self.has_token() {
                        self.start_token();
                    }
                    // Step over a whole UTF-8 character.
                    let ch_len = self.formula[self.offset..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                    self.offset += ch_len;
                    self.token_end = self.offset;
                }
            }
        }

        if self.has_token() {
            self.save_token();
        }

        if !self.token_stack.is_empty() {
            return Err(self.err("Unmatched opening parenthesis or bracket"));
        }
        Ok(())
    }

    /// `1.5E+3`: the sign belongs to the number.
    fn check_scientific_notation(&mut self) -> bool {
        let curr = self.byte(self.offset);
        if (curr == b'+' || curr == b'-') && self.has_token() && self.is_scientific_notation_base()
        {
            self.offset += 1;
            self.token_end = self.offset;
            return true;
        }
        false
    }

    fn is_scientific_notation_base(&self) -> bool {
        let slice = &self.formula.as_bytes()[self.token_start..self.token_end];
        if slice.len() < 2 {
            return false;
        }
        let last = slice[slice.len() - 1];
        if !(last == b'E' || last == b'e') || !slice[0].is_ascii_digit() {
            return false;
        }
        let mut dot_seen = false;
        for &ch in &slice[1..slice.len() - 1] {
            match ch {
                b'0'..=b'9' => {}
                b'.' if !dot_seen => dot_seen = true,
                _ => return false,
            }
        }
        true
    }

    fn save_token(&mut self) {
        if self.has_token() {
            let token = Token::operand_from_slice(&self.formula, self.token_start, self.token_end);
            self.items.push(token);
        }
    }

    /// Double quotes delimit text; single quotes delimit a sheet name that
    /// stays part of the surrounding reference token.
    fn parse_string(&mut self) -> Result<(), TokenizerError> {
        let delim = self.byte(self.offset);

        if delim == b'"' && self.has_token() {
            self.save_token();
            self.start_token();
        }

        let string_start = if delim == b'\'' && self.has_token() {
            self.token_start
        } else {
            self.offset
        };
        if !self.has_token() {
            self.token_start = self.offset;
        }
        self.offset += 1;

        while self.offset < self.formula.len() {
            if self.byte(self.offset) == delim {
                self.offset += 1;
                if self.offset < self.formula.len() && self.byte(self.offset) == delim {
                    self.offset += 1;
                } else {
                    if delim == b'"' {
                        let token =
                            Token::operand_from_slice(&self.formula, string_start, self.offset);
                        self.items.push(token);
                        self.start_token();
                    } else {
                        self.token_end = self.offset;
                    }
                    return Ok(());
                }
            } else {
                self.offset += 1;
            }
        }

        Err(self.err("Reached end of formula while parsing string"))
    }

    fn parse_error(&mut self) -> Result<(), TokenizerError> {
        // `Sheet1!#REF!` keeps its prefix.
        if self.has_token() && self.byte(self.token_end - 1) != b'!' {
            self.save_token();
            self.start_token();
        }
        let error_start = if self.has_token() {
            self.token_start
        } else {
            self.offset
        };

        let rest = &self.formula.as_bytes()[self.offset..];
        for &code in ERROR_CODES {
            let code_bytes = code.as_bytes();
            if rest.len() >= code_bytes.len()
                && rest[..code_bytes.len()].eq_ignore_ascii_case(code_bytes)
            {
                let end = self.offset + code_bytes.len();
                let token = Token::operand_from_slice(&self.formula, error_start, end);
                self.items.push(token);
                self.offset = end;
                self.start_token();
                return Ok(());
            }
        }

        Err(self.err(format!("Invalid error code at position {}", self.offset)))
    }

    fn parse_whitespace(&mut self) {
        self.save_token();
        let ws_start = self.offset;
        while self.offset < self.formula.len()
            && matches!(self.byte(self.offset), b' ' | b'\n' | b'\t')
        {
            self.offset += 1;
        }
        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Whitespace,
            TokenSubType::None,
            ws_start,
            self.offset,
        ));
        self.start_token();
    }

    fn parse_operator(&mut self) {
        self.save_token();

        if self.offset + 1 < self.formula.len() {
            let two = &self.formula.as_bytes()[self.offset..self.offset + 2];
            if two == b">=" || two == b"<=" || two == b"<>" {
                self.items.push(Token::from_slice(
                    &self.formula,
                    TokenType::OpInfix,
                    TokenSubType::None,
                    self.offset,
                    self.offset + 2,
                ));
                self.offset += 2;
                self.start_token();
                return;
            }
        }

        let token_type = match self.byte(self.offset) {
            b'%' => TokenType::OpPostfix,
            b'+' | b'-' => {
                let prev = self
                    .items
                    .iter()
                    .rev()
                    .find(|t| t.token_type != TokenType::Whitespace);
                match prev {
                    Some(p)
                        if p.subtype == TokenSubType::Close
                            || p.token_type == TokenType::OpPostfix
                            || p.token_type == TokenType::Operand =>
                    {
                        TokenType::OpInfix
                    }
                    _ => TokenType::OpPrefix,
                }
            }
            _ => TokenType::OpInfix,
        };

        self.items.push(Token::from_slice(
            &self.formula,
            token_type,
            TokenSubType::None,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        self.start_token();
    }

    fn parse_opener(&mut self) {
        let token = if self.byte(self.offset) == b'{' {
            self.save_token();
            Token::subexp_from_slice(&self.formula, false, self.offset, self.offset + 1)
        } else if self.has_token() {
            Token::subexp_from_slice(&self.formula, true, self.token_start, self.offset + 1)
        } else {
            Token::subexp_from_slice(&self.formula, false, self.offset, self.offset + 1)
        };

        self.items.push(token.clone());
        self.token_stack.push(token);
        self.offset += 1;
        self.start_token();
    }

    fn parse_closer(&mut self) -> Result<(), TokenizerError> {
        self.save_token();
        let curr = self.byte(self.offset);

        let Some(open) = self.token_stack.pop() else {
            return Err(self.err(format!(
                "No matching opener for closer at position {}",
                self.offset
            )));
        };
        let expects_brace = open.token_type == TokenType::Array;
        if expects_brace != (curr == b'}') {
            return Err(self.err("Mismatched ( and { pair"));
        }

        self.items.push(Token::from_slice(
            &self.formula,
            open.token_type,
            TokenSubType::Close,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        self.start_token();
        Ok(())
    }

    fn parse_separator(&mut self) {
        self.save_token();
        let subtype = if self.byte(self.offset) == b';' {
            TokenSubType::Row
        } else {
            TokenSubType::Arg
        };
        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Sep,
            subtype,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        self.start_token();
    }

    /// Reconstruct the formula from the tokens.
    pub fn render(&self) -> String {
        match self.items.first() {
            None => String::new(),
            Some(t) if t.token_type == TokenType::Literal => t.value.clone(),
            Some(_) => {
                let body: String = self.items.iter().map(|t| t.value.as_str()).collect();
                format!("={body}")
            }
        }
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(formula: &str) -> Vec<(TokenType, TokenSubType, String)> {
        Tokenizer::new(formula)
            .unwrap()
            .items
            .into_iter()
            .filter(|t| t.token_type != TokenType::Whitespace)
            .map(|t| (t.token_type, t.subtype, t.value))
            .collect()
    }

    #[test]
    fn ranges_stay_single_operands() {
        let toks = kinds("=SUM(A1:B3, 'My Sheet'!C1:C9)");
        assert_eq!(toks[0], (TokenType::Func, TokenSubType::Open, "SUM(".into()));
        assert_eq!(toks[1].2, "A1:B3");
        assert_eq!(toks[1].1, TokenSubType::Range);
        assert_eq!(toks[2].0, TokenType::Sep);
        assert_eq!(toks[3].2, "'My Sheet'!C1:C9");
        assert_eq!(toks[4].1, TokenSubType::Close);
    }

    #[test]
    fn prefix_and_infix_minus() {
        let toks = kinds("=-A1-2");
        assert_eq!(toks[0].0, TokenType::OpPrefix);
        assert_eq!(toks[2].0, TokenType::OpInfix);
        let toks = kinds("=1.5E-3*2%");
        assert_eq!(toks[0], (TokenType::Operand, TokenSubType::Number, "1.5E-3".into()));
        assert_eq!(toks[3].0, TokenType::OpPostfix);
    }

    #[test]
    fn errors_strings_and_comparisons() {
        let toks = kinds("=IF(A1<>\"a\"\"b\",#N/A,TRUE)");
        assert_eq!(toks[2].2, "<>");
        assert_eq!(toks[3], (TokenType::Operand, TokenSubType::Text, "\"a\"\"b\"".into()));
        assert_eq!(toks[5].1, TokenSubType::Error);
        assert_eq!(toks[7].1, TokenSubType::Logical);
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(Tokenizer::new("=SUM(A1").is_err());
        assert!(Tokenizer::new("=A1)").is_err());
        assert!(Tokenizer::new("=(1}").is_err());
        assert!(Tokenizer::new("=\"open").is_err());
        assert!(Tokenizer::new("=#BAD").is_err());
    }

    #[test]
    fn render_reproduces_input() {
        for f in ["=SUM(A1:A3) + 1", "plain text", "=-B2^2&\"x\"", ""] {
            assert_eq!(Tokenizer::new(f).unwrap().render(), f);
        }
    }
}
