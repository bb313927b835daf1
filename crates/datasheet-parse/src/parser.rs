use std::fmt::{self, Display};

use datasheet_common::{
    CellError, CellValue, ErrorKind, Region, UNBOUNDED, col_to_letters, letters_to_col,
    parse_a1_cell,
};
use thiserror::Error;

use crate::tokenizer::{Associativity, Token, TokenSubType, TokenType, Tokenizer, TokenizerError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
    #[error("ParserError at token {position}: {message}")]
    Syntax { message: String, position: usize },
    #[error("No tokens to parse")]
    Empty,
    #[error("Invalid reference '{0}'")]
    InvalidReference(String),
}

/// One end of a range reference. A `None` coordinate is open (whole row or
/// whole column ranges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RangeBound {
    pub row: Option<u32>,
    pub col: Option<u32>,
    pub row_abs: bool,
    pub col_abs: bool,
}

/// A reference to something outside the cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    Cell {
        sheet: Option<String>,
        row: u32,
        col: u32,
        row_abs: bool,
        col_abs: bool,
    },
    Range {
        sheet: Option<String>,
        start: RangeBound,
        end: RangeBound,
    },
    /// A workbook-level variable.
    Named(String),
}

impl ReferenceType {
    /// Parse `A1`, `$A$1:B2`, `A:C`, `2:5`, `Sheet1!A1`, `'My Sheet'!A1:B2`;
    /// anything else that is a valid identifier is a variable name.
    pub fn from_string(reference: &str) -> Result<Self, ParserError> {
        let (sheet, body) = split_sheet(reference)?;

        if let Some((lhs, rhs)) = body.split_once(':') {
            let start = parse_bound(lhs)
                .ok_or_else(|| ParserError::InvalidReference(reference.to_string()))?;
            let end = parse_bound(rhs)
                .ok_or_else(|| ParserError::InvalidReference(reference.to_string()))?;
            if start.row.is_some() != end.row.is_some() && start.col.is_some() != end.col.is_some()
            {
                return Err(ParserError::InvalidReference(reference.to_string()));
            }
            return Ok(ReferenceType::Range { sheet, start, end });
        }

        if let Some(c) = parse_a1_cell(&body) {
            return Ok(ReferenceType::Cell {
                sheet,
                row: c.row,
                col: c.col,
                row_abs: c.row_abs,
                col_abs: c.col_abs,
            });
        }

        if sheet.is_none() && is_identifier(&body) {
            return Ok(ReferenceType::Named(body));
        }
        Err(ParserError::InvalidReference(reference.to_string()))
    }

    pub fn sheet(&self) -> Option<&str> {
        match self {
            ReferenceType::Cell { sheet, .. } | ReferenceType::Range { sheet, .. } => {
                sheet.as_deref()
            }
            ReferenceType::Named(_) => None,
        }
    }

    /// The grid area this reference covers; `None` for variables.
    pub fn region(&self) -> Option<Region> {
        match self {
            ReferenceType::Cell { row, col, .. } => Some(Region::cell(*row, *col)),
            ReferenceType::Range { start, end, .. } => Some(Region::new(
                start.row.unwrap_or(0),
                start.col.unwrap_or(0),
                end.row.unwrap_or(UNBOUNDED),
                end.col.unwrap_or(UNBOUNDED),
            )),
            ReferenceType::Named(_) => None,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn split_sheet(reference: &str) -> Result<(Option<String>, String), ParserError> {
    if let Some(rest) = reference.strip_prefix('\'') {
        // 'It''s'!A1
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch == '\'' {
                if let Some((_, '\'')) = chars.peek() {
                    chars.next();
                    name.push('\'');
                    continue;
                }
                let tail = &rest[i + 1..];
                return match tail.strip_prefix('!') {
                    Some(body) => Ok((Some(name), body.to_string())),
                    None => Err(ParserError::InvalidReference(reference.to_string())),
                };
            }
            name.push(ch);
        }
        return Err(ParserError::InvalidReference(reference.to_string()));
    }
    match reference.split_once('!') {
        Some((sheet, body)) if !sheet.is_empty() => Ok((Some(sheet.to_string()), body.to_string())),
        Some(_) => Err(ParserError::InvalidReference(reference.to_string())),
        None => Ok((None, reference.to_string())),
    }
}

fn parse_bound(part: &str) -> Option<RangeBound> {
    if let Some(c) = parse_a1_cell(part) {
        return Some(RangeBound {
            row: Some(c.row),
            col: Some(c.col),
            row_abs: c.row_abs,
            col_abs: c.col_abs,
        });
    }
    let (abs, body) = match part.strip_prefix('$') {
        Some(b) => (true, b),
        None => (false, part),
    };
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        let row: u32 = body.parse().ok()?;
        return (row > 0).then_some(RangeBound {
            row: Some(row - 1),
            row_abs: abs,
            ..RangeBound::default()
        });
    }
    letters_to_col(body).map(|col| RangeBound {
        col: Some(col),
        col_abs: abs,
        ..RangeBound::default()
    })
}

fn write_sheet(f: &mut fmt::Formatter<'_>, sheet: &Option<String>) -> fmt::Result {
    if let Some(name) = sheet {
        if name
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '_' || c == '.'))
        {
            write!(f, "'{}'!", name.replace('\'', "''"))?;
        } else {
            write!(f, "{name}!")?;
        }
    }
    Ok(())
}

fn write_bound(f: &mut fmt::Formatter<'_>, b: &RangeBound) -> fmt::Result {
    if let Some(col) = b.col {
        if b.col_abs {
            f.write_str("$")?;
        }
        f.write_str(&col_to_letters(col))?;
    }
    if let Some(row) = b.row {
        if b.row_abs {
            f.write_str("$")?;
        }
        write!(f, "{}", row as u64 + 1)?;
    }
    Ok(())
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceType::Cell {
                sheet,
                row,
                col,
                row_abs,
                col_abs,
            } => {
                write_sheet(f, sheet)?;
                write_bound(
                    f,
                    &RangeBound {
                        row: Some(*row),
                        col: Some(*col),
                        row_abs: *row_abs,
                        col_abs: *col_abs,
                    },
                )
            }
            ReferenceType::Range { sheet, start, end } => {
                write_sheet(f, sheet)?;
                write_bound(f, start)?;
                f.write_str(":")?;
                write_bound(f, end)
            }
            ReferenceType::Named(name) => f.write_str(name),
        }
    }
}

/// The different types of AST nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Literal(CellValue),
    Reference {
        original: String,
        reference: ReferenceType,
    },
    UnaryOp {
        op: String,
        expr: Box<ASTNode>,
    },
    BinaryOp {
        op: String,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    Function {
        name: String,
        args: Vec<ASTNode>,
    },
    Array(Vec<Vec<ASTNode>>),
}

/// A parsed formula element.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
    /// True if this AST contains any volatile function calls. Only set when
    /// the parser was given a volatility classifier.
    pub contains_volatile: bool,
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType) -> Self {
        ASTNode {
            node_type,
            contains_volatile: false,
        }
    }

    pub fn new_with_volatile(node_type: ASTNodeType, contains_volatile: bool) -> Self {
        ASTNode {
            node_type,
            contains_volatile,
        }
    }

    pub fn literal(value: impl Into<CellValue>) -> Self {
        ASTNode::new(ASTNodeType::Literal(value.into()))
    }

    pub fn reference(reference: ReferenceType) -> Self {
        ASTNode::new(ASTNodeType::Reference {
            original: reference.to_string(),
            reference,
        })
    }

    pub fn contains_volatile(&self) -> bool {
        self.contains_volatile
    }

    pub fn get_dependencies(&self) -> Vec<&ReferenceType> {
        let mut dependencies = Vec::new();
        self.collect_dependencies(&mut dependencies);
        dependencies
    }

    fn collect_dependencies<'a>(&'a self, dependencies: &mut Vec<&'a ReferenceType>) {
        match &self.node_type {
            ASTNodeType::Reference { reference, .. } => dependencies.push(reference),
            ASTNodeType::UnaryOp { expr, .. } => expr.collect_dependencies(dependencies),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.collect_dependencies(dependencies);
                right.collect_dependencies(dependencies);
            }
            ASTNodeType::Function { args, .. } => {
                for arg in args {
                    arg.collect_dependencies(dependencies);
                }
            }
            ASTNodeType::Array(rows) => {
                for item in rows.iter().flatten() {
                    item.collect_dependencies(dependencies);
                }
            }
            ASTNodeType::Literal(_) => {}
        }
    }

    /// Visit every reference mutably.
    pub fn for_each_reference_mut(&mut self, f: &mut dyn FnMut(&mut ASTNode)) {
        if matches!(self.node_type, ASTNodeType::Reference { .. }) {
            f(self);
            return;
        }
        match &mut self.node_type {
            ASTNodeType::Reference { .. } => {}
            ASTNodeType::UnaryOp { expr, .. } => expr.for_each_reference_mut(f),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.for_each_reference_mut(f);
                right.for_each_reference_mut(f);
            }
            ASTNodeType::Function { args, .. } => {
                for arg in args {
                    arg.for_each_reference_mut(f);
                }
            }
            ASTNodeType::Array(rows) => {
                for item in rows.iter_mut().flatten() {
                    item.for_each_reference_mut(f);
                }
            }
            ASTNodeType::Literal(_) => {}
        }
    }

    /// Render back to formula text, with the leading `=`.
    pub fn to_formula(&self) -> String {
        format!("={self}")
    }

    fn precedence(&self) -> u8 {
        match &self.node_type {
            ASTNodeType::BinaryOp { op, .. } => binary_precedence(op),
            ASTNodeType::UnaryOp { op, .. } if op == "%" => 6,
            ASTNodeType::UnaryOp { .. } => 7,
            _ => u8::MAX,
        }
    }
}

fn binary_precedence(op: &str) -> u8 {
    match op {
        "^" => 5,
        "*" | "/" => 4,
        "+" | "-" => 3,
        "&" => 2,
        _ => 1,
    }
}

fn write_child(
    f: &mut fmt::Formatter<'_>,
    child: &ASTNode,
    parent_prec: u8,
    strict: bool,
) -> fmt::Result {
    let p = child.precedence();
    if p < parent_prec || (strict && p == parent_prec) {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &CellValue) -> fmt::Result {
    match value {
        CellValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
        other => write!(f, "{other}"),
    }
}

impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_type {
            ASTNodeType::Literal(value) => write_literal(f, value),
            ASTNodeType::Reference { reference, .. } => write!(f, "{reference}"),
            ASTNodeType::UnaryOp { op, expr } if op == "%" => {
                write_child(f, expr, 6, false)?;
                f.write_str("%")
            }
            ASTNodeType::UnaryOp { op, expr } => {
                f.write_str(op)?;
                write_child(f, expr, 7, false)
            }
            ASTNodeType::BinaryOp { op, left, right } => {
                let p = binary_precedence(op);
                write_child(f, left, p, false)?;
                f.write_str(op)?;
                write_child(f, right, p, true)
            }
            ASTNodeType::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ASTNodeType::Array(rows) => {
                f.write_str("{")?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        f.write_str(";")?;
                    }
                    for (c, item) in row.iter().enumerate() {
                        if c > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{item}")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

type VolatilityClassifier = Box<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// Converts tokens into an AST.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    volatility_classifier: Option<VolatilityClassifier>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens
                .into_iter()
                .filter(|t| t.token_type != TokenType::Whitespace)
                .collect(),
            position: 0,
            volatility_classifier: None,
        }
    }

    /// Annotate function calls the classifier reports as volatile.
    pub fn with_volatility_classifier<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.volatility_classifier = Some(Box::new(f));
        self
    }

    fn syntax(&self, message: impl Into<String>) -> ParserError {
        ParserError::Syntax {
            message: message.into(),
            position: self.position,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_is(&self, ty: TokenType, sub: TokenSubType) -> bool {
        self.peek()
            .is_some_and(|t| t.token_type == ty && t.subtype == sub)
    }

    pub fn parse(&mut self) -> Result<ASTNode, ParserError> {
        let Some(first) = self.tokens.first() else {
            return Err(ParserError::Empty);
        };

        if first.token_type == TokenType::Literal {
            return Ok(ASTNode::literal(first.value.clone()));
        }

        let ast = self.parse_expression()?;
        if let Some(t) = self.peek() {
            return Err(self.syntax(format!("Unexpected token {t}")));
        }
        Ok(ast)
    }

    fn parse_expression(&mut self) -> Result<ASTNode, ParserError> {
        self.parse_binary_op(0)
    }

    fn parse_binary_op(&mut self, min_precedence: u8) -> Result<ASTNode, ParserError> {
        let mut left = self.parse_unary_op()?;

        while let Some(token) = self.peek() {
            if token.token_type != TokenType::OpInfix {
                break;
            }
            let (precedence, associativity) =
                token.get_precedence().unwrap_or((0, Associativity::Left));
            if precedence < min_precedence {
                break;
            }

            let op = token.value.clone();
            self.position += 1;

            let next_min = if associativity == Associativity::Left {
                precedence + 1
            } else {
                precedence
            };
            let right = self.parse_binary_op(next_min)?;
            let contains_volatile = left.contains_volatile || right.contains_volatile;
            left = ASTNode::new_with_volatile(
                ASTNodeType::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                contains_volatile,
            );
        }

        Ok(left)
    }

    fn parse_unary_op(&mut self) -> Result<ASTNode, ParserError> {
        if let Some(token) = self.peek()
            && token.token_type == TokenType::OpPrefix
        {
            let op = token.value.clone();
            self.position += 1;
            let expr = self.parse_unary_op()?;
            let contains_volatile = expr.contains_volatile;
            return Ok(ASTNode::new_with_volatile(
                ASTNodeType::UnaryOp {
                    op,
                    expr: Box::new(expr),
                },
                contains_volatile,
            ));
        }
        self.parse_postfix_op()
    }

    fn parse_postfix_op(&mut self) -> Result<ASTNode, ParserError> {
        let mut expr = self.parse_primary()?;

        while let Some(token) = self.peek() {
            if token.token_type != TokenType::OpPostfix {
                break;
            }
            let op = token.value.clone();
            self.position += 1;
            let contains_volatile = expr.contains_volatile;
            expr = ASTNode::new_with_volatile(
                ASTNodeType::UnaryOp {
                    op,
                    expr: Box::new(expr),
                },
                contains_volatile,
            );
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ASTNode, ParserError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.syntax("Unexpected end of tokens"));
        };
        self.position += 1;

        match (token.token_type, token.subtype) {
            (TokenType::Operand, _) => self.parse_operand(token),
            (TokenType::Func, TokenSubType::Open) => self.parse_function(token),
            (TokenType::Paren, TokenSubType::Open) => {
                let expr = self.parse_expression()?;
                if !self.peek_is(TokenType::Paren, TokenSubType::Close) {
                    return Err(self.syntax("Expected closing parenthesis"));
                }
                self.position += 1;
                Ok(expr)
            }
            (TokenType::Array, TokenSubType::Open) => self.parse_array(),
            _ => {
                self.position -= 1;
                Err(self.syntax(format!("Unexpected token {token}")))
            }
        }
    }

    fn parse_operand(&mut self, token: Token) -> Result<ASTNode, ParserError> {
        match token.subtype {
            TokenSubType::Number => {
                let value = token
                    .value
                    .parse::<f64>()
                    .map_err(|_| self.syntax(format!("Invalid number: {}", token.value)))?;
                Ok(ASTNode::literal(value))
            }
            TokenSubType::Text => {
                let inner = &token.value[1..token.value.len() - 1];
                Ok(ASTNode::literal(inner.replace("\"\"", "\"")))
            }
            TokenSubType::Logical => Ok(ASTNode::literal(
                token.value.eq_ignore_ascii_case("TRUE"),
            )),
            TokenSubType::Error => {
                // `Sheet1!#REF!` collapses to the bare error.
                let code = token
                    .value
                    .rfind('#')
                    .map_or(token.value.as_str(), |i| &token.value[i..]);
                let kind = ErrorKind::parse(code)
                    .ok_or_else(|| self.syntax(format!("Invalid error: {}", token.value)))?;
                Ok(ASTNode::literal(CellError::new(kind)))
            }
            TokenSubType::Range => {
                let reference = ReferenceType::from_string(&token.value)?;
                Ok(ASTNode::new(ASTNodeType::Reference {
                    original: token.value,
                    reference,
                }))
            }
            _ => Err(self.syntax(format!("Unexpected operand subtype: {:?}", token.subtype))),
        }
    }

    fn parse_function(&mut self, func_token: Token) -> Result<ASTNode, ParserError> {
        let name = func_token.value[..func_token.value.len() - 1].to_string();
        let args = self.parse_function_arguments()?;
        let this_is_volatile = self
            .volatility_classifier
            .as_ref()
            .is_some_and(|f| f(name.as_str()));
        let args_volatile = args.iter().any(|a| a.contains_volatile);

        Ok(ASTNode::new_with_volatile(
            ASTNodeType::Function { name, args },
            this_is_volatile || args_volatile,
        ))
    }

    /// Arguments up to the closing `)`. Omitted arguments (`F(a,,b)`) are
    /// `Empty` literals.
    fn parse_function_arguments(&mut self) -> Result<Vec<ASTNode>, ParserError> {
        let mut args = Vec::new();

        if self.peek_is(TokenType::Func, TokenSubType::Close) {
            self.position += 1;
            return Ok(args);
        }

        loop {
            if self.peek_is(TokenType::Sep, TokenSubType::Arg)
                || self.peek_is(TokenType::Func, TokenSubType::Close)
            {
                args.push(ASTNode::literal(CellValue::Empty));
            } else {
                args.push(self.parse_expression()?);
            }

            match self.peek() {
                Some(t) if t.token_type == TokenType::Sep && t.subtype == TokenSubType::Arg => {
                    self.position += 1;
                }
                Some(t) if t.token_type == TokenType::Func && t.subtype == TokenSubType::Close => {
                    self.position += 1;
                    return Ok(args);
                }
                Some(t) => {
                    let msg = format!("Expected ',' or ')' in function arguments, got {t}");
                    return Err(self.syntax(msg));
                }
                None => return Err(self.syntax("Unterminated function call")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<ASTNode, ParserError> {
        let mut rows = Vec::new();
        let mut current_row = Vec::new();

        if self.peek_is(TokenType::Array, TokenSubType::Close) {
            self.position += 1;
            return Ok(ASTNode::new(ASTNodeType::Array(rows)));
        }

        current_row.push(self.parse_expression()?);

        loop {
            let Some(token) = self.peek() else {
                return Err(self.syntax("Unterminated array"));
            };
            match (token.token_type, token.subtype) {
                (TokenType::Sep, TokenSubType::Arg) => {
                    self.position += 1;
                    current_row.push(self.parse_expression()?);
                }
                (TokenType::Sep, TokenSubType::Row) => {
                    self.position += 1;
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_expression()?);
                }
                (TokenType::Array, TokenSubType::Close) => {
                    self.position += 1;
                    rows.push(current_row);
                    break;
                }
                _ => {
                    let msg = format!("Unexpected token in array: {token}");
                    return Err(self.syntax(msg));
                }
            }
        }

        let contains_volatile = rows.iter().flatten().any(|n| n.contains_volatile);
        Ok(ASTNode::new_with_volatile(
            ASTNodeType::Array(rows),
            contains_volatile,
        ))
    }
}

pub fn parse<T: AsRef<str>>(formula: T) -> Result<ASTNode, ParserError> {
    let tokens = Tokenizer::new(formula.as_ref())?.items;
    Parser::new(tokens).parse()
}

/// Parse and annotate volatility with `classifier`.
pub fn parse_with_volatility_classifier<T, F>(
    formula: T,
    classifier: F,
) -> Result<ASTNode, ParserError>
where
    T: AsRef<str>,
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    let tokens = Tokenizer::new(formula.as_ref())?.items;
    Parser::new(tokens)
        .with_volatility_classifier(classifier)
        .parse()
}
