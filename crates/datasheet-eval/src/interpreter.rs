use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use datasheet_common::{CellError, CellValue, ErrorKind, Region};
use datasheet_parse::{ASTNode, ASTNodeType, ReferenceType};
use smallvec::SmallVec;

use crate::context::{ExecutionContext, GroupMember};
use crate::engine::VertexKey;
use crate::function::{check_arity, spec_for};
use crate::function_registry::FunctionRegistry;
use crate::traits::{ArgumentHandle, Environment, FunctionContext};

/// Walks a formula AST against an [`Environment`].
pub struct Interpreter<'a> {
    env: &'a dyn Environment,
    functions: &'a FunctionRegistry,
    context: &'a ExecutionContext,
    current_sheet: &'a str,
    max_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        env: &'a dyn Environment,
        functions: &'a FunctionRegistry,
        context: &'a ExecutionContext,
        current_sheet: &'a str,
    ) -> Self {
        Self {
            env,
            functions,
            context,
            current_sheet,
            max_depth: usize::MAX,
        }
    }

    /// Bound on how deeply circular-group members may re-enter each other.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn current_sheet(&self) -> &'a str {
        self.current_sheet
    }

    pub fn env(&self) -> &'a dyn Environment {
        self.env
    }

    fn on_sheet<'s>(&self, sheet: &'s str) -> Interpreter<'s>
    where
        'a: 's,
    {
        Interpreter {
            env: self.env,
            functions: self.functions,
            context: self.context,
            current_sheet: sheet,
            max_depth: self.max_depth,
        }
    }

    pub fn evaluate(&self, node: &ASTNode) -> CellValue {
        match &node.node_type {
            ASTNodeType::Literal(v) => v.clone(),
            ASTNodeType::Reference { reference, .. } => self.resolve_reference(reference),
            ASTNodeType::UnaryOp { op, expr } => self.eval_unary(op, expr),
            ASTNodeType::BinaryOp { op, left, right } => self.eval_binary(op, left, right),
            ASTNodeType::Function { name, args } => self.eval_function(name, args),
            ASTNodeType::Array(rows) => CellValue::Array(
                rows.iter()
                    .map(|row| row.iter().map(|n| self.evaluate(n).into_scalar()).collect())
                    .collect(),
            ),
        }
    }

    pub fn resolve_reference(&self, reference: &ReferenceType) -> CellValue {
        match reference {
            ReferenceType::Named(name) => {
                if let Some(member) = self.context.named_member(name) {
                    return self.resolve_in_group(member);
                }
                self.env.get_variable(name).unwrap_or_else(|| {
                    CellError::new(ErrorKind::Name)
                        .with_message(format!("unknown name {name}"))
                        .into()
                })
            }
            ReferenceType::Cell { sheet, row, col, .. } => {
                let sheet = sheet.as_deref().unwrap_or(self.current_sheet);
                if !self.env.sheet_exists(sheet) {
                    return CellError::new(ErrorKind::Ref)
                        .with_message(format!("no sheet named {sheet}"))
                        .into();
                }
                if self.context.is_in_scc_group(reference, self.current_sheet)
                    && let Some(member) = self
                        .context
                        .members_in(sheet, &Region::cell(*row, *col))
                        .first()
                {
                    return self.resolve_in_group(member);
                }
                self.env.get_cell_value(*row, *col, sheet)
            }
            ReferenceType::Range { sheet, .. } => {
                let sheet = sheet.as_deref().unwrap_or(self.current_sheet);
                if !self.env.sheet_exists(sheet) {
                    return CellError::new(ErrorKind::Ref)
                        .with_message(format!("no sheet named {sheet}"))
                        .into();
                }
                let Some(region) = reference.region() else {
                    return ErrorKind::Ref.into();
                };
                let mut rows = self.env.get_range_values(sheet, &region);
                for member in self.context.members_in(sheet, &region) {
                    let Some((r, c)) = member.key.position() else {
                        continue;
                    };
                    let value = self.resolve_in_group(member);
                    if let Some(slot) = rows
                        .get_mut((r - region.top) as usize)
                        .and_then(|row| row.get_mut((c - region.left) as usize))
                    {
                        *slot = value;
                    }
                }
                CellValue::Array(rows)
            }
        }
    }

    /// Value of a circular-group member, computing it now if this pass has
    /// not. Re-entering a member already being evaluated is circular.
    fn resolve_in_group(&self, member: &GroupMember) -> CellValue {
        if let Some(v) = self.context.try_get_executed(&member.key) {
            return v;
        }
        if self.context.is_executing(&member.key) || self.context.depth() >= self.max_depth {
            return ErrorKind::Circular.into();
        }
        self.context.push_executing(member.key.clone());
        let value = shape_result(
            self.on_sheet(member.key.home_sheet())
                .evaluate(&member.formula),
            &member.key,
        );
        self.context.pop_executing();
        self.context.record_executed(member.key.clone(), value.clone());
        value
    }

    fn eval_unary(&self, op: &str, expr: &ASTNode) -> CellValue {
        let v = self.evaluate(expr).into_scalar();
        if v.is_error() {
            return v;
        }
        let n = match v.coerce_to_number() {
            Ok(n) => n,
            Err(e) => return e.into(),
        };
        match op {
            "-" => CellValue::Number(-n),
            "+" => CellValue::Number(n),
            "%" => CellValue::Number(n / 100.0),
            _ => CellError::new(ErrorKind::Value)
                .with_message(format!("unknown unary operator {op}"))
                .into(),
        }
    }

    fn eval_binary(&self, op: &str, left: &ASTNode, right: &ASTNode) -> CellValue {
        if op == ":" {
            return CellError::new(ErrorKind::Value)
                .with_message("range operator outside a reference")
                .into();
        }
        let l = self.evaluate(left).into_scalar();
        if l.is_error() {
            return l;
        }
        let r = self.evaluate(right).into_scalar();
        if r.is_error() {
            return r;
        }
        match op {
            "+" | "-" | "*" | "/" | "^" => arithmetic(op, &l, &r).unwrap_or_else(Into::into),
            "&" => match (l.coerce_to_text(), r.coerce_to_text()) {
                (Ok(a), Ok(b)) => CellValue::Text(a + &b),
                (Err(e), _) | (_, Err(e)) => e.into(),
            },
            "=" | "<>" | "<" | ">" | "<=" | ">=" => {
                let ord = compare_values(&l, &r);
                CellValue::Boolean(match op {
                    "=" => ord == Ordering::Equal,
                    "<>" => ord != Ordering::Equal,
                    "<" => ord == Ordering::Less,
                    ">" => ord == Ordering::Greater,
                    "<=" => ord != Ordering::Greater,
                    _ => ord != Ordering::Less,
                })
            }
            _ => CellError::new(ErrorKind::Value)
                .with_message(format!("unknown operator {op}"))
                .into(),
        }
    }

    fn eval_function(&self, name: &str, args: &[ASTNode]) -> CellValue {
        let Some(function) = self.functions.get(name) else {
            return CellError::new(ErrorKind::Name)
                .with_message(format!("unknown function {name}"))
                .into();
        };
        if let Err(e) = check_arity(function.as_ref(), args.len()) {
            return e.into();
        }
        let schema = function.arg_schema();
        let handles: SmallVec<[ArgumentHandle<'_, '_>; 4]> = args
            .iter()
            .enumerate()
            .map(|(i, node)| {
                ArgumentHandle::new(node, self, function.accepts_errors(), spec_for(schema, i))
            })
            .collect();
        let ctx = FunctionContext::new(self.env, self.current_sheet, self.context.rng());

        match panic::catch_unwind(AssertUnwindSafe(|| function.eval(&handles, &ctx))) {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => e.into(),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown fault".to_string());
                CellError::new(ErrorKind::Na)
                    .with_message(format!("Error running formula: {message}"))
                    .into()
            }
        }
    }
}

/// Cells hold one value; named variables may hold a whole array.
pub(crate) fn shape_result(value: CellValue, key: &VertexKey) -> CellValue {
    match key {
        VertexKey::Cell { .. } => value.into_scalar(),
        VertexKey::Named(_) => value,
    }
}

fn arithmetic(op: &str, l: &CellValue, r: &CellValue) -> Result<CellValue, CellError> {
    let a = l.coerce_to_number()?;
    let b = r.coerce_to_number()?;
    let n = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(CellError::new(ErrorKind::Div0));
            }
            a / b
        }
        _ => a.powf(b),
    };
    if n.is_finite() {
        Ok(CellValue::Number(n))
    } else {
        Err(CellError::new(ErrorKind::Num))
    }
}

/// Spreadsheet ordering: numbers < text < booleans, text compared without
/// case, blanks taking the zero value of the other side's type.
pub fn compare_values(l: &CellValue, r: &CellValue) -> Ordering {
    use CellValue::*;
    fn rank(v: &CellValue) -> u8 {
        match v {
            Number(_) | Empty => 0,
            Text(_) => 1,
            Boolean(_) => 2,
            _ => 3,
        }
    }
    match (l, r) {
        (Empty, Empty) => Ordering::Equal,
        (Number(a), Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Empty, Number(b)) => 0f64.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Number(a), Empty) => a.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
        (Text(a), Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Empty, Text(b)) => "".cmp(b.as_str()),
        (Text(a), Empty) => a.as_str().cmp(""),
        (Boolean(a), Boolean(b)) => a.cmp(b),
        (Empty, Boolean(b)) => false.cmp(b),
        (Boolean(a), Empty) => a.cmp(&false),
        _ => rank(l).cmp(&rank(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_across_types() {
        let n = CellValue::Number(5.0);
        let t = CellValue::Text("abc".into());
        let b = CellValue::Boolean(false);
        assert_eq!(compare_values(&n, &t), Ordering::Less);
        assert_eq!(compare_values(&t, &b), Ordering::Less);
        assert_eq!(
            compare_values(&CellValue::Text("ABC".into()), &t),
            Ordering::Equal
        );
        assert_eq!(compare_values(&CellValue::Empty, &CellValue::Number(0.0)), Ordering::Equal);
        assert_eq!(compare_values(&CellValue::Empty, &b), Ordering::Equal);
    }

    #[test]
    fn arithmetic_errors() {
        let zero = CellValue::Number(0.0);
        let one = CellValue::Number(1.0);
        assert_eq!(
            arithmetic("/", &one, &zero).unwrap_err().kind,
            ErrorKind::Div0
        );
        assert_eq!(
            arithmetic("+", &CellValue::Text("x".into()), &one)
                .unwrap_err()
                .kind,
            ErrorKind::Value
        );
        assert_eq!(
            arithmetic("^", &CellValue::Number(-8.0), &CellValue::Number(0.5))
                .unwrap_err()
                .kind,
            ErrorKind::Num
        );
        assert_eq!(
            arithmetic("+", &CellValue::Text(" 2 ".into()), &one).unwrap(),
            CellValue::Number(3.0)
        );
    }
}
