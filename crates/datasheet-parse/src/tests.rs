use datasheet_common::{Axis, CellValue, ErrorKind, Region, UNBOUNDED};
use proptest::prelude::*;

use crate::{ASTNode, ASTNodeType, ReferenceType, parse, parse_with_volatility_classifier};

fn reference(node: &ASTNode) -> &ReferenceType {
    match &node.node_type {
        ASTNodeType::Reference { reference, .. } => reference,
        other => panic!("expected a reference, got {other:?}"),
    }
}

#[test]
fn precedence_climbs() {
    let ast = parse("=1+2*3^2").unwrap();
    let ASTNodeType::BinaryOp { op, right, .. } = &ast.node_type else {
        panic!("expected binary op");
    };
    assert_eq!(op, "+");
    let ASTNodeType::BinaryOp { op, .. } = &right.node_type else {
        panic!("expected nested op");
    };
    assert_eq!(op, "*");
    assert_eq!(ast.to_formula(), "=1+2*3^2");
}

#[test]
fn unary_binds_tighter_than_power() {
    let ast = parse("=-2^2").unwrap();
    let ASTNodeType::BinaryOp { left, .. } = &ast.node_type else {
        panic!("expected binary op");
    };
    assert!(matches!(left.node_type, ASTNodeType::UnaryOp { .. }));
}

#[test]
fn references_are_zero_based() {
    let ast = parse("=B3").unwrap();
    assert_eq!(reference(&ast).region(), Some(Region::cell(2, 1)));

    let ast = parse("='My Sheet'!$A$1:C4").unwrap();
    let r = reference(&ast);
    assert_eq!(r.sheet(), Some("My Sheet"));
    assert_eq!(r.region(), Some(Region::new(0, 0, 3, 2)));
    assert_eq!(r.to_string(), "'My Sheet'!$A$1:C4");
}

#[test]
fn whole_rows_and_columns() {
    let cols = parse("=A:B").unwrap();
    assert_eq!(reference(&cols).region(), Some(Region::new(0, 0, UNBOUNDED, 1)));
    let rows = parse("=Sheet2!3:4").unwrap();
    assert_eq!(reference(&rows).region(), Some(Region::new(2, 0, 3, UNBOUNDED)));
    assert_eq!(reference(&rows).to_string(), "Sheet2!3:4");
}

#[test]
fn named_variables_and_literals() {
    let ast = parse("=Rate*TRUE&\"x\"\"y\"").unwrap();
    let deps = ast.get_dependencies();
    assert_eq!(deps, vec![&ReferenceType::Named("Rate".into())]);
    assert_eq!(ast.to_formula(), "=Rate*TRUE&\"x\"\"y\"");

    let ast = parse("=#DIV/0!").unwrap();
    assert_eq!(
        ast.node_type,
        ASTNodeType::Literal(CellValue::from(ErrorKind::Div0))
    );
}

#[test]
fn function_arguments_allow_omissions() {
    let ast = parse("=IF(A1,,3)").unwrap();
    let ASTNodeType::Function { name, args } = &ast.node_type else {
        panic!("expected function");
    };
    assert_eq!(name, "IF");
    assert_eq!(args.len(), 3);
    assert_eq!(args[1].node_type, ASTNodeType::Literal(CellValue::Empty));

    let ast = parse("=NOW()").unwrap();
    assert!(matches!(&ast.node_type, ASTNodeType::Function { args, .. } if args.is_empty()));
}

#[test]
fn non_formula_text_is_a_literal() {
    let ast = parse("hello").unwrap();
    assert_eq!(ast.node_type, ASTNodeType::Literal(CellValue::from("hello")));
}

#[test]
fn syntax_errors_are_reported() {
    assert!(parse("=1+").is_err());
    assert!(parse("=SUM(1 2)").is_err());
    assert!(parse("=(1").is_err());
    assert!(parse("").is_err());
    assert!(parse("=Sheet1!").is_err());
}

#[test]
fn volatility_propagates_upwards() {
    let ast = parse_with_volatility_classifier("=1+RAND()", |n| n.eq_ignore_ascii_case("rand"))
        .unwrap();
    assert!(ast.contains_volatile());
    let ast = parse_with_volatility_classifier("=1+ABS(2)", |n| n.eq_ignore_ascii_case("rand"))
        .unwrap();
    assert!(!ast.contains_volatile());
}

#[test]
fn insert_shifts_and_expands() {
    let mut ast = parse("=A1+A5+SUM(A2:A4)").unwrap();
    assert!(ast.adjust_for_insert("Sheet1", "Sheet1", Axis::Row, 2, 3));
    assert_eq!(ast.to_formula(), "=A1+A8+SUM(A2:A7)");

    let mut other = parse("=Other!A5+A5").unwrap();
    other.adjust_for_insert("Sheet1", "Other", Axis::Row, 0, 1);
    assert_eq!(other.to_formula(), "=Other!A6+A5");
}

#[test]
fn remove_clips_and_invalidates() {
    let mut ast = parse("=B1+C1+D1+SUM(A1:D1)").unwrap();
    ast.adjust_for_remove("S", "S", Axis::Col, 1, 2);
    assert_eq!(ast.to_formula(), "=#REF!+#REF!+B1+SUM(A1:B1)");
    assert!(ast.get_dependencies().len() == 2);

    let mut gone = parse("=SUM(B1:C1)").unwrap();
    gone.adjust_for_remove("S", "S", Axis::Col, 1, 2);
    assert_eq!(gone.to_formula(), "=SUM(#REF!)");
}

#[test]
fn copy_offsets_only_relative_parts() {
    let mut ast = parse("=A1+$A$1+A$1+SUM(B1:B2)").unwrap();
    ast.offset_relative(2, 1);
    assert_eq!(ast.to_formula(), "=B3+$A$1+B$1+SUM(C3:C4)");

    let mut off = parse("=A1").unwrap();
    off.offset_relative(-1, 0);
    assert_eq!(off.to_formula(), "=#REF!");
}

#[test]
fn sheet_rename_and_removal() {
    let mut ast = parse("=Data!A1+A1").unwrap();
    ast.rename_sheet("data", "Input");
    assert_eq!(ast.to_formula(), "=Input!A1+A1");
    ast.invalidate_sheet("Sheet1", "Input");
    assert_eq!(ast.to_formula(), "=#REF!+A1");
}

fn formula_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..50, 0u32..30).prop_map(|(r, c)| ASTNode::reference(ReferenceType::Cell {
            sheet: None,
            row: r,
            col: c,
            row_abs: false,
            col_abs: false,
        })
        .to_string()),
        (0u32..1000).prop_map(|n| n.to_string()),
        Just("TRUE".to_string()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/", "^", "&", "<="]), inner.clone())
                .prop_map(|(l, op, r)| format!("({l}){op}({r})")),
            inner.clone().prop_map(|e| format!("-({e})")),
            prop::collection::vec(inner, 1..3).prop_map(|args| format!("SUM({})", args.join(","))),
        ]
    })
}

proptest! {
    #[test]
    fn rendering_is_a_fixed_point(body in formula_strategy()) {
        let first = parse(format!("={body}")).unwrap();
        let rendered = first.to_formula();
        let second = parse(&rendered).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(rendered, second.to_formula());
    }

    #[test]
    fn insert_then_remove_restores_references(row in 0u32..40, col in 0u32..20, at in 0u32..40, n in 1u32..5) {
        let src = format!("={}+1", ASTNode::reference(ReferenceType::Cell {
            sheet: None, row, col, row_abs: false, col_abs: false,
        }));
        let original = parse(&src).unwrap();
        let mut ast = original.clone();
        ast.adjust_for_insert("S", "S", Axis::Row, at, n);
        ast.adjust_for_remove("S", "S", Axis::Row, at, n);
        prop_assert_eq!(ast.to_formula(), original.to_formula());
    }
}
