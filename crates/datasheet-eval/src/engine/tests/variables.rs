use datasheet_common::{CellValue, ErrorKind};

use super::common::*;
use crate::engine::{EngineError, VariableInfo, VariableValue};
use crate::test_env::TestEnvironment;

#[test]
fn value_variable_feeds_formulas() {
    let mut engine = engine();
    let mut env = TestEnvironment::new().with_cell_a1(SHEET, "A1", 200);
    engine
        .set_variable(&mut env, "rate", VariableValue::Value(0.5.into()))
        .unwrap();
    set_formula(&mut engine, &mut env, "B1", "=A1*rate");
    engine.calculate(&mut env, false);
    assert_eq!(env.value_a1(SHEET, "B1"), CellValue::Number(100.0));

    engine
        .set_variable(&mut env, "rate", VariableValue::Value(0.25.into()))
        .unwrap();
    assert_eq!(env.value_a1(SHEET, "B1"), CellValue::Number(50.0));
}

#[test]
fn formula_variable_needs_an_explicit_sheet() {
    let mut engine = engine();
    let mut env = TestEnvironment::new().with_cell_a1(SHEET, "A1", 4);

    let implicit = engine.parse_formula("=A1*2").unwrap();
    let err = engine
        .set_variable(&mut env, "double", VariableValue::Formula(implicit))
        .unwrap_err();
    assert!(matches!(err, EngineError::ImplicitSheetInVariable { .. }));
    assert!(engine.variables(&env).is_empty());

    let explicit = engine.parse_formula("=Sheet1!A1*2").unwrap();
    engine
        .set_variable(&mut env, "double", VariableValue::Formula(explicit))
        .unwrap();
    assert_eq!(
        engine.get_variable(&env, "double"),
        Some(CellValue::Number(8.0))
    );

    set_value(&mut engine, &mut env, "A1", 10);
    engine.calculate(&mut env, false);
    assert_eq!(
        engine.get_variable(&env, "double"),
        Some(CellValue::Number(20.0))
    );
}

#[test]
fn cleared_variable_reads_as_name_error() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    engine
        .set_variable(&mut env, "tax", VariableValue::Value(3.into()))
        .unwrap();
    set_formula(&mut engine, &mut env, "A1", "=tax+1");
    engine.calculate(&mut env, false);
    assert_eq!(env.value_a1(SHEET, "A1"), CellValue::Number(4.0));

    engine.clear_variable(&mut env, "tax");
    assert_eq!(engine.get_variable(&env, "tax"), None);
    assert_eq!(
        env.value_a1(SHEET, "A1").as_error().map(|e| e.kind),
        Some(ErrorKind::Name)
    );
}

#[test]
fn listing_reports_formulas_and_values() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    engine
        .set_variable(&mut env, "b", VariableValue::Value(2.into()))
        .unwrap();
    let formula = engine.parse_formula("=b*3").unwrap();
    engine
        .set_variable(&mut env, "a", VariableValue::Formula(formula))
        .unwrap();

    assert_eq!(
        engine.variables(&env),
        vec![
            VariableInfo {
                name: "a".into(),
                formula: Some("=b*3".into()),
                value: Some(CellValue::Number(6.0)),
            },
            VariableInfo {
                name: "b".into(),
                formula: None,
                value: Some(CellValue::Number(2.0)),
            },
        ]
    );
}

#[test]
fn cell_like_names_are_rejected() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    let err = engine
        .set_variable(&mut env, "A1", VariableValue::Value(1.into()))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(name) if name == "A1"));
}
