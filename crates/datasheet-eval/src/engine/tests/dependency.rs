use datasheet_common::Region;

use super::common::*;
use crate::engine::VertexKey;
use crate::test_env::TestEnvironment;

#[test]
fn direct_dependents_include_range_readers() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    set_formula(&mut engine, &mut env, "A2", "=A1*2");
    set_formula(&mut engine, &mut env, "B1", "=SUM(A1:A3)");
    set_formula(&mut engine, &mut env, "C1", "=A2");

    assert_eq!(engine.get_direct_dependents(&key("A1")), vec![key("A2")]);
    assert_eq!(
        engine.get_direct_dependents(&key("A2")),
        vec![key("B1"), key("C1")]
    );
}

#[test]
fn find_dependent_formula_by_region() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    set_formula(&mut engine, &mut env, "B1", "=SUM(A1:A3)");
    set_formula(&mut engine, &mut env, "C1", "=A5");
    set_formula(&mut engine, &mut env, "D1", "=SUM(A:A)");

    let hits = engine.find_dependent_formula(&Region::cell(1, 0), SHEET);
    assert_eq!(hits, vec![key("B1"), key("D1")]);

    let hits = engine.find_dependent_formula(&Region::new(3, 0, 10, 0), SHEET);
    assert_eq!(hits, vec![key("C1"), key("D1")]);

    assert!(engine.find_dependent_formula(&Region::cell(0, 5), SHEET).is_empty());
    assert!(engine.find_dependent_formula(&Region::cell(0, 0), "Other").is_empty());
}

#[test]
fn cross_sheet_edges() {
    let mut engine = engine();
    engine.add_sheet("Data").unwrap();
    let mut env = TestEnvironment::new().with_sheet("Data").with_cell_a1("Data", "A1", 4);
    set_formula(&mut engine, &mut env, "A1", "=data!A1*2");

    let data_a1 = VertexKey::cell("Data", 0, 0);
    assert_eq!(engine.get_direct_dependents(&data_a1), vec![key("A1")]);
    engine.calculate(&mut env, false);
    assert_eq!(env.value_a1(SHEET, "A1"), datasheet_common::CellValue::Number(8.0));
}

#[test]
fn reassigning_a_formula_replaces_its_edges() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    set_formula(&mut engine, &mut env, "C1", "=A1+B1");
    set_formula(&mut engine, &mut env, "C1", "=B1");

    assert!(engine.graph().vertex_id(&key("A1")).is_none());
    assert_eq!(engine.get_direct_dependents(&key("B1")), vec![key("C1")]);
}

#[test]
fn restore_reinstates_edges() {
    let mut engine = engine();
    let mut env = TestEnvironment::new();
    set_formula(&mut engine, &mut env, "C1", "=A1+B1");
    let undo = engine.set_formula(&key("C1"), None).unwrap();
    assert!(engine.graph().is_empty());

    engine.restore(undo);
    assert_eq!(formula_text(&engine, "C1").as_deref(), Some("=A1+B1"));
    assert_eq!(engine.get_direct_dependents(&key("A1")), vec![key("C1")]);
    assert_eq!(engine.get_direct_dependents(&key("B1")), vec![key("C1")]);
    assert_eq!(engine.pending(), vec![key("C1")]);
}

#[test]
fn unknown_sheet_is_an_error() {
    let mut engine = engine();
    let ast = engine.parse_formula("=1").unwrap();
    let err = engine
        .set_formula(&VertexKey::cell("Missing", 0, 0), Some(ast))
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown sheet 'Missing'");
}
