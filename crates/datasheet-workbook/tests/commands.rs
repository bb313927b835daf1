use datasheet_eval::VertexKey;
use datasheet_workbook::*;
use serde_json::json;

fn workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap();
    wb
}

fn cell(row: u32, col: u32) -> VertexKey {
    VertexKey::cell("Sheet1", row, col)
}

#[test]
fn formula_edit_round_trips_values_and_edges() {
    let mut wb = workbook();
    assert!(wb.execute(SetCellValue::new("Sheet1", 0, 0, 21.0)));
    assert!(wb.execute(SetFormula::new("Sheet1", 0, 1, "A1*2")));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(42.0));
    assert_eq!(wb.get_formula("Sheet1", 0, 1).as_deref(), Some("=A1*2"));
    assert_eq!(wb.engine().get_direct_dependents(&cell(0, 0)), vec![cell(0, 1)]);

    assert!(wb.undo());
    assert_eq!(wb.get_formula("Sheet1", 0, 1), None);
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Empty);
    assert!(wb.engine().get_direct_dependents(&cell(0, 0)).is_empty());

    assert!(wb.redo());
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(42.0));
    assert_eq!(wb.engine().get_direct_dependents(&cell(0, 0)), vec![cell(0, 1)]);
}

#[test]
fn value_over_formula_detaches_it_until_undone() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 3.0));
    wb.execute(SetFormula::new("Sheet1", 1, 0, "=A1+1"));
    wb.execute(SetCellValue::new("Sheet1", 1, 0, "fixed"));
    assert_eq!(wb.get_formula("Sheet1", 1, 0), None);

    wb.execute(SetCellValue::new("Sheet1", 0, 0, 10.0));
    assert_eq!(wb.get_value("Sheet1", 1, 0), CellValue::from("fixed"));

    assert!(wb.undo());
    assert!(wb.undo());
    assert_eq!(wb.get_formula("Sheet1", 1, 0).as_deref(), Some("=A1+1"));
    assert_eq!(wb.get_value("Sheet1", 1, 0), CellValue::Number(4.0));
}

#[test]
fn restore_data_is_spent_once() {
    let mut data = WorkbookData::new(WorkbookConfig::default(), Default::default());
    data.add_sheet("Sheet1").unwrap();
    let mut command = SetCellValue::new("Sheet1", 2, 2, 7.0);

    assert!(!command.undo(&mut data));
    assert!(command.execute(&mut data));
    assert!(command.undo(&mut data));
    assert!(!command.undo(&mut data));
    assert_eq!(data.sheet("Sheet1").unwrap().get_value(2, 2), CellValue::Empty);

    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 2, 2, 7.0));
    assert!(wb.undo());
    assert!(!wb.undo());
    assert_eq!(wb.get_value("Sheet1", 2, 2), CellValue::Empty);
}

#[test]
fn refused_command_changes_nothing() {
    let mut wb = workbook();
    assert!(!wb.execute(SetCellValue::new("Missing", 0, 0, 1.0)));
    assert!(!wb.execute(SetCellValue::new("Sheet1", 0, 10_000, 1.0)));
    assert!(!wb.execute(SetFormula::new("Sheet1", 0, 0, "=SUM(")));
    assert_eq!(wb.get_value("Sheet1", 0, 0), CellValue::Empty);
    assert!(!wb.can_undo());
}

#[test]
fn group_with_failing_member_leaves_no_trace() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0));
    let group = CommandGroup::new("paste")
        .with(SetCellValue::new("Sheet1", 0, 0, 100.0))
        .with(MergeCells::new("Sheet1", Region::new(0, 0, 50_000, 1)))
        .with(SetCellValue::new("Sheet1", 1, 0, 200.0));

    assert!(!wb.execute(group));
    assert_eq!(wb.get_value("Sheet1", 0, 0), CellValue::Number(1.0));
    assert_eq!(wb.get_value("Sheet1", 1, 0), CellValue::Empty);
    assert!(!wb.sheet("Sheet1").unwrap().cells().any_merges());
    assert_eq!(wb.commands().undo_len(), 1);
}

#[test]
fn merge_grows_with_inserted_columns_and_shrinks_back_on_undo() {
    let mut wb = workbook();
    assert!(wb.execute(MergeCells::new("Sheet1", Region::new(0, 1, 0, 4))));
    assert!(wb.execute(InsertRowsCols::new("Sheet1", Axis::Col, 2, 3)));
    let merges = |wb: &Workbook| wb.sheet("Sheet1").unwrap().cells().get_merges(&Region::new(0, 0, 0, 20));
    assert_eq!(merges(&wb), vec![Region::new(0, 1, 0, 7)]);
    assert_eq!(wb.sheet("Sheet1").unwrap().num_cols(), 29);

    assert!(wb.undo());
    assert_eq!(merges(&wb), vec![Region::new(0, 1, 0, 4)]);
    assert_eq!(wb.sheet("Sheet1").unwrap().num_cols(), 26);
}

#[test]
fn overlapping_merge_is_refused() {
    let mut wb = workbook();
    assert!(wb.execute(MergeCells::new("Sheet1", Region::new(0, 0, 1, 1))));
    assert!(!wb.execute(MergeCells::new("Sheet1", Region::new(1, 1, 2, 2))));
    assert!(wb.execute(UnmergeCells::new("Sheet1", Region::cell(1, 1))));
    assert_eq!(wb.sheet("Sheet1").unwrap().cells().get_merge(0, 0), None);
    assert!(wb.undo());
    assert_eq!(
        wb.sheet("Sheet1").unwrap().cells().get_merge(1, 0),
        Some(Region::new(0, 0, 1, 1))
    );
}

#[test]
fn removing_rows_rewrites_formulas_and_undo_restores_them() {
    let mut wb = workbook();
    let values = (0..5).map(|r| (r, 0, CellValue::from((r + 1) as f64))).collect();
    wb.execute(SetCellValues::new("Sheet1", values));
    wb.execute(SetFormula::new("Sheet1", 0, 1, "=SUM(A1:A5)"));
    wb.execute(SetFormula::new("Sheet1", 1, 1, "=A2*10"));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(15.0));

    assert!(wb.execute(RemoveRowsCols::new("Sheet1", Axis::Row, 1, 2)));
    assert_eq!(wb.get_formula("Sheet1", 0, 1).as_deref(), Some("=SUM(A1:A3)"));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(1.0 + 4.0 + 5.0));
    assert_eq!(wb.get_value("Sheet1", 1, 0), CellValue::Number(4.0));
    assert_eq!(wb.get_formula("Sheet1", 1, 1), None);

    assert!(wb.undo());
    assert_eq!(wb.get_formula("Sheet1", 0, 1).as_deref(), Some("=SUM(A1:A5)"));
    assert_eq!(wb.get_formula("Sheet1", 1, 1).as_deref(), Some("=A2*10"));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(15.0));
    assert_eq!(wb.get_value("Sheet1", 1, 1), CellValue::Number(20.0));
    assert_eq!(wb.sheet("Sheet1").unwrap().num_rows(), 1000);
}

#[test]
fn references_into_removed_rows_become_ref_errors() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 2, 0, 8.0));
    wb.execute(SetFormula::new("Sheet1", 0, 1, "=A3+1"));
    wb.execute(RemoveRowsCols::new("Sheet1", Axis::Row, 2, 1));
    assert_eq!(wb.get_formula("Sheet1", 0, 1).as_deref(), Some("=#REF!+1"));
    assert!(
        wb.get_value("Sheet1", 0, 1)
            .as_error()
            .is_some_and(|e| e.kind == datasheet_common::ErrorKind::Ref)
    );
    wb.undo();
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(9.0));
}

#[test]
fn copy_range_moves_relative_references() {
    let mut wb = workbook();
    wb.execute(SetCellValues::new(
        "Sheet1",
        vec![(0, 0, 1.0.into()), (1, 0, 2.0.into()), (0, 1, 10.0.into()), (1, 1, 20.0.into())],
    ));
    wb.execute(SetFormula::new("Sheet1", 0, 2, "=A1+$B$1"));
    wb.execute(SetType::new("Sheet1", Region::cell(0, 2), "currency"));

    assert!(wb.execute(CopyRange::new("Sheet1", Region::cell(0, 2), (1, 2))));
    assert_eq!(wb.get_formula("Sheet1", 1, 2).as_deref(), Some("=A2+$B$1"));
    assert_eq!(wb.get_value("Sheet1", 1, 2), CellValue::Number(12.0));
    assert_eq!(wb.sheet("Sheet1").unwrap().cells().get_type(1, 2), "currency");

    assert!(wb.undo());
    assert_eq!(wb.get_formula("Sheet1", 1, 2), None);
    assert_eq!(wb.sheet("Sheet1").unwrap().cells().get_type(1, 2), DEFAULT_CELL_TYPE);

    let values_only = CopyOptions {
        values: true,
        formulas: false,
        types: false,
    };
    assert!(wb.execute(CopyRange::new("Sheet1", Region::cell(0, 2), (3, 2)).with_options(values_only)));
    assert_eq!(wb.get_formula("Sheet1", 3, 2), None);
    assert_eq!(wb.get_value("Sheet1", 3, 2), CellValue::Number(11.0));
}

#[test]
fn clear_cells_and_metadata_round_trip() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 2.0));
    wb.execute(SetFormula::new("Sheet1", 0, 1, "=A1*A1"));
    wb.execute(SetFormula::new("Sheet1", 5, 5, "=B1+1"));
    wb.execute(SetMetaData::new("Sheet1", 0, 0, "comment", Some(json!("input"))));
    assert_eq!(wb.get_value("Sheet1", 5, 5), CellValue::Number(5.0));

    assert!(wb.execute(ClearCells::new("Sheet1", vec![Region::new(0, 0, 0, 1)])));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Empty);
    assert_eq!(wb.get_value("Sheet1", 5, 5), CellValue::Number(1.0));
    assert_eq!(
        wb.sheet("Sheet1").unwrap().cells().get_metadata(0, 0, "comment"),
        Some(&json!("input"))
    );

    assert!(wb.undo());
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(4.0));
    assert_eq!(wb.get_value("Sheet1", 5, 5), CellValue::Number(5.0));

    assert!(wb.undo());
    assert_eq!(wb.sheet("Sheet1").unwrap().cells().get_metadata(0, 0, "comment"), None);
}

#[test]
fn sizes_and_visibility_are_undoable() {
    let mut wb = workbook();
    assert!(wb.execute(SetSize::new("Sheet1", Axis::Row, 2, 3, 40.0)));
    assert!(wb.execute(HideRowsCols::new("Sheet1", Axis::Col, 1, 2)));
    let sheet = wb.sheet("Sheet1").unwrap();
    assert_eq!(sheet.info(Axis::Row).size(3), 40.0);
    assert!(!sheet.info(Axis::Col).is_visible(2));

    assert!(wb.execute(UnhideRowsCols::new("Sheet1", Axis::Col, 2, 2)));
    assert!(wb.sheet("Sheet1").unwrap().info(Axis::Col).is_visible(2));

    assert!(wb.undo());
    assert!(wb.undo());
    assert!(wb.undo());
    let sheet = wb.sheet("Sheet1").unwrap();
    assert_eq!(sheet.info(Axis::Row).size(3), 24.0);
    assert!(sheet.info(Axis::Col).is_visible(1));
    assert!(!wb.execute(SetSize::new("Sheet1", Axis::Row, 3, 2, 10.0)));
}

#[test]
fn removing_a_sheet_breaks_references_and_clears_history() {
    let mut wb = workbook();
    wb.add_sheet("Data").unwrap();
    wb.execute(SetCellValue::new("Data", 0, 0, 5.0));
    wb.execute(SetFormula::new("Sheet1", 0, 0, "=Data!A1*2"));
    assert_eq!(wb.get_value("Sheet1", 0, 0), CellValue::Number(10.0));

    wb.rename_sheet("Data", "Inputs").unwrap();
    assert_eq!(wb.get_formula("Sheet1", 0, 0).as_deref(), Some("=Inputs!A1*2"));
    assert!(!wb.can_undo());
    assert!(matches!(
        wb.rename_sheet("Inputs", "sheet1"),
        Err(WorkbookError::DuplicateSheet(_))
    ));

    wb.remove_sheet("Inputs").unwrap();
    assert_eq!(wb.get_formula("Sheet1", 0, 0).as_deref(), Some("=#REF!*2"));
    assert!(wb.get_value("Sheet1", 0, 0).as_error().is_some());
    assert!(matches!(wb.add_sheet("SHEET1"), Err(WorkbookError::DuplicateSheet(_))));
}

#[test]
fn insert_past_the_grid_edge_is_refused() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 5, 0, 42.0));
    wb.execute(SetFormula::new("Sheet1", 6, 1, "=A6+1"));
    let before = wb.sheet("Sheet1").unwrap().cells().positions();

    assert!(!wb.execute(InsertRowsCols::new("Sheet1", Axis::Row, 0, u32::MAX - 2)));
    let mut data = WorkbookData::new(WorkbookConfig::default(), Default::default());
    data.add_sheet("Sheet1").unwrap();
    assert!(matches!(
        data.insert_rows_cols("Sheet1", Axis::Col, 0, u32::MAX - 2),
        Err(WorkbookError::OutOfBounds { .. })
    ));

    let sheet = wb.sheet("Sheet1").unwrap();
    assert_eq!(sheet.num_rows(), 1000);
    assert_eq!(sheet.cells().positions(), before);
    assert_eq!(wb.get_value("Sheet1", 2, 0), CellValue::Empty);
    assert_eq!(wb.get_value("Sheet1", 5, 0), CellValue::Number(42.0));
    assert_eq!(wb.get_value("Sheet1", 6, 1), CellValue::Number(43.0));
}

#[test]
fn insert_up_to_the_grid_edge_keeps_cells_in_order() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 5, 0, 42.0));
    let count = UNBOUNDED - 1 - 1000;
    assert!(wb.execute(InsertRowsCols::new("Sheet1", Axis::Row, 0, count)));
    assert_eq!(wb.sheet("Sheet1").unwrap().num_rows(), UNBOUNDED - 1);
    assert_eq!(wb.get_value("Sheet1", 5 + count, 0), CellValue::Number(42.0));
    assert_eq!(wb.get_value("Sheet1", 5, 0), CellValue::Empty);

    assert!(!wb.execute(InsertRowsCols::new("Sheet1", Axis::Row, 0, 1)));
    assert!(wb.undo());
    assert_eq!(wb.get_value("Sheet1", 5, 0), CellValue::Number(42.0));
}

#[test]
fn sheet_without_rows_accepts_no_cells() {
    let mut wb = workbook();
    assert!(wb.execute(RemoveRowsCols::new("Sheet1", Axis::Row, 0, 1000)));
    let sheet = wb.sheet("Sheet1").unwrap();
    assert_eq!(sheet.num_rows(), 0);
    assert_eq!(sheet.region(), None);
    assert_eq!(sheet.clip(&Region::ALL), None);

    assert!(!wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0)));
    assert!(!wb.execute(MergeCells::new("Sheet1", Region::cell(0, 0))));
    assert!(wb.get_value("Sheet1", 0, 0).is_empty());

    assert!(wb.undo());
    assert_eq!(wb.sheet("Sheet1").unwrap().region(), Some(Region::new(0, 0, 999, 25)));
    assert!(wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0)));
}

#[test]
fn sort_moves_whole_rows_and_undo_puts_them_back() {
    let mut wb = workbook();
    wb.execute(SetCellValues::new(
        "Sheet1",
        vec![
            (0, 0, CellValue::from(3.0)),
            (1, 0, CellValue::from(1.0)),
            (2, 0, CellValue::from(2.0)),
            (1, 1, CellValue::from("c")),
            (2, 1, CellValue::from("a")),
        ],
    ));
    wb.execute(SetFormula::new("Sheet1", 0, 1, "=A1*10"));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(30.0));

    let region = Region::new(0, 0, 3, 1);
    assert!(wb.execute(SortRange::new("Sheet1", region, vec![])));
    let column = |wb: &Workbook, col: u32| -> Vec<CellValue> {
        (0..4).map(|r| wb.get_value("Sheet1", r, col)).collect()
    };
    let n = CellValue::Number;
    assert_eq!(column(&wb, 0), vec![n(1.0), n(2.0), n(3.0), CellValue::Empty]);
    assert_eq!(column(&wb, 1)[..2].to_vec(), vec![CellValue::from("c"), CellValue::from("a")]);
    assert_eq!(wb.get_formula("Sheet1", 2, 1).as_deref(), Some("=A3*10"));
    assert_eq!(wb.get_value("Sheet1", 2, 1), CellValue::Number(30.0));

    assert!(wb.undo());
    assert_eq!(column(&wb, 0)[..3].to_vec(), vec![n(3.0), n(1.0), n(2.0)]);
    assert_eq!(wb.get_formula("Sheet1", 0, 1).as_deref(), Some("=A1*10"));
    assert_eq!(wb.get_value("Sheet1", 0, 1), CellValue::Number(30.0));
    assert_eq!(wb.get_value("Sheet1", 1, 1), CellValue::from("c"));
    assert_eq!(wb.get_formula("Sheet1", 2, 1), None);
}

#[test]
fn sort_reports_order_and_honours_secondary_keys() {
    let mut data = WorkbookData::new(WorkbookConfig::default(), Default::default());
    data.add_sheet("Sheet1").unwrap();
    let rows = [(1.0, "x"), (2.0, "b"), (1.0, "a"), (2.0, "a")];
    let values = rows
        .iter()
        .enumerate()
        .flat_map(|(r, &(n, s))| {
            let r = r as u32;
            [(r, 0, CellValue::from(n)), (r, 1, CellValue::from(s))]
        })
        .collect();
    data.set_cell_values("Sheet1", values).unwrap();

    let options = [ColumnSortOptions::new(0, false), ColumnSortOptions::new(1, true)];
    let (restore, order) = data
        .sort_range("Sheet1", Region::new(0, 0, 3, 1), &options)
        .unwrap();
    assert_eq!(order, vec![3, 1, 2, 0]);
    let cells = data.sheet("Sheet1").unwrap().cells();
    assert_eq!(cells.get_value(0, 1), CellValue::from("a"));
    assert_eq!(cells.get_value(1, 1), CellValue::from("b"));
    assert_eq!(cells.get_value(3, 1), CellValue::from("x"));

    data.restore(restore);
    assert_eq!(data.sheet("Sheet1").unwrap().cells().get_value(0, 1), CellValue::from("x"));
    let outside = Region::new(5000, 0, 5001, 1);
    assert!(data.sort_range("Sheet1", outside, &[]).is_err());
}
