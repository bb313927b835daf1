use datasheet_workbook::*;

fn workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap();
    wb.drain_events();
    wb
}

#[test]
fn events_are_ready_immediately_outside_batches() {
    let mut wb = workbook();
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0));
    assert_eq!(
        wb.drain_events(),
        vec![SheetEvent::CellsChanged {
            sheet: "Sheet1".into(),
            positions: vec![(0, 0)],
            regions: vec![],
        }]
    );
    assert!(wb.drain_events().is_empty());
}

#[test]
fn command_group_coalesces_and_recalculates_once() {
    let mut wb = workbook();
    wb.execute(SetFormula::new("Sheet1", 0, 2, "=A1+B1"));
    wb.drain_events();

    wb.begin_command_group("edit");
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0));
    assert!(wb.drain_events().is_empty());
    assert_eq!(wb.get_value("Sheet1", 0, 2), CellValue::Number(0.0));
    wb.execute(SetCellValue::new("Sheet1", 0, 1, 2.0));
    assert!(wb.end_command_group());

    assert_eq!(wb.get_value("Sheet1", 0, 2), CellValue::Number(3.0));
    assert_eq!(
        wb.drain_events(),
        vec![SheetEvent::CellsChanged {
            sheet: "Sheet1".into(),
            positions: vec![(0, 0), (0, 1), (0, 2)],
            regions: vec![],
        }]
    );
    assert!(!wb.end_command_group());
}

#[test]
fn structural_edits_report_and_undo_with_inverse_events() {
    let mut wb = workbook();
    wb.execute(InsertRowsCols::new("Sheet1", Axis::Row, 3, 2));
    assert_eq!(
        wb.drain_events(),
        vec![SheetEvent::RowColInserted {
            sheet: "Sheet1".into(),
            axis: Axis::Row,
            index: 3,
            count: 2,
        }]
    );

    wb.undo();
    let events = wb.drain_events();
    assert_eq!(
        events.first(),
        Some(&SheetEvent::RowColRemoved {
            sheet: "Sheet1".into(),
            axis: Axis::Row,
            index: 3,
            count: 2,
        })
    );
}

#[test]
fn merge_events_and_group_screen_updating() {
    let mut wb = workbook();
    let group = CommandGroup::new("layout")
        .with(MergeCells::new("Sheet1", Region::new(0, 0, 1, 1)))
        .with(SetSize::new("Sheet1", Axis::Col, 0, 1, 60.0));
    assert!(wb.execute(group));
    assert_eq!(
        wb.drain_events(),
        vec![
            SheetEvent::ScreenUpdating(false),
            SheetEvent::RegionMerged {
                sheet: "Sheet1".into(),
                region: Region::new(0, 0, 1, 1),
            },
            SheetEvent::RowColInfoChanged {
                sheet: "Sheet1".into(),
                axis: Axis::Col,
                start: 0,
                end: 1,
            },
            SheetEvent::ScreenUpdating(true),
        ]
    );

    assert!(wb.undo());
    let events = wb.drain_events();
    assert!(events.contains(&SheetEvent::RegionUnmerged {
        sheet: "Sheet1".into(),
        region: Region::new(0, 0, 1, 1),
    }));
}

#[test]
fn nested_batches_release_at_the_outermost_end() {
    let mut wb = workbook();
    wb.begin_batch();
    wb.begin_batch();
    wb.execute(SetCellValue::new("Sheet1", 0, 0, 1.0));
    wb.end_batch();
    assert!(wb.drain_events().is_empty());
    wb.end_batch();
    assert_eq!(wb.drain_events().len(), 1);
}
