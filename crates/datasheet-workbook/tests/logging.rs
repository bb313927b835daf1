#![cfg(feature = "tracing")]

use std::io;
use std::sync::{Arc, Mutex};

use datasheet_workbook::*;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn commands_and_recalculation_open_spans() {
    let captured = Captured::default();
    let writer = captured.clone();
    let _guard = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(LevelFilter::DEBUG)
        .with_span_events(FmtSpan::NEW)
        .with_writer(move || writer.clone())
        .finish()
        .set_default();

    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap();
    assert!(wb.execute(SetCellValue::new("Sheet1", 0, 0, 2.0)));
    assert!(wb.execute(SetFormula::new("Sheet1", 0, 1, "=A1*2")));
    assert!(wb.undo());
    let overlapping = CommandGroup::new("merges")
        .with(MergeCells::new("Sheet1", Region::new(0, 0, 1, 1)))
        .with(MergeCells::new("Sheet1", Region::new(1, 1, 2, 2)));
    assert!(!wb.execute(overlapping));

    let log = captured.text();
    assert!(log.contains("command{"), "{log}");
    assert!(log.contains("SetFormula"), "{log}");
    assert!(log.contains("calculate{"), "{log}");
    assert!(log.contains("undo{"), "{log}");
    assert!(log.contains("DEBUG"), "{log}");
}
