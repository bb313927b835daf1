//! Change notifications, queued for the host to drain.

use datasheet_common::{Axis, Region};

/// Something a host rendering the workbook may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetEvent {
    /// Values, formulas, types or metadata changed at `positions` and over
    /// `regions`.
    CellsChanged {
        sheet: String,
        positions: Vec<(u32, u32)>,
        regions: Vec<Region>,
    },
    RowColInserted {
        sheet: String,
        axis: Axis,
        index: u32,
        count: u32,
    },
    RowColRemoved {
        sheet: String,
        axis: Axis,
        index: u32,
        count: u32,
    },
    /// Sizes or visibility changed over `start..=end`.
    RowColInfoChanged {
        sheet: String,
        axis: Axis,
        start: u32,
        end: u32,
    },
    RegionMerged {
        sheet: String,
        region: Region,
    },
    RegionUnmerged {
        sheet: String,
        region: Region,
    },
    /// Opaque presentation signal: `false` while a batch of changes is being
    /// applied, `true` once it is done.
    ScreenUpdating(bool),
}

impl SheetEvent {
    pub fn sheet(&self) -> Option<&str> {
        match self {
            SheetEvent::CellsChanged { sheet, .. }
            | SheetEvent::RowColInserted { sheet, .. }
            | SheetEvent::RowColRemoved { sheet, .. }
            | SheetEvent::RowColInfoChanged { sheet, .. }
            | SheetEvent::RegionMerged { sheet, .. }
            | SheetEvent::RegionUnmerged { sheet, .. } => Some(sheet),
            SheetEvent::ScreenUpdating(_) => None,
        }
    }
}

/// Event queue with reference-counted batch windows.
///
/// Outside a batch, events are ready as soon as they are emitted. Inside one
/// they are held back, `CellsChanged` for the same sheet folded together,
/// and released in order when the outermost batch ends.
#[derive(Debug, Default)]
pub struct EventSink {
    depth: usize,
    held: Vec<SheetEvent>,
    ready: Vec<SheetEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_batching(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn begin_batch(&mut self) {
        self.depth += 1;
    }

    /// Returns `true` when this closed the outermost batch.
    pub fn end_batch(&mut self) -> bool {
        match self.depth {
            0 => false,
            1 => {
                self.depth = 0;
                self.ready.append(&mut self.held);
                true
            }
            _ => {
                self.depth -= 1;
                false
            }
        }
    }

    pub fn emit(&mut self, event: SheetEvent) {
        if self.depth == 0 {
            self.ready.push(event);
            return;
        }
        if let SheetEvent::CellsChanged {
            sheet,
            positions,
            regions,
        } = event
        {
            let existing = self.held.iter_mut().find_map(|e| match e {
                SheetEvent::CellsChanged {
                    sheet: s,
                    positions: p,
                    regions: r,
                } if *s == sheet => Some((p, r)),
                _ => None,
            });
            match existing {
                Some((p, r)) => {
                    p.extend(positions);
                    p.sort_unstable();
                    p.dedup();
                    for region in regions {
                        if !r.contains(&region) {
                            r.push(region);
                        }
                    }
                }
                None => self.held.push(SheetEvent::CellsChanged {
                    sheet,
                    positions,
                    regions,
                }),
            }
            return;
        }
        self.held.push(event);
    }

    /// Events released so far, oldest first.
    pub fn drain(&mut self) -> Vec<SheetEvent> {
        std::mem::take(&mut self.ready)
    }
}
