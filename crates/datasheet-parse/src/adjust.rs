//! Reference rewriting for structural edits.
//!
//! Every rewrite works on the references of one formula that live on `home`
//! (references without a sheet prefix) and targets the sheet being edited.
//! A reference whose cells disappear is replaced by a `#REF!` literal.

use datasheet_common::{Axis, CellError, CellValue, ErrorKind};

use crate::parser::{ASTNode, ASTNodeType, RangeBound, ReferenceType};

fn same_sheet(reference: &ReferenceType, home: &str, target: &str) -> bool {
    match reference.sheet() {
        Some(s) => s.eq_ignore_ascii_case(target),
        None => home.eq_ignore_ascii_case(target),
    }
}

fn axis_value<'a>(row: &'a mut u32, col: &'a mut u32, axis: Axis) -> &'a mut u32 {
    match axis {
        Axis::Row => row,
        Axis::Col => col,
    }
}

fn bound_value(b: &mut RangeBound, axis: Axis) -> &mut Option<u32> {
    match axis {
        Axis::Row => &mut b.row,
        Axis::Col => &mut b.col,
    }
}

fn bound_abs(b: &RangeBound, axis: Axis) -> bool {
    match axis {
        Axis::Row => b.row_abs,
        Axis::Col => b.col_abs,
    }
}

fn invalidate(node: &mut ASTNode) {
    node.node_type = ASTNodeType::Literal(CellValue::Error(CellError::new(ErrorKind::Ref)));
}

/// Outcome of rewriting one reference.
enum Rewrite {
    Unchanged,
    Changed,
    Deleted,
}

fn apply(node: &mut ASTNode, f: &mut dyn FnMut(&mut ReferenceType) -> Rewrite) -> bool {
    let mut changed = false;
    node.for_each_reference_mut(&mut |n| {
        let ASTNodeType::Reference {
            original,
            reference,
        } = &mut n.node_type
        else {
            return;
        };
        match f(reference) {
            Rewrite::Unchanged => {}
            Rewrite::Changed => {
                *original = reference.to_string();
                changed = true;
            }
            Rewrite::Deleted => {
                invalidate(n);
                changed = true;
            }
        }
    });
    changed
}

fn shift_cell_for_insert(v: &mut u32, index: u32, count: u32) -> Rewrite {
    if *v >= index {
        *v = v.saturating_add(count);
        Rewrite::Changed
    } else {
        Rewrite::Unchanged
    }
}

impl ASTNode {
    /// `count` rows/columns were inserted at `index` on `target`. References
    /// at or after the index move; ranges that straddle it grow.
    pub fn adjust_for_insert(
        &mut self,
        home: &str,
        target: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> bool {
        apply(self, &mut |reference| {
            if !same_sheet(reference, home, target) {
                return Rewrite::Unchanged;
            }
            match reference {
                ReferenceType::Cell { row, col, .. } => {
                    shift_cell_for_insert(axis_value(row, col, axis), index, count)
                }
                ReferenceType::Range { start, end, .. } => {
                    let mut changed = false;
                    for b in [start, end] {
                        if let Some(v) = bound_value(b, axis)
                            && *v >= index
                        {
                            *v = v.saturating_add(count);
                            changed = true;
                        }
                    }
                    if changed {
                        Rewrite::Changed
                    } else {
                        Rewrite::Unchanged
                    }
                }
                ReferenceType::Named(_) => Rewrite::Unchanged,
            }
        })
    }

    /// `count` rows/columns starting at `index` were removed from `target`.
    /// References inside the span become `#REF!`, ranges are clipped and
    /// later references move back.
    pub fn adjust_for_remove(
        &mut self,
        home: &str,
        target: &str,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> bool {
        let last = index.saturating_add(count.saturating_sub(1));
        apply(self, &mut |reference| {
            if !same_sheet(reference, home, target) || count == 0 {
                return Rewrite::Unchanged;
            }
            match reference {
                ReferenceType::Cell { row, col, .. } => {
                    let v = axis_value(row, col, axis);
                    if *v > last {
                        *v -= count;
                        Rewrite::Changed
                    } else if *v >= index {
                        Rewrite::Deleted
                    } else {
                        Rewrite::Unchanged
                    }
                }
                ReferenceType::Range { start, end, .. } => {
                    let (Some(lo), Some(hi)) = (*bound_value(start, axis), *bound_value(end, axis))
                    else {
                        return Rewrite::Unchanged;
                    };
                    if lo >= index && hi <= last {
                        return Rewrite::Deleted;
                    }
                    let new_lo = if lo < index {
                        lo
                    } else if lo > last {
                        lo - count
                    } else {
                        index
                    };
                    let new_hi = if hi < index {
                        hi
                    } else if hi > last {
                        hi - count
                    } else {
                        index - 1
                    };
                    if (new_lo, new_hi) == (lo, hi) {
                        return Rewrite::Unchanged;
                    }
                    *bound_value(start, axis) = Some(new_lo);
                    *bound_value(end, axis) = Some(new_hi);
                    Rewrite::Changed
                }
                ReferenceType::Named(_) => Rewrite::Unchanged,
            }
        })
    }

    /// Move relative references by (`drow`, `dcol`) as when a formula is
    /// copied. Absolute parts stay; references pushed off the grid become
    /// `#REF!`.
    pub fn offset_relative(&mut self, drow: i64, dcol: i64) -> bool {
        fn moved(v: u32, d: i64) -> Option<u32> {
            let n = v as i64 + d;
            (0..u32::MAX as i64).contains(&n).then_some(n as u32)
        }
        apply(self, &mut |reference| match reference {
            ReferenceType::Cell {
                row,
                col,
                row_abs,
                col_abs,
                ..
            } => {
                let r = if *row_abs { Some(*row) } else { moved(*row, drow) };
                let c = if *col_abs { Some(*col) } else { moved(*col, dcol) };
                match (r, c) {
                    (Some(r), Some(c)) if (r, c) == (*row, *col) => Rewrite::Unchanged,
                    (Some(r), Some(c)) => {
                        *row = r;
                        *col = c;
                        Rewrite::Changed
                    }
                    _ => Rewrite::Deleted,
                }
            }
            ReferenceType::Range { start, end, .. } => {
                let mut changed = false;
                for b in [start, end] {
                    for (axis, d) in [(Axis::Row, drow), (Axis::Col, dcol)] {
                        if d == 0 || bound_abs(b, axis) {
                            continue;
                        }
                        if let Some(v) = *bound_value(b, axis) {
                            match moved(v, d) {
                                Some(n) => {
                                    *bound_value(b, axis) = Some(n);
                                    changed = true;
                                }
                                None => return Rewrite::Deleted,
                            }
                        }
                    }
                }
                if changed {
                    Rewrite::Changed
                } else {
                    Rewrite::Unchanged
                }
            }
            ReferenceType::Named(_) => Rewrite::Unchanged,
        })
    }

    /// Replace every reference into `sheet` with `#REF!`.
    pub fn invalidate_sheet(&mut self, home: &str, sheet: &str) -> bool {
        apply(self, &mut |reference| {
            if matches!(reference, ReferenceType::Named(_)) || !same_sheet(reference, home, sheet)
            {
                Rewrite::Unchanged
            } else {
                Rewrite::Deleted
            }
        })
    }

    /// Rewrite explicit sheet prefixes `old` to `new`.
    pub fn rename_sheet(&mut self, old: &str, new: &str) -> bool {
        apply(self, &mut |reference| match reference {
            ReferenceType::Cell { sheet: Some(s), .. } | ReferenceType::Range { sheet: Some(s), .. }
                if s.eq_ignore_ascii_case(old) =>
            {
                *s = new.to_string();
                Rewrite::Changed
            }
            _ => Rewrite::Unchanged,
        })
    }
}
