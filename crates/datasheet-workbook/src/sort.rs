//! Row ordering for range sorts.

use std::cmp::Ordering;

use datasheet_common::CellValue;
use serde::{Deserialize, Serialize};

/// One sort key: a column offset within the sorted region and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSortOptions {
    pub column: u32,
    pub ascending: bool,
}

impl ColumnSortOptions {
    pub fn new(column: u32, ascending: bool) -> Self {
        Self { column, ascending }
    }
}

impl Default for ColumnSortOptions {
    fn default() -> Self {
        Self::new(0, true)
    }
}

/// Numbers, then text, then booleans, then errors.
fn rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Number(_) => 0,
        CellValue::Text(_) => 1,
        CellValue::Boolean(_) => 2,
        _ => 3,
    }
}

/// Order two sort-key cells. Blank cells sort last in both directions.
pub fn compare_values(a: &CellValue, b: &CellValue, ascending: bool) -> Ordering {
    let order = match (a, b) {
        (CellValue::Empty, CellValue::Empty) => return Ordering::Equal,
        (CellValue::Empty, _) => return Ordering::Greater,
        (_, CellValue::Empty) => return Ordering::Less,
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        (CellValue::Boolean(x), CellValue::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    };
    if ascending { order } else { order.reverse() }
}

/// Stable permutation of `keys`: entry `i` of the result is the index of the
/// row that belongs at position `i`. Each row of `keys` holds one value per
/// entry of `options`.
pub fn sorted_order(keys: &[Vec<CellValue>], options: &[ColumnSortOptions]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..keys.len() as u32).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&keys[a as usize], &keys[b as usize]);
        options
            .iter()
            .zip(a.iter().zip(b))
            .map(|(opt, (x, y))| compare_values(x, y, opt.ascending))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    order
}
