//! Per-sheet cell contents: values, formulas, metadata, cell types and merges.

use std::collections::BTreeMap;

use datasheet_common::{Axis, CellValue, Region, UNBOUNDED};
use datasheet_parse::ASTNode;
use datasheet_store::{
    AppliedShift, DataRegion, MergeRegionDataStore, OverlapPolicy, OverwritingValue,
    RegionDataStore, RegionRestoreData, RegionStore, StoreError,
};
use serde_json::Value;

type Pos = (u32, u32);

pub const DEFAULT_CELL_TYPE: &str = "default";

/// Everything stored at one position, as it was before a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSnapshot {
    pub value: Option<CellValue>,
    pub formula: Option<ASTNode>,
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// Reverts one [`CellStore`] mutation.
///
/// Snapshots are keyed by the position the cell had before the mutation;
/// restoring undoes the shifts first so those positions are valid again.
#[derive(Debug, Clone, Default)]
pub struct CellStoreRestoreData {
    pub(crate) cells: BTreeMap<Pos, CellSnapshot>,
    pub(crate) shifts: Vec<AppliedShift>,
    pub(crate) types: Vec<RegionRestoreData<OverwritingValue<String>>>,
    pub(crate) merges: Vec<RegionRestoreData<bool>>,
}

impl CellStoreRestoreData {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
            && self.shifts.is_empty()
            && self.types.iter().all(RegionRestoreData::is_empty)
            && self.merges.iter().all(RegionRestoreData::is_empty)
    }

    /// Positions whose contents were saved.
    pub fn positions(&self) -> Vec<Pos> {
        self.cells.keys().copied().collect()
    }
}

#[derive(Debug, Clone)]
pub struct CellStore {
    values: BTreeMap<Pos, CellValue>,
    formulas: BTreeMap<Pos, ASTNode>,
    metadata: BTreeMap<Pos, BTreeMap<String, Value>>,
    types: MergeRegionDataStore<OverwritingValue<String>>,
    merges: RegionDataStore<bool>,
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new()
    }
}

fn along(axis: Axis, (row, col): Pos) -> u32 {
    match axis {
        Axis::Row => row,
        Axis::Col => col,
    }
}

/// `v` moved by `delta`, held inside `0..UNBOUNDED`.
fn shifted(v: u32, delta: i64) -> u32 {
    i64::from(v)
        .checked_add(delta)
        .map_or(UNBOUNDED - 1, |n| n.clamp(0, i64::from(UNBOUNDED - 1)) as u32)
}

fn shift_keys<V>(map: &mut BTreeMap<Pos, V>, shift: AppliedShift) {
    let moved: Vec<Pos> = map
        .keys()
        .copied()
        .filter(|&p| along(shift.axis, p) >= shift.from)
        .collect();
    let mut taken: Vec<(Pos, V)> = moved
        .into_iter()
        .filter_map(|p| map.remove(&p).map(|v| (p, v)))
        .collect();
    for ((row, col), v) in taken.drain(..) {
        let moved = |x: u32| shifted(x, shift.delta);
        let pos = match shift.axis {
            Axis::Row => (moved(row), col),
            Axis::Col => (row, moved(col)),
        };
        map.insert(pos, v);
    }
}

impl CellStore {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            formulas: BTreeMap::new(),
            metadata: BTreeMap::new(),
            types: MergeRegionDataStore::new(false),
            merges: RegionDataStore::new(OverlapPolicy::Reject, false),
        }
    }

    /* ─────────────── reads ─────────────── */

    pub fn get_value(&self, row: u32, col: u32) -> CellValue {
        self.values.get(&(row, col)).cloned().unwrap_or_default()
    }

    pub fn get_formula(&self, row: u32, col: u32) -> Option<&ASTNode> {
        self.formulas.get(&(row, col))
    }

    pub fn has_formula(&self, row: u32, col: u32) -> bool {
        self.formulas.contains_key(&(row, col))
    }

    pub fn get_metadata(&self, row: u32, col: u32, name: &str) -> Option<&Value> {
        self.metadata.get(&(row, col)).and_then(|m| m.get(name))
    }

    pub fn get_type(&self, row: u32, col: u32) -> &str {
        self.types
            .get_data(row, col)
            .first()
            .map_or(DEFAULT_CELL_TYPE, |t| t.0.as_str())
    }

    /// Typed areas intersecting `region`, clipped to it.
    pub fn types_in(&self, region: &Region) -> Vec<(Region, String)> {
        self.types
            .get_data_regions(region)
            .into_iter()
            .filter_map(|e| e.region.intersection(region).map(|r| (r, e.data.0.clone())))
            .collect()
    }

    /// The merged region covering a position, if any.
    pub fn get_merge(&self, row: u32, col: u32) -> Option<Region> {
        self.merges
            .get_data_regions_at(row, col)
            .first()
            .map(|e| e.region)
    }

    pub fn get_merges(&self, region: &Region) -> Vec<Region> {
        self.merges
            .get_data_regions(region)
            .into_iter()
            .map(|e| e.region)
            .collect()
    }

    pub fn any_merges(&self) -> bool {
        self.merges.any()
    }

    /// Positions holding a value or formula, row-major.
    pub fn positions(&self) -> Vec<Pos> {
        let mut out: Vec<Pos> = self.values.keys().copied().collect();
        out.extend(self.formulas.keys().copied());
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn positions_in(&self, region: &Region) -> Vec<Pos> {
        self.positions()
            .into_iter()
            .filter(|&(r, c)| region.contains(r, c))
            .collect()
    }

    pub fn formulas(&self) -> impl Iterator<Item = (Pos, &ASTNode)> + '_ {
        self.formulas.iter().map(|(p, f)| (*p, f))
    }

    /// Last row and column holding anything.
    pub fn extent(&self) -> Option<Pos> {
        let keys = self.values.keys().chain(self.formulas.keys());
        keys.fold(None, |acc, &(r, c)| match acc {
            None => Some((r, c)),
            Some((mr, mc)) => Some((mr.max(r), mc.max(c))),
        })
    }

    /* ─────────────── writes ─────────────── */

    fn snapshot(&self, data: &mut CellStoreRestoreData, pos: Pos) {
        data.cells.entry(pos).or_insert_with(|| CellSnapshot {
            value: self.values.get(&pos).cloned(),
            formula: self.formulas.get(&pos).cloned(),
            metadata: self.metadata.get(&pos).cloned(),
        });
    }

    /// Store a value without touching the formula. Used for computed results.
    pub(crate) fn put_value(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            self.values.remove(&(row, col));
        } else {
            self.values.insert((row, col), value);
        }
    }

    /// Set a plain value, clearing any formula. Returns the cleared formula.
    pub fn set_value(
        &mut self,
        row: u32,
        col: u32,
        value: CellValue,
        data: &mut CellStoreRestoreData,
    ) -> Option<ASTNode> {
        self.snapshot(data, (row, col));
        self.put_value(row, col, value);
        self.formulas.remove(&(row, col))
    }

    pub fn set_formula(
        &mut self,
        row: u32,
        col: u32,
        formula: Option<ASTNode>,
        data: &mut CellStoreRestoreData,
    ) {
        self.snapshot(data, (row, col));
        match formula {
            Some(f) => self.formulas.insert((row, col), f),
            None => self.formulas.remove(&(row, col)),
        };
    }

    /// Remove values and formulas inside `region`. Returns the positions that
    /// held formulas.
    pub fn clear(&mut self, region: &Region, data: &mut CellStoreRestoreData) -> Vec<Pos> {
        let mut cleared = Vec::new();
        for pos in self.positions_in(region) {
            self.snapshot(data, pos);
            self.values.remove(&pos);
            if self.formulas.remove(&pos).is_some() {
                cleared.push(pos);
            }
        }
        cleared
    }

    pub fn set_metadata(
        &mut self,
        row: u32,
        col: u32,
        name: &str,
        value: Option<Value>,
        data: &mut CellStoreRestoreData,
    ) {
        self.snapshot(data, (row, col));
        match value {
            Some(v) => {
                self.metadata
                    .entry((row, col))
                    .or_default()
                    .insert(name.to_string(), v);
            }
            None => {
                if let Some(m) = self.metadata.get_mut(&(row, col)) {
                    m.remove(name);
                    if m.is_empty() {
                        self.metadata.remove(&(row, col));
                    }
                }
            }
        }
    }

    pub fn set_type(&mut self, region: Region, cell_type: &str, data: &mut CellStoreRestoreData) {
        if let Some(r) = self
            .types
            .add(region, OverwritingValue(cell_type.to_string()))
        {
            data.types.push(r);
        }
    }

    /// Merge `region`. Fails without change if it overlaps an existing merge.
    pub fn merge(
        &mut self,
        region: Region,
        data: &mut CellStoreRestoreData,
    ) -> Result<(), StoreError> {
        let r = self.merges.try_add(region, true)?;
        data.merges.push(r);
        Ok(())
    }

    /// Remove every merge overlapping `region`. Returns the removed merges.
    pub fn unmerge(&mut self, region: &Region, data: &mut CellStoreRestoreData) -> Vec<Region> {
        let r = self.merges.delete_overlapping(region);
        let removed = r.regions_removed.iter().map(|e: &DataRegion<bool>| e.region).collect();
        data.merges.push(r);
        removed
    }

    /* ─────────────── structure ─────────────── */

    fn apply_shift(&mut self, shift: AppliedShift) {
        shift_keys(&mut self.values, shift);
        shift_keys(&mut self.formulas, shift);
        shift_keys(&mut self.metadata, shift);
    }

    /// Open `count` empty rows or columns at `index`. Formulas are moved,
    /// not rewritten.
    pub fn insert_row_col_at(
        &mut self,
        index: u32,
        count: u32,
        axis: Axis,
        data: &mut CellStoreRestoreData,
    ) {
        let shift = AppliedShift {
            axis,
            from: index,
            delta: count as i64,
        };
        self.apply_shift(shift);
        data.shifts.push(shift);
        data.types.push(self.types.insert_row_col_at(index, count, axis));
        data.merges.push(self.merges.insert_row_col_at(index, count, axis));
    }

    /// Drop the contents of `count` rows or columns at `index` and close the
    /// gap. Returns the positions that held formulas.
    pub fn remove_row_col_at(
        &mut self,
        index: u32,
        count: u32,
        axis: Axis,
        data: &mut CellStoreRestoreData,
    ) -> Vec<Pos> {
        let last = index.saturating_add(count.saturating_sub(1));
        let cleared = self.clear(&Region::span_of(axis, index, last), data);
        let with_meta: Vec<Pos> = self
            .metadata
            .keys()
            .copied()
            .filter(|&p| (index..=last).contains(&along(axis, p)))
            .collect();
        for pos in with_meta {
            self.snapshot(data, pos);
            self.metadata.remove(&pos);
        }
        let shift = AppliedShift {
            axis,
            from: index.saturating_add(count),
            delta: -(count as i64),
        };
        self.apply_shift(shift);
        data.shifts.push(shift);
        data.types.push(self.types.remove_row_col_at(index, count, axis));
        data.merges.push(self.merges.remove_row_col_at(index, count, axis));
        cleared
    }

    pub fn restore(&mut self, data: CellStoreRestoreData) {
        for r in data.merges.into_iter().rev() {
            self.merges.restore(r);
        }
        for r in data.types.into_iter().rev() {
            self.types.restore(r);
        }
        for shift in data.shifts.iter().rev() {
            self.apply_shift(shift.inverse());
        }
        for (pos, snap) in data.cells {
            match snap.value {
                Some(v) => self.values.insert(pos, v),
                None => self.values.remove(&pos),
            };
            match snap.formula {
                Some(f) => self.formulas.insert(pos, f),
                None => self.formulas.remove(&pos),
            };
            match snap.metadata {
                Some(m) => self.metadata.insert(pos, m),
                None => self.metadata.remove(&pos),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasheet_parse::parse;

    fn contents(store: &CellStore) -> Vec<(Pos, CellValue, Option<String>)> {
        store
            .positions()
            .into_iter()
            .map(|(r, c)| {
                (
                    (r, c),
                    store.get_value(r, c),
                    store.get_formula(r, c).map(|f| f.to_formula()),
                )
            })
            .collect()
    }

    fn filled() -> CellStore {
        let mut store = CellStore::new();
        let mut scratch = CellStoreRestoreData::default();
        for row in 0..5 {
            store.set_value(row, 0, (row as i32).into(), &mut scratch);
        }
        store.set_formula(4, 1, Some(parse("=A1*2").unwrap()), &mut scratch);
        store.set_metadata(2, 0, "note", Some(Value::from("x")), &mut scratch);
        store
    }

    #[test]
    fn set_value_replaces_formula_and_restores() {
        let mut store = filled();
        let before = contents(&store);
        let mut data = CellStoreRestoreData::default();
        let cleared = store.set_value(4, 1, "text".into(), &mut data);
        assert_eq!(cleared.map(|f| f.to_formula()).as_deref(), Some("=A1*2"));
        assert!(!store.has_formula(4, 1));
        store.restore(data);
        assert_eq!(contents(&store), before);
    }

    #[test]
    fn remove_rows_drops_span_and_undo_brings_it_back() {
        let mut store = filled();
        let before = contents(&store);
        let mut data = CellStoreRestoreData::default();
        let cleared = store.remove_row_col_at(1, 2, Axis::Row, &mut data);
        assert!(cleared.is_empty());
        assert_eq!(store.get_value(1, 0), CellValue::Number(3.0));
        assert_eq!(store.get_value(2, 0), CellValue::Number(4.0));
        assert!(store.has_formula(2, 1));
        assert_eq!(store.get_metadata(2, 0, "note"), None);

        store.restore(data);
        assert_eq!(contents(&store), before);
        assert_eq!(store.get_metadata(2, 0, "note"), Some(&Value::from("x")));
    }

    #[test]
    fn insert_cols_moves_contents_right() {
        let mut store = filled();
        let before = contents(&store);
        let mut data = CellStoreRestoreData::default();
        store.insert_row_col_at(0, 2, Axis::Col, &mut data);
        assert_eq!(store.get_value(3, 2), CellValue::Number(3.0));
        assert!(store.has_formula(4, 3));
        assert_eq!(store.get_value(3, 0), CellValue::Empty);
        store.restore(data);
        assert_eq!(contents(&store), before);
    }

    #[test]
    fn merges_reject_overlap_and_grow_on_insert() {
        let mut store = CellStore::new();
        let mut data = CellStoreRestoreData::default();
        store.merge(Region::new(0, 1, 0, 4), &mut data).unwrap();
        assert!(store.merge(Region::new(0, 4, 1, 5), &mut data).is_err());

        let mut insert = CellStoreRestoreData::default();
        store.insert_row_col_at(2, 3, Axis::Col, &mut insert);
        assert_eq!(store.get_merge(0, 7), Some(Region::new(0, 1, 0, 7)));
        store.restore(insert);
        assert_eq!(store.get_merges(&Region::rows(0, 0)), vec![Region::new(0, 1, 0, 4)]);
    }

    #[test]
    fn types_overwrite_and_restore() {
        let mut store = CellStore::new();
        let mut first = CellStoreRestoreData::default();
        store.set_type(Region::new(0, 0, 3, 3), "number", &mut first);
        let mut second = CellStoreRestoreData::default();
        store.set_type(Region::new(1, 1, 1, 1), "text", &mut second);
        assert_eq!(store.get_type(1, 1), "text");
        assert_eq!(store.get_type(2, 2), "number");
        store.restore(second);
        assert_eq!(store.get_type(1, 1), "number");
        store.restore(first);
        assert_eq!(store.get_type(1, 1), DEFAULT_CELL_TYPE);
    }

    #[test]
    fn shifted_positions_stay_inside_the_grid() {
        assert_eq!(shifted(5, 3), 8);
        assert_eq!(shifted(2, -5), 0);
        assert_eq!(shifted(10, i64::from(u32::MAX)), UNBOUNDED - 1);
        assert_eq!(shifted(0, i64::MAX), UNBOUNDED - 1);
    }
}
