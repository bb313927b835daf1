//! Shared storage and structural edits behind the region stores.

use std::collections::BTreeMap;

use datasheet_common::{Axis, Edge, Region};

use crate::StoreError;
use crate::interval_tree::IntervalTree;
use crate::restore::{AppliedShift, DataRegion, RegionRestoreData};

/// Entries keyed by insertion id, indexed by their row span.
#[derive(Debug, Clone)]
pub(crate) struct RegionIndex<T> {
    entries: BTreeMap<u64, DataRegion<T>>,
    rows: IntervalTree<u64>,
    next_id: u64,
}

impl<T> Default for RegionIndex<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            rows: IntervalTree::new(),
            next_id: 0,
        }
    }
}

impl<T: Clone + PartialEq> RegionIndex<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataRegion<T>> + '_ {
        self.entries.values()
    }

    pub fn insert(&mut self, entry: DataRegion<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(entry.region.top, entry.region.bottom, id);
        self.entries.insert(id, entry);
        id
    }

    pub fn remove_id(&mut self, id: u64) -> Option<DataRegion<T>> {
        let entry = self.entries.remove(&id)?;
        self.rows.remove(entry.region.top, entry.region.bottom, &id);
        Some(entry)
    }

    /// Ids of entries intersecting `region`, oldest first.
    pub fn ids_in(&self, region: &Region) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .rows
            .query(region.top, region.bottom)
            .copied()
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|e| e.region.intersects(region))
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn get_in(&self, region: &Region) -> Vec<&DataRegion<T>> {
        self.ids_in(region)
            .into_iter()
            .filter_map(|id| self.entries.get(&id))
            .collect()
    }

    fn find_equal(&self, entry: &DataRegion<T>) -> Option<u64> {
        self.ids_in(&entry.region)
            .into_iter()
            .find(|id| self.entries.get(id) == Some(entry))
    }

    fn apply_shift(&mut self, shift: AppliedShift) {
        if shift.delta == 0 {
            return;
        }
        let moving: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, e)| e.region.leading(shift.axis) >= shift.from)
            .map(|(id, _)| *id)
            .collect();
        for id in moving {
            let Some(mut entry) = self.remove_id(id) else {
                continue;
            };
            entry.region = entry.region.shift_along(shift.axis, shift.delta);
            self.rows.insert(entry.region.top, entry.region.bottom, id);
            self.entries.insert(id, entry);
        }
    }

    /// Insert `count` rows/columns at `index`.
    ///
    /// Entries starting at or after `index` shift. Entries straddling it
    /// grow. Entries ending right before it grow only with `expand_after`.
    pub fn insert_row_col_at(
        &mut self,
        index: u32,
        count: u32,
        axis: Axis,
        expand_after: bool,
    ) -> RegionRestoreData<T> {
        let mut restore = RegionRestoreData::default();
        if count == 0 {
            return restore;
        }

        let growing: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, e)| {
                let lead = e.region.leading(axis);
                let trail = e.region.trailing(axis);
                let straddles = lead < index && trail >= index;
                let touches = expand_after && index > 0 && trail == index - 1;
                straddles || touches
            })
            .map(|(id, _)| *id)
            .collect();

        let mut expanded = Vec::with_capacity(growing.len());
        for id in growing {
            if let Some(entry) = self.remove_id(id) {
                let region = entry.region.expand(Edge::trailing(axis), count as i64);
                expanded.push(DataRegion::new(region, entry.data.clone()));
                restore.regions_removed.push(entry);
            }
        }

        let shift = AppliedShift {
            axis,
            from: index,
            delta: count as i64,
        };
        self.apply_shift(shift);
        restore.shifts.push(shift);

        for entry in expanded {
            self.insert(entry.clone());
            restore.regions_added.push(entry);
        }
        restore
    }

    /// Remove `count` rows/columns starting at `index`.
    pub fn remove_row_col_at(&mut self, index: u32, count: u32, axis: Axis) -> RegionRestoreData<T> {
        let mut restore = RegionRestoreData::default();
        if count == 0 {
            return restore;
        }
        let last = index.saturating_add(count - 1);

        let touched: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, e)| e.region.trailing(axis) >= index && e.region.leading(axis) <= last)
            .map(|(id, _)| *id)
            .collect();

        let mut clipped = Vec::new();
        for id in touched {
            let Some(entry) = self.remove_id(id) else {
                continue;
            };
            let lead = entry.region.leading(axis);
            let trail = entry.region.trailing(axis);
            if lead < index || trail > last {
                let new_lead = lead.min(index);
                let new_trail = if trail > last {
                    entry.region.shift_along(axis, -(count as i64)).trailing(axis)
                } else {
                    index - 1
                };
                let region = entry.region.with_span(axis, new_lead, new_trail);
                clipped.push(DataRegion::new(region, entry.data.clone()));
            }
            restore.regions_removed.push(entry);
        }

        let shift = AppliedShift {
            axis,
            from: last.saturating_add(1),
            delta: -(count as i64),
        };
        self.apply_shift(shift);
        restore.shifts.push(shift);

        for entry in clipped {
            self.insert(entry.clone());
            restore.regions_added.push(entry);
        }
        restore
    }

    /// Remove the covered part of every entry overlapping `region`.
    pub fn clear(&mut self, region: &Region) -> RegionRestoreData<T> {
        let mut restore = RegionRestoreData::default();
        for id in self.ids_in(region) {
            let Some(entry) = self.remove_id(id) else {
                continue;
            };
            for piece in entry.region.subtract(region) {
                let kept = DataRegion::new(piece, entry.data.clone());
                self.insert(kept.clone());
                restore.regions_added.push(kept);
            }
            restore.regions_removed.push(entry);
        }
        restore
    }

    pub fn delete_overlapping(&mut self, region: &Region) -> RegionRestoreData<T> {
        let mut restore = RegionRestoreData::default();
        for id in self.ids_in(region) {
            if let Some(entry) = self.remove_id(id) {
                restore.regions_removed.push(entry);
            }
        }
        restore
    }

    pub fn delete(&mut self, entry: &DataRegion<T>) -> Result<RegionRestoreData<T>, StoreError> {
        let id = self
            .find_equal(entry)
            .ok_or(StoreError::NotFound(entry.region))?;
        let mut restore = RegionRestoreData::default();
        if let Some(removed) = self.remove_id(id) {
            restore.regions_removed.push(removed);
        }
        Ok(restore)
    }

    /// Undo one mutation: drop what it added, reverse its shifts newest
    /// first, then put back what it removed.
    pub fn restore(&mut self, data: RegionRestoreData<T>) {
        for added in &data.regions_added {
            if let Some(id) = self.find_equal(added) {
                self.remove_id(id);
            }
        }
        for shift in data.shifts.iter().rev() {
            self.apply_shift(shift.inverse());
        }
        for removed in data.regions_removed {
            self.insert(removed);
        }
    }
}
