use datasheet_common::{Axis, Region};

use crate::StoreError;
use crate::region_index::RegionIndex;
use crate::restore::{DataRegion, RegionRestoreData};

/// A set of regions carrying values, queryable by point or by overlap.
///
/// All structural mutations return the restore data that reverts them.
pub trait RegionStore<T: Clone + PartialEq> {
    /// Store `data` over `region`. `None` means the store rejected the add
    /// and nothing changed.
    fn add(&mut self, region: Region, data: T) -> Option<RegionRestoreData<T>>;

    /// Entries intersecting `region`, oldest first.
    fn get_data_regions(&self, region: &Region) -> Vec<&DataRegion<T>>;

    fn all_data_regions(&self) -> Vec<&DataRegion<T>>;

    fn insert_row_col_at(&mut self, index: u32, count: u32, axis: Axis) -> RegionRestoreData<T>;

    fn remove_row_col_at(&mut self, index: u32, count: u32, axis: Axis) -> RegionRestoreData<T>;

    /// Remove exactly one stored entry.
    fn delete(&mut self, entry: &DataRegion<T>) -> Result<RegionRestoreData<T>, StoreError>;

    /// Remove the part of every entry covered by `region`.
    fn clear(&mut self, region: &Region) -> RegionRestoreData<T>;

    /// Remove every entry touching `region`, whole.
    fn delete_overlapping(&mut self, region: &Region) -> RegionRestoreData<T>;

    fn restore(&mut self, data: RegionRestoreData<T>);

    fn get_data_regions_at(&self, row: u32, col: u32) -> Vec<&DataRegion<T>> {
        self.get_data_regions(&Region::cell(row, col))
    }

    fn get_data(&self, row: u32, col: u32) -> Vec<&T> {
        self.get_data_regions_at(row, col)
            .into_iter()
            .map(|e| &e.data)
            .collect()
    }

    fn contains(&self, row: u32, col: u32) -> bool {
        !self.get_data_regions_at(row, col).is_empty()
    }

    fn any(&self) -> bool {
        !self.all_data_regions().is_empty()
    }

    fn any_in(&self, region: &Region) -> bool {
        !self.get_data_regions(region).is_empty()
    }
}

/// How a [`RegionDataStore`] treats an add that intersects existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Overlapping entries coexist.
    #[default]
    Allow,
    /// Overlapping adds are rejected.
    Reject,
}

/// Region store holding whole entries, never splitting them on add.
#[derive(Debug, Clone)]
pub struct RegionDataStore<T> {
    index: RegionIndex<T>,
    policy: OverlapPolicy,
    expand_when_insert_after: bool,
}

impl<T> Default for RegionDataStore<T> {
    fn default() -> Self {
        Self {
            index: RegionIndex::default(),
            policy: OverlapPolicy::Allow,
            expand_when_insert_after: true,
        }
    }
}

impl<T: Clone + PartialEq> RegionDataStore<T> {
    pub fn new(policy: OverlapPolicy, expand_when_insert_after: bool) -> Self {
        Self {
            index: RegionIndex::default(),
            policy,
            expand_when_insert_after,
        }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    /// Like [`RegionStore::add`] but reports why an add was rejected.
    pub fn try_add(&mut self, region: Region, data: T) -> Result<RegionRestoreData<T>, StoreError> {
        if self.policy == OverlapPolicy::Reject
            && let Some(existing) = self.index.get_in(&region).first()
        {
            return Err(StoreError::Overlap {
                region,
                existing: existing.region,
            });
        }
        let entry = DataRegion::new(region, data);
        self.index.insert(entry.clone());
        Ok(RegionRestoreData {
            regions_added: vec![entry],
            ..RegionRestoreData::default()
        })
    }
}

impl<T: Clone + PartialEq> RegionStore<T> for RegionDataStore<T> {
    fn add(&mut self, region: Region, data: T) -> Option<RegionRestoreData<T>> {
        self.try_add(region, data).ok()
    }

    fn get_data_regions(&self, region: &Region) -> Vec<&DataRegion<T>> {
        self.index.get_in(region)
    }

    fn all_data_regions(&self) -> Vec<&DataRegion<T>> {
        self.index.iter().collect()
    }

    fn insert_row_col_at(&mut self, index: u32, count: u32, axis: Axis) -> RegionRestoreData<T> {
        self.index
            .insert_row_col_at(index, count, axis, self.expand_when_insert_after)
    }

    fn remove_row_col_at(&mut self, index: u32, count: u32, axis: Axis) -> RegionRestoreData<T> {
        self.index.remove_row_col_at(index, count, axis)
    }

    fn delete(&mut self, entry: &DataRegion<T>) -> Result<RegionRestoreData<T>, StoreError> {
        self.index.delete(entry)
    }

    fn clear(&mut self, region: &Region) -> RegionRestoreData<T> {
        self.index.clear(region)
    }

    fn delete_overlapping(&mut self, region: &Region) -> RegionRestoreData<T> {
        self.index.delete_overlapping(region)
    }

    fn restore(&mut self, data: RegionRestoreData<T>) {
        self.index.restore(data)
    }
}
