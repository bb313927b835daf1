use datasheet_common::{Axis, Region};

use crate::StoreError;
use crate::region_index::RegionIndex;
use crate::region_store::RegionStore;
use crate::restore::{DataRegion, RegionRestoreData};

/// A value that can absorb another value written over it.
pub trait Mergeable {
    fn merge(&mut self, incoming: &Self);
}

/// A value whose merge simply replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OverwritingValue<T>(pub T);

impl<T: Clone> Mergeable for OverwritingValue<T> {
    fn merge(&mut self, incoming: &Self) {
        self.0 = incoming.0.clone();
    }
}

/// Region store whose entries never overlap: an add splits every entry it
/// touches and merges the new value into the intersections.
#[derive(Debug, Clone)]
pub struct MergeRegionDataStore<T> {
    index: RegionIndex<T>,
    expand_when_insert_after: bool,
}

impl<T> Default for MergeRegionDataStore<T> {
    fn default() -> Self {
        Self {
            index: RegionIndex::default(),
            expand_when_insert_after: true,
        }
    }
}

impl<T: Clone + PartialEq + Mergeable> MergeRegionDataStore<T> {
    pub fn new(expand_when_insert_after: bool) -> Self {
        Self {
            index: RegionIndex::default(),
            expand_when_insert_after,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }
}

impl<T: Clone + PartialEq + Mergeable> RegionStore<T> for MergeRegionDataStore<T> {
    fn add(&mut self, region: Region, data: T) -> Option<RegionRestoreData<T>> {
        let mut restore = RegionRestoreData::default();
        let mut uncovered = vec![region];
        let mut added = Vec::new();

        for id in self.index.ids_in(&region) {
            let Some(existing) = self.index.remove_id(id) else {
                continue;
            };
            for piece in existing.region.subtract(&region) {
                added.push(DataRegion::new(piece, existing.data.clone()));
            }
            if let Some(overlap) = existing.region.intersection(&region) {
                let mut merged = existing.data.clone();
                merged.merge(&data);
                added.push(DataRegion::new(overlap, merged));
                uncovered = uncovered
                    .into_iter()
                    .flat_map(|u| u.subtract(&overlap))
                    .collect();
            }
            restore.regions_removed.push(existing);
        }
        added.extend(uncovered.into_iter().map(|u| DataRegion::new(u, data.clone())));

        for entry in added {
            self.index.insert(entry.clone());
            restore.regions_added.push(entry);
        }
        Some(restore)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Style {
        bold: Option<bool>,
        color: Option<&'static str>,
    }

    impl Mergeable for Style {
        fn merge(&mut self, incoming: &Self) {
            if incoming.bold.is_some() {
                self.bold = incoming.bold;
            }
            if incoming.color.is_some() {
                self.color = incoming.color;
            }
        }
    }

    #[test]
    fn overlapping_add_merges_into_intersection() {
        let mut store = MergeRegionDataStore::new(true);
        let bold = Style {
            bold: Some(true),
            ..Style::default()
        };
        let red = Style {
            color: Some("red"),
            ..Style::default()
        };
        store.add(Region::new(0, 0, 3, 3), bold.clone());
        let restore = store.add(Region::new(2, 2, 5, 5), red.clone()).unwrap();

        assert_eq!(
            store.get_data(3, 3),
            vec![&Style {
                bold: Some(true),
                color: Some("red")
            }]
        );
        assert_eq!(store.get_data(0, 0), vec![&bold]);
        assert_eq!(store.get_data(5, 5), vec![&red]);

        let all = store.all_data_regions();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.region.intersects(&b.region));
            }
        }
        let area: u128 = all.iter().map(|e| e.region.area()).sum();
        assert_eq!(area, 16 + 16 - 4);

        store.restore(restore);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_data(3, 3), vec![&bold]);
    }

    #[test]
    fn overwriting_value_replaces() {
        let mut store = MergeRegionDataStore::new(false);
        store.add(Region::new(0, 0, 0, 9), OverwritingValue(1));
        store.add(Region::new(0, 4, 0, 4), OverwritingValue(2));
        assert_eq!(store.get_data(0, 4), vec![&OverwritingValue(2)]);
        assert_eq!(store.get_data(0, 5), vec![&OverwritingValue(1)]);
        assert_eq!(store.len(), 3);
    }
}
