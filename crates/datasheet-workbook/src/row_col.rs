//! Per-row or per-column sizes and visibility.

use datasheet_store::{Direction, Range1DRestoreData, Range1DStore};

/// Reverts one [`RowColInfo`] mutation.
#[derive(Debug, Clone, Default)]
pub struct RowColRestoreData {
    sizes: Vec<Range1DRestoreData<f64>>,
    hidden: Vec<Range1DRestoreData<bool>>,
}

impl RowColRestoreData {
    pub fn is_empty(&self) -> bool {
        self.sizes.iter().all(|d| d.is_empty()) && self.hidden.iter().all(|d| d.is_empty())
    }
}

/// Sizes and hidden flags along one axis of a sheet.
#[derive(Debug, Clone)]
pub struct RowColInfo {
    sizes: Range1DStore<f64>,
    hidden: Range1DStore<bool>,
}

impl RowColInfo {
    pub fn new(default_size: f64) -> Self {
        Self {
            sizes: Range1DStore::new(default_size),
            hidden: Range1DStore::new(false),
        }
    }

    pub fn size(&self, index: u32) -> f64 {
        *self.sizes.get(index)
    }

    pub fn default_size(&self) -> f64 {
        *self.sizes.default_value()
    }

    pub fn is_visible(&self, index: u32) -> bool {
        !*self.hidden.get(index)
    }

    /// Hidden spans as `(start, end)` pairs.
    pub fn hidden_spans(&self) -> Vec<(u32, u32)> {
        self.hidden
            .iter()
            .filter(|(_, _, h)| **h)
            .map(|(s, e, _)| (s, e))
            .collect()
    }

    /// The first visible index at or after `index` going `direction`.
    pub fn next_visible(&self, index: u32, direction: Direction) -> Option<u32> {
        let mut at = index;
        loop {
            let Some((start, end, _)) = self
                .hidden
                .get_overlapping(at, at)
                .into_iter()
                .find(|(_, _, hidden)| **hidden)
            else {
                return Some(at);
            };
            at = match direction {
                Direction::Forward => end.checked_add(1)?,
                Direction::Backward => start.checked_sub(1)?,
            };
        }
    }

    /// Total size of `start..=end`, skipping hidden entries.
    pub fn span_size(&self, start: u32, end: u32) -> f64 {
        (start..=end)
            .filter(|&i| self.is_visible(i))
            .map(|i| self.size(i))
            .sum()
    }

    pub fn set_size(&mut self, start: u32, end: u32, size: f64) -> RowColRestoreData {
        RowColRestoreData {
            sizes: vec![self.sizes.set(start, end, size)],
            hidden: Vec::new(),
        }
    }

    pub fn hide(&mut self, start: u32, end: u32) -> RowColRestoreData {
        RowColRestoreData {
            sizes: Vec::new(),
            hidden: vec![self.hidden.set(start, end, true)],
        }
    }

    pub fn unhide(&mut self, start: u32, end: u32) -> RowColRestoreData {
        RowColRestoreData {
            sizes: Vec::new(),
            hidden: vec![self.hidden.clear(start, end)],
        }
    }

    pub fn insert(&mut self, index: u32, count: u32) -> RowColRestoreData {
        RowColRestoreData {
            sizes: vec![self.sizes.insert_at(index, count)],
            hidden: vec![self.hidden.insert_at(index, count)],
        }
    }

    pub fn remove(&mut self, index: u32, count: u32) -> RowColRestoreData {
        let end = index.saturating_add(count.saturating_sub(1));
        RowColRestoreData {
            sizes: vec![self.sizes.delete(index, end)],
            hidden: vec![self.hidden.delete(index, end)],
        }
    }

    pub fn restore(&mut self, data: RowColRestoreData) {
        for d in data.sizes.into_iter().rev() {
            self.sizes.restore(d);
        }
        for d in data.hidden.into_iter().rev() {
            self.hidden.restore(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_default_and_restore() {
        let mut info = RowColInfo::new(20.0);
        let undo = info.set_size(2, 4, 35.0);
        assert_eq!(info.size(1), 20.0);
        assert_eq!(info.size(3), 35.0);
        assert_eq!(info.span_size(0, 4), 20.0 * 2.0 + 35.0 * 3.0);
        info.restore(undo);
        assert_eq!(info.size(3), 20.0);
    }

    #[test]
    fn hidden_spans_are_skipped() {
        let mut info = RowColInfo::new(10.0);
        info.hide(3, 5);
        assert!(!info.is_visible(4));
        assert_eq!(info.hidden_spans(), vec![(3, 5)]);
        assert_eq!(info.next_visible(3, Direction::Forward), Some(6));
        assert_eq!(info.next_visible(5, Direction::Backward), Some(2));
        assert_eq!(info.next_visible(1, Direction::Forward), Some(1));
        assert_eq!(info.span_size(0, 9), 70.0);

        let undo = info.unhide(4, 4);
        assert_eq!(info.hidden_spans(), vec![(3, 3), (5, 5)]);
        info.restore(undo);
        assert_eq!(info.hidden_spans(), vec![(3, 5)]);
    }

    #[test]
    fn insert_and_remove_move_sizes() {
        let mut info = RowColInfo::new(10.0);
        info.set_size(4, 4, 50.0);
        let insert = info.insert(2, 3);
        assert_eq!(info.size(7), 50.0);
        assert_eq!(info.size(4), 10.0);
        info.restore(insert);
        assert_eq!(info.size(4), 50.0);

        let remove = info.remove(4, 1);
        assert_eq!(info.size(4), 10.0);
        info.restore(remove);
        assert_eq!(info.size(4), 50.0);
    }
}
