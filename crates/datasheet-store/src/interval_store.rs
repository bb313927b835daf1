//! One-dimensional stores over rows or columns.

use std::collections::BTreeMap;

use crate::merge_store::{Mergeable, OverwritingValue};
use crate::restore::{AppliedShift1D, IntervalRestoreData, OrderedInterval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

fn offset(v: u32, d: i64) -> u32 {
    if v == u32::MAX {
        return v;
    }
    (v as i64 + d).clamp(0, (u32::MAX - 1) as i64) as u32
}

/// Ordered, pairwise-disjoint `[start, end]` intervals. Writing over an
/// existing interval splits it and merges the new value into the overlap.
#[derive(Debug, Clone)]
pub struct MergeableIntervalStore<T> {
    intervals: BTreeMap<u32, (u32, T)>,
}

impl<T> Default for MergeableIntervalStore<T> {
    fn default() -> Self {
        Self {
            intervals: BTreeMap::new(),
        }
    }
}

impl<T: Clone + PartialEq + Mergeable> MergeableIntervalStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        self.intervals.iter().map(|(s, (e, v))| (*s, *e, v))
    }

    fn overlapping_keys(&self, start: u32, end: u32) -> Vec<u32> {
        let mut keys = Vec::new();
        if let Some((&s, (e, _))) = self.intervals.range(..start).next_back()
            && *e >= start
        {
            keys.push(s);
        }
        keys.extend(self.intervals.range(start..=end).map(|(s, _)| *s));
        keys
    }

    fn take(&mut self, start: u32) -> Option<OrderedInterval<T>> {
        self.intervals
            .remove(&start)
            .map(|(end, data)| OrderedInterval { start, end, data })
    }

    fn put(&mut self, interval: OrderedInterval<T>) {
        self.intervals
            .insert(interval.start, (interval.end, interval.data));
    }

    fn apply_shift(&mut self, shift: AppliedShift1D) {
        if shift.delta == 0 {
            return;
        }
        let moving: Vec<u32> = self.intervals.range(shift.from..).map(|(s, _)| *s).collect();
        let taken: Vec<OrderedInterval<T>> =
            moving.into_iter().filter_map(|s| self.take(s)).collect();
        for mut iv in taken {
            iv.start = offset(iv.start, shift.delta);
            iv.end = offset(iv.end, shift.delta);
            self.put(iv);
        }
    }

    pub fn get(&self, pos: u32) -> Option<&T> {
        self.intervals
            .range(..=pos)
            .next_back()
            .filter(|(_, (end, _))| *end >= pos)
            .map(|(_, (_, v))| v)
    }

    pub fn get_overlapping(&self, start: u32, end: u32) -> Vec<(u32, u32, &T)> {
        self.overlapping_keys(start, end)
            .into_iter()
            .filter_map(|s| self.intervals.get(&s).map(|(e, v)| (s, *e, v)))
            .collect()
    }

    /// The nearest interval strictly after (or before) `pos`.
    pub fn get_next(&self, pos: u32, direction: Direction) -> Option<(u32, u32, &T)> {
        match direction {
            Direction::Forward => self
                .intervals
                .range(pos.saturating_add(1)..)
                .next()
                .map(|(s, (e, v))| (*s, *e, v)),
            Direction::Backward => self
                .intervals
                .range(..pos)
                .rev()
                .find(|(_, (e, _))| *e < pos)
                .map(|(s, (e, v))| (*s, *e, v)),
        }
    }

    /// The first index after `pos` that holds a value.
    pub fn next_non_empty_index(&self, pos: u32) -> Option<u32> {
        let next = pos.checked_add(1)?;
        if self.get(next).is_some() {
            return Some(next);
        }
        self.intervals.range(next..).next().map(|(s, _)| *s)
    }

    /// Write `value` over `[start, end]`.
    pub fn add(&mut self, start: u32, end: u32, value: T) -> IntervalRestoreData<T> {
        let (start, end) = (start.min(end), start.max(end));
        let mut restore = IntervalRestoreData::default();
        let mut added = Vec::new();
        // first position not yet written; None once past u32::MAX
        let mut cursor = Some(start);

        for key in self.overlapping_keys(start, end) {
            let Some(existing) = self.take(key) else {
                continue;
            };
            if existing.start < start {
                added.push(OrderedInterval {
                    start: existing.start,
                    end: start - 1,
                    data: existing.data.clone(),
                });
            }
            if existing.end > end {
                added.push(OrderedInterval {
                    start: end + 1,
                    end: existing.end,
                    data: existing.data.clone(),
                });
            }
            let lo = existing.start.max(start);
            let hi = existing.end.min(end);
            if let Some(c) = cursor
                && lo > c
            {
                added.push(OrderedInterval {
                    start: c,
                    end: lo - 1,
                    data: value.clone(),
                });
            }
            let mut merged = existing.data.clone();
            merged.merge(&value);
            added.push(OrderedInterval {
                start: lo,
                end: hi,
                data: merged,
            });
            cursor = hi.checked_add(1);
            restore.removed.push(existing);
        }
        if let Some(c) = cursor
            && c <= end
        {
            added.push(OrderedInterval {
                start: c,
                end,
                data: value,
            });
        }

        for iv in added {
            self.put(iv.clone());
            restore.added.push(iv);
        }
        restore
    }

    /// Remove values over `[start, end]`; nothing moves.
    pub fn clear(&mut self, start: u32, end: u32) -> IntervalRestoreData<T> {
        let (start, end) = (start.min(end), start.max(end));
        let mut restore = IntervalRestoreData::default();
        for key in self.overlapping_keys(start, end) {
            let Some(existing) = self.take(key) else {
                continue;
            };
            if existing.start < start {
                let kept = OrderedInterval {
                    start: existing.start,
                    end: start - 1,
                    data: existing.data.clone(),
                };
                self.put(kept.clone());
                restore.added.push(kept);
            }
            if existing.end > end {
                let kept = OrderedInterval {
                    start: end + 1,
                    end: existing.end,
                    data: existing.data.clone(),
                };
                self.put(kept.clone());
                restore.added.push(kept);
            }
            restore.removed.push(existing);
        }
        restore
    }

    /// Remove `[start, end]` and close the gap.
    pub fn delete(&mut self, start: u32, end: u32) -> IntervalRestoreData<T> {
        let (start, end) = (start.min(end), start.max(end));
        let len = (end - start) as i64 + 1;
        let mut restore = IntervalRestoreData::default();
        let mut clipped = Vec::new();

        for key in self.overlapping_keys(start, end) {
            let Some(existing) = self.take(key) else {
                continue;
            };
            if existing.start < start || existing.end > end {
                let new_end = if existing.end > end {
                    offset(existing.end, -len)
                } else {
                    start - 1
                };
                clipped.push(OrderedInterval {
                    start: existing.start.min(start),
                    end: new_end,
                    data: existing.data.clone(),
                });
            }
            restore.removed.push(existing);
        }

        let shift = AppliedShift1D {
            from: end.saturating_add(1),
            delta: -len,
        };
        self.apply_shift(shift);
        restore.shifts.push(shift);

        for iv in clipped {
            self.put(iv.clone());
            restore.added.push(iv);
        }
        restore
    }

    /// Open a gap of `count` at `start`, splitting an interval that spans it.
    pub fn insert_at(&mut self, start: u32, count: u32) -> IntervalRestoreData<T> {
        let mut restore = IntervalRestoreData::default();
        if count == 0 {
            return restore;
        }
        let mut pieces = Vec::new();
        if let Some((&s, (e, _))) = self.intervals.range(..start).next_back()
            && *e >= start
            && let Some(existing) = self.take(s)
        {
            pieces.push(OrderedInterval {
                start: existing.start,
                end: start - 1,
                data: existing.data.clone(),
            });
            pieces.push(OrderedInterval {
                start: offset(start, count as i64),
                end: offset(existing.end, count as i64),
                data: existing.data.clone(),
            });
            restore.removed.push(existing);
        }

        let shift = AppliedShift1D {
            from: start,
            delta: count as i64,
        };
        self.apply_shift(shift);
        restore.shifts.push(shift);

        for iv in pieces {
            self.put(iv.clone());
            restore.added.push(iv);
        }
        restore
    }

    pub fn restore(&mut self, data: IntervalRestoreData<T>) {
        for added in &data.added {
            if self
                .intervals
                .get(&added.start)
                .is_some_and(|(end, data)| *end == added.end && *data == added.data)
            {
                self.intervals.remove(&added.start);
            }
        }
        for shift in data.shifts.iter().rev() {
            self.apply_shift(shift.inverse());
        }
        for removed in data.removed {
            self.put(removed);
        }
    }
}

pub type Range1DRestoreData<T> = IntervalRestoreData<OverwritingValue<T>>;

/// One scalar per row or column, `default` where nothing is set.
#[derive(Debug, Clone)]
pub struct Range1DStore<T> {
    store: MergeableIntervalStore<OverwritingValue<T>>,
    default: T,
}

impl<T: Clone + PartialEq> Range1DStore<T> {
    pub fn new(default: T) -> Self {
        Self {
            store: MergeableIntervalStore::default(),
            default,
        }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn set(&mut self, start: u32, end: u32, value: T) -> Range1DRestoreData<T> {
        self.store.add(start, end, OverwritingValue(value))
    }

    pub fn get(&self, pos: u32) -> &T {
        self.store.get(pos).map_or(&self.default, |v| &v.0)
    }

    /// Only explicitly set values.
    pub fn get_set(&self, pos: u32) -> Option<&T> {
        self.store.get(pos).map(|v| &v.0)
    }

    pub fn get_overlapping(&self, start: u32, end: u32) -> Vec<(u32, u32, &T)> {
        self.store
            .get_overlapping(start, end)
            .into_iter()
            .map(|(s, e, v)| (s, e, &v.0))
            .collect()
    }

    pub fn get_next(&self, pos: u32, direction: Direction) -> Option<(u32, u32, &T)> {
        self.store
            .get_next(pos, direction)
            .map(|(s, e, v)| (s, e, &v.0))
    }

    pub fn next_non_empty_index(&self, pos: u32) -> Option<u32> {
        self.store.next_non_empty_index(pos)
    }

    pub fn clear(&mut self, start: u32, end: u32) -> Range1DRestoreData<T> {
        self.store.clear(start, end)
    }

    pub fn delete(&mut self, start: u32, end: u32) -> Range1DRestoreData<T> {
        self.store.delete(start, end)
    }

    pub fn insert_at(&mut self, start: u32, count: u32) -> Range1DRestoreData<T> {
        self.store.insert_at(start, count)
    }

    pub fn restore(&mut self, data: Range1DRestoreData<T>) {
        self.store.restore(data)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        self.store.iter().map(|(s, e, v)| (s, e, &v.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot<T: Clone + PartialEq>(s: &Range1DStore<T>) -> Vec<(u32, u32, T)> {
        s.iter().map(|(a, b, v)| (a, b, v.clone())).collect()
    }

    #[test]
    fn set_overwrites_and_splits() {
        let mut s = Range1DStore::new(0);
        s.set(0, 9, 1);
        let undo = s.set(3, 4, 2);
        assert_eq!(snapshot(&s), vec![(0, 2, 1), (3, 4, 2), (5, 9, 1)]);
        assert_eq!(*s.get(3), 2);
        assert_eq!(*s.get(12), 0);
        s.restore(undo);
        assert_eq!(snapshot(&s), vec![(0, 9, 1)]);
    }

    #[test]
    fn set_fills_gaps_between_existing() {
        let mut s = Range1DStore::new(0);
        s.set(2, 3, 1);
        s.set(6, 7, 1);
        s.set(0, 9, 5);
        assert_eq!(
            snapshot(&s),
            vec![(0, 1, 5), (2, 3, 5), (4, 5, 5), (6, 7, 5), (8, 9, 5)]
        );
    }

    #[test]
    fn delete_closes_the_gap() {
        let mut s = Range1DStore::new(0);
        s.set(2, 10, 1);
        s.set(20, 21, 2);
        let undo = s.delete(4, 5);
        assert_eq!(snapshot(&s), vec![(2, 8, 1), (18, 19, 2)]);
        s.restore(undo);
        assert_eq!(snapshot(&s), vec![(2, 10, 1), (20, 21, 2)]);
    }

    #[test]
    fn insert_opens_a_gap() {
        let mut s = Range1DStore::new(0);
        s.set(2, 5, 1);
        s.set(8, 8, 2);
        let undo = s.insert_at(4, 3);
        assert_eq!(snapshot(&s), vec![(2, 3, 1), (7, 8, 1), (11, 11, 2)]);
        assert_eq!(*s.get(5), 0);
        s.restore(undo);
        assert_eq!(snapshot(&s), vec![(2, 5, 1), (8, 8, 2)]);
    }

    #[test]
    fn navigation() {
        let mut s = Range1DStore::new(false);
        s.set(3, 4, true);
        s.set(9, 9, true);
        assert_eq!(s.next_non_empty_index(0), Some(3));
        assert_eq!(s.next_non_empty_index(3), Some(4));
        assert_eq!(s.next_non_empty_index(4), Some(9));
        assert_eq!(s.next_non_empty_index(9), None);
        assert_eq!(s.get_next(4, Direction::Forward).map(|t| t.0), Some(9));
        assert_eq!(s.get_next(9, Direction::Backward).map(|t| t.0), Some(3));
        assert_eq!(s.get_overlapping(4, 9).len(), 2);
    }

    #[test]
    fn clear_keeps_outside() {
        let mut s = Range1DStore::new(1.0);
        s.set(0, 10, 2.0);
        let undo = s.clear(3, 5);
        assert_eq!(snapshot(&s), vec![(0, 2, 2.0), (6, 10, 2.0)]);
        assert_eq!(*s.get(4), 1.0);
        s.restore(undo);
        assert_eq!(snapshot(&s), vec![(0, 10, 2.0)]);
    }
}
