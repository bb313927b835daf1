use datasheet_common::{Axis, Region};

/// A region plus the value stored over it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRegion<T> {
    pub region: Region,
    pub data: T,
}

impl<T> DataRegion<T> {
    pub fn new(region: Region, data: T) -> Self {
        Self { region, data }
    }
}

/// Every entry whose leading edge along `axis` was `>= from` moved by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedShift {
    pub axis: Axis,
    pub from: u32,
    pub delta: i64,
}

impl AppliedShift {
    /// The shift that undoes this one.
    pub fn inverse(&self) -> AppliedShift {
        AppliedShift {
            axis: self.axis,
            from: (self.from as i64 + self.delta).max(0) as u32,
            delta: -self.delta,
        }
    }
}

/// Everything one region-store mutation changed: `regions_removed` in their
/// original coordinates, `shifts` in application order, `regions_added` in
/// their final coordinates.
///
/// Consumed by value on restore, so it cannot be applied twice. Data from
/// several mutations is restored one at a time, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRestoreData<T> {
    pub regions_added: Vec<DataRegion<T>>,
    pub regions_removed: Vec<DataRegion<T>>,
    pub shifts: Vec<AppliedShift>,
}

impl<T> Default for RegionRestoreData<T> {
    fn default() -> Self {
        Self {
            regions_added: Vec::new(),
            regions_removed: Vec::new(),
            shifts: Vec::new(),
        }
    }
}

impl<T> RegionRestoreData<T> {
    pub fn is_empty(&self) -> bool {
        self.regions_added.is_empty() && self.regions_removed.is_empty() && self.shifts.is_empty()
    }
}

/// Same as [`AppliedShift`] for a 1D store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedShift1D {
    pub from: u32,
    pub delta: i64,
}

impl AppliedShift1D {
    pub fn inverse(&self) -> AppliedShift1D {
        AppliedShift1D {
            from: (self.from as i64 + self.delta).max(0) as u32,
            delta: -self.delta,
        }
    }
}

/// A closed interval `[start, end]` with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedInterval<T> {
    pub start: u32,
    pub end: u32,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRestoreData<T> {
    pub added: Vec<OrderedInterval<T>>,
    pub removed: Vec<OrderedInterval<T>>,
    pub shifts: Vec<AppliedShift1D>,
}

impl<T> Default for IntervalRestoreData<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            shifts: Vec::new(),
        }
    }
}

impl<T> IntervalRestoreData<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.shifts.is_empty()
    }
}
