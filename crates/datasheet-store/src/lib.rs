//! Sparse storage for sheet data.
//!
//! [`RegionStore`] implementations keep values over rectangular regions,
//! [`Range1DStore`] keeps one value per row or column. Every structural
//! mutation hands back restore data that reverts exactly that mutation.

mod error;
pub mod interval_store;
pub mod interval_tree;
pub mod merge_store;
mod region_index;
pub mod region_store;
pub mod restore;

pub use error::StoreError;
pub use interval_store::{Direction, MergeableIntervalStore, Range1DRestoreData, Range1DStore};
pub use interval_tree::IntervalTree;
pub use merge_store::{MergeRegionDataStore, Mergeable, OverwritingValue};
pub use region_store::{OverlapPolicy, RegionDataStore, RegionStore};
pub use restore::{
    AppliedShift, AppliedShift1D, DataRegion, IntervalRestoreData, OrderedInterval,
    RegionRestoreData,
};
