use datasheet_common::Region;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("region {region} overlaps existing entry {existing}")]
    Overlap { region: Region, existing: Region },
    #[error("no entry stored at {0}")]
    NotFound(Region),
}
