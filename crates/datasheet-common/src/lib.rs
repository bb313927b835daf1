pub mod address;
pub mod error;
pub mod region;
pub mod value;

pub use address::*;
pub use error::*;
pub use region::*;
pub use value::*;
