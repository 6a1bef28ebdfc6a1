//! Disk-backed triplet index storage: the read side of C2.
//!
//! - [`record`]: fixed-width on-disk record format and header parsing.
//! - [`table`]: a single mmap-backed, sorted table for one type-triple.
//! - [`registry`]: the sharded, lazily-opening map from type-triple to table.

pub mod record;
pub mod registry;
pub mod table;

pub use record::IndexRecord;
pub use registry::TableRegistry;
pub use table::TripletTable;
