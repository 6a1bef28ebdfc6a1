//! Concurrent registry of per-type-triple tables (C2).
//!
//! Many corresponder threads look up tables for the same handful of
//! type-triples simultaneously while the aggregator may be opening a table
//! for the first time. Sharded into independent lock stripes so reads to
//! different type-triples never contend, the same technique this codebase
//! uses for its other hot concurrent lookup structures.

use crate::error::Error;
use crate::storage::table::TripletTable;
use crate::triplet::TypeTriple;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

const NUM_SHARDS: usize = 16;

#[derive(Default)]
struct Shard {
    tables: FxHashMap<TypeTriple, Option<Arc<TripletTable>>>,
}

/// Lazily-opening, sharded registry mapping a canonical type-triple to its
/// on-disk table.
pub struct TableRegistry {
    root: PathBuf,
    shards: [RwLock<Shard>; NUM_SHARDS],
}

impl TableRegistry {
    /// Creates a registry rooted at a shard directory. Tables are opened on
    /// first access, not eagerly.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            shards: std::array::from_fn(|_| RwLock::new(Shard::default())),
        }
    }

    fn shard_index(key: TypeTriple) -> usize {
        let hash = (u32::from(key.0) << 16) | (u32::from(key.1) << 8) | u32::from(key.2);
        (hash as usize) % NUM_SHARDS
    }

    /// Looks up (opening and caching on first access) the table for a
    /// type-triple.
    ///
    /// Returns `Ok(None)` if no table file exists for this type-triple —
    /// that's the documented "zero matches, not an error" failure mode of
    /// section 4.1, not a reason to fail the search.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`/`Error::InvalidIndex` if a table file exists but
    /// fails to open or validate.
    pub fn get_or_open(&self, key: TypeTriple) -> Result<Option<Arc<TripletTable>>, Error> {
        let shard_idx = Self::shard_index(key);
        {
            let shard = self.shards[shard_idx].read();
            if let Some(entry) = shard.tables.get(&key) {
                return Ok(entry.clone());
            }
        }

        let path = self.root.join(format!("{}.phidx", key.table_name()));
        let opened = if path.exists() {
            Some(Arc::new(TripletTable::open(&path)?))
        } else {
            None
        };

        let mut shard = self.shards[shard_idx].write();
        Ok(shard
            .tables
            .entry(key)
            .or_insert(opened)
            .clone())
    }
}
