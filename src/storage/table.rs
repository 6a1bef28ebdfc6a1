//! Disk-backed, sorted triplet table: the read side of C2.
//!
//! Each table holds every triangle record for one canonical point-type
//! triple, sorted ascending by `(d12, d13, d23)`. Opened once via mmap and
//! never rewritten by this crate (database construction is out of scope),
//! so there is no WAL, no remap epoch, and no write lock on the read path.

use crate::error::Error;
use crate::storage::record::{IndexRecord, TableHeader, HEADER_SIZE, RECORD_SIZE};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A memory-mapped, sorted table of triplet records for one type-triple.
pub struct TripletTable {
    path: PathBuf,
    mmap: Mmap,
    header: TableHeader,
}

impl TripletTable {
    /// Opens a table file, validating its header.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file can't be opened or mapped, and
    /// `Error::InvalidIndex` if the header fails validation — both fail
    /// the search at startup per section 7.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        // SAFETY: the table file is not mutated while mapped; this crate
        // never writes to an index table, only the (out-of-scope) database
        // builder does, and that happens before the file is opened here.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let header = TableHeader::parse(&mmap)?;
        Ok(Self { path, mmap, header })
    }

    /// Number of records in the table.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.header.record_count
    }

    /// True if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.record_count == 0
    }

    fn record_bytes(&self, i: u64) -> &[u8] {
        let start = HEADER_SIZE + i as usize * RECORD_SIZE;
        &self.mmap[start..start + RECORD_SIZE]
    }

    /// Decodes record `i` (`0..len()`), skipping and logging corrupt
    /// records per section 7's "skip, don't abort" policy.
    fn record(&self, i: u64) -> Option<IndexRecord> {
        match IndexRecord::decode(self.record_bytes(i)) {
            Ok(record) => {
                if !record.is_ordered() {
                    warn!(
                        table = %self.path.display(),
                        offset = i,
                        "corrupt record: distances out of canonical order, skipping"
                    );
                    return None;
                }
                Some(record)
            }
            Err(err) => {
                warn!(
                    table = %self.path.display(),
                    offset = i,
                    error = %err,
                    "corrupt record, skipping"
                );
                None
            }
        }
    }

    /// Binary search for the first record index whose `d12 >= target`.
    fn lower_bound(&self, target: u16) -> u64 {
        let (mut lo, mut hi) = (0u64, self.header.record_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let d12 = match self.record(mid) {
                Some(r) => r.d12,
                // A corrupt record can't be compared; treat it as smaller
                // so the scan still converges toward valid neighbors.
                None => u16::MIN,
            };
            if d12 < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Range query for one query triangle with tolerance `delta` (in
    /// Angstrom): binary-search the start offset by `d_small - delta`,
    /// linear scan until `d_small + delta`, filter the other two distances
    /// within `delta` (section 4.1).
    #[must_use]
    pub fn range_query(&self, d_small: f64, d_mid: f64, d_large: f64, delta: f64) -> Vec<IndexRecord> {
        let lo_bound = crate::fixed_point::quantize_distance((d_small - delta).max(0.0));
        let hi_bound = (d_small + delta).max(0.0);

        let mut out = Vec::new();
        let mut i = self.lower_bound(lo_bound);
        while i < self.header.record_count {
            let Some(record) = self.record(i) else {
                i += 1;
                continue;
            };
            let rd12 = crate::fixed_point::dequantize_distance(record.d12);
            if rd12 > hi_bound {
                break;
            }
            let rd13 = crate::fixed_point::dequantize_distance(record.d13);
            let rd23 = crate::fixed_point::dequantize_distance(record.d23);
            if (rd13 - d_mid).abs() <= delta && (rd23 - d_large).abs() <= delta {
                out.push(record);
            }
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::VERSION;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_table(records: &[IndexRecord]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let header = TableHeader {
            version: VERSION,
            record_size: RECORD_SIZE as u16,
            record_count: records.len() as u64,
        };
        file.write_all(&header.to_bytes()).unwrap();
        for r in records {
            file.write_all(&r.encode()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn rec(d12: u16, d13: u16, d23: u16, mol_loc: u64) -> IndexRecord {
        IndexRecord {
            d12,
            d13,
            d23,
            mol_loc,
            p_idx: [0, 1, 2],
            reduced_xyz: [[0, 0, 0]; 3],
            flags: 0,
        }
    }

    #[test]
    fn range_query_finds_exact_match() {
        let records = vec![rec(50, 60, 70, 1), rec(100, 100, 100, 2), rec(200, 200, 200, 3)];
        let file = write_table(&records);
        let table = TripletTable::open(file.path()).unwrap();
        let hits = table.range_query(1.00, 1.00, 1.00, 0.05);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].mol_loc, 2);
    }

    #[test]
    fn range_query_respects_tolerance() {
        let records = vec![rec(110, 110, 110, 1)];
        let file = write_table(&records);
        let table = TripletTable::open(file.path()).unwrap();
        assert!(table.range_query(1.00, 1.00, 1.00, 0.005).is_empty());
        assert_eq!(table.range_query(1.00, 1.00, 1.00, 0.15).len(), 1);
    }

    #[test]
    fn empty_table_yields_no_matches() {
        let file = write_table(&[]);
        let table = TripletTable::open(file.path()).unwrap();
        assert!(table.range_query(1.0, 1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn rejects_bad_header() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"garbage").unwrap();
        file.flush().unwrap();
        assert!(TripletTable::open(file.path()).is_err());
    }
}
