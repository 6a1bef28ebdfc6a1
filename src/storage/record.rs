//! On-disk triplet-index record format (section 6): header, fixed-width
//! record layout, and safe little-endian (de)serialization.

use crate::error::Error;
use crate::fixed_point;

/// Index file magic, including the trailing NUL.
pub const MAGIC: &[u8; 6] = b"PHIDX\0";

/// Current on-disk format version this reader understands.
pub const VERSION: u16 = 1;

/// Header size in bytes: magic(6) + version(2) + record_size(2) + count(8).
pub const HEADER_SIZE: usize = 18;

/// Fixed record size in bytes:
/// d12,d13,d23 (2 each) + mol_loc (8) + p_idx[3] (1 each) +
/// reduced_xyz[3] (2*3 each) + flags (2).
pub const RECORD_SIZE: usize = 2 * 3 + 8 + 3 + 2 * 3 * 3 + 2;

/// Parsed table header.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    /// On-disk format version.
    pub version: u16,
    /// Declared per-record size; must equal `RECORD_SIZE`.
    pub record_size: u16,
    /// Number of records following the header.
    pub record_count: u64,
}

impl TableHeader {
    /// Parses and validates a header from the first `HEADER_SIZE` bytes of
    /// a table file.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIndex` on a magic/version/record-size
    /// mismatch, per section 7's policy that `InvalidIndex` fails the
    /// search at startup.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::InvalidIndex("truncated header".to_string()));
        }
        if &bytes[0..6] != MAGIC {
            return Err(Error::InvalidIndex("bad magic".to_string()));
        }
        let version = u16::from_le_bytes([bytes[6], bytes[7]]);
        if version != VERSION {
            return Err(Error::InvalidIndex(format!(
                "unsupported index version {version}"
            )));
        }
        let record_size = u16::from_le_bytes([bytes[8], bytes[9]]);
        if record_size as usize != RECORD_SIZE {
            return Err(Error::InvalidIndex(format!(
                "unexpected record size {record_size}, expected {RECORD_SIZE}"
            )));
        }
        let record_count = u64::from_le_bytes(bytes[10..18].try_into().unwrap());
        Ok(Self {
            version,
            record_size,
            record_count,
        })
    }

    /// Serializes a header for writing (used by tests that build fixture
    /// tables; production tables are produced by the out-of-scope database
    /// builder).
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..6].copy_from_slice(MAGIC);
        out[6..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..10].copy_from_slice(&self.record_size.to_le_bytes());
        out[10..18].copy_from_slice(&self.record_count.to_le_bytes());
        out
    }
}

/// Reserved bit mask in `flags`. Any non-zero reserved bit means the reader
/// must abort with `InvalidIndex("unsupported index version")`.
pub const RESERVED_FLAGS_MASK: u16 = 0xFFFE;

/// A single fixed-width triplet record, decoded from its on-disk bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexRecord {
    /// Canonical ascending distance key, fixed-point encoded.
    pub d12: u16,
    /// See `d12`.
    pub d13: u16,
    /// See `d12`.
    pub d23: u16,
    /// Conformer location: a pointer into the library (opaque to this crate).
    pub mol_loc: u64,
    /// Molecule-local point indices for the three triangle vertices.
    pub p_idx: [u8; 3],
    /// Fixed-point reduced coordinates for the three triangle vertices.
    pub reduced_xyz: [[i16; 3]; 3],
    /// Format flags; bit 0 is defined, the rest are reserved.
    pub flags: u16,
}

impl IndexRecord {
    /// Decodes one record from a `RECORD_SIZE`-byte slice.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptRecord`-shaped data only via the caller (this
    /// function itself only validates structural length and the reserved
    /// flag bits, per section 6's "reader must abort" rule for version bits
    /// specifically — ordering/range checks are the scanner's job since
    /// they require the query's tolerance window).
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != RECORD_SIZE {
            return Err(Error::InvalidIndex(format!(
                "record slice has {} bytes, expected {RECORD_SIZE}",
                bytes.len()
            )));
        }
        let mut off = 0;
        let mut read_u16 = || {
            let v = u16::from_le_bytes([bytes[off], bytes[off + 1]]);
            off += 2;
            v
        };
        let d12 = read_u16();
        let d13 = read_u16();
        let d23 = read_u16();
        let mol_loc = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
        off += 8;
        let p_idx = [bytes[off], bytes[off + 1], bytes[off + 2]];
        off += 3;
        let mut reduced_xyz = [[0i16; 3]; 3];
        for vertex in &mut reduced_xyz {
            for coord in vertex.iter_mut() {
                *coord = i16::from_le_bytes([bytes[off], bytes[off + 1]]);
                off += 2;
            }
        }
        let flags = u16::from_le_bytes([bytes[off], bytes[off + 1]]);

        if flags & RESERVED_FLAGS_MASK != 0 {
            return Err(Error::InvalidIndex(
                "unsupported index version (reserved flag bit set)".to_string(),
            ));
        }

        Ok(Self {
            d12,
            d13,
            d23,
            mol_loc,
            p_idx,
            reduced_xyz,
            flags,
        })
    }

    /// Encodes a record to its `RECORD_SIZE`-byte on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        let mut off = 0;
        for v in [self.d12, self.d13, self.d23] {
            out[off..off + 2].copy_from_slice(&v.to_le_bytes());
            off += 2;
        }
        out[off..off + 8].copy_from_slice(&self.mol_loc.to_le_bytes());
        off += 8;
        out[off..off + 3].copy_from_slice(&self.p_idx);
        off += 3;
        for vertex in &self.reduced_xyz {
            for coord in vertex {
                out[off..off + 2].copy_from_slice(&coord.to_le_bytes());
                off += 2;
            }
        }
        out[off..off + 2].copy_from_slice(&self.flags.to_le_bytes());
        out
    }

    /// The record's canonical distance key, reinflated to Angstrom.
    #[must_use]
    pub fn distances(&self) -> (f64, f64, f64) {
        (
            fixed_point::dequantize_distance(self.d12),
            fixed_point::dequantize_distance(self.d13),
            fixed_point::dequantize_distance(self.d23),
        )
    }

    /// Checks the record's ordering invariant: `d12 <= d13 <= d23`. A
    /// violation means the record fails the range/ordering check section 7
    /// calls `CorruptRecord`.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.d12 <= self.d13 && self.d13 <= self.d23
    }
}
