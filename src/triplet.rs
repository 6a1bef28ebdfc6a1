//! Triplet key & encoding (C1): pack a canonical three-point descriptor into
//! the fixed-width key used for index lookup and range queries.

use crate::point::QueryPoint;

/// An unordered triple of point types, canonicalized so that type-triples
/// differing only by permutation hash to the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTriple(pub u8, pub u8, pub u8);

impl TypeTriple {
    /// Builds the canonical (sorted ascending) type-triple for three types.
    #[must_use]
    pub fn canonical(a: u8, b: u8, c: u8) -> Self {
        let mut types = [a, b, c];
        types.sort_unstable();
        Self(types[0], types[1], types[2])
    }

    /// A stable string form suitable for table file names and log fields.
    #[must_use]
    pub fn table_name(&self) -> String {
        format!("{}-{}-{}", self.0, self.1, self.2)
    }
}

/// The three pairwise distances of a triangle, canonically ordered
/// ascending: `(d_smallest, d_middle, d_largest)`. C2 range scans rely on
/// this ordering (section 3's invariant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceKey {
    /// Smallest of the three pairwise distances, in Angstrom.
    pub d_small: f64,
    /// Middle pairwise distance, in Angstrom.
    pub d_mid: f64,
    /// Largest pairwise distance, in Angstrom.
    pub d_large: f64,
}

impl DistanceKey {
    /// Sorts three raw distances into canonical ascending order.
    #[must_use]
    pub fn canonical(d01: f64, d02: f64, d12: f64) -> Self {
        let mut ds = [d01, d02, d12];
        ds.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            d_small: ds[0],
            d_mid: ds[1],
            d_large: ds[2],
        }
    }
}

/// One of a query's triangles: three `QueryPoint`s plus their canonical
/// distance key. A query of P points induces at most `C(P,3)` triangles.
#[derive(Debug, Clone, Copy)]
pub struct Triplet {
    /// The three query points forming this triangle, in the order the
    /// distances below were computed from.
    pub points: [QueryPoint; 3],
    /// Canonical ascending distance key for this triangle.
    pub distances: DistanceKey,
}

impl Triplet {
    /// Builds a triplet from three query points, computing and canonically
    /// ordering its pairwise distances.
    #[must_use]
    pub fn new(a: QueryPoint, b: QueryPoint, c: QueryPoint) -> Self {
        let d01 = euclidean(&a.point.position(), &b.point.position());
        let d02 = euclidean(&a.point.position(), &c.point.position());
        let d12 = euclidean(&b.point.position(), &c.point.position());
        Self {
            points: [a, b, c],
            distances: DistanceKey::canonical(d01, d02, d12),
        }
    }

    /// The canonical (sorted) type-triple this triangle's index table is
    /// keyed by.
    #[must_use]
    pub fn type_triple(&self) -> TypeTriple {
        TypeTriple::canonical(
            self.points[0].point.type_id,
            self.points[1].point.type_id,
            self.points[2].point.type_id,
        )
    }
}

/// One rotation/reflection-canonicalized ordering of a query triangle,
/// enumerated as a candidate "slot" entry. Each triangle induces up to 6
/// `QueryTriplet`s (the permutations of its three points), because the
/// index record's three point-type/coordinate slots may match the query's
/// three points in any consistent order.
#[derive(Debug, Clone, Copy)]
pub struct QueryTriplet {
    /// The underlying triangle.
    pub triplet: Triplet,
    /// Permutation of `triplet.points` applied to derive this ordering,
    /// expressed as indices into `triplet.points`.
    pub order: [usize; 3],
}

impl QueryTriplet {
    /// Enumerates all distinct permutations of `triplet`'s three points as
    /// `QueryTriplet`s. Permutations that are not consistent with the
    /// triangle's own point-type multiset collapse naturally at match time;
    /// all 6 are generated here since type consistency is checked per-entry
    /// by the aggregator, not by the enumerator.
    #[must_use]
    pub fn enumerate(triplet: Triplet) -> Vec<Self> {
        const PERMS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        PERMS
            .into_iter()
            .map(|order| Self { triplet, order })
            .collect()
    }

    /// The query point bound to index-record slot `i` (`0..3`) under this
    /// ordering.
    #[must_use]
    pub fn point(&self, i: usize) -> QueryPoint {
        self.triplet.points[self.order[i]]
    }
}

fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Enumerates every triangle (`C(P,3)`) of a query's points, in a stable
/// order (ascending index triples), producing one `Triplet` per slot.
#[must_use]
pub fn enumerate_triplets(points: &[QueryPoint]) -> Vec<Triplet> {
    let p = points.len();
    let mut out = Vec::with_capacity(p * (p.saturating_sub(1)) * (p.saturating_sub(2)) / 6);
    for i in 0..p {
        for j in (i + 1)..p {
            for k in (j + 1)..p {
                out.push(Triplet::new(points[i], points[j], points[k]));
            }
        }
    }
    out
}
