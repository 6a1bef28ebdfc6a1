//! Pharmacophore feature points: the query's and the library's atomic unit.

use serde::{Deserialize, Serialize};

/// A 3D point, used both for query/molecule coordinates and for rotation
/// translation offsets.
pub type Vec3 = [f64; 3];

/// How a point's optional direction vector should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    /// No directionality; the point is a bare sphere.
    None,
    /// A hydrogen-bond donor direction (points away from the donor atom).
    DonorVector,
    /// A hydrogen-bond acceptor direction (points toward the acceptor lone pair).
    AcceptorVector,
}

/// A single labeled 3D feature: a type, a position, and a tolerance radius.
///
/// `radius` is the spatial tolerance; `weight()` is `1/radius^2`, the RMSD
/// weight C5 assigns this point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PharmaPoint {
    /// Feature type (donor, acceptor, hydrophobe, ...), a small dense int.
    pub type_id: u8,
    /// Position in query or molecule space.
    pub x: f64,
    /// Position in query or molecule space.
    pub y: f64,
    /// Position in query or molecule space.
    pub z: f64,
    /// Spatial tolerance, in Angstrom.
    pub radius: f64,
    /// Optional unit direction vector; `None` when `vector_kind` is `None`.
    pub vector: Option<Vec3>,
    /// How `vector` should be interpreted.
    pub vector_kind: VectorKind,
}

impl PharmaPoint {
    /// Creates a point with no direction vector.
    #[must_use]
    pub const fn new(type_id: u8, x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            type_id,
            x,
            y,
            z,
            radius,
            vector: None,
            vector_kind: VectorKind::None,
        }
    }

    /// Position as a plain 3-vector.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        [self.x, self.y, self.z]
    }

    /// The RMSD weight this point contributes: `1 / radius^2`.
    ///
    /// # Panics
    ///
    /// Never panics; a non-positive radius yields `f64::INFINITY`, which
    /// callers must reject at query-build time (see `QueryTooLarge`/`BadConfig`).
    #[must_use]
    pub fn weight(&self) -> f64 {
        1.0 / (self.radius * self.radius)
    }
}

/// A `PharmaPoint` plus its positional index `0..P-1` in the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryPoint {
    /// Index of this point within the query, `0..P-1`.
    pub index: usize,
    /// The underlying feature.
    pub point: PharmaPoint,
}

impl QueryPoint {
    /// Pairs a feature with its query-local index.
    #[must_use]
    pub const fn new(index: usize, point: PharmaPoint) -> Self {
        Self { index, point }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_inverse_square_radius() {
        let p = PharmaPoint::new(0, 0.0, 0.0, 0.0, 0.5);
        assert!((p.weight() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn position_matches_fields() {
        let p = PharmaPoint::new(1, 1.0, 2.0, 3.0, 1.0);
        assert_eq!(p.position(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn query_point_carries_index() {
        let qp = QueryPoint::new(2, PharmaPoint::new(0, 0.0, 0.0, 0.0, 1.0));
        assert_eq!(qp.index, 2);
    }
}
