//! Query construction and the external result wire shape (section 6).

use crate::filter::{Excluder, MoleculeFilter};
use crate::point::QueryPoint;

/// A pharmacophore search query: the points to match, which shard to search,
/// and the post-alignment filters to apply.
#[derive(Debug, Clone)]
pub struct Query {
    /// The query's feature points.
    pub points: Vec<QueryPoint>,
    /// Which shard (library partition) this search runs against.
    pub db_id: u32,
    /// Total shard count, carried through for cross-shard rank
    /// reconstruction.
    pub num_dbs: u32,
    /// Spatial include/exclude constraints, in query space.
    pub excluder: Excluder,
    /// Molecular-weight / rotatable-bond window.
    pub molecule_filter: MoleculeFilter,
}

impl Query {
    /// Builds a query over a single-shard search (the common case).
    #[must_use]
    pub fn new(points: Vec<QueryPoint>) -> Self {
        Self {
            points,
            db_id: 0,
            num_dbs: 1,
            excluder: Excluder::new(),
            molecule_filter: MoleculeFilter::default(),
        }
    }
}

/// One hit, in the shape the public search API returns to callers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueryResult {
    /// Conformer location the hit came from.
    pub conformer_location: u64,
    /// Shard the hit came from.
    pub db_id: u32,
    /// Query-point-to-molecule-point correspondence.
    pub correspondence: Vec<i32>,
    /// Geometric-mean RMSD in Angstroms between aligned molecule points and
    /// query points.
    pub rmsd: f64,
    /// Rotation matrix, molecule -> query space, narrowed to `f32`.
    pub rotation: [[f32; 3]; 3],
    /// Translation, narrowed to `f32`.
    pub translation: [f32; 3],
    /// Weighted residual used to gate acceptance (meaningful only in
    /// weighted mode, where it is bounded at `<= 1.0`).
    pub weighted_residual: f64,
}

impl From<crate::rank::RankItem> for QueryResult {
    fn from(item: crate::rank::RankItem) -> Self {
        let r = item.result;
        let rot = r.rmsd.rotation;
        let trans = r.rmsd.translation;
        Self {
            conformer_location: r.conformer_location,
            db_id: r.db_id,
            correspondence: r.correspondence,
            rmsd: r.weighted_residual,
            rotation: [
                [rot[(0, 0)] as f32, rot[(0, 1)] as f32, rot[(0, 2)] as f32],
                [rot[(1, 0)] as f32, rot[(1, 1)] as f32, rot[(1, 2)] as f32],
                [rot[(2, 0)] as f32, rot[(2, 1)] as f32, rot[(2, 2)] as f32],
            ],
            translation: [trans.x as f32, trans.y as f32, trans.z as f32],
            weighted_residual: r.rmsd.value,
        }
    }
}
