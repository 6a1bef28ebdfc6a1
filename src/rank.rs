//! Result ranker and deduplicator (C6): bounded top-M result set with
//! per-molecule conformer caps, grounded on the bounded-capacity eviction
//! pattern this codebase uses for its other bounded structures, swapping
//! recency eviction for worst-RMSD eviction.

use crate::config::Sort;
use crate::correspond::CorrespondenceResult;
use crate::filter::{Excluder, MoleculeFilter, MoleculeProperties};
use rustc_hash::FxHashMap;

/// One submission to the ranker: a correspondence result plus the
/// caller-supplied context needed to filter and dedup it.
#[derive(Debug, Clone)]
pub struct RankItem {
    /// The alignment result.
    pub result: CorrespondenceResult,
    /// The conformer's parent molecule id, for per-molecule dedup.
    pub parent_molecule_id: u64,
}

/// Ranker configuration: caps and filters, applied in the order section 4.5
/// specifies (molecule window, spatial constraints, then dedup/rank).
pub struct RankerParams {
    /// Weight/rotatable-bond window.
    pub molecule_filter: MoleculeFilter,
    /// Spatial include/exclude constraints.
    pub excluder: Excluder,
    /// Per-`(db_id, parent_molecule_id)` cap; 0 = unlimited.
    pub reduce_confs: u32,
    /// Global cap on kept results; 0 = unlimited.
    pub max_hits: u32,
    /// Final ordering.
    pub sort: Sort,
}

/// Bounded, deduplicated, filtered result collector.
pub struct Ranker {
    params: RankerParams,
    accepted: Vec<RankItem>,
    groups: FxHashMap<(u32, u64), Vec<usize>>,
}

impl Ranker {
    /// Creates an empty ranker.
    #[must_use]
    pub fn new(params: RankerParams) -> Self {
        Self { params, accepted: Vec::new(), groups: FxHashMap::default() }
    }

    /// Submits one candidate result. Applies, in order: the molecule window,
    /// the spatial constraints, then the dedup/global-cap eviction policy.
    /// Returns whether the candidate was kept (accepted immediately or
    /// replacing a worse entry) after every check.
    pub fn submit(
        &mut self,
        item: RankItem,
        props: MoleculeProperties,
        transformed_molecule_points: &[nalgebra::Vector3<f64>],
    ) -> bool {
        if !self.params.molecule_filter.passes(props) {
            return false;
        }
        if !self.params.excluder.passes(transformed_molecule_points) {
            return false;
        }

        let key = (item.result.db_id, item.parent_molecule_id);
        let residual = item.result.weighted_residual;

        if self.params.reduce_confs != 0 {
            let group = self.groups.entry(key).or_default();
            if group.len() as u32 >= self.params.reduce_confs {
                let worst_local = group
                    .iter()
                    .copied()
                    .max_by(|&a, &b| {
                        self.accepted[a]
                            .result
                            .weighted_residual
                            .total_cmp(&self.accepted[b].result.weighted_residual)
                    })
                    .expect("group is non-empty by the len check above");
                if self.accepted[worst_local].result.weighted_residual <= residual {
                    return false;
                }
                self.replace_global(worst_local, item);
                return true;
            }
        }

        self.insert_new(item, key, residual)
    }

    fn insert_new(&mut self, item: RankItem, key: (u32, u64), residual: f64) -> bool {
        if self.params.max_hits != 0 && self.accepted.len() as u32 >= self.params.max_hits {
            let worst_global = (0..self.accepted.len())
                .max_by(|&a, &b| {
                    self.accepted[a]
                        .result
                        .weighted_residual
                        .total_cmp(&self.accepted[b].result.weighted_residual)
                })
                .expect("max_hits > 0 implies accepted is non-empty once full");
            if self.accepted[worst_global].result.weighted_residual <= residual {
                return false;
            }
            self.remove_from_group(worst_global);
            self.replace_global(worst_global, item);
            return true;
        }

        let idx = self.accepted.len();
        self.accepted.push(item);
        self.groups.entry(key).or_default().push(idx);
        true
    }

    fn replace_global(&mut self, idx: usize, item: RankItem) {
        self.remove_from_group(idx);
        let key = (item.result.db_id, item.parent_molecule_id);
        self.accepted[idx] = item;
        self.groups.entry(key).or_default().push(idx);
    }

    fn remove_from_group(&mut self, idx: usize) {
        let old_key = (self.accepted[idx].result.db_id, self.accepted[idx].parent_molecule_id);
        if let Some(indices) = self.groups.get_mut(&old_key) {
            indices.retain(|&i| i != idx);
        }
    }

    /// Consumes the ranker, returning the final result set in the
    /// configured order.
    #[must_use]
    pub fn finish(mut self) -> Vec<RankItem> {
        if self.params.sort == Sort::Rmsd {
            self.accepted
                .sort_by(|a, b| a.result.weighted_residual.total_cmp(&b.result.weighted_residual));
        }
        self.accepted
    }
}
