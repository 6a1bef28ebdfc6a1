//! Top-level search orchestration: C2 (registry) -> C3 (aggregator) ->
//! Q1 -> N corresponder workers (C4+C5) -> Q2 -> C6 (ranker) -> caller.

use crate::aggregator::{self, ConformerMatches};
use crate::arena::BumpArena;
use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::correspond::{generate_correspondences, CorrespondenceParams};
use crate::error::{Error, Result};
use crate::filter::MoleculeProperties;
use crate::query::{Query, QueryResult};
use crate::queue;
use crate::rank::{RankItem, Ranker, RankerParams};
use crate::storage::TableRegistry;
use crate::triplet::enumerate_triplets;
use nalgebra::Vector3;
use tracing::{info, info_span};

/// External collaborator supplying whatever the ranker needs about a
/// conformer's parent molecule that this crate has no business computing
/// itself (molecular weight, rotatable bonds, the whole atom set for
/// spatial filtering, and the parent molecule id for dedup).
pub trait MoleculeInfo: Send + Sync {
    /// Weight/rotatable-bond properties for the conformer's parent molecule.
    fn properties(&self, conformer_location: u64) -> MoleculeProperties;
    /// The id shared by every conformer of the same parent molecule.
    fn parent_molecule_id(&self, conformer_location: u64) -> u64;
    /// Every atom position of the conformer, in molecule-local space, for
    /// spatial include/exclude checking after the rigid transform is
    /// applied.
    fn whole_molecule_points(&self, conformer_location: u64) -> Vec<Vector3<f64>>;
}

struct RankSubmission {
    item: RankItem,
    props: MoleculeProperties,
    transformed_points: Vec<Vector3<f64>>,
}

/// Runs a full search: enumerates the query's triangles, aggregates
/// per-conformer matches from the index, runs the bitmask-pruned
/// correspondence search and Kabsch alignment on `config.concurrency.threads`
/// worker threads, and ranks the results.
///
/// # Errors
///
/// Returns `Error::QueryTooLarge` if the query has fewer than 3 points, and
/// propagates `Error::Io`/`Error::InvalidIndex` surfaced while opening index
/// tables.
pub fn search(
    registry: &TableRegistry,
    query: &Query,
    config: &SearchConfig,
    molinfo: &dyn MoleculeInfo,
    cancel: &CancelToken,
) -> Result<Vec<QueryResult>> {
    if query.points.len() < 3 {
        return Err(Error::QueryTooLarge(format!(
            "query has {} points, at least 3 are required to form a triangle",
            query.points.len()
        )));
    }

    let span = info_span!("search", points = query.points.len(), shard = query.db_id);
    let _enter = span.enter();

    let triangles = enumerate_triplets(&query.points);
    let conformer_groups = aggregator::collect(registry, &triangles)?;
    info!(conformers = conformer_groups.len(), "aggregation complete");

    let num_slots = triangles.len();
    let corr_params = CorrespondenceParams {
        weighting_mode: config.alignment.weighting_mode,
        max_rmsd: config.ranker.max_rmsd,
        orientations_per_conf: config.concurrency.orientations_per_conf,
    };

    let threads = config.concurrency.threads.max(1) as usize;
    let capacity = config.concurrency.queue_capacity as usize;
    let (q1_tx, q1_rx) = queue::bounded::<ConformerMatches>(capacity);
    let (q2_tx, q2_rx) = queue::bounded::<RankSubmission>(capacity);

    let mut correspondences_generated = 0usize;
    let mut results_emitted = 0usize;

    std::thread::scope(|scope| {
        scope.spawn({
            let q1_tx = q1_tx.clone();
            move || {
                for group in conformer_groups {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if q1_tx.send(group).is_err() {
                        break;
                    }
                }
            }
        });
        drop(q1_tx);

        for _ in 0..threads {
            let q1_rx = q1_rx.clone();
            let q2_tx = q2_tx.clone();
            scope.spawn(|| {
                worker_loop(&q1_rx, &q2_tx, query, num_slots, corr_params, molinfo, cancel);
            });
        }
        drop(q1_rx);
        drop(q2_tx);

        let mut ranker = Ranker::new(RankerParams {
            molecule_filter: query.molecule_filter,
            excluder: query.excluder.clone(),
            reduce_confs: config.ranker.reduce_confs,
            max_hits: config.ranker.max_hits,
            sort: config.ranker.sort,
        });
        while let Ok(submission) = q2_rx.recv() {
            correspondences_generated += 1;
            if ranker.submit(submission.item, submission.props, &submission.transformed_points) {
                results_emitted += 1;
            }
        }
        info!(correspondences_generated, results_emitted, "search finished");
        Ok(ranker.finish().into_iter().map(QueryResult::from).collect())
    })
}

fn worker_loop(
    q1_rx: &queue::Consumer<ConformerMatches>,
    q2_tx: &queue::Producer<RankSubmission>,
    query: &Query,
    num_slots: usize,
    corr_params: CorrespondenceParams,
    molinfo: &dyn MoleculeInfo,
    cancel: &CancelToken,
) {
    let arena: BumpArena<crate::correspond::CorrespondenceResult> = BumpArena::new();
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(group) = q1_rx.recv() else { break };
        let conformer_location = group.conformer_location;
        let candidates =
            generate_correspondences(&group, num_slots, &query.points, query.db_id, query.num_dbs, corr_params);

        for candidate in candidates {
            // SAFETY: the pointer is read back within this same loop
            // iteration, well before the next `reset()`.
            let ptr = unsafe { arena.alloc(candidate) };
            let candidate = unsafe { (*ptr).clone() };

            let props = molinfo.properties(conformer_location);
            let parent_molecule_id = molinfo.parent_molecule_id(conformer_location);
            let whole_points = molinfo.whole_molecule_points(conformer_location);
            let transformed_points: Vec<Vector3<f64>> =
                whole_points.iter().map(|&p| candidate.rmsd.reorient(p)).collect();

            let submission = RankSubmission {
                item: RankItem { result: candidate, parent_molecule_id },
                props,
                transformed_points,
            };
            if q2_tx.send(submission).is_err() {
                return;
            }
        }
        arena.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::point::{PharmaPoint, QueryPoint};

    struct NoMolecules;
    impl MoleculeInfo for NoMolecules {
        fn properties(&self, _: u64) -> MoleculeProperties {
            MoleculeProperties { weight: 0.0, rotatable_bonds: 0 }
        }
        fn parent_molecule_id(&self, conformer_location: u64) -> u64 {
            conformer_location
        }
        fn whole_molecule_points(&self, _: u64) -> Vec<Vector3<f64>> {
            Vec::new()
        }
    }

    #[test]
    fn empty_index_yields_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TableRegistry::new(dir.path());
        let query = Query::new(vec![
            QueryPoint::new(0, PharmaPoint::new(0, 0.0, 0.0, 0.0, 1.0)),
            QueryPoint::new(1, PharmaPoint::new(1, 1.0, 0.0, 0.0, 1.0)),
            QueryPoint::new(2, PharmaPoint::new(2, 0.0, 1.0, 0.0, 1.0)),
        ]);
        let config = SearchConfig::default();
        let cancel = CancelToken::new();
        let results = search(&registry, &query, &config, &NoMolecules, &cancel).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn cancel_before_start_yields_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TableRegistry::new(dir.path());
        let query = Query::new(vec![
            QueryPoint::new(0, PharmaPoint::new(0, 0.0, 0.0, 0.0, 1.0)),
            QueryPoint::new(1, PharmaPoint::new(1, 1.0, 0.0, 0.0, 1.0)),
            QueryPoint::new(2, PharmaPoint::new(2, 0.0, 1.0, 0.0, 1.0)),
        ]);
        let config = SearchConfig::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let results = search(&registry, &query, &config, &NoMolecules, &cancel).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn query_with_fewer_than_three_points_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TableRegistry::new(dir.path());
        let query = Query::new(vec![
            QueryPoint::new(0, PharmaPoint::new(0, 0.0, 0.0, 0.0, 1.0)),
            QueryPoint::new(1, PharmaPoint::new(1, 1.0, 0.0, 0.0, 1.0)),
        ]);
        let config = SearchConfig::default();
        let cancel = CancelToken::new();
        let err = search(&registry, &query, &config, &NoMolecules, &cancel).unwrap_err();
        assert!(matches!(err, crate::error::Error::QueryTooLarge(_)));
    }
}
