//! Correspondence generator (C4): bitmask-pruned backtracking search over a
//! conformer's per-slot candidate triangle matches, producing every
//! one-to-one query-to-molecule point correspondence (up to the orientation
//! cap) and handing each off to C5 for alignment.
//!
//! Grounded on the legacy recursive `generate(pos, alreadyMatched)` walk:
//! descend slots from last to first, maintaining parallel append-only stacks
//! of paired coordinates/weights plus a used-molecule-point bitmask, and
//! invoke the alignment filter at the base case.

use crate::aggregator::{ConformerMatches, TripletMatch};
use crate::align::{unweighted_kabsch, weighted_kabsch, RmsdResult};
use crate::bitmask::Bitmask128;
use crate::config::WeightingMode;
use crate::point::QueryPoint;
use nalgebra::Vector3;

/// One fully-aligned, accepted candidate: a query-to-molecule point
/// correspondence plus its alignment.
#[derive(Debug, Clone)]
pub struct CorrespondenceResult {
    /// Conformer location this result came from.
    pub conformer_location: u64,
    /// Shard identifier the match came from.
    pub db_id: u32,
    /// Total shard count, carried for cross-shard rank reconstruction.
    pub num_dbs: u32,
    /// Molecule point index bound to each query point, by query index.
    pub correspondence: Vec<i32>,
    /// The accepted alignment. `rmsd.value` is the weighted Kabsch residual
    /// gated at `<= 1.0` (meaningless in unweighted mode, where it is the
    /// plain sum of squared deviations).
    pub rmsd: RmsdResult,
    /// Unweighted geometric-mean RMSD in Angstroms (`sqrt(mean(d^2))`),
    /// gated against `max_rmsd`. This is the quantity external callers care
    /// about, regardless of which weighting mode produced the alignment.
    pub weighted_residual: f64,
}

/// Parameters governing the backtracking search and its base-case filter.
#[derive(Debug, Clone, Copy)]
pub struct CorrespondenceParams {
    /// Weighted vs. unweighted Kabsch.
    pub weighting_mode: WeightingMode,
    /// Accept only results with aggregate RMSD at or below this bound.
    pub max_rmsd: f64,
    /// Per-conformer cap on emitted orientations; 0 means unlimited.
    pub orientations_per_conf: u32,
}

struct Search<'a> {
    slots: &'a [Vec<TripletMatch>],
    query_points: &'a [QueryPoint],
    params: CorrespondenceParams,
    conformer_location: u64,
    db_id: u32,
    num_dbs: u32,

    correspondence: Vec<i32>,
    query_coords: Vec<Vector3<f64>>,
    mol_coords: Vec<Vector3<f64>>,
    weights: Vec<f64>,
    this_conf_count: u32,
    out: Vec<CorrespondenceResult>,
}

impl<'a> Search<'a> {
    fn generate(&mut self, slot: isize, already_matched: Bitmask128) -> bool {
        if slot < 0 {
            return self.try_accept(already_matched);
        }
        let slot = slot as usize;
        let candidates = &self.slots[slot];

        for tm in candidates {
            let mut new_q = [None; 3];
            let mut new_bits = Bitmask128::new();
            let mut valid = true;

            for p in 0..3 {
                let qpoint = tm.order[p];
                let mpoint = usize::from(tm.record.p_idx[p]);
                match self.correspondence.get(qpoint).copied() {
                    Some(-1) | None => {
                        if already_matched.test(mpoint) || new_bits.test(mpoint) {
                            valid = false;
                            break;
                        }
                        new_q[p] = Some((qpoint, mpoint));
                        new_bits = new_bits.set(mpoint);
                    }
                    Some(cur) if cur as usize == mpoint => {
                        // identical binding, nothing new to push
                    }
                    Some(_) => {
                        valid = false;
                        break;
                    }
                }
            }

            if !valid {
                continue;
            }

            let mut pushed = 0;
            for (p, entry) in new_q.iter().enumerate() {
                let Some((qpoint, mpoint)) = *entry else { continue };
                self.correspondence[qpoint] = mpoint as i32;
                let coord = crate::fixed_point::dequantize_vec3(tm.record.reduced_xyz[p]);
                self.mol_coords.push(Vector3::new(coord[0], coord[1], coord[2]));
                let qp = self.query_points[qpoint];
                let pos = qp.point.position();
                self.query_coords.push(Vector3::new(pos[0], pos[1], pos[2]));
                self.weights.push(qp.point.weight());
                pushed += 1;
            }

            let keep_going = self.generate(slot as isize - 1, already_matched.union(new_bits));

            for _ in 0..pushed {
                self.mol_coords.pop();
                self.query_coords.pop();
                self.weights.pop();
            }
            for entry in new_q.into_iter().flatten() {
                self.correspondence[entry.0] = -1;
            }

            if !keep_going {
                return false;
            }
        }
        true
    }

    fn try_accept(&mut self, _already_matched: Bitmask128) -> bool {
        let n = self.query_coords.len();
        if n == 0 {
            return true;
        }
        debug_assert_eq!(n, self.mol_coords.len());
        debug_assert_eq!(n, self.weights.len());

        let aligned = match self.params.weighting_mode {
            WeightingMode::Weighted => {
                let Some(r) = weighted_kabsch(&self.query_coords, &self.mol_coords, &self.weights) else {
                    return true;
                };
                if r.value > 1.0 {
                    return true;
                }
                r
            }
            WeightingMode::Unweighted => {
                let Some(r) = unweighted_kabsch(&self.query_coords, &self.mol_coords) else {
                    return true;
                };
                r
            }
        };

        let mut sum_sq = 0.0;
        for i in 0..n {
            let reoriented = aligned.reorient(self.mol_coords[i]);
            let d = reoriented - self.query_coords[i];
            let dsq = d.norm_squared();
            if self.weights[i] * dsq > 1.0 {
                return true;
            }
            sum_sq += dsq;
        }
        let value = (sum_sq / n as f64).sqrt();
        if value > self.params.max_rmsd {
            return true;
        }

        self.out.push(CorrespondenceResult {
            conformer_location: self.conformer_location,
            db_id: self.db_id,
            num_dbs: self.num_dbs,
            correspondence: self.correspondence.clone(),
            rmsd: aligned,
            weighted_residual: value,
        });
        self.this_conf_count += 1;
        if self.params.orientations_per_conf != 0 && self.this_conf_count >= self.params.orientations_per_conf {
            return false;
        }
        true
    }
}

/// Runs the backtracking correspondence search for one conformer's matches,
/// returning every accepted alignment up to the orientation cap.
///
/// `num_slots` is the total number of query-triangle slots (`matches` may be
/// sparse; slots with no matches contribute an empty candidate list, which
/// makes the recursion a no-op for that slot — callers should only invoke
/// this for conformers that passed the aggregator's "every slot has >=1
/// entry" screen).
#[must_use]
pub fn generate_correspondences(
    matches: &ConformerMatches,
    num_slots: usize,
    query_points: &[QueryPoint],
    db_id: u32,
    num_dbs: u32,
    params: CorrespondenceParams,
) -> Vec<CorrespondenceResult> {
    let mut slots: Vec<Vec<TripletMatch>> = vec![Vec::new(); num_slots];
    for m in &matches.matches {
        slots[m.slot].push(*m);
    }

    let mut search = Search {
        slots: &slots,
        query_points,
        params,
        conformer_location: matches.conformer_location,
        db_id,
        num_dbs,
        correspondence: vec![-1; query_points.len()],
        query_coords: Vec::with_capacity(query_points.len()),
        mol_coords: Vec::with_capacity(query_points.len()),
        weights: Vec::with_capacity(query_points.len()),
        this_conf_count: 0,
        out: Vec::new(),
    };
    search.generate(num_slots as isize - 1, Bitmask128::new());
    search.out
}
