//! Triplet match aggregation (C3): range-query every ordering of every
//! query triangle, then stream the results grouped by conformer location in
//! ascending order.
//!
//! A "slot" is one query triangle (`Triplet`); each of its up to six point
//! orderings (`QueryTriplet`) is tried against the index separately, since
//! the index record's three point slots may bind to the query's three
//! points in any consistent order. All orderings matched for a slot feed the
//! same candidate list C4 iterates for that slot. A slot's matches come back
//! sorted by `d12`, not by conformer location, so grouping by conformer
//! requires a k-way merge across slots rather than a single linear scan.

use crate::error::Error;
use crate::storage::{IndexRecord, TableRegistry};
use crate::triplet::{QueryTriplet, Triplet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One matched index record bound to a specific query-triangle slot and
/// point ordering.
#[derive(Debug, Clone, Copy)]
pub struct TripletMatch {
    /// Index of the query triangle (`Triplet`) this match belongs to.
    pub slot: usize,
    /// Global query-point index bound to each record vertex 0,1,2.
    pub order: [usize; 3],
    /// The matched on-disk record.
    pub record: IndexRecord,
}

/// One slot's accumulated candidates (from every ordering tried), sorted
/// ascending by `mol_loc` to support the k-way merge in
/// [`merge_by_conformer`].
struct SlotMatches {
    slot: usize,
    records: Vec<(usize, [usize; 3], IndexRecord)>,
    cursor: usize,
}

impl SlotMatches {
    fn peek(&self) -> Option<&(usize, [usize; 3], IndexRecord)> {
        self.records.get(self.cursor)
    }

    fn pop(&mut self) -> TripletMatch {
        let (_, order, record) = self.records[self.cursor];
        self.cursor += 1;
        TripletMatch { slot: self.slot, order, record }
    }
}

/// One conformer's worth of matches across all slots, in the order the
/// merge discovered them.
#[derive(Debug, Clone)]
pub struct ConformerMatches {
    /// Conformer (molecule orientation) location this group belongs to.
    pub conformer_location: u64,
    /// Matches contributed by any slot for this conformer.
    pub matches: Vec<TripletMatch>,
}

/// Runs the range query for every ordering of every query triangle, deriving
/// per-edge tolerance from the endpoints' tolerance radii (the sum of the
/// two radii spanning each edge — the more generous bound, since canonical
/// distance order doesn't track which specific endpoints a given distance
/// spans once points are permuted), then merges the per-slot results into
/// conformer-grouped batches in ascending conformer-location order.
///
/// # Errors
///
/// Propagates `Error::Io`/`Error::InvalidIndex` from opening a table.
pub fn collect(registry: &TableRegistry, triangles: &[Triplet]) -> Result<Vec<ConformerMatches>, Error> {
    let mut slot_matches = Vec::with_capacity(triangles.len());
    for (slot, triplet) in triangles.iter().enumerate() {
        let mut records: Vec<(usize, [usize; 3], IndexRecord)> = Vec::new();
        for qt in QueryTriplet::enumerate(*triplet) {
            let key = qt.triplet.type_triple();
            let Some(table) = registry.get_or_open(key)? else {
                continue;
            };
            let d = qt.triplet.distances;
            let r0 = qt.point(0).point.radius;
            let r1 = qt.point(1).point.radius;
            let r2 = qt.point(2).point.radius;
            let delta = (r0 + r1).max(r1 + r2).max(r0 + r2);
            let global_order = [
                qt.point(0).index,
                qt.point(1).index,
                qt.point(2).index,
            ];
            for record in table.range_query(d.d_small, d.d_mid, d.d_large, delta) {
                records.push((0, global_order, record));
            }
        }
        if records.is_empty() {
            continue;
        }
        records.sort_unstable_by_key(|(_, _, r)| r.mol_loc);
        slot_matches.push(SlotMatches { slot, records, cursor: 0 });
    }
    Ok(merge_by_conformer(slot_matches))
}

fn merge_by_conformer(mut slots: Vec<SlotMatches>) -> Vec<ConformerMatches> {
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    for (i, s) in slots.iter().enumerate() {
        if let Some((_, _, rec)) = s.peek() {
            heap.push(Reverse((rec.mol_loc, i)));
        }
    }

    let mut out: Vec<ConformerMatches> = Vec::new();
    while let Some(Reverse((mol_loc, i))) = heap.pop() {
        let m = slots[i].pop();
        if let Some((_, _, rec)) = slots[i].peek() {
            heap.push(Reverse((rec.mol_loc, i)));
        }
        match out.last_mut() {
            Some(group) if group.conformer_location == mol_loc => group.matches.push(m),
            _ => out.push(ConformerMatches { conformer_location: mol_loc, matches: vec![m] }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(mol_loc: u64) -> IndexRecord {
        IndexRecord {
            d12: 100,
            d13: 150,
            d23: 200,
            mol_loc,
            p_idx: [0, 1, 2],
            reduced_xyz: [[0, 0, 0], [0, 0, 0], [0, 0, 0]],
            flags: 0,
        }
    }

    fn slot(slot_idx: usize, locs: &[u64]) -> SlotMatches {
        SlotMatches {
            slot: slot_idx,
            records: locs.iter().map(|&l| (0, [0, 1, 2], rec(l))).collect(),
            cursor: 0,
        }
    }

    #[test]
    fn merge_groups_same_conformer_across_slots() {
        let slots = vec![slot(0, &[1, 3, 5]), slot(1, &[1, 2, 5])];
        let groups = merge_by_conformer(slots);
        let locations: Vec<u64> = groups.iter().map(|g| g.conformer_location).collect();
        assert_eq!(locations, vec![1, 2, 3, 5]);
        assert_eq!(groups[0].matches.len(), 2);
        assert_eq!(groups[1].matches.len(), 1);
    }

    #[test]
    fn merge_is_ascending_with_single_slot() {
        let sorted_input = slot(0, &[1, 4, 9]);
        let groups = merge_by_conformer(vec![sorted_input]);
        let locations: Vec<u64> = groups.iter().map(|g| g.conformer_location).collect();
        assert_eq!(locations, vec![1, 4, 9]);
    }

    #[test]
    fn empty_slots_yield_no_groups() {
        assert!(merge_by_conformer(vec![]).is_empty());
    }
}
