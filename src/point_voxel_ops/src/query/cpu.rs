//! CPU implementations of the resolve-and-sample pass.
//!
//! Both functions assume inputs already passed validation. The serial pass
//! is the reference: it accepts points in ascending index order, so its
//! output is fully deterministic. The parallel pass claims slots with one
//! atomic fetch-add per resolving point; which points fill an over-quota
//! voxel depends on scheduling, how many never does.

use std::ops::Add;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use rayon::prelude::*;

use crate::batch::BatchLayout;
use crate::grid::GridParams;
use crate::hash_table::{lookup, Bucket, EMPTY};
use crate::samples::{PointOutcome, QueryStats, VoxelSamples};

/// Where a point landed after quantization and hash lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    OutOfGrid,
    Unmatched,
    Voxel(usize),
}

/// Quantize a point and probe its batch segment.
#[inline]
fn resolve_point(grid: &GridParams, segment: &[Bucket], point: &[f32; 3]) -> Resolution {
    let Some(coord) = grid.quantize(point) else {
        return Resolution::OutOfGrid;
    };
    match lookup(segment, grid.pack_key(coord)) {
        Some(voxel) => Resolution::Voxel(voxel),
        None => Resolution::Unmatched,
    }
}

/// Single-threaded pass; slots are claimed in point order.
pub fn sample_voxels_serial(
    grid: &GridParams,
    layout: &BatchLayout,
    num_samples: usize,
    points: &[[f32; 3]],
    hash_table: &[Bucket],
) -> (VoxelSamples, QueryStats) {
    let resolved = (0..layout.batch_size()).flat_map(|b| {
        let segment = &hash_table[layout.hash_range(b)];
        layout
            .point_range(b)
            .map(move |i| (i, resolve_point(grid, segment, &points[i])))
    });

    fill_slots(layout.num_voxels(), num_samples, resolved)
}

/// Claim slots for already-resolved points, in iteration order.
///
/// `resolved` yields `(point_index, resolution)` pairs; every point must
/// appear exactly once.
pub(crate) fn fill_slots(
    num_voxels: usize,
    num_samples: usize,
    resolved: impl IntoIterator<Item = (usize, Resolution)>,
) -> (VoxelSamples, QueryStats) {
    let mut v_map = vec![EMPTY; num_voxels * num_samples];
    let mut claims = vec![0u32; num_voxels];
    let mut stats = QueryStats::default();

    for (i, resolution) in resolved {
        let outcome = match resolution {
            Resolution::OutOfGrid => PointOutcome::OutOfGrid,
            Resolution::Unmatched => PointOutcome::Unmatched,
            Resolution::Voxel(v) => {
                let slot = claims[v] as usize;
                claims[v] += 1;
                if slot < num_samples {
                    v_map[v * num_samples + slot] = i as i32;
                    PointOutcome::Sampled
                } else {
                    PointOutcome::OverQuota
                }
            }
        };
        stats = stats.record(outcome);
    }

    stats.voxels_populated = claims.iter().filter(|&&c| c > 0).count();
    (VoxelSamples::from_claims(v_map, &claims, num_samples), stats)
}

/// Data-parallel pass, one rayon task per point.
pub fn sample_voxels_parallel(
    grid: &GridParams,
    layout: &BatchLayout,
    num_samples: usize,
    points: &[[f32; 3]],
    hash_table: &[Bucket],
) -> (VoxelSamples, QueryStats) {
    let claims: Vec<AtomicU32> = (0..layout.num_voxels()).map(|_| AtomicU32::new(0)).collect();
    let slots: Vec<AtomicI32> = (0..layout.num_voxels() * num_samples)
        .map(|_| AtomicI32::new(EMPTY))
        .collect();

    let mut stats = (0..layout.batch_size())
        .into_par_iter()
        .map(|b| {
            let segment = &hash_table[layout.hash_range(b)];

            layout
                .point_range(b)
                .into_par_iter()
                .fold(QueryStats::default, |stats, i| {
                    let outcome = match resolve_point(grid, segment, &points[i]) {
                        Resolution::OutOfGrid => PointOutcome::OutOfGrid,
                        Resolution::Unmatched => PointOutcome::Unmatched,
                        Resolution::Voxel(v) => claim_slot(
                            &claims[v],
                            &slots[v * num_samples..(v + 1) * num_samples],
                            i as i32,
                        ),
                    };
                    stats.record(outcome)
                })
                .reduce(QueryStats::default, QueryStats::add)
        })
        .reduce(QueryStats::default, QueryStats::add);

    let claims: Vec<u32> = claims.into_iter().map(AtomicU32::into_inner).collect();
    let v_map: Vec<i32> = slots.into_iter().map(AtomicI32::into_inner).collect();

    stats.voxels_populated = claims.iter().filter(|&&c| c > 0).count();
    (VoxelSamples::from_claims(v_map, &claims, num_samples), stats)
}

/// Claim the next free slot of a voxel row for `point`.
///
/// The pre-increment counter value is this point's slot; it is unique per
/// claimant, so no two points ever write the same slot.
#[inline]
fn claim_slot(counter: &AtomicU32, row: &[AtomicI32], point: i32) -> PointOutcome {
    let slot = counter.fetch_add(1, Ordering::Relaxed) as usize;
    match row.get(slot) {
        Some(cell) => {
            cell.store(point, Ordering::Relaxed);
            PointOutcome::Sampled
        }
        None => PointOutcome::OverQuota,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VoxelCoord;
    use crate::hash_table::VoxelHashTable;

    fn single_voxel_setup() -> (GridParams, BatchLayout, VoxelHashTable) {
        let grid = GridParams::new([1.0, 1.0, 1.0], [2, 2, 2]);
        let layout = BatchLayout::new(&[3], &[1], 8).unwrap();
        let table = VoxelHashTable::build(&grid, &layout, &[VoxelCoord::new(0, 0, 0)]).unwrap();
        (grid, layout, table)
    }

    #[test]
    fn test_resolve_point() {
        let (grid, _, table) = single_voxel_setup();
        let segment = table.segment(0);

        assert_eq!(resolve_point(&grid, segment, &[0.5, 0.5, 0.5]), Resolution::Voxel(0));
        assert_eq!(resolve_point(&grid, segment, &[1.5, 0.5, 0.5]), Resolution::Unmatched);
        assert_eq!(resolve_point(&grid, segment, &[2.5, 0.5, 0.5]), Resolution::OutOfGrid);
    }

    #[test]
    fn test_serial_accepts_first_points() {
        let (grid, layout, table) = single_voxel_setup();
        let points = [[0.1, 0.1, 0.1], [0.5, 0.5, 0.5], [0.9, 0.9, 0.9]];

        let (samples, stats) = sample_voxels_serial(&grid, &layout, 2, &points, table.buckets());

        assert_eq!(samples.v_map, vec![0, 1]);
        assert_eq!(samples.v_mask, vec![true, true]);
        assert_eq!(stats.points_sampled, 2);
        assert_eq!(stats.points_over_quota, 1);
        assert_eq!(stats.voxels_populated, 1);
    }

    #[test]
    fn test_fill_slots_counts_every_outcome() {
        let resolved = [
            (0, Resolution::Voxel(1)),
            (1, Resolution::OutOfGrid),
            (2, Resolution::Voxel(1)),
            (3, Resolution::Unmatched),
            (4, Resolution::Voxel(1)),
        ];

        let (samples, stats) = fill_slots(2, 2, resolved);

        assert_eq!(samples.v_map, vec![EMPTY, EMPTY, 0, 2]);
        assert_eq!(samples.v_mask, vec![false, false, true, true]);
        assert_eq!(stats.points_total, 5);
        assert_eq!(stats.points_sampled, 2);
        assert_eq!(stats.points_over_quota, 1);
        assert_eq!(stats.points_out_of_grid, 1);
        assert_eq!(stats.points_unmatched, 1);
        assert_eq!(stats.voxels_populated, 1);
    }

    #[test]
    fn test_parallel_respects_quota() {
        let (grid, layout, table) = single_voxel_setup();
        let points = [[0.1, 0.1, 0.1], [0.5, 0.5, 0.5], [0.9, 0.9, 0.9]];

        let (samples, stats) = sample_voxels_parallel(&grid, &layout, 2, &points, table.buckets());

        assert_eq!(samples.v_mask, vec![true, true]);
        let mut winners = samples.v_map.clone();
        winners.sort_unstable();
        winners.dedup();
        assert_eq!(winners.len(), 2);
        assert!(winners.iter().all(|&i| (0..3).contains(&i)));
        assert_eq!(stats.points_over_quota, 1);
    }

    #[test]
    fn test_claim_slot_never_overruns() {
        let counter = AtomicU32::new(0);
        let row: Vec<AtomicI32> = (0..4).map(|_| AtomicI32::new(EMPTY)).collect();

        let outcomes: Vec<_> = (0..64)
            .into_par_iter()
            .map(|i| claim_slot(&counter, &row, i))
            .collect();

        let sampled = outcomes
            .iter()
            .filter(|&&o| o == PointOutcome::Sampled)
            .count();
        assert_eq!(sampled, 4);
        assert_eq!(counter.load(Ordering::Relaxed), 64);

        let mut written: Vec<i32> = row.into_iter().map(AtomicI32::into_inner).collect();
        written.sort_unstable();
        written.dedup();
        assert_eq!(written.len(), 4);
        assert!(!written.contains(&EMPTY));
    }
}
