//! Hash table population from voxel coordinates.
//!
//! This is the step upstream of the query: voxelize each batch element's
//! points, assign compact voxel indices in batch order, then insert every
//! voxel's key into its element's segment.

use std::collections::HashSet;

use tracing::debug;

use super::{probe_start, Insert, VoxelHashTable};
use crate::batch::BatchLayout;
use crate::error::{HashBuildError, QueryError};
use crate::grid::{GridParams, VoxelCoord};

/// Unique occupied voxels of a batched point cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupiedVoxels {
    /// Voxel coordinates, grouped by batch element, first-seen order within each.
    /// The position in this vector is the compact voxel index.
    pub coords: Vec<VoxelCoord>,
    /// Voxels per batch element.
    pub v_bs_cnt: Vec<u32>,
}

/// Collect the in-grid voxels touched by each batch element's points.
///
/// Points outside the grid are skipped, so they never get a voxel and will
/// resolve to "no voxel" at query time. `p_bs_cnt` must sum to
/// `points.len()`.
pub fn occupied_voxels(
    grid: &GridParams,
    p_bs_cnt: &[u32],
    points: &[[f32; 3]],
) -> Result<OccupiedVoxels, QueryError> {
    let expected: usize = p_bs_cnt.iter().map(|&c| c as usize).sum();
    if expected != points.len() {
        return Err(QueryError::PointCountMismatch {
            expected,
            actual: points.len(),
        });
    }

    let mut coords = Vec::new();
    let mut v_bs_cnt = Vec::with_capacity(p_bs_cnt.len());
    let mut start = 0usize;

    for &count in p_bs_cnt {
        let end = start + count as usize;
        let mut seen = HashSet::new();
        let before = coords.len();

        for point in &points[start..end] {
            if let Some(coord) = grid.quantize(point) {
                if seen.insert(coord) {
                    coords.push(coord);
                }
            }
        }

        v_bs_cnt.push((coords.len() - before) as u32);
        start = end;
    }

    Ok(OccupiedVoxels { coords, v_bs_cnt })
}

impl VoxelHashTable {
    /// Build a table mapping each voxel's key to its global voxel index.
    ///
    /// `voxel_coords[v]` is the coordinate of global voxel `v`; voxels are
    /// attributed to batch elements through `layout`'s voxel ranges.
    pub fn build(
        grid: &GridParams,
        layout: &BatchLayout,
        voxel_coords: &[VoxelCoord],
    ) -> Result<Self, HashBuildError> {
        if voxel_coords.len() != layout.num_voxels() {
            return Err(HashBuildError::VoxelCountMismatch {
                expected: layout.num_voxels(),
                actual: voxel_coords.len(),
            });
        }

        let capacity = layout.max_hash_size();
        let mut table = Self::empty(layout.batch_size(), capacity);

        for b in 0..layout.batch_size() {
            let mut max_displacement = 0usize;

            for v in layout.voxel_range(b) {
                let coord = voxel_coords[v];
                if !grid.contains(coord) {
                    return Err(HashBuildError::VoxelOutOfGrid(coord));
                }
                let key = grid.pack_key(coord);

                match table.insert(b, key, v as i32) {
                    Insert::Placed(slot) => {
                        let start = probe_start(key, capacity);
                        let displacement = (slot + capacity - start) % capacity;
                        max_displacement = max_displacement.max(displacement);
                    }
                    Insert::Duplicate => {
                        return Err(HashBuildError::DuplicateVoxel { batch: b, coord });
                    }
                    Insert::Full => {
                        return Err(HashBuildError::SegmentFull { batch: b, capacity });
                    }
                }
            }

            debug!(
                batch = b,
                voxels = layout.voxel_range(b).len(),
                load_factor = layout.voxel_range(b).len() as f64 / capacity as f64,
                max_displacement,
                "built hash segment"
            );
        }

        Ok(table)
    }
}
