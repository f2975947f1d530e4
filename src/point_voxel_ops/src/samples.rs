//! Per-voxel sample table and query statistics.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Fixed-capacity sample rows, one per voxel.
///
/// Row `v` occupies `[v * num_samples, (v + 1) * num_samples)` in both
/// buffers. Valid slots always form a prefix of the row; the rest hold
/// [`EMPTY`](crate::hash_table::EMPTY) in `v_map` and `false` in `v_mask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelSamples {
    /// Global point indices [V * num_samples].
    pub v_map: Vec<i32>,
    /// Slot validity [V * num_samples].
    pub v_mask: Vec<bool>,
    /// Slots per voxel.
    pub num_samples: usize,
}

impl VoxelSamples {
    /// Assemble the table from claimed slots and per-voxel claim counters.
    ///
    /// `claims[v]` is the number of points that tried to claim a slot in
    /// voxel `v`, including those dropped for a full quota.
    pub(crate) fn from_claims(v_map: Vec<i32>, claims: &[u32], num_samples: usize) -> Self {
        debug_assert_eq!(v_map.len(), claims.len() * num_samples);

        let mut v_mask = vec![false; v_map.len()];
        for (row, &claimed) in v_mask.chunks_exact_mut(num_samples).zip(claims) {
            let valid = (claimed as usize).min(num_samples);
            row[..valid].fill(true);
        }

        Self {
            v_map,
            v_mask,
            num_samples,
        }
    }

    pub fn num_voxels(&self) -> usize {
        if self.num_samples == 0 {
            0
        } else {
            self.v_map.len() / self.num_samples
        }
    }

    /// Sample row of voxel `v`, including invalid slots.
    pub fn row(&self, v: usize) -> &[i32] {
        &self.v_map[v * self.num_samples..(v + 1) * self.num_samples]
    }

    /// Validity flags of voxel `v`.
    pub fn mask_row(&self, v: usize) -> &[bool] {
        &self.v_mask[v * self.num_samples..(v + 1) * self.num_samples]
    }

    /// Number of valid slots in voxel `v`.
    pub fn valid_count(&self, v: usize) -> usize {
        self.mask_row(v).iter().take_while(|&&m| m).count()
    }

    /// Point indices sampled into voxel `v`.
    pub fn valid_indices(&self, v: usize) -> &[i32] {
        &self.row(v)[..self.valid_count(v)]
    }

    /// Per-voxel valid slot counts.
    pub fn valid_counts(&self) -> Vec<usize> {
        (0..self.num_voxels()).map(|v| self.valid_count(v)).collect()
    }

    /// `v_mask` as 0/1 integers, the layout consumers of integer masks expect.
    pub fn mask_as_i32(&self) -> Vec<i32> {
        self.v_mask.iter().map(|&m| m as i32).collect()
    }
}

/// What happened to a single point during the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointOutcome {
    /// Quantized outside the grid.
    OutOfGrid,
    /// In the grid, but its key has no bucket in the batch segment.
    Unmatched,
    /// Claimed a slot in its voxel.
    Sampled,
    /// Resolved to a voxel whose quota was already full.
    OverQuota,
}

/// Counters describing one query call.
///
/// `points_total` always equals the sum of the four outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    pub points_total: usize,
    pub points_sampled: usize,
    pub points_out_of_grid: usize,
    pub points_unmatched: usize,
    pub points_over_quota: usize,
    /// Voxels holding at least one valid sample.
    pub voxels_populated: usize,
}

impl QueryStats {
    pub(crate) fn record(mut self, outcome: PointOutcome) -> Self {
        self.points_total += 1;
        match outcome {
            PointOutcome::OutOfGrid => self.points_out_of_grid += 1,
            PointOutcome::Unmatched => self.points_unmatched += 1,
            PointOutcome::Sampled => self.points_sampled += 1,
            PointOutcome::OverQuota => self.points_over_quota += 1,
        }
        self
    }

    /// Points that resolved to a voxel, sampled or not.
    pub fn points_resolved(&self) -> usize {
        self.points_sampled + self.points_over_quota
    }
}

impl Add for QueryStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            points_total: self.points_total + rhs.points_total,
            points_sampled: self.points_sampled + rhs.points_sampled,
            points_out_of_grid: self.points_out_of_grid + rhs.points_out_of_grid,
            points_unmatched: self.points_unmatched + rhs.points_unmatched,
            points_over_quota: self.points_over_quota + rhs.points_over_quota,
            voxels_populated: self.voxels_populated + rhs.voxels_populated,
        }
    }
}

impl AddAssign for QueryStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
