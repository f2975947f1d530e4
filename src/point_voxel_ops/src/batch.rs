//! Batch partitioning of the flattened point, voxel and hash arrays.
//!
//! Each batch element owns a contiguous run of points, a contiguous run of
//! voxels and one fixed-size hash segment. The ranges are derived once per
//! query by prefix-summing the per-element counts and then shared by the
//! resolver and the sampler.

use std::ops::Range;

use crate::error::QueryError;

/// Prefix-summed ownership ranges for one batched query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    /// Exclusive prefix sum of `p_bs_cnt` [B + 1].
    point_offsets: Vec<usize>,
    /// Exclusive prefix sum of `v_bs_cnt` [B + 1].
    voxel_offsets: Vec<usize>,
    /// Buckets per hash segment.
    max_hash_size: usize,
}

impl BatchLayout {
    /// Derive the layout from per-element point and voxel counts.
    ///
    /// Zero counts are valid and produce empty ranges.
    pub fn new(
        p_bs_cnt: &[u32],
        v_bs_cnt: &[u32],
        max_hash_size: usize,
    ) -> Result<Self, QueryError> {
        if p_bs_cnt.len() != v_bs_cnt.len() {
            return Err(QueryError::BatchLengthMismatch {
                points: p_bs_cnt.len(),
                voxels: v_bs_cnt.len(),
            });
        }
        if max_hash_size == 0 {
            return Err(QueryError::ZeroHashSize);
        }
        // Every segment range and the table length derive from this product
        if p_bs_cnt.len().checked_mul(max_hash_size).is_none() {
            return Err(QueryError::HashTableTooLarge {
                batch_size: p_bs_cnt.len(),
                max_hash_size,
            });
        }

        Ok(Self {
            point_offsets: prefix_sum(p_bs_cnt),
            voxel_offsets: prefix_sum(v_bs_cnt),
            max_hash_size,
        })
    }

    /// Number of batch elements.
    pub fn batch_size(&self) -> usize {
        self.point_offsets.len() - 1
    }

    pub fn num_points(&self) -> usize {
        self.point_offsets[self.batch_size()]
    }

    pub fn num_voxels(&self) -> usize {
        self.voxel_offsets[self.batch_size()]
    }

    pub fn max_hash_size(&self) -> usize {
        self.max_hash_size
    }

    /// Total buckets across all hash segments.
    pub fn hash_table_len(&self) -> usize {
        self.batch_size() * self.max_hash_size
    }

    /// Points owned by batch element `b`.
    pub fn point_range(&self, b: usize) -> Range<usize> {
        self.point_offsets[b]..self.point_offsets[b + 1]
    }

    /// Voxels owned by batch element `b`.
    pub fn voxel_range(&self, b: usize) -> Range<usize> {
        self.voxel_offsets[b]..self.voxel_offsets[b + 1]
    }

    /// Hash buckets owned by batch element `b`.
    pub fn hash_range(&self, b: usize) -> Range<usize> {
        b * self.max_hash_size..(b + 1) * self.max_hash_size
    }

    /// Point prefix sums [B + 1].
    pub fn point_offsets(&self) -> &[usize] {
        &self.point_offsets
    }

    /// Voxel prefix sums [B + 1].
    pub fn voxel_offsets(&self) -> &[usize] {
        &self.voxel_offsets
    }

    /// Batch element owning global point `i`.
    pub fn batch_of_point(&self, i: usize) -> Option<usize> {
        owner(&self.point_offsets, i)
    }

    /// Batch element owning global voxel `v`.
    pub fn batch_of_voxel(&self, v: usize) -> Option<usize> {
        owner(&self.voxel_offsets, v)
    }
}

fn prefix_sum(counts: &[u32]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    let mut sum = 0usize;
    offsets.push(sum);
    for &count in counts {
        sum += count as usize;
        offsets.push(sum);
    }
    offsets
}

/// Find `b` with `offsets[b] <= i < offsets[b + 1]`.
///
/// Empty ranges are skipped: the last element whose start is `<= i` owns `i`.
fn owner(offsets: &[usize], i: usize) -> Option<usize> {
    if i >= offsets[offsets.len() - 1] {
        return None;
    }
    Some(offsets.partition_point(|&start| start <= i) - 1)
}
