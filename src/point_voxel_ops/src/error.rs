//! Error types for input validation and hash table construction.
//!
//! The query pass itself never fails: out-of-grid points, missing hash keys
//! and full voxels are silent exclusions. Everything here is raised before
//! the pass starts.

use thiserror::Error;

use crate::grid::VoxelCoord;

/// Rejected query inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("voxel size must be finite and positive, got {0:?}")]
    InvalidVoxelSize([f32; 3]),

    #[error("grid extent must be non-zero on every axis, got {0:?}")]
    InvalidGridSize([u32; 3]),

    #[error("grid of {volume} voxels does not fit the i32 key space")]
    GridTooLarge { volume: u64 },

    #[error("num_samples must be at least 1")]
    ZeroSamples,

    #[error("max_hash_size must be at least 1")]
    ZeroHashSize,

    #[error("batch count length mismatch: p_bs_cnt has {points} entries, v_bs_cnt has {voxels}")]
    BatchLengthMismatch { points: usize, voxels: usize },

    #[error("p_bs_cnt sums to {expected} points but {actual} were given")]
    PointCountMismatch { expected: usize, actual: usize },

    #[error("{0} points exceed the i32 index range of v_map")]
    TooManyPoints(usize),

    #[error("sample table of {voxels} voxels x {num_samples} samples overflows")]
    SampleTableTooLarge { voxels: usize, num_samples: usize },

    #[error("{batch_size} hash segments of {max_hash_size} buckets overflow the table length")]
    HashTableTooLarge {
        batch_size: usize,
        max_hash_size: usize,
    },

    #[error("hash table has {actual} buckets, expected {expected} (batch size x max_hash_size)")]
    HashTableSizeMismatch { expected: usize, actual: usize },

    #[error("hash bucket {slot} of batch {batch} holds key {key} outside the grid")]
    MalformedBucket { batch: usize, slot: usize, key: i32 },

    #[error("hash bucket {slot} of batch {batch} points at voxel {index}, outside the batch's voxel range")]
    VoxelIndexOutOfRange {
        batch: usize,
        slot: usize,
        index: i32,
    },
}

/// Failures while populating a hash table from voxel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashBuildError {
    #[error("hash segment of batch {batch} is full ({capacity} buckets)")]
    SegmentFull { batch: usize, capacity: usize },

    #[error("voxel {coord:?} appears twice in batch {batch}")]
    DuplicateVoxel { batch: usize, coord: VoxelCoord },

    #[error("voxel {0:?} lies outside the grid")]
    VoxelOutOfGrid(VoxelCoord),

    #[error("layout expects {expected} voxels but {actual} coordinates were given")]
    VoxelCountMismatch { expected: usize, actual: usize },
}
