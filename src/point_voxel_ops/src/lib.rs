//! Batched point-to-voxel hash query with bounded per-voxel sampling.
//!
//! Given a batch of point clouds, the voxels occupied by each cloud and a
//! per-cloud hash table from voxel keys to voxel indices, this library
//! gathers up to `num_samples` point indices for every voxel. It is the
//! grouping step of voxel-based point feature extractors.
//!
//! # Architecture
//!
//! The query is split into phases:
//! - Partition: prefix-sum the per-element counts into ownership ranges
//! - Resolve: quantize each point and probe its element's hash segment
//! - Sample: claim one of the voxel's slots, dropping points once it is full
//!
//! Upstream of the query, [`occupied_voxels`] and [`VoxelHashTable::build`]
//! produce the voxel list and hash table from raw clouds.
//!
//! # Usage
//!
//! ```ignore
//! use point_voxel_ops::{occupied_voxels, BatchLayout, GridParams, VoxelHashTable, VoxelQuery};
//!
//! let grid = GridParams::new([0.05, 0.05, 0.1], [1408, 1600, 40]);
//! let occupied = occupied_voxels(&grid, &p_bs_cnt, &points)?;
//! let layout = BatchLayout::new(&p_bs_cnt, &occupied.v_bs_cnt, 400_000)?;
//! let table = VoxelHashTable::build(&grid, &layout, &occupied.coords)?;
//!
//! let query = VoxelQuery::builder().grid(grid).num_samples(16).build()?;
//! let result = query.run(&p_bs_cnt, &occupied.v_bs_cnt, &points, table.buckets())?;
//! println!("sampled {} of {} points", result.stats.points_sampled, result.stats.points_total);
//! ```

pub mod batch;
pub mod error;
pub mod grid;
pub mod hash_table;
pub mod query;
pub mod samples;
pub mod test_utils;
pub mod timing;

pub use batch::BatchLayout;
pub use error::{HashBuildError, QueryError};
pub use grid::{GridParams, VoxelCoord};
pub use hash_table::{
    lookup, occupied_voxels, probe_start, Bucket, OccupiedVoxels, VoxelHashTable, EMPTY,
};
pub use samples::{QueryStats, VoxelSamples};
pub use timing::QueryTiming;

// High-level API (recommended for most users)
pub use query::{
    query_voxel_samples, validate_inputs, QueryBackend, QueryResult, VoxelQuery, VoxelQueryBuilder,
    VoxelQueryConfig,
};

// GPU backend (optional, for direct device access)
#[cfg(feature = "cuda")]
pub use query::GpuVoxelQuery;
