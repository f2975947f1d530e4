//! Batched point-to-voxel query with bounded per-voxel sampling.
//!
//! One pass over all points: each point is attributed to its batch element,
//! quantized, looked up in that element's hash segment, and, if it lands in
//! a tracked voxel, claims one of the voxel's `num_samples` slots.
//!
//! Three backends share the same semantics:
//! - `Serial`: deterministic, slots filled in point order
//! - `Parallel`: rayon, one atomic fetch-add per resolving point
//! - `Gpu`: CubeCL kernel (requires the `cuda` feature), falls back to
//!   `Parallel` when unavailable
//!
//! # Example
//!
//! ```ignore
//! use point_voxel_ops::{VoxelQuery, QueryBackend};
//!
//! let query = VoxelQuery::builder()
//!     .voxel_size([0.05, 0.05, 0.1])
//!     .grid_size([1408, 1600, 40])
//!     .num_samples(16)
//!     .max_hash_size(400_000)
//!     .backend(QueryBackend::Parallel)
//!     .build()?;
//!
//! let result = query.run(&p_bs_cnt, &v_bs_cnt, &points, table.buckets())?;
//! let rows = &result.samples.v_map;
//! ```

mod cpu;
#[cfg(feature = "cuda")]
mod gpu;
#[cfg(feature = "cuda")]
mod kernels;

pub use cpu::{sample_voxels_parallel, sample_voxels_serial};
#[cfg(feature = "cuda")]
pub use gpu::GpuVoxelQuery;
#[cfg(feature = "cuda")]
pub use kernels::point_to_voxel_query_kernel;

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::batch::BatchLayout;
use crate::error::QueryError;
use crate::grid::GridParams;
use crate::hash_table::{Bucket, EMPTY};
use crate::samples::{QueryStats, VoxelSamples};
use crate::time_phase;
use crate::timing::{QueryTiming, TimingCollector};

/// Below this many points the GPU backend runs on CPU threads instead;
/// upload and launch overhead dominate for small clouds.
pub const GPU_MIN_POINTS: usize = 10_000;

/// Execution strategy for the sampling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryBackend {
    Serial,
    #[default]
    Parallel,
    Gpu,
}

/// Configuration for a voxel query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelQueryConfig {
    /// Voxel grid the points are quantized against.
    pub grid: GridParams,
    /// Slots per voxel.
    pub num_samples: usize,
    /// Buckets per batch element's hash segment.
    pub max_hash_size: usize,
    /// Execution strategy.
    pub backend: QueryBackend,
}

impl Default for VoxelQueryConfig {
    fn default() -> Self {
        Self {
            grid: GridParams::default(),
            num_samples: 16,
            max_hash_size: 400_000,
            backend: QueryBackend::default(),
        }
    }
}

impl VoxelQueryConfig {
    pub fn validate(&self) -> Result<(), QueryError> {
        self.grid.validate()?;
        if self.num_samples == 0 {
            return Err(QueryError::ZeroSamples);
        }
        if self.max_hash_size == 0 {
            return Err(QueryError::ZeroHashSize);
        }
        Ok(())
    }
}

/// Builder for [`VoxelQuery`].
#[derive(Debug, Clone, Default)]
pub struct VoxelQueryBuilder {
    config: VoxelQueryConfig,
}

impl VoxelQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole grid description.
    pub fn grid(mut self, grid: GridParams) -> Self {
        self.config.grid = grid;
        self
    }

    /// Set voxel edge lengths `(x_size, y_size, z_size)`.
    pub fn voxel_size(mut self, voxel_size: [f32; 3]) -> Self {
        self.config.grid.voxel_size = voxel_size.into();
        self
    }

    /// Set grid extent `(x_max, y_max, z_max)` in voxels.
    pub fn grid_size(mut self, grid_size: [u32; 3]) -> Self {
        self.config.grid.grid_size = grid_size.into();
        self
    }

    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.config.num_samples = num_samples;
        self
    }

    pub fn max_hash_size(mut self, max_hash_size: usize) -> Self {
        self.config.max_hash_size = max_hash_size;
        self
    }

    pub fn backend(mut self, backend: QueryBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &VoxelQueryConfig {
        &self.config
    }

    pub fn build(self) -> Result<VoxelQuery> {
        VoxelQuery::new(self.config)
    }
}

/// Output of [`VoxelQuery::run`].
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Per-voxel sample rows and validity mask.
    pub samples: VoxelSamples,
    /// Point outcome counters.
    pub stats: QueryStats,
    /// Phase timing (zeros unless built with `profiling`).
    pub timing: QueryTiming,
    /// Whether the sampling pass ran on the GPU.
    pub used_gpu: bool,
}

/// A configured, reusable voxel query executor.
///
/// Holds no per-call state: every [`VoxelQuery::run`] allocates and returns
/// its own output.
pub struct VoxelQuery {
    config: VoxelQueryConfig,
    #[cfg(feature = "cuda")]
    gpu: Option<GpuVoxelQuery>,
}

impl VoxelQuery {
    /// Create an executor; fails on an invalid configuration.
    pub fn new(config: VoxelQueryConfig) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "cuda")]
        let gpu = match config.backend {
            QueryBackend::Gpu => match GpuVoxelQuery::new() {
                Ok(gpu) => Some(gpu),
                Err(e) => {
                    warn!("GPU voxel query unavailable ({e}), falling back to CPU");
                    None
                }
            },
            _ => None,
        };

        if cfg!(not(feature = "cuda")) && config.backend == QueryBackend::Gpu {
            warn!("built without the `cuda` feature, GPU backend runs on CPU threads");
        }

        Ok(Self {
            config,
            #[cfg(feature = "cuda")]
            gpu,
        })
    }

    pub fn builder() -> VoxelQueryBuilder {
        VoxelQueryBuilder::new()
    }

    pub fn config(&self) -> &VoxelQueryConfig {
        &self.config
    }

    /// Run the query over one batch.
    ///
    /// # Arguments
    /// * `p_bs_cnt` - Points per batch element [B]
    /// * `v_bs_cnt` - Voxels per batch element [B]
    /// * `points` - Flattened point cloud in batch order [N]
    /// * `hash_table` - `[key, voxel_index]` buckets [B * max_hash_size]
    pub fn run(
        &self,
        p_bs_cnt: &[u32],
        v_bs_cnt: &[u32],
        points: &[[f32; 3]],
        hash_table: &[Bucket],
    ) -> Result<QueryResult> {
        let mut collector = TimingCollector::new();
        collector.start_query();

        let layout = time_phase!(collector, "partition", {
            validate_inputs(&self.config, p_bs_cnt, v_bs_cnt, points, hash_table)
        })?;

        let (samples, stats, used_gpu) = time_phase!(collector, "sample", {
            self.sample(&layout, points, hash_table)
        });

        debug!(
            batch_size = layout.batch_size(),
            points = stats.points_total,
            voxels = layout.num_voxels(),
            sampled = stats.points_sampled,
            out_of_grid = stats.points_out_of_grid,
            unmatched = stats.points_unmatched,
            over_quota = stats.points_over_quota,
            voxels_populated = stats.voxels_populated,
            used_gpu,
            "voxel query finished"
        );

        Ok(QueryResult {
            samples,
            stats,
            timing: collector.finish(),
            used_gpu,
        })
    }

    fn sample(
        &self,
        layout: &BatchLayout,
        points: &[[f32; 3]],
        hash_table: &[Bucket],
    ) -> (VoxelSamples, QueryStats, bool) {
        let grid = &self.config.grid;
        let num_samples = self.config.num_samples;

        match self.config.backend {
            QueryBackend::Serial => {
                let (samples, stats) =
                    sample_voxels_serial(grid, layout, num_samples, points, hash_table);
                (samples, stats, false)
            }
            QueryBackend::Parallel => {
                let (samples, stats) =
                    sample_voxels_parallel(grid, layout, num_samples, points, hash_table);
                (samples, stats, false)
            }
            QueryBackend::Gpu => {
                if let Some((samples, stats)) = self.try_gpu(layout, points, hash_table) {
                    return (samples, stats, true);
                }
                let (samples, stats) =
                    sample_voxels_parallel(grid, layout, num_samples, points, hash_table);
                (samples, stats, false)
            }
        }
    }

    #[cfg(feature = "cuda")]
    fn try_gpu(
        &self,
        layout: &BatchLayout,
        points: &[[f32; 3]],
        hash_table: &[Bucket],
    ) -> Option<(VoxelSamples, QueryStats)> {
        let gpu = self.gpu.as_ref()?;
        if points.len() < GPU_MIN_POINTS || layout.num_voxels() == 0 {
            return None;
        }

        match gpu.sample(
            &self.config.grid,
            layout,
            self.config.num_samples,
            points,
            hash_table,
        ) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("GPU voxel query failed ({e}), falling back to CPU");
                None
            }
        }
    }

    #[cfg(not(feature = "cuda"))]
    fn try_gpu(
        &self,
        _layout: &BatchLayout,
        _points: &[[f32; 3]],
        _hash_table: &[Bucket],
    ) -> Option<(VoxelSamples, QueryStats)> {
        None
    }
}

/// Query per-voxel point samples on CPU threads.
///
/// Convenience wrapper around [`VoxelQuery`] with the `Parallel` backend.
/// Returns `v_map`/`v_mask` rows of `num_samples` slots per voxel; unfilled
/// slots hold [`EMPTY`] and `false`.
#[allow(clippy::too_many_arguments)]
pub fn query_voxel_samples(
    grid: &GridParams,
    num_samples: usize,
    max_hash_size: usize,
    p_bs_cnt: &[u32],
    v_bs_cnt: &[u32],
    points: &[[f32; 3]],
    hash_table: &[Bucket],
) -> Result<VoxelSamples> {
    let query = VoxelQuery::new(VoxelQueryConfig {
        grid: *grid,
        num_samples,
        max_hash_size,
        backend: QueryBackend::Parallel,
    })?;
    Ok(query.run(p_bs_cnt, v_bs_cnt, points, hash_table)?.samples)
}

/// Check every precondition of the sampling pass and derive the batch layout.
pub fn validate_inputs(
    config: &VoxelQueryConfig,
    p_bs_cnt: &[u32],
    v_bs_cnt: &[u32],
    points: &[[f32; 3]],
    hash_table: &[Bucket],
) -> Result<BatchLayout, QueryError> {
    config.validate()?;
    let layout = BatchLayout::new(p_bs_cnt, v_bs_cnt, config.max_hash_size)?;

    if layout.num_points() != points.len() {
        return Err(QueryError::PointCountMismatch {
            expected: layout.num_points(),
            actual: points.len(),
        });
    }
    if points.len() > i32::MAX as usize {
        return Err(QueryError::TooManyPoints(points.len()));
    }
    if layout
        .num_voxels()
        .checked_mul(config.num_samples)
        .is_none()
    {
        return Err(QueryError::SampleTableTooLarge {
            voxels: layout.num_voxels(),
            num_samples: config.num_samples,
        });
    }
    if hash_table.len() != layout.hash_table_len() {
        return Err(QueryError::HashTableSizeMismatch {
            expected: layout.hash_table_len(),
            actual: hash_table.len(),
        });
    }

    hash_table
        .par_chunks(layout.max_hash_size())
        .enumerate()
        .try_for_each(|(b, segment)| {
            let voxels = layout.voxel_range(b);
            for (slot, &[key, index]) in segment.iter().enumerate() {
                if key == EMPTY {
                    continue;
                }
                if !config.grid.is_valid_key(key) {
                    return Err(QueryError::MalformedBucket { batch: b, slot, key });
                }
                if index < 0 || !voxels.contains(&(index as usize)) {
                    return Err(QueryError::VoxelIndexOutOfRange {
                        batch: b,
                        slot,
                        index,
                    });
                }
            }
            Ok(())
        })?;

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VoxelCoord;
    use crate::hash_table::VoxelHashTable;
    use crate::test_utils::{make_clustered_cloud, BatchedScene};
    use std::collections::HashSet;

    fn unit_grid(extent: u32) -> GridParams {
        GridParams::new([1.0, 1.0, 1.0], [extent, extent, extent])
    }

    fn query(
        grid: GridParams,
        num_samples: usize,
        max_hash_size: usize,
        backend: QueryBackend,
    ) -> VoxelQuery {
        VoxelQuery::builder()
            .grid(grid)
            .num_samples(num_samples)
            .max_hash_size(max_hash_size)
            .backend(backend)
            .build()
            .unwrap()
    }

    /// Check the invariants every backend must uphold.
    fn assert_sample_invariants(scene: &BatchedScene, samples: &VoxelSamples, num_samples: usize) {
        let layout = scene.layout();

        for b in 0..layout.batch_size() {
            for v in layout.voxel_range(b) {
                let valid = samples.valid_indices(v);
                assert!(valid.len() <= num_samples);

                let unique: HashSet<_> = valid.iter().collect();
                assert_eq!(unique.len(), valid.len(), "voxel {v} holds a point twice");

                for &i in valid {
                    assert!(
                        layout.point_range(b).contains(&(i as usize)),
                        "point {i} sampled into voxel {v} of batch {b}"
                    );
                    let coord = scene.grid.quantize(&scene.points[i as usize]).unwrap();
                    assert_eq!(coord, scene.voxel_coords[v]);
                }

                for (slot, &m) in samples.mask_row(v).iter().enumerate() {
                    assert_eq!(m, slot < valid.len());
                }
            }
        }
    }

    #[test]
    fn test_three_points_one_voxel_quota_two() {
        let grid = unit_grid(2);
        let layout = BatchLayout::new(&[3], &[1], 8).unwrap();
        let table = VoxelHashTable::build(&grid, &layout, &[VoxelCoord::new(0, 0, 0)]).unwrap();
        let points = [[0.2, 0.3, 0.4], [0.5, 0.5, 0.5], [0.9, 0.1, 0.7]];

        for backend in [QueryBackend::Serial, QueryBackend::Parallel] {
            let result = query(grid, 2, 8, backend)
                .run(&[3], &[1], &points, table.buckets())
                .unwrap();

            let samples = &result.samples;
            assert_eq!(samples.v_mask, vec![true, true]);
            assert_ne!(samples.v_map[0], samples.v_map[1]);
            assert!(samples.v_map.iter().all(|i| (0..3).contains(i)));
            assert_eq!(result.stats.points_sampled, 2);
            assert_eq!(result.stats.points_over_quota, 1);
            assert!(!result.used_gpu);
        }
    }

    #[test]
    fn test_point_without_hash_entry_is_dropped() {
        let grid = unit_grid(2);
        let layout = BatchLayout::new(&[3], &[1], 8).unwrap();
        let table = VoxelHashTable::build(&grid, &layout, &[VoxelCoord::new(0, 0, 0)]).unwrap();
        // Point 1 lies in voxel (1, 1, 1), which has no bucket
        let points = [[0.5, 0.5, 0.5], [1.5, 1.5, 1.5], [0.7, 0.7, 0.7]];

        let samples =
            query_voxel_samples(&grid, 4, 8, &[3], &[1], &points, table.buckets()).unwrap();

        let mut valid = samples.valid_indices(0).to_vec();
        valid.sort_unstable();
        assert_eq!(valid, vec![0, 2]);
        assert_eq!(samples.mask_row(0), &[true, true, false, false]);
        assert_eq!(&samples.row(0)[2..], &[EMPTY, EMPTY]);
    }

    #[test]
    fn test_no_cross_batch_leakage() {
        // Both batch elements cover the same voxel coordinates
        let grid = unit_grid(4);
        let coords = [
            VoxelCoord::new(0, 0, 0),
            VoxelCoord::new(1, 0, 0),
            VoxelCoord::new(0, 0, 0),
            VoxelCoord::new(1, 0, 0),
            VoxelCoord::new(2, 0, 0),
        ];
        let layout = BatchLayout::new(&[5, 4], &[2, 3], 16).unwrap();
        let table = VoxelHashTable::build(&grid, &layout, &coords).unwrap();
        let points = [
            [0.5, 0.5, 0.5],
            [1.5, 0.5, 0.5],
            [0.2, 0.2, 0.2],
            [1.1, 0.9, 0.1],
            [2.5, 0.5, 0.5], // voxel (2,0,0) is not tracked in batch 0
            [0.5, 0.5, 0.5],
            [1.5, 0.5, 0.5],
            [2.5, 0.5, 0.5],
            [0.9, 0.9, 0.9],
        ];

        for backend in [QueryBackend::Serial, QueryBackend::Parallel] {
            let result = query(grid, 4, 16, backend)
                .run(&[5, 4], &[2, 3], &points, table.buckets())
                .unwrap();
            let samples = &result.samples;

            for v in 0..2 {
                assert!(samples.valid_indices(v).iter().all(|&i| i < 5));
            }
            for v in 2..5 {
                assert!(samples.valid_indices(v).iter().all(|&i| (5..9).contains(&i)));
            }
            assert_eq!(samples.valid_counts(), vec![2, 2, 2, 1, 1]);
            assert_eq!(result.stats.points_unmatched, 1);
        }
    }

    #[test]
    fn test_serial_is_deterministic() {
        let scene = BatchedScene::from_clouds(
            unit_grid(16),
            &[
                make_clustered_cloud([4.0, 4.0, 4.0], 1.5, 400, 1),
                make_clustered_cloud([8.0, 8.0, 8.0], 2.0, 300, 2),
            ],
            256,
        )
        .unwrap();
        let query = query(scene.grid, 3, 256, QueryBackend::Serial);

        let first = scene.run(&query).unwrap();
        let second = scene.run(&query).unwrap();

        assert_eq!(first.samples, second.samples);
        assert_sample_invariants(&scene, &first.samples, 3);

        // Serial claims in point order: each row holds the lowest indices
        let layout = scene.layout();
        for v in 0..layout.num_voxels() {
            let valid = first.samples.valid_indices(v);
            assert!(valid.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_parallel_counts_match_serial() {
        let scene = BatchedScene::from_clouds(
            unit_grid(32),
            &[
                make_clustered_cloud([10.0, 10.0, 10.0], 3.0, 5_000, 7),
                Vec::new(),
                make_clustered_cloud([20.0, 12.0, 6.0], 4.0, 3_000, 8),
            ],
            2048,
        )
        .unwrap();

        let serial = scene.run(&query(scene.grid, 5, 2048, QueryBackend::Serial)).unwrap();
        let parallel = query(scene.grid, 5, 2048, QueryBackend::Parallel);

        for _ in 0..3 {
            let result = scene.run(&parallel).unwrap();
            assert_eq!(result.samples.valid_counts(), serial.samples.valid_counts());
            assert_eq!(result.stats, serial.stats);
            assert_sample_invariants(&scene, &result.samples, 5);
        }
    }

    #[test]
    fn test_spare_capacity_keeps_every_point() {
        let scene = BatchedScene::from_clouds(
            unit_grid(8),
            &[make_clustered_cloud([4.0, 4.0, 4.0], 1.0, 50, 3)],
            512,
        )
        .unwrap();

        // Quota larger than the cloud: nothing can be dropped
        let result = scene.run(&query(scene.grid, 64, 512, QueryBackend::Parallel)).unwrap();

        let mut all: Vec<i32> = (0..scene.layout().num_voxels())
            .flat_map(|v| result.samples.valid_indices(v).to_vec())
            .collect();
        all.sort_unstable();
        let in_grid: Vec<i32> = (0..scene.points.len() as i32)
            .filter(|&i| scene.grid.quantize(&scene.points[i as usize]).is_some())
            .collect();
        assert_eq!(all, in_grid);
        assert_eq!(result.stats.points_over_quota, 0);
        assert_eq!(result.stats.points_unmatched, 0);
    }

    #[test]
    fn test_gpu_backend_falls_back_for_small_inputs() {
        let grid = unit_grid(2);
        let layout = BatchLayout::new(&[1], &[1], 4).unwrap();
        let table = VoxelHashTable::build(&grid, &layout, &[VoxelCoord::new(1, 1, 1)]).unwrap();

        let result = query(grid, 2, 4, QueryBackend::Gpu)
            .run(&[1], &[1], &[[1.5, 1.5, 1.5]], table.buckets())
            .unwrap();

        assert!(!result.used_gpu);
        assert_eq!(result.samples.v_map, vec![0, EMPTY]);
        assert_eq!(result.samples.v_mask, vec![true, false]);
    }

    #[test]
    fn test_empty_inputs() {
        let result = query(unit_grid(2), 2, 4, QueryBackend::Parallel)
            .run(&[], &[], &[], &[])
            .unwrap();
        assert!(result.samples.v_map.is_empty());
        assert_eq!(result.stats, QueryStats::default());

        // Voxels without points keep every slot invalid
        let grid = unit_grid(2);
        let layout = BatchLayout::new(&[0], &[2], 4).unwrap();
        let coords = [VoxelCoord::new(0, 0, 0), VoxelCoord::new(1, 0, 0)];
        let table = VoxelHashTable::build(&grid, &layout, &coords).unwrap();
        let result = query(grid, 3, 4, QueryBackend::Serial)
            .run(&[0], &[2], &[], table.buckets())
            .unwrap();
        assert_eq!(result.samples.v_map, vec![EMPTY; 6]);
        assert_eq!(result.samples.v_mask, vec![false; 6]);
    }

    #[test]
    fn test_validation_errors() {
        let config = VoxelQueryConfig {
            grid: unit_grid(4),
            num_samples: 2,
            max_hash_size: 4,
            backend: QueryBackend::Serial,
        };
        let empty = [[EMPTY, EMPTY]; 4];

        assert_eq!(
            validate_inputs(&config, &[2], &[0], &[[0.5; 3]], &empty),
            Err(QueryError::PointCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            validate_inputs(&config, &[1], &[0], &[[0.5; 3]], &empty[..3]),
            Err(QueryError::HashTableSizeMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            validate_inputs(&config, &[1, 0], &[0], &[[0.5; 3]], &empty),
            Err(QueryError::BatchLengthMismatch {
                points: 2,
                voxels: 1
            })
        );

        let mut bad_key = empty;
        bad_key[1] = [64, 0];
        assert_eq!(
            validate_inputs(&config, &[1], &[1], &[[0.5; 3]], &bad_key),
            Err(QueryError::MalformedBucket {
                batch: 0,
                slot: 1,
                key: 64
            })
        );

        // Voxel index belonging to another batch element
        let mut foreign = [[EMPTY, EMPTY]; 8];
        foreign[5] = [5, 0];
        assert_eq!(
            validate_inputs(&config, &[1, 1], &[1, 1], &[[0.5; 3]; 2], &foreign),
            Err(QueryError::VoxelIndexOutOfRange {
                batch: 1,
                slot: 1,
                index: 0
            })
        );

        let huge_segments = VoxelQueryConfig {
            max_hash_size: usize::MAX / 2 + 1,
            ..config.clone()
        };
        assert_eq!(
            validate_inputs(&huge_segments, &[0, 0], &[0, 0], &[], &[]),
            Err(QueryError::HashTableTooLarge {
                batch_size: 2,
                max_hash_size: usize::MAX / 2 + 1
            })
        );

        let zero_samples = VoxelQueryConfig {
            num_samples: 0,
            ..config.clone()
        };
        assert!(VoxelQuery::new(zero_samples).is_err());
    }

    #[test]
    fn test_config_serde() {
        let config: VoxelQueryConfig = serde_json::from_str(
            r#"{
                "grid": { "voxel_size": [0.1, 0.1, 0.2], "grid_size": [100, 80, 10] },
                "num_samples": 8,
                "backend": "serial"
            }"#,
        )
        .unwrap();

        approx::assert_relative_eq!(config.grid.voxel_size.z, 0.2);
        assert_eq!(config.grid.grid_size.y, 80);
        assert_eq!(config.num_samples, 8);
        assert_eq!(config.max_hash_size, VoxelQueryConfig::default().max_hash_size);
        assert_eq!(config.backend, QueryBackend::Serial);

        let json = serde_json::to_string(&config).unwrap();
        let back: VoxelQueryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
