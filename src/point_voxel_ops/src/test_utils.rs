//! Synthetic batched scenes for exercising the voxel query.
//!
//! Provides deterministic point cloud generators and a fixture that runs the
//! full upstream pipeline (voxelize, index, hash) so tests can feed the query
//! the same inputs a detector would.

use anyhow::Result;

use crate::batch::BatchLayout;
use crate::grid::{GridParams, VoxelCoord};
use crate::hash_table::{occupied_voxels, VoxelHashTable};
use crate::query::{QueryResult, VoxelQuery};

/// Generate a cloud uniformly filling the cube `center ± half_extent`.
///
/// Uses a fixed LCG so the same `seed` always yields the same cloud.
pub fn make_clustered_cloud(
    center: [f32; 3],
    half_extent: f32,
    num_points: usize,
    seed: u64,
) -> Vec<[f32; 3]> {
    let mut rng_state = seed;
    let mut next_random = || -> f32 {
        rng_state = rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        // Top 24 bits give an exactly representable value in [0, 1)
        ((rng_state >> 40) as f32) / ((1u64 << 24) as f32)
    };

    (0..num_points)
        .map(|_| {
            let mut p = [0.0; 3];
            for (axis, c) in p.iter_mut().zip(center) {
                *axis = c + (next_random() * 2.0 - 1.0) * half_extent;
            }
            p
        })
        .collect()
}

/// Generate a half-cubic cloud: the XY, YZ and ZX planes through `origin`.
///
/// Each plane is a `length` square sampled every `interval`, roughly
/// `3 * (length / interval + 1)²` points. Points on shared edges repeat,
/// which makes heavily populated voxels along the axes.
pub fn make_half_cubic_pcd(origin: [f32; 3], length: f32, interval: f32) -> Vec<[f32; 3]> {
    let per_line = (length / interval) as usize + 1;
    let mut points = Vec::with_capacity(3 * per_line * per_line);
    let [ox, oy, oz] = origin;

    for i in 0..per_line {
        for j in 0..per_line {
            let u = interval * j as f32;
            let v = interval * i as f32;

            points.push([ox + u, oy + v, oz]);
            points.push([ox, oy + u, oz + v]);
            points.push([ox + u, oy, oz + v]);
        }
    }

    points
}

/// Per-element counts as `u32`, failing if any length does not fit.
pub fn batch_counts(lengths: impl IntoIterator<Item = usize>) -> Result<Vec<u32>> {
    lengths
        .into_iter()
        .map(|len| {
            u32::try_from(len)
                .map_err(|_| anyhow::anyhow!("{len} points exceed the u32 batch count"))
        })
        .collect()
}

/// A batch of clouds with their voxels and hash table already built.
#[derive(Debug, Clone)]
pub struct BatchedScene {
    pub grid: GridParams,
    /// All clouds concatenated in batch order.
    pub points: Vec<[f32; 3]>,
    pub p_bs_cnt: Vec<u32>,
    pub v_bs_cnt: Vec<u32>,
    /// Coordinate of each global voxel index.
    pub voxel_coords: Vec<VoxelCoord>,
    pub table: VoxelHashTable,
    layout: BatchLayout,
}

impl BatchedScene {
    /// Voxelize `clouds` (one per batch element) and build their hash table.
    pub fn from_clouds(
        grid: GridParams,
        clouds: &[Vec<[f32; 3]>],
        max_hash_size: usize,
    ) -> Result<Self> {
        let p_bs_cnt = batch_counts(clouds.iter().map(Vec::len))?;
        let points: Vec<[f32; 3]> = clouds.concat();

        let occupied = occupied_voxels(&grid, &p_bs_cnt, &points)?;
        let layout = BatchLayout::new(&p_bs_cnt, &occupied.v_bs_cnt, max_hash_size)?;
        let table = VoxelHashTable::build(&grid, &layout, &occupied.coords)?;

        Ok(Self {
            grid,
            points,
            p_bs_cnt,
            v_bs_cnt: occupied.v_bs_cnt,
            voxel_coords: occupied.coords,
            table,
            layout,
        })
    }

    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    /// Run `query` over this scene.
    pub fn run(&self, query: &VoxelQuery) -> Result<QueryResult> {
        query.run(&self.p_bs_cnt, &self.v_bs_cnt, &self.points, self.table.buckets())
    }
}
