//! CUDA backend for the voxel query.
//!
//! Uploads points, batch offsets and the hash table, launches
//! [`point_to_voxel_query_kernel`] to resolve every point, then claims
//! sample slots on CPU in point order. Output matches the serial backend
//! exactly.

use anyhow::{ensure, Result};
use cubecl::client::ComputeClient;
use cubecl::cuda::{CudaDevice, CudaRuntime};
use cubecl::prelude::*;

use super::cpu::{fill_slots, Resolution};
use super::kernels::{point_to_voxel_query_kernel, RESOLVED_OUT_OF_GRID, RESOLVED_UNMATCHED};
use crate::batch::BatchLayout;
use crate::grid::GridParams;
use crate::hash_table::Bucket;
use crate::samples::{QueryStats, VoxelSamples};

/// Type alias for CUDA compute client
type CudaClient = ComputeClient<<CudaRuntime as Runtime>::Server, <CudaRuntime as Runtime>::Channel>;

/// Threads per cube for the resolve kernel.
const BLOCK_SIZE: u32 = 256;

/// GPU executor for the resolve step.
pub struct GpuVoxelQuery {
    /// CUDA device (kept alive for runtime lifetime)
    #[allow(dead_code)]
    device: CudaDevice,
    client: CudaClient,
}

impl GpuVoxelQuery {
    /// Create an executor on the default CUDA device.
    pub fn new() -> Result<Self> {
        Self::with_device_id(0)
    }

    pub fn with_device_id(device_id: usize) -> Result<Self> {
        let device = CudaDevice::new(device_id);
        let client = CudaRuntime::client(&device);

        Ok(Self { device, client })
    }

    /// Run the query for validated inputs.
    pub fn sample(
        &self,
        grid: &GridParams,
        layout: &BatchLayout,
        num_samples: usize,
        points: &[[f32; 3]],
        hash_table: &[Bucket],
    ) -> Result<(VoxelSamples, QueryStats)> {
        let num_points = points.len();
        ensure!(
            u32::try_from(num_points).is_ok(),
            "{num_points} points exceed the kernel's u32 index range"
        );
        ensure!(
            u32::try_from(hash_table.len() * 2).is_ok(),
            "hash table of {} buckets exceeds the kernel's u32 index range",
            hash_table.len()
        );

        let resolved = self.resolve(grid, layout, points, hash_table)?;

        let num_voxels = layout.num_voxels();
        let mut decoded = Vec::with_capacity(num_points);
        for (i, &r) in resolved.iter().enumerate() {
            let resolution = match r {
                RESOLVED_OUT_OF_GRID => Resolution::OutOfGrid,
                RESOLVED_UNMATCHED => Resolution::Unmatched,
                v => {
                    let v = usize::try_from(v)
                        .ok()
                        .filter(|&v| v < num_voxels)
                        .ok_or_else(|| anyhow::anyhow!("kernel resolved point {i} to voxel {v}"))?;
                    Resolution::Voxel(v)
                }
            };
            decoded.push((i, resolution));
        }

        Ok(fill_slots(num_voxels, num_samples, decoded))
    }

    /// Launch the resolve kernel and download its per-point output.
    fn resolve(
        &self,
        grid: &GridParams,
        layout: &BatchLayout,
        points: &[[f32; 3]],
        hash_table: &[Bucket],
    ) -> Result<Vec<i32>> {
        let num_points = points.len() as u32;

        let points_flat: Vec<f32> = points.iter().flat_map(|p| p.iter().copied()).collect();
        let offsets: Vec<u32> = layout.point_offsets().iter().map(|&o| o as u32).collect();
        let table_flat: Vec<i32> = hash_table.iter().flat_map(|b| b.iter().copied()).collect();

        let points_gpu = self.client.create(f32::as_bytes(&points_flat));
        let offsets_gpu = self.client.create(u32::as_bytes(&offsets));
        let table_gpu = self.client.create(i32::as_bytes(&table_flat));
        let resolved_gpu = self.client.empty(points.len() * std::mem::size_of::<i32>());

        let cube_count = num_points.div_ceil(BLOCK_SIZE);
        unsafe {
            point_to_voxel_query_kernel::launch_unchecked::<f32, CudaRuntime>(
                &self.client,
                CubeCount::Static(cube_count, 1, 1),
                CubeDim::new(BLOCK_SIZE, 1, 1),
                ArrayArg::from_raw_parts::<f32>(&points_gpu, points_flat.len(), 1),
                ArrayArg::from_raw_parts::<u32>(&offsets_gpu, offsets.len(), 1),
                ArrayArg::from_raw_parts::<i32>(&table_gpu, table_flat.len(), 1),
                ScalarArg::new(grid.voxel_size.x),
                ScalarArg::new(grid.voxel_size.y),
                ScalarArg::new(grid.voxel_size.z),
                ScalarArg::new(grid.grid_size.x),
                ScalarArg::new(grid.grid_size.y),
                ScalarArg::new(grid.grid_size.z),
                ScalarArg::new(layout.batch_size() as u32),
                ScalarArg::new(layout.max_hash_size() as u32),
                ScalarArg::new(num_points),
                ArrayArg::from_raw_parts::<i32>(&resolved_gpu, points.len(), 1),
            );
        }

        let resolved_bytes = self.client.read_one(resolved_gpu.binding());
        Ok(i32::from_bytes(&resolved_bytes).to_vec())
    }
}
