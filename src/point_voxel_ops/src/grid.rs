//! Grid parameters, voxel quantization and key packing.
//!
//! Keys are packed row-major: `key = (qz * y_max + qy) * x_max + qx`. The
//! same packing is used by the hash table builder and by the query, so a
//! table built here is always probed in the order it was filled.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A regular voxel grid: edge lengths plus extent in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Voxel edge lengths `(x_size, y_size, z_size)`.
    pub voxel_size: Vector3<f32>,
    /// Grid extent in voxel units `(x_max, y_max, z_max)`.
    pub grid_size: Vector3<u32>,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            voxel_size: Vector3::new(0.05, 0.05, 0.1),
            grid_size: Vector3::new(1408, 1600, 40),
        }
    }
}

impl GridParams {
    pub fn new(voxel_size: [f32; 3], grid_size: [u32; 3]) -> Self {
        Self {
            voxel_size: Vector3::from(voxel_size),
            grid_size: Vector3::from(grid_size),
        }
    }

    /// Total number of cells in the grid.
    pub fn volume(&self) -> u64 {
        self.grid_size.iter().map(|&d| d as u64).product()
    }

    /// Check that the grid can be quantized against and keyed in `i32`.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.voxel_size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(QueryError::InvalidVoxelSize(self.voxel_size.into()));
        }
        if self.grid_size.iter().any(|&d| d == 0) {
            return Err(QueryError::InvalidGridSize(self.grid_size.into()));
        }
        let volume = self.volume();
        if volume > i32::MAX as u64 {
            return Err(QueryError::GridTooLarge { volume });
        }
        Ok(())
    }

    /// Check whether a voxel coordinate lies inside the grid.
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.grid_size.x
            && (coord.y as u32) < self.grid_size.y
            && (coord.z as u32) < self.grid_size.z
    }

    /// Quantize a point into its voxel, or `None` if it falls outside the grid.
    ///
    /// Bounds are checked on the floored float values before casting, so
    /// far-away points and NaN coordinates never wrap into range.
    pub fn quantize(&self, point: &[f32; 3]) -> Option<VoxelCoord> {
        let q = Vector3::from(*point)
            .component_div(&self.voxel_size)
            .map(f32::floor);

        for axis in 0..3 {
            if !(q[axis] >= 0.0 && q[axis] < self.grid_size[axis] as f32) {
                return None;
            }
        }

        Some(VoxelCoord::new(q.x as i32, q.y as i32, q.z as i32))
    }

    /// Pack an in-grid voxel coordinate into its hash key.
    pub fn pack_key(&self, coord: VoxelCoord) -> i32 {
        let x_max = self.grid_size.x as i32;
        let y_max = self.grid_size.y as i32;
        (coord.z * y_max + coord.y) * x_max + coord.x
    }

    /// Inverse of [`GridParams::pack_key`].
    pub fn unpack_key(&self, key: i32) -> VoxelCoord {
        let x_max = self.grid_size.x as i32;
        let y_max = self.grid_size.y as i32;
        let plane = x_max * y_max;
        let z = key / plane;
        let rem = key % plane;
        VoxelCoord::new(rem % x_max, rem / x_max, z)
    }

    /// Check whether a key could have been produced by [`GridParams::pack_key`].
    pub fn is_valid_key(&self, key: i32) -> bool {
        key >= 0 && (key as u64) < self.volume()
    }
}

/// 3D voxel coordinates (integer grid indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}
