//! GPU kernel for the resolve step of the voxel query using CubeCL.
//!
//! The kernel handles the per-point work: batch attribution, quantization
//! and the hash probe. Slot claiming runs on CPU over the resolved indices,
//! which keeps it deterministic and avoids device atomics.

use cubecl::prelude::*;

/// Kernel output for a point outside the grid.
pub const RESOLVED_OUT_OF_GRID: i32 = -1;
/// Kernel output for an in-grid point whose key has no bucket.
pub const RESOLVED_UNMATCHED: i32 = -2;

/// Resolve every point to its global voxel index.
///
/// # Inputs
/// - `points`: [N * 3] point coordinates (flattened)
/// - `point_offsets`: [B + 1] exclusive prefix sum of points per batch element
/// - `hash_table`: [B * max_hash_size * 2] `[key, voxel_index]` buckets (flattened)
/// - `voxel_size_*`, `grid_*`: grid description
///
/// # Outputs
/// - `resolved`: [N] voxel index, `-1` for out-of-grid, `-2` for unmatched
#[cube(launch_unchecked)]
#[allow(clippy::too_many_arguments)]
pub fn point_to_voxel_query_kernel<F: Float>(
    points: &Array<F>,
    point_offsets: &Array<u32>,
    hash_table: &Array<i32>,
    voxel_size_x: F,
    voxel_size_y: F,
    voxel_size_z: F,
    grid_x: u32,
    grid_y: u32,
    grid_z: u32,
    batch_size: u32,
    max_hash_size: u32,
    num_points: u32,
    resolved: &mut Array<i32>,
) {
    let idx = ABSOLUTE_POS;

    if idx >= num_points {
        terminate!();
    }

    // Owning batch element: count segment ends at or before this point.
    // Offsets are monotonic, so this equals the first b with idx < offsets[b + 1].
    let mut batch = 0u32;
    for b in 0..batch_size {
        if point_offsets[b + 1] <= idx {
            batch += 1u32;
        }
    }

    let base = idx * 3;
    let qx = F::floor(points[base] / voxel_size_x);
    let qy = F::floor(points[base + 1] / voxel_size_y);
    let qz = F::floor(points[base + 2] / voxel_size_z);

    // Comparisons with NaN are false, so NaN coordinates land out of grid
    let zero = F::new(0.0);
    let in_x = qx >= zero && qx < F::cast_from(grid_x);
    let in_y = qy >= zero && qy < F::cast_from(grid_y);
    let in_z = qz >= zero && qz < F::cast_from(grid_z);

    if in_x && in_y && in_z {
        let ix = u32::cast_from(qx);
        let iy = u32::cast_from(qy);
        let iz = u32::cast_from(qz);
        let key = (iz * grid_y + iy) * grid_x + ix;
        let key_i32 = i32::cast_from(key);

        let seg_base = batch * max_hash_size;
        let mut slot = key % max_hash_size;
        let mut probes = 0u32;
        let mut probing = true;
        let mut found = -2i32;

        while probing {
            let bucket = (seg_base + slot) * 2;
            let stored = hash_table[bucket];

            if stored == key_i32 {
                found = hash_table[bucket + 1];
                probing = false;
            } else {
                if stored == -1i32 {
                    probing = false;
                } else {
                    slot += 1u32;
                    if slot == max_hash_size {
                        slot = 0u32;
                    }
                    probes += 1u32;
                    if probes >= max_hash_size {
                        probing = false;
                    }
                }
            }
        }

        resolved[idx] = found;
    } else {
        resolved[idx] = -1i32;
    }
}
