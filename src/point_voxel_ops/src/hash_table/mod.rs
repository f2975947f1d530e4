//! Batch-segmented open-addressing hash table from voxel keys to voxel indices.
//!
//! The table is a flat array of `[key, voxel_index]` buckets split into one
//! segment of `max_hash_size` buckets per batch element. Empty buckets hold
//! `[EMPTY, EMPTY]`. Collisions are resolved by linear probing that wraps
//! inside the segment, so a probe never reads another element's buckets.
//!
//! # Usage
//!
//! ```ignore
//! let layout = BatchLayout::new(&p_bs_cnt, &v_bs_cnt, max_hash_size)?;
//! let occupied = occupied_voxels(&grid, &p_bs_cnt, &points)?;
//! let table = VoxelHashTable::build(&grid, &layout, &occupied.coords)?;
//!
//! let key = grid.pack_key(coord);
//! let voxel = lookup(table.segment(b), key);
//! ```

mod builder;

pub use builder::{occupied_voxels, OccupiedVoxels};

/// Marker for an unused bucket (both halves) and for unfilled `v_map` slots.
pub const EMPTY: i32 = -1;

/// A single `[key, voxel_index]` bucket.
pub type Bucket = [i32; 2];

/// First bucket probed for `key` within a segment.
///
/// Shared by the builder and every query backend; changing it invalidates
/// all previously built tables.
#[inline]
pub fn probe_start(key: i32, max_hash_size: usize) -> usize {
    key as usize % max_hash_size
}

/// Look up `key` in one batch segment.
///
/// Returns the stored voxel index, or `None` when an empty bucket is hit or
/// the whole segment has been scanned without a match.
#[inline]
pub fn lookup(segment: &[Bucket], key: i32) -> Option<usize> {
    let capacity = segment.len();
    if capacity == 0 {
        return None;
    }

    let mut slot = probe_start(key, capacity);
    for _ in 0..capacity {
        let [stored_key, voxel] = segment[slot];
        if stored_key == key {
            return usize::try_from(voxel).ok();
        }
        if stored_key == EMPTY {
            return None;
        }
        slot += 1;
        if slot == capacity {
            slot = 0;
        }
    }
    None
}

/// Owned hash table covering every batch element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelHashTable {
    buckets: Vec<Bucket>,
    max_hash_size: usize,
}

impl VoxelHashTable {
    /// Create a table with every bucket empty.
    ///
    /// `batch_size * max_hash_size` must fit in `usize`; callers pass a
    /// validated [`BatchLayout`](crate::batch::BatchLayout).
    pub(crate) fn empty(batch_size: usize, max_hash_size: usize) -> Self {
        Self {
            buckets: vec![[EMPTY, EMPTY]; batch_size * max_hash_size],
            max_hash_size,
        }
    }

    /// Wrap buckets produced elsewhere (e.g. by an external builder).
    ///
    /// The contents are checked when the table is queried, not here.
    pub fn from_buckets(buckets: Vec<Bucket>, max_hash_size: usize) -> Self {
        Self {
            buckets,
            max_hash_size,
        }
    }

    /// Wrap a flat `[k0, v0, k1, v1, ...]` buffer.
    pub fn from_flat(flat: &[i32], max_hash_size: usize) -> Self {
        let buckets = flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
        Self::from_buckets(buckets, max_hash_size)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Flatten into `[k0, v0, k1, v1, ...]` (device upload layout).
    pub fn to_flat(&self) -> Vec<i32> {
        self.buckets.iter().flat_map(|b| b.iter().copied()).collect()
    }

    pub fn max_hash_size(&self) -> usize {
        self.max_hash_size
    }

    /// Number of segments (batch elements).
    pub fn batch_size(&self) -> usize {
        if self.max_hash_size == 0 {
            0
        } else {
            self.buckets.len() / self.max_hash_size
        }
    }

    /// Buckets of batch element `b`.
    pub fn segment(&self, b: usize) -> &[Bucket] {
        &self.buckets[b * self.max_hash_size..(b + 1) * self.max_hash_size]
    }

    /// Number of occupied buckets in segment `b`.
    pub fn segment_len(&self, b: usize) -> usize {
        self.segment(b).iter().filter(|[k, _]| *k != EMPTY).count()
    }

    /// Number of occupied buckets across all segments.
    pub fn occupancy(&self) -> usize {
        self.buckets.iter().filter(|[k, _]| *k != EMPTY).count()
    }

    /// Insert `key -> voxel` into segment `b` with the shared probe order.
    fn insert(&mut self, b: usize, key: i32, voxel: i32) -> Insert {
        let capacity = self.max_hash_size;
        let base = b * capacity;
        let mut slot = probe_start(key, capacity);

        for _ in 0..capacity {
            let bucket = &mut self.buckets[base + slot];
            if bucket[0] == key {
                return Insert::Duplicate;
            }
            if bucket[0] == EMPTY {
                *bucket = [key, voxel];
                return Insert::Placed(slot);
            }
            slot = (slot + 1) % capacity;
        }
        Insert::Full
    }
}

/// Outcome of a single bucket insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insert {
    /// Stored at this bucket of the segment.
    Placed(usize),
    Duplicate,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_direct_hit() {
        let mut segment = vec![[EMPTY, EMPTY]; 8];
        segment[probe_start(13, 8)] = [13, 4];

        assert_eq!(lookup(&segment, 13), Some(4));
        assert_eq!(lookup(&segment, 21), None);
    }

    #[test]
    fn test_lookup_follows_collisions_and_wraps() {
        // Keys 7, 15, 23 all start at slot 7 in an 8-bucket segment
        let mut table = VoxelHashTable::empty(1, 8);
        assert_eq!(table.insert(0, 7, 0), Insert::Placed(7));
        assert_eq!(table.insert(0, 15, 1), Insert::Placed(0));
        assert_eq!(table.insert(0, 23, 2), Insert::Placed(1));

        let segment = table.segment(0);
        assert_eq!(lookup(segment, 7), Some(0));
        assert_eq!(lookup(segment, 15), Some(1));
        assert_eq!(lookup(segment, 23), Some(2));
        // Same start slot, not present: stops at the empty bucket 2
        assert_eq!(lookup(segment, 31), None);
    }

    #[test]
    fn test_lookup_full_segment_terminates() {
        let segment: Vec<Bucket> = (0..4).map(|k| [k, k]).collect();

        assert_eq!(lookup(&segment, 2), Some(2));
        assert_eq!(lookup(&segment, 9), None);
        assert_eq!(lookup(&[], 9), None);
    }

    #[test]
    fn test_insert_duplicate_and_full() {
        let mut table = VoxelHashTable::empty(1, 2);
        assert!(matches!(table.insert(0, 5, 0), Insert::Placed(_)));
        assert_eq!(table.insert(0, 5, 1), Insert::Duplicate);
        assert!(matches!(table.insert(0, 6, 1), Insert::Placed(_)));
        assert_eq!(table.insert(0, 7, 2), Insert::Full);
    }

    #[test]
    fn test_segments_are_disjoint() {
        let mut table = VoxelHashTable::empty(2, 4);
        table.insert(1, 3, 9);

        assert_eq!(table.segment_len(0), 0);
        assert_eq!(table.segment_len(1), 1);
        assert_eq!(lookup(table.segment(0), 3), None);
        assert_eq!(lookup(table.segment(1), 3), Some(9));
        assert_eq!(table.occupancy(), 1);
    }

    #[test]
    fn test_flat_roundtrip() {
        let mut table = VoxelHashTable::empty(2, 3);
        table.insert(0, 4, 0);
        table.insert(1, 2, 1);

        let flat = table.to_flat();
        assert_eq!(flat.len(), 12);
        assert_eq!(VoxelHashTable::from_flat(&flat, 3), table);
        assert_eq!(table.batch_size(), 2);
    }
}
