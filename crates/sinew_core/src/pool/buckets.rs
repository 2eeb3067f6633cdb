/// Number of size classes in the pool schedule.
pub const NUM_POOL_BUCKETS: usize = 17;

/// Ascending bucket sizes in bytes, 16 B through 1 MiB.
pub const POOL_BUCKET_SIZES: [u32; NUM_POOL_BUCKETS] = [
    16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536, 131072, 262144,
    524288, 1048576,
];

pub const MAX_BUCKET_SIZE: u32 = POOL_BUCKET_SIZES[NUM_POOL_BUCKETS - 1];

/// Smallest bucket whose size is at least `size`, or `None` when `size`
/// is larger than the largest bucket.
#[inline]
pub fn try_bucket_index(size: u32) -> Option<usize> {
    let index = POOL_BUCKET_SIZES.partition_point(|&bucket| bucket < size);
    (index < NUM_POOL_BUCKETS).then_some(index)
}

/// Smallest bucket whose size is at least `size`.
///
/// # Panics
///
/// If `size` exceeds [`MAX_BUCKET_SIZE`]. Callers size bone and cloth
/// uploads from mesh data, so an oversize request is a caller bug.
#[inline]
pub fn bucket_index(size: u32) -> usize {
    match try_bucket_index(size) {
        Some(index) => index,
        None => panic!(
            "pool request of {size} bytes exceeds the largest bucket ({MAX_BUCKET_SIZE} bytes)"
        ),
    }
}

#[inline]
pub fn bucket_size(index: usize) -> u32 {
    POOL_BUCKET_SIZES[index]
}

/// `size` rounded up to its bucket.
#[inline]
pub fn rounded_size(size: u32) -> u32 {
    bucket_size(bucket_index(size))
}
