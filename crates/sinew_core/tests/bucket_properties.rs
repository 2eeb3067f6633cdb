//! Property tests for the pool bucket schedule.

use proptest::prelude::*;
use sinew_core::pool::{
    bucket_index, bucket_size, try_bucket_index, MAX_BUCKET_SIZE, POOL_BUCKET_SIZES,
};

proptest! {
    /// The chosen bucket fits the request and is the tightest such bucket.
    #[test]
    fn bucket_is_smallest_fit(size in 0u32..=MAX_BUCKET_SIZE) {
        let index = bucket_index(size);
        prop_assert!(bucket_size(index) >= size);
        if index > 0 {
            prop_assert!(bucket_size(index - 1) < size);
        }
        prop_assert!(POOL_BUCKET_SIZES.iter().all(|&b| b < size || b >= bucket_size(index)));
    }

    /// Larger requests never land in a smaller bucket.
    #[test]
    fn bucket_index_is_monotonic(a in 0u32..=MAX_BUCKET_SIZE, b in 0u32..=MAX_BUCKET_SIZE) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(bucket_index(small) <= bucket_index(large));
    }

    /// Everything above the schedule is refused rather than truncated.
    #[test]
    fn oversize_is_refused(size in (MAX_BUCKET_SIZE + 1)..=u32::MAX) {
        prop_assert_eq!(try_bucket_index(size), None);
    }
}
