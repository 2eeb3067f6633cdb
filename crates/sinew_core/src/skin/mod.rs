//! GPU skin cache.
//!
//! Each registered mesh section owns double-buffered skinned position
//! output plus pooled bone (and optionally cloth) input buffers. The
//! cache decides per frame whether skinning has to run and which output
//! slot it writes.

mod bones;
mod cache;

pub use bones::BoneTransform;
pub use cache::{SkinCache, SkinCacheSettings, SkinCacheStats, SkinDispatch, SkinEntryId};

use crate::pool::PoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkinCacheError {
    #[error("skin cache budget exhausted: {requested} bytes requested, {available} available")]
    OverBudget { requested: u64, available: u64 },

    #[error("unknown skin cache entry {0:?}")]
    UnknownEntry(SkinEntryId),

    #[error("skin cache entry {0:?} has no bone data for this frame")]
    NoBoneData(SkinEntryId),

    #[error("{pool}: upload of {bytes} bytes exceeds the largest bucket ({limit} bytes)")]
    UploadTooLarge {
        pool: &'static str,
        bytes: usize,
        limit: u32,
    },

    #[error("no free output slot for skin cache entry {0:?}")]
    NoFreeSlot(SkinEntryId),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
