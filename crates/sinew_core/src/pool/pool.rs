use super::buckets::{bucket_index, bucket_size, NUM_POOL_BUCKETS};
use super::{BufferDesc, BufferFactory, BufferUsage, GpuBuffer, PoolError};
use serde::{Deserialize, Serialize};
use sinew_metrics::Counter;

/// Reclamation tuning for a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Frames a released buffer waits before it may be handed out again.
    pub safe_frames: usize,
    /// Upper bound on buffers destroyed per tick.
    pub drain_per_frame: usize,
    /// Free buffers unused for longer than this are destroyed.
    pub cull_after_frames: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            safe_frames: 3,
            drain_per_frame: 10,
            cull_after_frames: 30,
        }
    }
}

/// Label and usage stamped on every buffer a pool creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolKind {
    pub label: &'static str,
    pub usage: BufferUsage,
}

impl PoolKind {
    pub const BONES: Self = Self {
        label: "bone buffer pool",
        usage: BufferUsage::Bones,
    };
    pub const CLOTH: Self = Self {
        label: "cloth buffer pool",
        usage: BufferUsage::Cloth,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub free: usize,
    pub pending: usize,
    pub free_bytes: u64,
    pub created: u64,
    pub reused: u64,
    pub released: u64,
    pub culled: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    created: u64,
    reused: u64,
    released: u64,
    culled: u64,
}

struct PooledEntry<B> {
    buffer: B,
    frame_freed: u64,
    size: u32,
}

/// Pool of interchangeable buffers keyed by size bucket.
///
/// Released buffers first sit in a ring of `safe_frames` pending lists so
/// that in-flight GPU work can still read them; `tick` promotes the
/// oldest list into the free buckets and culls entries that stayed
/// unused for `cull_after_frames`.
///
/// Owned by the render thread; no internal locking.
pub struct ResourcePool<F: BufferFactory> {
    factory: F,
    kind: PoolKind,
    settings: PoolSettings,
    free: Vec<Vec<PooledEntry<F::Buffer>>>,
    pending: Vec<Vec<PooledEntry<F::Buffer>>>,
    frame: u64,
    totals: Totals,
    counters: Counter,
}

impl<F: BufferFactory> ResourcePool<F> {
    pub fn new(factory: F, kind: PoolKind, settings: PoolSettings) -> Self {
        let settings = PoolSettings {
            safe_frames: settings.safe_frames.max(1),
            ..settings
        };
        tracing::debug!(
            pool = kind.label,
            safe_frames = settings.safe_frames,
            cull_after_frames = settings.cull_after_frames,
            "creating resource pool"
        );
        Self {
            factory,
            kind,
            settings,
            free: (0..NUM_POOL_BUCKETS).map(|_| Vec::new()).collect(),
            pending: (0..settings.safe_frames).map(|_| Vec::new()).collect(),
            frame: 0,
            totals: Totals::default(),
            counters: Counter::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    #[inline]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Hand out a buffer of at least `size` bytes, reusing the most
    /// recently freed buffer of the matching bucket when one exists.
    ///
    /// # Panics
    ///
    /// If `size` exceeds the largest bucket.
    pub fn acquire(&mut self, size: u32) -> Result<F::Buffer, PoolError> {
        let bucket = bucket_index(size);
        if let Some(entry) = self.free[bucket].pop() {
            self.totals.reused += 1;
            self.counters.increment("reused", 1);
            tracing::trace!(pool = self.kind.label, bucket, "reusing pooled buffer");
            return Ok(entry.buffer);
        }
        self.create_resource(size)
    }

    /// Return a buffer to the pool. It becomes reusable `safe_frames - 1`
    /// ticks later.
    pub fn release(&mut self, buffer: F::Buffer) {
        let size = self.creation_size(&buffer);
        let slot = (self.frame % self.settings.safe_frames as u64) as usize;
        self.pending[slot].push(PooledEntry {
            buffer,
            frame_freed: self.frame,
            size,
        });
        self.totals.released += 1;
        self.counters.increment("released", 1);
    }

    /// Upload through the pool's backend.
    pub fn write(
        &mut self,
        buffer: &mut F::Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), PoolError> {
        self.factory.write_buffer(buffer, offset, data)
    }

    /// Advance to `frame`: promote buffers released long enough ago and
    /// destroy a bounded number of stale free buffers.
    pub fn tick(&mut self, frame: u64) {
        self.frame = frame;
        let ready = ((frame + 1) % self.settings.safe_frames as u64) as usize;
        for entry in std::mem::take(&mut self.pending[ready]) {
            let bucket = bucket_index(entry.size);
            self.free[bucket].push(entry);
        }
        self.cull(false);
    }

    /// Destroy every pooled buffer, pending or free.
    pub fn drain_all(&mut self) {
        for slot in 0..self.pending.len() {
            for entry in std::mem::take(&mut self.pending[slot]) {
                self.free_resource(entry.buffer);
                self.totals.culled += 1;
                self.counters.increment("culled", 1);
            }
        }
        self.cull(true);
    }

    pub fn free_count(&self) -> usize {
        self.free.iter().map(Vec::len).sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(Vec::len).sum()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free_count(),
            pending: self.pending_count(),
            free_bytes: self
                .free
                .iter()
                .flatten()
                .map(|entry| u64::from(entry.size))
                .sum(),
            created: self.totals.created,
            reused: self.totals.reused,
            released: self.totals.released,
            culled: self.totals.culled,
        }
    }

    /// Named metrics counters. Empty unless the `metrics` feature is on;
    /// [`ResourcePool::stats`] is always maintained.
    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    fn create_resource(&mut self, requested: u32) -> Result<F::Buffer, PoolError> {
        let size = bucket_size(bucket_index(requested));
        let buffer = self.factory.create_buffer(&BufferDesc {
            label: self.kind.label,
            size: u64::from(size),
            usage: self.kind.usage,
        })?;
        self.totals.created += 1;
        self.counters.increment("created", 1);
        tracing::debug!(pool = self.kind.label, requested, size, "created pooled buffer");
        Ok(buffer)
    }

    fn creation_size(&self, buffer: &F::Buffer) -> u32 {
        let size = u32::try_from(buffer.size()).unwrap_or(u32::MAX);
        debug_assert_eq!(
            bucket_size(bucket_index(size)),
            size,
            "{} received a buffer it did not create",
            self.kind.label
        );
        size
    }

    fn free_resource(&mut self, buffer: F::Buffer) {
        tracing::trace!(pool = self.kind.label, size = buffer.size(), "destroying pooled buffer");
        drop(buffer);
    }

    fn cull(&mut self, force: bool) {
        let mut budget = self.settings.drain_per_frame;
        if !force && budget == 0 {
            return;
        }
        let mut culled = 0u64;
        'buckets: for bucket in 0..NUM_POOL_BUCKETS {
            let mut index = self.free[bucket].len();
            while index > 0 {
                index -= 1;
                let deadline = self.free[bucket][index]
                    .frame_freed
                    .saturating_add(self.settings.cull_after_frames);
                let expired = force || self.frame > deadline;
                if !expired {
                    continue;
                }
                let entry = self.free[bucket].swap_remove(index);
                self.free_resource(entry.buffer);
                culled += 1;
                if !force {
                    budget -= 1;
                    if budget == 0 {
                        break 'buckets;
                    }
                }
            }
        }
        if culled > 0 {
            self.totals.culled += culled;
            self.counters.increment("culled", culled);
            tracing::debug!(
                pool = self.kind.label,
                culled,
                frame = self.frame,
                "culled pooled buffers"
            );
        }
    }
}

impl<F: BufferFactory> Drop for ResourcePool<F> {
    fn drop(&mut self) {
        self.drain_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{GpuBuffer, HostBufferFactory};

    fn pool(settings: PoolSettings) -> ResourcePool<HostBufferFactory> {
        ResourcePool::new(HostBufferFactory::new(), PoolKind::BONES, settings)
    }

    #[test]
    fn acquire_rounds_up_to_bucket() {
        let mut pool = pool(PoolSettings::default());
        let buffer = pool.acquire(100).unwrap();
        assert_eq!(buffer.size(), 128);
    }

    #[test]
    fn released_buffers_wait_for_safe_frames() {
        let mut pool = pool(PoolSettings::default());
        pool.tick(10);
        let buffer = pool.acquire(64).unwrap();
        let id = buffer.id();
        pool.release(buffer);
        assert_eq!(pool.pending_count(), 1);

        // Released on frame 10 (slot 1); slot 1 is promoted when (frame + 1) % 3 == 1.
        pool.tick(11);
        assert_eq!(pool.free_count(), 0);
        pool.tick(12);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.pending_count(), 0);

        let again = pool.acquire(40).unwrap();
        assert_eq!(again.id(), id);
    }

    #[test]
    fn reuse_is_per_bucket() {
        let mut pool = pool(PoolSettings {
            safe_frames: 1,
            ..PoolSettings::default()
        });
        let small = pool.acquire(16).unwrap();
        let small_id = small.id();
        pool.release(small);
        pool.tick(1);

        let large = pool.acquire(4096).unwrap();
        assert_ne!(large.id(), small_id);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn stale_free_buffers_are_culled_with_a_per_tick_cap() {
        let mut pool = pool(PoolSettings {
            safe_frames: 1,
            drain_per_frame: 2,
            cull_after_frames: 5,
        });
        let buffers: Vec<_> = (0..3).map(|_| pool.acquire(256).unwrap()).collect();
        for buffer in buffers {
            pool.release(buffer);
        }
        pool.tick(0);
        assert_eq!(pool.free_count(), 3);

        pool.tick(5);
        assert_eq!(pool.free_count(), 3);
        pool.tick(6);
        assert_eq!(pool.free_count(), 1);
        pool.tick(7);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn drain_all_empties_pending_and_free() {
        let mut pool = pool(PoolSettings::default());
        let a = pool.acquire(16).unwrap();
        let b = pool.acquire(16).unwrap();
        pool.release(a);
        pool.tick(1);
        pool.tick(2);
        pool.release(b);
        assert!(pool.free_count() + pool.pending_count() == 2);

        pool.drain_all();
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn stats_track_reuse() {
        let mut pool = pool(PoolSettings {
            safe_frames: 1,
            ..PoolSettings::default()
        });
        let buffer = pool.acquire(512).unwrap();
        pool.release(buffer);
        pool.tick(1);
        let _buffer = pool.acquire(300).unwrap();

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.free, 0);
    }

    #[test]
    fn stats_do_not_depend_on_the_metrics_feature() {
        let mut pool = pool(PoolSettings {
            safe_frames: 1,
            ..PoolSettings::default()
        });
        let a = pool.acquire(64).unwrap();
        let b = pool.acquire(64).unwrap();
        pool.release(a);
        pool.tick(1);
        let a = pool.acquire(64).unwrap();
        pool.release(a);
        pool.release(b);
        pool.drain_all();

        let stats = pool.stats();
        assert_eq!(
            (stats.created, stats.reused, stats.released, stats.culled),
            (2, 1, 3, 2)
        );
        #[cfg(feature = "metrics")]
        assert_eq!(pool.counters().get("released"), 3);
        #[cfg(not(feature = "metrics"))]
        assert_eq!(pool.counters().get("released"), 0);
    }

    #[test]
    fn huge_cull_delay_never_expires() {
        let mut pool = pool(PoolSettings {
            safe_frames: 1,
            drain_per_frame: 10,
            cull_after_frames: u64::MAX,
        });
        pool.tick(5);
        let buffer = pool.acquire(32).unwrap();
        pool.release(buffer);
        pool.tick(6);
        pool.tick(u64::MAX - 1);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.stats().culled, 0);
    }
}
