use super::{BoneTransform, SkinCacheError};
use crate::frame::{FrameTracker, SlotTag, NUM_BUFFERS};
use crate::memory::MemoryBudget;
use crate::pool::{
    try_bucket_index, BufferDesc, BufferFactory, BufferId, BufferUsage, GpuBuffer, PoolKind,
    PoolSettings, PoolStats, ResourcePool, MAX_BUCKET_SIZE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinCacheSettings {
    /// Ceiling on skinned output buffer memory.
    pub budget_bytes: u64,
    /// Bytes per skinned position.
    pub position_stride: u32,
    /// Bytes per packed tangent frame.
    pub tangent_stride: u32,
}

impl Default for SkinCacheSettings {
    fn default() -> Self {
        Self {
            budget_bytes: 128 * 1024 * 1024,
            position_stride: 12,
            tangent_stride: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinEntryId(u64);

impl SkinEntryId {
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Result of [`SkinCache::dispatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinDispatch {
    pub entry: SkinEntryId,
    /// Slot the skinning pass must write, `None` if this frame's output
    /// is already resident.
    pub write_slot: Option<usize>,
    /// Slot holding this frame's skinned positions.
    pub output_slot: usize,
    pub output_buffer: BufferId,
    /// Slot holding last frame's skinned positions, if still resident.
    pub previous_slot: Option<usize>,
    pub previous_buffer: Option<BufferId>,
    pub bone_buffer: BufferId,
    pub cloth_buffer: Option<BufferId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkinCacheStats {
    pub entries: usize,
    pub used_bytes: u64,
    pub budget_bytes: u64,
    pub extra_required_bytes: u64,
    pub bone_pool: PoolStats,
    pub cloth_pool: PoolStats,
}

struct Revisioned<B> {
    buffer: B,
    revision: u32,
}

impl<B: GpuBuffer> Revisioned<B> {
    fn tag(&self) -> SlotTag {
        SlotTag::new(self.buffer.id(), self.revision)
    }
}

/// Current and previous upload of a per-frame input.
struct InputHistory<B> {
    current: Option<Revisioned<B>>,
    previous: Option<Revisioned<B>>,
}

impl<B> Default for InputHistory<B> {
    fn default() -> Self {
        Self {
            current: None,
            previous: None,
        }
    }
}

impl<B> InputHistory<B> {
    /// Make `next` current. Returns the buffer that fell out of the
    /// history and can go back to its pool.
    fn push(&mut self, next: Revisioned<B>) -> Option<B> {
        if matches!(&self.current, Some(current) if current.revision == next.revision) {
            return self.current.replace(next).map(|stale| stale.buffer);
        }
        let stale = self.previous.take();
        self.previous = self.current.replace(next);
        stale.map(|stale| stale.buffer)
    }

    fn drain(&mut self) -> impl Iterator<Item = B> {
        [self.current.take(), self.previous.take()]
            .into_iter()
            .flatten()
            .map(|entry| entry.buffer)
    }
}

struct SkinEntry<B> {
    num_vertices: u32,
    output_bytes: u64,
    positions: [B; NUM_BUFFERS],
    _tangents: B,
    tracker: FrameTracker,
    bones: InputHistory<B>,
    cloth: InputHistory<B>,
}

/// Owns the skinning buffers for every registered mesh section.
///
/// Created and torn down with the renderer; all calls come from the
/// render thread.
pub struct SkinCache<F: BufferFactory + Clone> {
    factory: F,
    settings: SkinCacheSettings,
    bone_pool: ResourcePool<F>,
    cloth_pool: ResourcePool<F>,
    entries: HashMap<SkinEntryId, SkinEntry<F::Buffer>>,
    next_entry: u64,
    budget: MemoryBudget,
    frame: u64,
}

impl<F: BufferFactory + Clone> SkinCache<F> {
    pub fn new(factory: F, pool_settings: PoolSettings, settings: SkinCacheSettings) -> Self {
        tracing::info!(
            budget_bytes = settings.budget_bytes,
            "initializing skin cache"
        );
        Self {
            bone_pool: ResourcePool::new(factory.clone(), PoolKind::BONES, pool_settings),
            cloth_pool: ResourcePool::new(factory.clone(), PoolKind::CLOTH, pool_settings),
            factory,
            settings,
            entries: HashMap::new(),
            next_entry: 1,
            budget: MemoryBudget::new(settings.budget_bytes),
            frame: 0,
        }
    }

    /// Bytes of output a section with `num_vertices` vertices needs.
    pub fn output_bytes(&self, num_vertices: u32) -> u64 {
        let n = u64::from(num_vertices);
        NUM_BUFFERS as u64 * n * u64::from(self.settings.position_stride)
            + n * u64::from(self.settings.tangent_stride)
    }

    /// Allocate output buffers for a mesh section.
    pub fn register(&mut self, num_vertices: u32) -> Result<SkinEntryId, SkinCacheError> {
        let requested = self.output_bytes(num_vertices);
        if !self.budget.try_reserve(requested) {
            let available = self.budget.available();
            tracing::warn!(requested, available, "skin cache over budget");
            return Err(SkinCacheError::OverBudget {
                requested,
                available,
            });
        }

        let outputs = self.create_outputs(num_vertices);
        let (positions, tangents) = match outputs {
            Ok(outputs) => outputs,
            Err(err) => {
                self.budget.release(requested);
                return Err(err.into());
            }
        };

        let id = SkinEntryId(self.next_entry);
        self.next_entry += 1;
        self.entries.insert(
            id,
            SkinEntry {
                num_vertices,
                output_bytes: requested,
                positions,
                _tangents: tangents,
                tracker: FrameTracker::new(),
                bones: InputHistory::default(),
                cloth: InputHistory::default(),
            },
        );
        tracing::debug!(
            entry = id.0,
            num_vertices,
            bytes = requested,
            "registered skin cache entry"
        );
        Ok(id)
    }

    /// Release an entry's outputs and return its inputs to the pools.
    pub fn unregister(&mut self, id: SkinEntryId) -> Result<(), SkinCacheError> {
        let mut entry = self
            .entries
            .remove(&id)
            .ok_or(SkinCacheError::UnknownEntry(id))?;
        for buffer in entry.bones.drain() {
            self.bone_pool.release(buffer);
        }
        for buffer in entry.cloth.drain() {
            self.cloth_pool.release(buffer);
        }
        self.budget.release(entry.output_bytes);
        Ok(())
    }

    /// Upload this frame's bone matrices into a pooled buffer.
    ///
    /// Uploads above the largest pool bucket fail with
    /// [`SkinCacheError::UploadTooLarge`].
    pub fn update_bones(
        &mut self,
        id: SkinEntryId,
        transforms: &[BoneTransform],
        revision: u32,
    ) -> Result<BufferId, SkinCacheError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(SkinCacheError::UnknownEntry(id))?;
        upload(
            &mut self.bone_pool,
            &mut entry.bones,
            bytemuck::cast_slice(transforms),
            revision,
        )
    }

    /// Upload this frame's simulated cloth positions into a pooled buffer.
    pub fn update_cloth(
        &mut self,
        id: SkinEntryId,
        positions: &[[f32; 4]],
        revision: u32,
    ) -> Result<BufferId, SkinCacheError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(SkinCacheError::UnknownEntry(id))?;
        upload(
            &mut self.cloth_pool,
            &mut entry.cloth,
            bytemuck::cast_slice(positions),
            revision,
        )
    }

    /// Decide where this frame's skinning output goes.
    pub fn dispatch(&mut self, id: SkinEntryId) -> Result<SkinDispatch, SkinCacheError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(SkinCacheError::UnknownEntry(id))?;
        let current = entry
            .bones
            .current
            .as_ref()
            .map(Revisioned::tag)
            .ok_or(SkinCacheError::NoBoneData(id))?;
        let previous = entry.bones.previous.as_ref().map(Revisioned::tag);

        let (write_slot, output_slot) = match entry.tracker.find(current) {
            Some(slot) => (None, slot),
            None => {
                entry.tracker.advance(current, previous);
                let slot = entry
                    .tracker
                    .find(current)
                    .ok_or(SkinCacheError::NoFreeSlot(id))?;
                (Some(slot), slot)
            }
        };
        let previous_slot = previous.and_then(|tag| entry.tracker.find(tag));

        if write_slot.is_some() {
            tracing::trace!(
                entry = id.0,
                slot = output_slot,
                vertices = entry.num_vertices,
                "skinning"
            );
        }

        Ok(SkinDispatch {
            entry: id,
            write_slot,
            output_slot,
            output_buffer: entry.positions[output_slot].id(),
            previous_slot,
            previous_buffer: previous_slot.map(|slot| entry.positions[slot].id()),
            bone_buffer: current.source,
            cloth_buffer: entry.cloth.current.as_ref().map(|c| c.buffer.id()),
        })
    }

    /// Per-frame housekeeping: drain pools and report any shortfall.
    pub fn tick(&mut self, frame: u64) {
        self.frame = frame;
        self.bone_pool.tick(frame);
        self.cloth_pool.tick(frame);
        let shortfall = self.budget.reset_frame();
        if shortfall > 0 {
            tracing::warn!(
                frame,
                shortfall,
                budget = self.budget.limit(),
                "skin cache needs more memory than its budget"
            );
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn contains(&self, id: SkinEntryId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn stats(&self) -> SkinCacheStats {
        SkinCacheStats {
            entries: self.entries.len(),
            used_bytes: self.budget.used(),
            budget_bytes: self.budget.limit(),
            extra_required_bytes: self.budget.extra_required(),
            bone_pool: self.bone_pool.stats(),
            cloth_pool: self.cloth_pool.stats(),
        }
    }

    fn create_outputs(
        &mut self,
        num_vertices: u32,
    ) -> Result<([F::Buffer; NUM_BUFFERS], F::Buffer), crate::pool::PoolError> {
        let n = u64::from(num_vertices);
        let position = BufferDesc {
            label: "skinned positions",
            size: n * u64::from(self.settings.position_stride),
            usage: BufferUsage::SkinnedPositions,
        };
        let positions = [
            self.factory.create_buffer(&position)?,
            self.factory.create_buffer(&position)?,
        ];
        let tangents = self.factory.create_buffer(&BufferDesc {
            label: "skinned tangents",
            size: n * u64::from(self.settings.tangent_stride),
            usage: BufferUsage::SkinnedTangents,
        })?;
        Ok((positions, tangents))
    }
}

fn upload<F: BufferFactory>(
    pool: &mut ResourcePool<F>,
    history: &mut InputHistory<F::Buffer>,
    bytes: &[u8],
    revision: u32,
) -> Result<BufferId, SkinCacheError> {
    let size = u32::try_from(bytes.len())
        .ok()
        .filter(|&size| try_bucket_index(size).is_some())
        .ok_or(SkinCacheError::UploadTooLarge {
            pool: pool.kind().label,
            bytes: bytes.len(),
            limit: MAX_BUCKET_SIZE,
        })?;
    let mut buffer = pool.acquire(size)?;
    if let Err(err) = pool.write(&mut buffer, 0, bytes) {
        pool.release(buffer);
        return Err(err.into());
    }
    let id = buffer.id();
    if let Some(stale) = history.push(Revisioned { buffer, revision }) {
        pool.release(stale);
    }
    Ok(id)
}
