//! Two-slot residency tracking for skinned output.
//!
//! Velocity (motion blur) needs the previous frame's skinned positions
//! next to the current ones. Each skinned mesh owns [`NUM_BUFFERS`]
//! physical output buffers; the tracker records which (bone buffer,
//! revision) pair each slot was last written from.

use crate::pool::BufferId;

pub const NUM_BUFFERS: usize = 2;

/// Identifies the data a slot holds: the bone buffer it was skinned from
/// and that buffer's revision (normally the frame number of the upload).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotTag {
    pub source: BufferId,
    pub revision: u32,
}

impl SlotTag {
    pub const fn new(source: BufferId, revision: u32) -> Self {
        Self { source, revision }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameTracker {
    tags: [Option<SlotTag>; NUM_BUFFERS],
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.tags = [None; NUM_BUFFERS];
    }

    #[inline]
    pub fn num_buffers(&self) -> usize {
        NUM_BUFFERS
    }

    #[inline]
    pub fn tag(&self, slot: usize) -> Option<SlotTag> {
        self.tags.get(slot).copied().flatten()
    }

    /// Slot holding exactly `tag`, if any.
    pub fn find(&self, tag: SlotTag) -> Option<usize> {
        self.tags.iter().position(|slot| *slot == Some(tag))
    }

    /// Retag the first slot that holds neither `current` nor `previous`
    /// with `current`. Slot 0 is preferred when both qualify, regardless
    /// of which revision is older.
    ///
    /// Call once per frame, with frames in increasing order.
    pub fn advance(&mut self, current: SlotTag, previous: Option<SlotTag>) {
        let live = [Some(current), previous];
        for slot in self.tags.iter_mut() {
            let needed = slot.is_some() && live.contains(slot);
            if !needed {
                *slot = Some(current);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: BufferId = BufferId::from_raw(1);
    const B: BufferId = BufferId::from_raw(2);
    const C: BufferId = BufferId::from_raw(3);

    #[test]
    fn empty_tracker_finds_nothing() {
        let tracker = FrameTracker::new();
        assert_eq!(tracker.find(SlotTag::new(A, 0)), None);
        assert_eq!(tracker.tag(0), None);
        assert_eq!(tracker.tag(NUM_BUFFERS), None);
    }

    #[test]
    fn current_and_previous_stay_resident() {
        let mut tracker = FrameTracker::new();
        // Frame producing (B, 2), then the frame producing (A, 1) with (B, 2) as history.
        tracker.advance(SlotTag::new(B, 2), None);
        tracker.advance(SlotTag::new(A, 1), Some(SlotTag::new(B, 2)));

        assert!(tracker.find(SlotTag::new(A, 1)).is_some());
        assert!(tracker.find(SlotTag::new(B, 2)).is_some());
        assert_eq!(tracker.find(SlotTag::new(C, 3)), None);

        tracker.advance(SlotTag::new(A, 1), Some(SlotTag::new(C, 3)));
        assert_eq!(tracker.find(SlotTag::new(B, 2)), None);
        assert!(tracker.find(SlotTag::new(A, 1)).is_some());
    }

    #[test]
    fn ties_evict_slot_zero() {
        let mut tracker = FrameTracker::new();
        tracker.advance(SlotTag::new(A, 1), None);
        tracker.advance(SlotTag::new(A, 2), Some(SlotTag::new(A, 1)));
        assert_eq!(tracker.find(SlotTag::new(A, 1)), Some(0));
        assert_eq!(tracker.find(SlotTag::new(A, 2)), Some(1));

        // Neither slot is live: slot 0 is reused even though slot 1 is newer.
        tracker.advance(SlotTag::new(B, 7), None);
        assert_eq!(tracker.find(SlotTag::new(B, 7)), Some(0));
        assert_eq!(tracker.find(SlotTag::new(A, 2)), Some(1));
    }

    #[test]
    fn rolling_frames_keep_two_revisions() {
        let mut tracker = FrameTracker::new();
        let mut previous = None;
        for revision in 1..=6 {
            let current = SlotTag::new(A, revision);
            tracker.advance(current, previous);
            assert!(tracker.find(current).is_some());
            if let Some(prev) = previous {
                assert!(tracker.find(prev).is_some());
            }
            if revision > 2 {
                assert_eq!(tracker.find(SlotTag::new(A, revision - 2)), None);
            }
            previous = Some(current);
        }
    }

    #[test]
    fn reset_clears_all_slots() {
        let mut tracker = FrameTracker::new();
        tracker.advance(SlotTag::new(A, 1), None);
        tracker.reset();
        assert_eq!(tracker.find(SlotTag::new(A, 1)), None);
    }
}
