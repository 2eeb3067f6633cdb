//! Render frame numbering
//!
//! Pools and trackers are driven by an explicit frame number rather than
//! a global counter.

/// Monotonic render frame counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame number truncated to a buffer revision.
    pub fn revision(&self) -> u32 {
        self.frame as u32
    }

    /// Move to the next frame and return its number.
    pub fn advance(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }
}
