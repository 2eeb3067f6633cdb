//! Memory budget for skin cache output buffers

/// Byte budget with per-frame shortfall tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    limit: u64,
    used: u64,
    extra_required: u64,
}

impl MemoryBudget {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: 0,
            extra_required: 0,
        }
    }

    /// Reserve `bytes` if they fit; otherwise remember the shortfall for
    /// this frame and refuse.
    pub fn try_reserve(&mut self, bytes: u64) -> bool {
        match self.used.checked_add(bytes) {
            Some(total) if total <= self.limit => {
                self.used = total;
                true
            }
            _ => {
                self.extra_required += bytes.saturating_sub(self.available());
                false
            }
        }
    }

    pub fn release(&mut self, bytes: u64) {
        debug_assert!(bytes <= self.used, "released more than was reserved");
        self.used = self.used.saturating_sub(bytes);
    }

    /// Clear the shortfall, returning what it was.
    pub fn reset_frame(&mut self) -> u64 {
        std::mem::take(&mut self.extra_required)
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    pub fn extra_required(&self) -> u64 {
        self.extra_required
    }
}
