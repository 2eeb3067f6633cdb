//! Sinew Core
//!
//! GPU skinning resource management:
//! - Size-bucketed buffer pools with deferred reuse and culling
//! - Two-slot frame tracker for current/previous skinned output
//! - Skin cache tying pools, trackers and a memory budget together

pub mod frame;
pub mod memory;
pub mod pool;
pub mod skin;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
