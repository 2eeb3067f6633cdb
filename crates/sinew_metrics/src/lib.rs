//! Sinew Metrics - counters and timings for pool and trace instrumentation
//!
//! Everything here vanishes in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use sinew_metrics::{Counter, FrameTimer};
//!
//! let mut counters = Counter::new();
//! counters.increment("reused", 1);
//!
//! let mut timer = FrameTimer::new(60); // Track last 60 frames
//! timer.begin();
//! // ... skin and drain ...
//! timer.end();
//! println!("{:.2} ms", timer.frame_time_ms());
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod scope_profiler;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use scope_profiler::ScopeProfiler;

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a named scope (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        {
            $profiler.time_scope($name, || $body)
        }
        #[cfg(not(feature = "metrics"))]
        {
            $body
        }
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
}

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn average(&self) -> T where T: Default { T::default() }
    pub fn peak(&self) -> T where T: Default { T::default() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct ScopeProfiler;

#[cfg(not(feature = "metrics"))]
impl ScopeProfiler {
    pub fn new() -> Self { Self }
    pub fn time_scope<F: FnOnce() -> R, R>(&mut self, _name: &'static str, f: F) -> R { f() }
    pub fn timing(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_compiles_with_either_feature_set() {
        let mut _timer = super::FrameTimer::new(60);
        let mut _buffer = super::RingBuffer::<u64>::new(10);
        let mut counter = super::Counter::new();
        let mut profiler = super::ScopeProfiler::new();
        counter.increment("created", 2);
        let value = time_scope!(profiler, "work", { 40 + 2 });
        assert_eq!(value, 42);
    }
}
