//! Sinew Services Layer
//!
//! Settings loading shared by the runtime and tools.

pub mod settings;

pub use settings::{Settings, SettingsError, TraceSettings};
