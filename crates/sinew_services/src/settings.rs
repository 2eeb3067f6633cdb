//! Settings management

use serde::{Deserialize, Serialize};
use sinew_core::pool::PoolSettings;
use sinew_core::skin::SkinCacheSettings;
use sinew_trace::ObjectFlags;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine settings. Missing sections and fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pool: PoolSettings,
    pub skin_cache: SkinCacheSettings,
    pub trace: TraceSettings,
}

/// Which objects a trace-route query treats as alive on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    pub include_transients: bool,
    pub keep_native: bool,
    pub keep_standalone: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            include_transients: true,
            keep_native: true,
            keep_standalone: true,
        }
    }
}

impl TraceSettings {
    pub fn keep_flags(&self) -> ObjectFlags {
        let mut flags = ObjectFlags::empty();
        if self.keep_native {
            flags |= ObjectFlags::NATIVE;
        }
        if self.keep_standalone {
            flags |= ObjectFlags::STANDALONE;
        }
        flags
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let settings = Settings::from_json_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pool.safe_frames, 3);
        assert_eq!(settings.skin_cache.budget_bytes, 128 * 1024 * 1024);
        assert_eq!(settings.trace.keep_flags(), ObjectFlags::GC_KEEP);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_json_str(
            r#"{ "pool": { "cull_after_frames": 90 }, "trace": { "keep_standalone": false } }"#,
        )
        .unwrap();
        assert_eq!(settings.pool.cull_after_frames, 90);
        assert_eq!(settings.pool.drain_per_frame, 10);
        assert_eq!(settings.trace.keep_flags(), ObjectFlags::NATIVE);
        assert!(settings.trace.include_transients);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Settings::from_json_str("{ \"pool\": 3 }").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::load("/nonexistent/sinew.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sinew.json"));
    }

    #[test]
    fn serialized_settings_load_back() {
        let mut settings = Settings::default();
        settings.skin_cache.position_stride = 16;
        let json = settings.to_json_string().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }
}
