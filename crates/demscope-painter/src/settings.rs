//! Runtime settings for the load lifecycle.

use crate::error::SettingsError;
use crate::scheduler::LoadScheduler;
use demscope_common::ViewMode;
use demscope_mesh::INVALID_VALUE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on load workers, whatever the host offers.
pub const MAX_LOAD_WORKERS: usize = 4;

/// Default interval between progress notifications for one DEM.
pub const DEFAULT_NOTIFY_INTERVAL_MS: u64 = 47;

/// Settings for a [`DemManager`](crate::DemManager).
///
/// Every field has a default, so a YAML document only needs the keys it
/// changes:
///
/// ```yaml
/// max_concurrent_loads: 2
/// cache_dir: /tmp/dem-cache
/// default_view_mode: IncludingInvalid
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Worker threads for loads. Zero means one per available core, up to
    /// [`MAX_LOAD_WORKERS`].
    pub max_concurrent_loads: usize,
    pub notify_interval_ms: u64,
    /// Sentinel marking undefined grid samples.
    pub invalid_value: f32,
    /// Download cache for remote sources. Without one only local files load.
    pub cache_dir: Option<PathBuf>,
    /// Mode used when a DEM's configuration does not name one.
    pub default_view_mode: ViewMode,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            max_concurrent_loads: 0,
            notify_interval_ms: DEFAULT_NOTIFY_INTERVAL_MS,
            invalid_value: INVALID_VALUE,
            cache_dir: None,
            default_view_mode: ViewMode::ValidOnly,
        }
    }
}

impl LoadSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_millis(self.notify_interval_ms)
    }

    /// Number of load workers to start.
    ///
    /// Never more than the available parallelism nor [`MAX_LOAD_WORKERS`],
    /// never less than one.
    pub fn worker_count(&self) -> usize {
        let cap = LoadScheduler::default_workers();
        match self.max_concurrent_loads {
            0 => cap,
            n => n.min(cap),
        }
        .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LoadSettings::default();
        assert_eq!(settings.notify_interval(), Duration::from_millis(47));
        assert_eq!(settings.invalid_value, -1.0e38);
        assert!(settings.cache_dir.is_none());
        let workers = settings.worker_count();
        assert!((1..=MAX_LOAD_WORKERS).contains(&workers));
    }

    #[test]
    fn test_partial_yaml() {
        let settings = LoadSettings::from_yaml_str("max_concurrent_loads: 1\ncache_dir: /tmp/cache\n").unwrap();
        assert_eq!(settings.max_concurrent_loads, 1);
        assert_eq!(settings.worker_count(), 1);
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(settings.notify_interval_ms, DEFAULT_NOTIFY_INTERVAL_MS);
    }

    #[test]
    fn test_worker_count_is_capped() {
        let settings = LoadSettings {
            max_concurrent_loads: 64,
            ..LoadSettings::default()
        };
        assert!(settings.worker_count() <= MAX_LOAD_WORKERS);
    }

    #[test]
    fn test_yaml_round_trip() {
        let settings = LoadSettings {
            notify_interval_ms: 100,
            default_view_mode: ViewMode::IncludingInvalid,
            ..LoadSettings::default()
        };
        let yaml = settings.to_yaml_string().unwrap();
        assert_eq!(LoadSettings::from_yaml_str(&yaml).unwrap(), settings);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = LoadSettings::from_yaml_str("notify_interval_ms: soon\n").unwrap_err();
        assert!(matches!(err, SettingsError::Yaml(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoadSettings::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
