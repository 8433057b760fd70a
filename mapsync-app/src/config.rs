use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mapsync_core::Viewport;
use mapsync_search::{DispatcherConfig, StalePolicy};

use crate::resilience::ResilienceConfig;

/// How pointer and wheel input reach the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// The engine's own gesture handlers drive the camera.
    #[default]
    Native,
    /// Native handlers are suspended and the capture overlay drives the
    /// camera through the validated store.
    SafeMode,
}

// ---------------------------------------------------------------------------
// Controller settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_relayout_delay_ms")]
    pub relayout_delay_ms: u64,
    /// Consecutive recoveries without a healthy idle before the map is
    /// reported degraded.
    #[serde(default = "default_max_recoveries")]
    pub max_recoveries: u32,
    /// Case-insensitive substrings that mark an engine error as a transform fault.
    #[serde(default = "default_transform_signatures")]
    pub transform_signatures: Vec<String>,
    #[serde(default = "default_projection_tolerance_deg")]
    pub projection_tolerance_deg: f64,
    #[serde(default = "default_tile_size_px")]
    pub tile_size_px: f64,
    /// Zoom change per wheel notch in safe mode.
    #[serde(default = "default_wheel_zoom_step")]
    pub wheel_zoom_step: f64,
    #[serde(default)]
    pub stale_policy: StalePolicy,
    #[serde(default)]
    pub input_mode: InputMode,
    /// Switch to safe-mode input once the map is reported degraded.
    #[serde(default = "default_true")]
    pub auto_safe_mode: bool,
    #[serde(default = "default_initial_viewport")]
    pub initial_viewport: Viewport,
    /// Zoom applied with a geolocation fix. `None` keeps the current zoom.
    #[serde(default = "default_geolocation_zoom")]
    pub geolocation_zoom: Option<f64>,
}

fn default_debounce_ms() -> u64 {
    300
}
fn default_retry_backoff_ms() -> u64 {
    150
}
fn default_relayout_delay_ms() -> u64 {
    250
}
fn default_max_recoveries() -> u32 {
    3
}
fn default_transform_signatures() -> Vec<String> {
    ["transform", "matrix", "projection", "invalid lnglat", "nan"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_projection_tolerance_deg() -> f64 {
    1e-6
}
fn default_tile_size_px() -> f64 {
    512.0
}
fn default_wheel_zoom_step() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_initial_viewport() -> Viewport {
    Viewport::from_parts(40.7128, -74.006, 12.0)
}
fn default_geolocation_zoom() -> Option<f64> {
    Some(14.0)
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            relayout_delay_ms: default_relayout_delay_ms(),
            max_recoveries: default_max_recoveries(),
            transform_signatures: default_transform_signatures(),
            projection_tolerance_deg: default_projection_tolerance_deg(),
            tile_size_px: default_tile_size_px(),
            wheel_zoom_step: default_wheel_zoom_step(),
            stale_policy: StalePolicy::default(),
            input_mode: InputMode::default(),
            auto_safe_mode: true,
            initial_viewport: default_initial_viewport(),
            geolocation_zoom: default_geolocation_zoom(),
        }
    }
}

impl ControllerConfig {
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig {
            relayout_delay: Duration::from_millis(self.relayout_delay_ms),
            max_recoveries: self.max_recoveries,
            signatures: self.transform_signatures.clone(),
        }
    }

    /// Load settings from `path`, falling back to defaults on any problem.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<ControllerConfig>(&json) {
                    Ok(config) => {
                        info!("Loaded controller settings from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        error!("Failed to parse controller settings: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read controller settings file: {e}");
                }
            }
        } else {
            debug!("No controller settings file at {}", path.display());
        }
        Self::default()
    }

    /// Persist settings to `path`.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Saved controller settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("mapsync-config-{}-{name}", std::process::id()))
            .join("mapsync.json")
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config: ControllerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.dispatcher(), DispatcherConfig::default());
        assert!(config.initial_viewport.is_valid());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"debounce_ms": 50, "input_mode": "safe_mode"}"#).unwrap();
        assert_eq!(config.dispatcher().debounce, Duration::from_millis(50));
        assert_eq!(config.input_mode, InputMode::SafeMode);
        assert_eq!(config.retry_backoff_ms, 150);
    }

    #[test]
    fn resilience_settings_carry_over() {
        let config = ControllerConfig {
            max_recoveries: 5,
            relayout_delay_ms: 10,
            ..ControllerConfig::default()
        };
        let r = config.resilience();
        assert_eq!(r.max_recoveries, 5);
        assert_eq!(r.relayout_delay, Duration::from_millis(10));
        assert!(r.signatures.iter().any(|s| s == "matrix"));
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("save");
        let config = ControllerConfig {
            stale_policy: StalePolicy::LatestDispatchedOnly,
            geolocation_zoom: None,
            ..ControllerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ControllerConfig::load(&path), config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let path = temp_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert_eq!(ControllerConfig::load(&path), ControllerConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert_eq!(
            ControllerConfig::load(Path::new("/nonexistent/mapsync.json")),
            ControllerConfig::default()
        );
    }
}
