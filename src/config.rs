//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides the monitoring
//! interval, crop region, preprocessing options and recognizer backend.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::monitor::DEFAULT_INTERVAL_MS;
use crate::ocr::RecognizerConfig;
use crate::region::CropSpec;

/// Complete application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Monitoring tick interval in milliseconds (1000 to 60000)
    pub interval_ms: u64,
    /// Region to OCR; `null` sends the whole capture
    pub crop: Option<CropSpec>,
    /// Integer upscale factor applied after cropping
    pub upscale: u32,
    /// Bright-text threshold (pixels with R, G, B all > threshold become text)
    pub threshold: Option<u8>,
    /// OCR backend
    pub recognizer: RecognizerConfig,
    /// CSV file that monitoring results are appended to
    pub csv_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            crop: Some(CropSpec::default()),
            upscale: 2,
            threshold: None,
            recognizer: RecognizerConfig::default(),
            csv_path: None,
        }
    }
}

/// Loads configuration from `config_path`, or returns defaults.
///
/// A missing or unparseable file is logged and replaced by defaults so the
/// tool always starts.
pub fn load_config(config_path: &Path) -> AppConfig {
    info!("Looking for config at: {}", config_path.display());

    if !config_path.exists() {
        info!("{} not found. Using default config.", config_path.display());
        return AppConfig::default();
    }

    match fs::read_to_string(config_path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("Config loaded from {}", config_path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Failed to parse {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Anchor;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.interval_ms, 5000);
        assert_eq!(config.upscale, 2);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "interval_ms": 2000,
                "crop": {"kind": "anchored", "anchor": "bottom_right", "width": 300, "height": 60, "offset_x": 10, "offset_y": 4},
                "threshold": 180
            }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.interval_ms, 2000);
        assert_eq!(config.threshold, Some(180));
        assert_eq!(config.upscale, 2);
        assert_eq!(
            config.crop,
            Some(CropSpec::Anchored {
                anchor: Anchor::BottomRight,
                width: 300,
                height: 60,
                offset_x: 10,
                offset_y: 4,
            })
        );
    }

    #[test]
    fn test_null_crop_means_full_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"crop": null}"#).unwrap();
        assert_eq!(load_config(&path).crop, None);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }
}
