//! Locations of config, logs and saved crops.
//!
//! Everything lives next to the executable so a copied folder is
//! self-contained. Relative paths from `config.json` are resolved against the
//! same directory, not the shell's working directory.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the default config file: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the log file: `<exe_dir>/logs/ocr-monitor.log`
pub fn get_log_file() -> PathBuf {
    get_logs_dir().join("ocr-monitor.log")
}

/// Returns the directory for saved crops: `<exe_dir>/screenshots/`
pub fn get_screenshots_dir() -> PathBuf {
    get_exe_dir().join("screenshots")
}

/// Resolves a path from the config file. Absolute paths are kept.
pub fn resolve_config_path(path: &Path) -> PathBuf {
    resolve_against(get_exe_dir(), path)
}

/// Path for a saved OCR input: `<exe_dir>/screenshots/crop_<timestamp>.png`
pub fn crop_output_path(captured_at: &DateTime<Local>) -> PathBuf {
    get_screenshots_dir().join(crop_file_name(captured_at))
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn crop_file_name(captured_at: &DateTime<Local>) -> String {
    // Milliseconds keep back-to-back captures from overwriting each other
    format!("crop_{}.png", captured_at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_screenshots_dir())?;
    Ok(())
}
