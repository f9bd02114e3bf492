use log::{debug, info};
use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::error::{PipelineError, Result};

/// Windows installer locations (UB-Mannheim builds).
const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

/// Executable found by the last successful discovery. Failures are not cached
/// so installing Tesseract while monitoring takes effect on the next tick.
static DISCOVERED_EXE: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory for a private Tesseract copy:
/// `<local data dir>/ocr-monitor/tesseract`
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocr-monitor")
        .join("tesseract")
}

fn executable_name() -> String {
    format!("tesseract{}", EXE_SUFFIX)
}

/// Finds the Tesseract executable.
///
/// Search order: configured path, private data dir, `PATH`, common install dirs.
/// Without a configured path the discovered executable is cached for the
/// lifetime of the process.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(PipelineError::RecognitionFailed(format!(
            "configured Tesseract executable not found: {}",
            path.display()
        )));
    }

    cached_or_discover(&DISCOVERED_EXE, discover_tesseract_executable)
}

fn cached_or_discover(
    cache: &OnceLock<PathBuf>,
    discover: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = cache.get() {
        return Ok(path.clone());
    }
    let path = discover()?;
    Ok(cache.get_or_init(|| path).clone())
}

fn discover_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() {
        debug!("Using Tesseract from {}", local_exe.display());
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in COMMON_INSTALL_DIRS {
        let p = Path::new(dir).join(executable_name());
        if p.exists() {
            info!("Found Tesseract at: {}", p.display());
            return Ok(p);
        }
    }

    Err(PipelineError::RecognitionFailed(
        "Tesseract not found. Install Tesseract-OCR or set recognizer.executable in config.json"
            .to_string(),
    ))
}

/// Finds a tessdata directory containing `<language>.traineddata`.
///
/// Returns `None` when Tesseract should fall back to its built-in search path.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }
    candidates.extend(COMMON_INSTALL_DIRS.iter().map(|d| Path::new(d).join("tessdata")));

    candidates
        .into_iter()
        .find(|dir| dir.join(&traineddata).exists())
}
