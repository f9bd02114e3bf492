use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use super::{RecognitionResult, TextRecognizer};
use crate::capture::RawImage;
use crate::error::{PipelineError, Result};

/// Runs the Tesseract command-line tool on each image.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    /// Explicit executable; discovered once and cached when `None`.
    pub executable: Option<PathBuf>,
    /// Tesseract language code, e.g. `eng`.
    pub language: String,
    /// Page segmentation mode passed as `--psm`.
    pub psm: u8,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            executable: None,
            language: "eng".to_string(),
            // Assume single uniform block of text
            psm: 6,
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &RawImage) -> Result<RecognitionResult> {
        let this = self.clone();
        let image = image.clone();
        tokio::task::spawn_blocking(move || this.recognize_blocking(&image))
            .await
            .map_err(|e| PipelineError::RecognitionFailed(format!("OCR worker failed: {}", e)))?
    }
}

impl TesseractRecognizer {
    /// Saves the image to a temporary PNG and reads Tesseract's stdout.
    fn recognize_blocking(&self, img: &RawImage) -> Result<RecognitionResult> {
        let tesseract_exe = find_tesseract_executable(self.executable.as_deref())?;

        let temp_input = NamedTempFile::with_suffix(".png").map_err(failed)?;
        img.save_with_format(temp_input.path(), image::ImageFormat::Png)
            .map_err(failed)?;

        let mut command = Command::new(&tesseract_exe);
        command
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string());
        if let Some(tessdata_dir) = find_tessdata_dir(&self.language) {
            command.arg("--tessdata-dir").arg(tessdata_dir);
        }

        let output = command.output().map_err(failed)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::RecognitionFailed(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("Tesseract returned {} chars", text.len());
        Ok(RecognitionResult { text })
    }
}

fn failed(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::RecognitionFailed(err.to_string())
}
