pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod remote;
pub mod setup;

pub use engine::TesseractRecognizer;
pub use extract::{ParsedFields, parse_fields};
pub use preprocess::{crop, threshold_bright_pixels};
pub use remote::HttpRecognizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::capture::RawImage;
use crate::error::Result;

/// Recognized text for one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
}

/// Text recognition backend.
///
/// Calls may take seconds and may fail; implementations must not block the
/// async runtime while they wait.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &RawImage) -> Result<RecognitionResult>;
}

/// Which recognizer to build, as stored in config.json.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognizerConfig {
    Tesseract {
        #[serde(default)]
        executable: Option<PathBuf>,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default = "default_psm")]
        psm: u8,
    },
    Http {
        endpoint: String,
    },
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_psm() -> u8 {
    6
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig::Tesseract {
            executable: None,
            language: default_language(),
            psm: default_psm(),
        }
    }
}

/// Builds the configured recognizer.
pub fn build_recognizer(config: &RecognizerConfig) -> Result<Arc<dyn TextRecognizer>> {
    Ok(match config {
        RecognizerConfig::Tesseract {
            executable,
            language,
            psm,
        } => Arc::new(TesseractRecognizer {
            executable: executable.clone(),
            language: language.clone(),
            psm: *psm,
        }),
        RecognizerConfig::Http { endpoint } => Arc::new(HttpRecognizer::new(endpoint.clone())?),
    })
}
