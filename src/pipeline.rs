//! One-shot capture → crop → recognize → parse chain.
//!
//! Manual captures call `Pipeline::analyze` directly; monitoring sessions call
//! it once per tick.

use chrono::{DateTime, Local};
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::capture::{
    DisplayDescriptor, ImageSource, RawImage, ScreenSource, WindowDescriptor, acquire,
    visible_windows,
};
use crate::config::AppConfig;
use crate::error::Result;
use crate::ocr::{ParsedFields, TextRecognizer, crop, parse_fields, threshold_bright_pixels};
use crate::region::{CropRectangle, CropSpec, resolve};

/// Image preparation applied between acquisition and recognition.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisSettings {
    /// Used when a request carries no crop of its own; `None` means full image.
    pub default_crop: Option<CropSpec>,
    pub upscale: u32,
    pub threshold: Option<u8>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AnalysisSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_crop: config.crop.clone(),
            upscale: config.upscale,
            threshold: config.threshold,
        }
    }
}

/// What to capture and which part of it to read.
#[derive(Clone, Debug)]
pub struct CaptureRequest {
    pub source: ImageSource,
    pub crop: Option<CropSpec>,
}

impl CaptureRequest {
    pub fn new(source: ImageSource) -> Self {
        Self { source, crop: None }
    }

    pub fn with_crop(mut self, crop: Option<CropSpec>) -> Self {
        self.crop = crop;
        self
    }
}

/// Outcome of one successful pass through the pipeline.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub text: String,
    pub fields: ParsedFields,
    /// Region of the raw capture that was recognized
    pub crop: CropRectangle,
    /// Image actually sent to the recognizer
    #[serde(skip)]
    pub image: RawImage,
    pub captured_at: DateTime<Local>,
}

/// The capture/OCR chain with its external collaborators injected.
pub struct Pipeline {
    screen: Arc<dyn ScreenSource>,
    recognizer: Arc<dyn TextRecognizer>,
    settings: AnalysisSettings,
}

impl Pipeline {
    pub fn new(
        screen: Arc<dyn ScreenSource>,
        recognizer: Arc<dyn TextRecognizer>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            screen,
            recognizer,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Capturable windows, with untitled and tiny windows removed.
    pub async fn windows(&self) -> Result<Vec<WindowDescriptor>> {
        Ok(visible_windows(self.screen.list_windows().await?))
    }

    pub async fn displays(&self) -> Result<Vec<DisplayDescriptor>> {
        self.screen.list_displays().await
    }

    /// Runs acquire → resolve → crop → recognize → parse once.
    pub async fn analyze(&self, request: &CaptureRequest) -> Result<Analysis> {
        let started = Instant::now();
        let captured_at = Local::now();

        let raw = acquire(&request.source, self.screen.as_ref()).await?;
        debug!(
            "Acquired {}x{} from {}",
            raw.width(),
            raw.height(),
            request.source.describe()
        );

        let (image, rect) = self.prepare(&raw, request.crop.as_ref())?;
        debug!(
            "Cropped to ({}, {}) {}x{}, sending {}x{} to OCR",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            image.width(),
            image.height()
        );

        let result = self.recognizer.recognize(&image).await?;
        let fields = parse_fields(&result.text);
        debug!(
            "Analysis done in {}ms: total={:?} percentage={:?}",
            started.elapsed().as_millis(),
            fields.total,
            fields.percentage
        );

        Ok(Analysis {
            text: result.text,
            fields,
            crop: rect,
            image,
            captured_at,
        })
    }

    /// Crops, upscales and optionally thresholds a raw capture.
    pub fn prepare(
        &self,
        raw: &RawImage,
        crop_spec: Option<&CropSpec>,
    ) -> Result<(RawImage, CropRectangle)> {
        let (width, height) = raw.dimensions();
        let spec = crop_spec.or(self.settings.default_crop.as_ref());
        let rect = match spec {
            Some(spec) => resolve(width, height, spec)?,
            None => resolve(width, height, &CropSpec::Rect {
                x: 0,
                y: 0,
                width: width as i64,
                height: height as i64,
            })?,
        };

        let mut image = crop(raw, rect, self.settings.upscale)?;
        if let Some(threshold) = self.settings.threshold {
            image = threshold_bright_pixels(&image, threshold);
        }
        Ok((image, rect))
    }
}
