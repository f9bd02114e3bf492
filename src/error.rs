//! Error taxonomy shared by every pipeline stage.
//!
//! All variants are recoverable at the call site: one-shot operations report
//! them to the caller, monitoring sessions log them and skip the tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("crop region has no visible pixels inside a {image_width}x{image_height} image")]
    InvalidCropRegion { image_width: u32, image_height: u32 },

    #[error("no active capture stream")]
    NoActiveStream,

    #[error("screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("monitoring interval {0}ms is outside the allowed range [1000, 60000]")]
    InvalidInterval(u64),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
