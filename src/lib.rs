//! Screen-region OCR monitor.
//!
//! Captures a screen, window, live frame or uploaded image, crops the region
//! of interest, runs text recognition and extracts a total and a percentage.
//! Monitoring sessions repeat that on a timer and keep a short history.

pub mod capture;
pub mod config;
pub mod error;
pub mod monitor;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod region;

#[cfg(test)]
mod test_support;

pub use error::{PipelineError, Result};
pub use monitor::SessionManager;
pub use pipeline::{Analysis, AnalysisSettings, CaptureRequest, Pipeline};
