//! Image acquisition.
//!
//! This module provides:
//! - The three capture sources (`ImageSource`)
//! - OS screenshot and window listing boundary (`ScreenSource`, `XcapScreen`)
//! - Live frame streams (`LiveStream`)
//! - Uploaded file decoding (`decode_upload`)
//!
//! The caller picks the source; acquisition never chooses among them.

pub mod screenshot;
pub mod stream;
pub mod upload;
pub mod window;

use image::{ImageBuffer, Rgba};
use std::sync::Arc;

pub use screenshot::{ScreenSource, XcapScreen};
pub use stream::{FrameReceiver, LiveStream};
pub use upload::decode_upload;
pub use window::{Bounds, DisplayDescriptor, WindowDescriptor, visible_windows};

use crate::error::Result;

/// Raw RGBA pixels at capture resolution.
pub type RawImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Where a capture's pixels come from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Current frame of an already-shared screen or window.
    LiveFrame(FrameReceiver),
    /// One-shot OS screenshot. `window` takes precedence over `display`.
    OsScreenshot {
        display: Option<usize>,
        window: Option<u32>,
    },
    /// Encoded image bytes supplied by the user.
    FileUpload(Arc<[u8]>),
}

impl ImageSource {
    pub fn display(index: Option<usize>) -> Self {
        ImageSource::OsScreenshot {
            display: index,
            window: None,
        }
    }

    pub fn window(window_id: u32) -> Self {
        ImageSource::OsScreenshot {
            display: None,
            window: Some(window_id),
        }
    }

    pub fn upload(bytes: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::FileUpload(bytes.into())
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::LiveFrame(_) => "live frame".to_string(),
            ImageSource::OsScreenshot {
                window: Some(id), ..
            } => format!("window {}", id),
            ImageSource::OsScreenshot { display, .. } => {
                format!("display {}", display.unwrap_or(0))
            }
            ImageSource::FileUpload(bytes) => format!("upload ({} bytes)", bytes.len()),
        }
    }
}

/// Acquires a raw image from the requested source.
pub async fn acquire(source: &ImageSource, screen: &dyn ScreenSource) -> Result<RawImage> {
    match source {
        ImageSource::LiveFrame(frames) => frames.current_frame(),
        ImageSource::OsScreenshot {
            window: Some(window_id),
            ..
        } => screen.capture_window(*window_id).await,
        ImageSource::OsScreenshot { display, .. } => screen.capture_display(*display).await,
        ImageSource::FileUpload(bytes) => decode_upload(bytes),
    }
}
