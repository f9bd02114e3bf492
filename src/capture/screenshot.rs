//! OS-level screenshot and window enumeration boundary.
//!
//! The pipeline only sees the `ScreenSource` trait. `XcapScreen` is the real
//! implementation; xcap calls block, so each one runs on the blocking pool.

use async_trait::async_trait;
use image::ImageBuffer;
use log::{debug, info};
use xcap::{Monitor, Window};

use super::RawImage;
use super::window::{Bounds, DisplayDescriptor, WindowDescriptor};
use crate::error::{PipelineError, Result};

/// Screenshot and window listing services provided by the operating system.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// Captures a full display. `None` selects the first display.
    async fn capture_display(&self, display_index: Option<usize>) -> Result<RawImage>;

    /// Captures a single window by its OS id.
    async fn capture_window(&self, window_id: u32) -> Result<RawImage>;

    /// Lists every window the OS reports, unfiltered.
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>>;

    /// Lists attached displays in enumeration order.
    async fn list_displays(&self) -> Result<Vec<DisplayDescriptor>>;
}

/// `ScreenSource` backed by the xcap crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct XcapScreen;

#[async_trait]
impl ScreenSource for XcapScreen {
    async fn capture_display(&self, display_index: Option<usize>) -> Result<RawImage> {
        run_blocking(move || {
            let index = display_index.unwrap_or(0);
            let monitors = Monitor::all().map_err(unavailable)?;
            let monitor = monitors.into_iter().nth(index).ok_or_else(|| {
                PipelineError::CaptureUnavailable(format!("display {} not found", index))
            })?;

            debug!("Capturing display {}", index);
            let image = monitor.capture_image().map_err(unavailable)?;
            into_raw_image(image.width(), image.height(), image.into_raw())
        })
        .await
    }

    async fn capture_window(&self, window_id: u32) -> Result<RawImage> {
        run_blocking(move || {
            let windows = Window::all().map_err(unavailable)?;
            let window = windows
                .into_iter()
                .find(|w| w.id().ok() == Some(window_id))
                .ok_or_else(|| {
                    PipelineError::CaptureUnavailable(format!("window {} not found", window_id))
                })?;

            if window.is_minimized().unwrap_or(false) {
                return Err(PipelineError::CaptureUnavailable(format!(
                    "window {} is minimized",
                    window_id
                )));
            }

            debug!("Capturing window {}", window_id);
            let image = window.capture_image().map_err(unavailable)?;
            into_raw_image(image.width(), image.height(), image.into_raw())
        })
        .await
    }

    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>> {
        run_blocking(|| {
            let windows = Window::all().map_err(unavailable)?;
            let descriptors: Vec<WindowDescriptor> = windows
                .iter()
                .filter_map(|w| {
                    // Windows that vanish mid-enumeration fail their getters; skip them
                    Some(WindowDescriptor {
                        id: w.id().ok()?,
                        title: w.title().unwrap_or_default(),
                        owner_name: w.app_name().unwrap_or_else(|_| "Unknown".to_string()),
                        bounds: Bounds {
                            x: w.x().ok()?,
                            y: w.y().ok()?,
                            width: w.width().ok()?,
                            height: w.height().ok()?,
                        },
                    })
                })
                .collect();
            info!("Enumerated {} windows", descriptors.len());
            Ok(descriptors)
        })
        .await
    }

    async fn list_displays(&self) -> Result<Vec<DisplayDescriptor>> {
        run_blocking(|| {
            let monitors = Monitor::all().map_err(unavailable)?;
            let displays = monitors
                .iter()
                .enumerate()
                .map(|(index, m)| DisplayDescriptor {
                    index,
                    id: m.id().unwrap_or_default(),
                    name: m.name().unwrap_or_else(|_| format!("display-{}", index)),
                    bounds: Bounds {
                        x: m.x().unwrap_or_default(),
                        y: m.y().unwrap_or_default(),
                        width: m.width().unwrap_or_default(),
                        height: m.height().unwrap_or_default(),
                    },
                    is_primary: m.is_primary().unwrap_or(false),
                })
                .collect();
            Ok(displays)
        })
        .await
    }
}

fn unavailable(err: xcap::XCapError) -> PipelineError {
    PipelineError::CaptureUnavailable(err.to_string())
}

/// Rebuilds xcap's buffer with our `image` version.
fn into_raw_image(width: u32, height: u32, pixels: Vec<u8>) -> Result<RawImage> {
    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
        PipelineError::CaptureUnavailable(format!(
            "screenshot buffer does not match {}x{}",
            width, height
        ))
    })
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::CaptureUnavailable(format!("capture worker failed: {}", e)))?
}
