//! In-memory stand-ins for the OS and OCR boundaries, shared by unit tests.

use async_trait::async_trait;
use image::{ImageBuffer, Rgba};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::capture::{Bounds, DisplayDescriptor, RawImage, ScreenSource, WindowDescriptor};
use crate::error::{PipelineError, Result};
use crate::ocr::{RecognitionResult, TextRecognizer};

pub fn gradient(width: u32, height: u32) -> RawImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

/// Screen that returns a gradient; windows capture at half the display size.
pub struct FakeScreen {
    width: u32,
    height: u32,
    fail: bool,
    window_captures: Mutex<Vec<u32>>,
}

impl FakeScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: false,
            window_captures: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0, 0)
        }
    }

    pub fn window_captures(&self) -> Vec<u32> {
        self.window_captures.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(PipelineError::CaptureUnavailable("permission denied".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ScreenSource for FakeScreen {
    async fn capture_display(&self, _display_index: Option<usize>) -> Result<RawImage> {
        self.check()?;
        Ok(gradient(self.width, self.height))
    }

    async fn capture_window(&self, window_id: u32) -> Result<RawImage> {
        self.check()?;
        self.window_captures.lock().unwrap().push(window_id);
        Ok(gradient(self.width / 2, self.height / 2))
    }

    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>> {
        self.check()?;
        Ok(vec![
            WindowDescriptor {
                id: 1,
                title: "Game".to_string(),
                owner_name: "game".to_string(),
                bounds: Bounds { x: 0, y: 0, width: 800, height: 600 },
            },
            WindowDescriptor {
                id: 2,
                title: String::new(),
                owner_name: "shell".to_string(),
                bounds: Bounds { x: 0, y: 0, width: 800, height: 600 },
            },
        ])
    }

    async fn list_displays(&self) -> Result<Vec<DisplayDescriptor>> {
        self.check()?;
        Ok(vec![DisplayDescriptor {
            index: 0,
            id: 1,
            name: "fake".to_string(),
            bounds: Bounds { x: 0, y: 0, width: self.width, height: self.height },
            is_primary: true,
        }])
    }
}

/// Recognizer that replays scripted results, then repeats a fallback text.
pub struct FakeRecognizer {
    script: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sizes: Mutex<Vec<(u32, u32)>>,
}

impl FakeRecognizer {
    pub fn new(fallback: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(fallback: &str, script: Vec<Result<String>>) -> Self {
        let recognizer = Self::new(fallback);
        *recognizer.script.lock().unwrap() = script.into();
        recognizer
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent `recognize` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Dimensions of every image handed to `recognize`, in call order.
    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(&self, image: &RawImage) -> Result<RecognitionResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().unwrap().push(image.dimensions());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let text = match next {
            Some(result) => result?,
            None => self.fallback.replace("{n}", &call.to_string()),
        };
        Ok(RecognitionResult { text })
    }
}
