//! Live frame stream from a shared screen or window.
//!
//! Whatever owns the capture (a browser bridge, a recorder) publishes frames
//! into a `LiveStream`; acquisition reads the most recent one.

use std::sync::Arc;
use tokio::sync::watch;

use super::RawImage;
use crate::error::{PipelineError, Result};

type Frame = Option<Arc<RawImage>>;

/// Producer side of a live capture stream.
#[derive(Debug)]
pub struct LiveStream {
    sender: watch::Sender<Frame>,
}

/// Consumer handle that can be cloned into capture requests.
#[derive(Clone, Debug)]
pub struct FrameReceiver {
    receiver: watch::Receiver<Frame>,
}

impl LiveStream {
    /// Creates a stream with no frame attached yet.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replaces the current frame.
    pub fn publish(&self, frame: RawImage) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    /// Detaches the stream, e.g. when the user stops sharing.
    pub fn detach(&self) {
        self.sender.send_replace(None);
    }

    pub fn subscribe(&self) -> FrameReceiver {
        FrameReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for LiveStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Copies out the current frame at native resolution.
    pub fn current_frame(&self) -> Result<RawImage> {
        // A dropped producer means the share ended, even if a frame is cached
        if self.receiver.has_changed().is_err() {
            return Err(PipelineError::NoActiveStream);
        }
        self.receiver
            .borrow()
            .as_deref()
            .cloned()
            .ok_or(PipelineError::NoActiveStream)
    }
}
