use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

use super::state::Stage;

/// An in-memory still frame.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageBuffer {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("{0} camera is unavailable: {1}")]
    Unavailable(Stage, String),
    #[error("{0} camera is already in use")]
    Busy(Stage),
    #[error("{0} camera is not open")]
    NotOpen(Stage),
    #[error("captured frame is empty")]
    EmptyFrame,
}

/// A live camera-like source, one independent handle per stage.
pub trait FrameSource: Send + Sync {
    fn open(&self, target: Stage) -> Result<(), CaptureError>;
    fn snapshot(&self, target: Stage) -> Result<ImageBuffer, CaptureError>;
    fn close(&self, target: Stage);
}

/// Scoped camera acquisition; the target is closed when the guard drops.
pub struct CameraGuard {
    source: Arc<dyn FrameSource>,
    target: Stage,
}

impl CameraGuard {
    pub fn acquire(source: Arc<dyn FrameSource>, target: Stage) -> Result<Self, CaptureError> {
        source.open(target)?;
        debug!(%target, "camera acquired");
        Ok(Self { source, target })
    }

    pub fn target(&self) -> Stage {
        self.target
    }

    pub fn snapshot(&self) -> Result<ImageBuffer, CaptureError> {
        let frame = self.source.snapshot(self.target)?;
        if frame.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(frame)
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.source.close(self.target);
        debug!(target = %self.target, "camera released");
    }
}

impl fmt::Debug for CameraGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraGuard")
            .field("target", &self.target)
            .finish()
    }
}

/// Frame source that serves one fixed frame, e.g. a kiosk fixture or a
/// pre-scanned document. Tracks which targets are currently open.
#[derive(Debug, Default)]
pub struct StillFrameSource {
    frame: ImageBuffer,
    held: Mutex<HashSet<Stage>>,
}

impl StillFrameSource {
    pub fn new(frame: ImageBuffer) -> Self {
        Self {
            frame,
            held: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_held(&self, target: Stage) -> bool {
        self.held
            .lock()
            .expect("frame source poisoned")
            .contains(&target)
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().expect("frame source poisoned").len()
    }
}

impl FrameSource for StillFrameSource {
    fn open(&self, target: Stage) -> Result<(), CaptureError> {
        let mut held = self.held.lock().expect("frame source poisoned");
        if !held.insert(target) {
            return Err(CaptureError::Busy(target));
        }
        Ok(())
    }

    fn snapshot(&self, target: Stage) -> Result<ImageBuffer, CaptureError> {
        if !self.is_held(target) {
            return Err(CaptureError::NotOpen(target));
        }
        Ok(self.frame.clone())
    }

    fn close(&self, target: Stage) {
        let mut held = self.held.lock().expect("frame source poisoned");
        if !held.remove(&target) {
            warn!(%target, "close on a camera that was not open");
        }
    }
}
