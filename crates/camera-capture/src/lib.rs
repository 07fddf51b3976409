//! Camera Capture Library for Study Attention Monitoring
//!
//! Provides the frame source abstraction consumed by the attention pipeline.
//! Supports:
//! - Decoded RGB frames with grayscale, crop and mirror helpers
//! - Replaying a directory of still images as a webcam stream

pub mod frame;
pub mod sequence;

pub use frame::{GrayFrame, VideoFrame};
pub use sequence::ImageSequenceSource;

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Invalid frame geometry: {0}")]
    Geometry(String),
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Nominal FPS, used to stamp frames that carry no capture time
    pub fps: u32,
    /// Flip frames horizontally so the preview behaves like a mirror
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            mirror: true,
        }
    }
}

impl CameraConfig {
    /// Nominal time between two frames in nanoseconds
    pub fn frame_interval_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.fps.max(1))
    }
}

/// Anything that hands out color frames one at a time.
///
/// `Ok(None)` means the stream is exhausted and the session should end.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).next_frame()
    }
}
