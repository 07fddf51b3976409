//! Directory-backed frame source
//!
//! Plays back still images (png/jpg/bmp) in file-name order as if they came
//! from a webcam running at the configured nominal FPS.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays a sorted list of image files
pub struct ImageSequenceSource {
    config: CameraConfig,
    files: Vec<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    /// Open every supported image in `dir`
    pub fn open(dir: impl AsRef<Path>, config: CameraConfig) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CameraError::Open(e.to_string()))?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if supported {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "no images found in {}",
                dir.display()
            )));
        }

        info!("Opened image sequence {} ({} frames)", dir.display(), files.len());
        Ok(Self {
            config,
            files,
            position: 0,
        })
    }

    /// Number of frames not yet delivered
    pub fn remaining(&self) -> usize {
        self.files.len() - self.position
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.files.get(self.position) else {
            debug!("Image sequence exhausted");
            return Ok(None);
        };

        let rgb = image::open(path)
            .map_err(|e| CameraError::Decode(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let sequence = self.position as u32;
        let timestamp_ns = u64::from(sequence) * self.config.frame_interval_ns();
        self.position += 1;

        let mut frame = VideoFrame::new(rgb.into_raw(), width, height, timestamp_ns, sequence)?;
        if self.config.mirror {
            frame.mirror();
        }
        Ok(Some(frame))
    }
}
