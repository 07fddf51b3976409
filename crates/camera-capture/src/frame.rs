//! Video frame types and processing

use crate::CameraError;
use image::{imageops, imageops::FilterType, GrayImage};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        timestamp_ns: u64,
        sequence: u32,
    ) -> Result<Self, CameraError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CameraError::Geometry(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Flip the frame horizontally in place
    pub fn mirror(&mut self) {
        let row_len = self.width as usize * 3;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let mut left = 0;
            let mut right = self.width as usize - 1;
            while left < right {
                for c in 0..3 {
                    row.swap(left * 3 + c, right * 3 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }

    /// Convert to single-channel luminance
    pub fn to_grayscale(&self) -> GrayFrame {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114)
                as u8;
            gray.push(y);
        }
        GrayFrame {
            data: gray,
            width: self.width,
            height: self.height,
        }
    }
}

/// Single-channel frame handed to detectors
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GrayFrame {
    /// Crop a region, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, x: i32, y: i32, w: u32, h: u32) -> Option<GrayFrame> {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let w = i32::try_from(w).unwrap_or(i32::MAX);
        let h = i32::try_from(h).unwrap_or(i32::MAX);
        let x1 = x.saturating_add(w).clamp(0, self.width as i32) as u32;
        let y1 = y.saturating_add(h).clamp(0, self.height as i32) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let (cw, ch) = (x1 - x0, y1 - y0);
        let mut cropped = Vec::with_capacity((cw * ch) as usize);
        for row in y0..y1 {
            let start = (row * self.width + x0) as usize;
            cropped.extend_from_slice(&self.data[start..start + cw as usize]);
        }

        Some(GrayFrame {
            data: cropped,
            width: cw,
            height: ch,
        })
    }

    /// Resize with area-like filtering (triangle), suitable for downscaling face patches
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<GrayFrame, CameraError> {
        let img = GrayImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CameraError::Geometry("gray buffer does not match dimensions".into()))?;
        let resized = imageops::resize(&img, new_width, new_height, FilterType::Triangle);
        Ok(GrayFrame {
            width: resized.width(),
            height: resized.height(),
            data: resized.into_raw(),
        })
    }
}
