//! Observation sources: recorded landmark traces and live frame feeds

use std::io::BufRead;

use attention::{Emotion, FaceBbox, FaceDetection, FaceObserver, FrameObservation, LandmarkSet, Point};
use camera_capture::FrameSource;
use serde::Deserialize;
use tracing::debug;

use crate::SessionError;

/// Nominal spacing of trace frames that carry no timestamp (~30fps)
const TRACE_FRAME_NS: u64 = 1_000_000_000 / 30;

/// Yields one observation per frame; `Ok(None)` ends the session
pub trait ObservationSource {
    fn next_observation(&mut self) -> Result<Option<FrameObservation>, SessionError>;
}

/// One line of a JSON-lines landmark trace.
///
/// ```json
/// {"timestamp_ms": 33, "landmarks": [[x, y], ...68], "emotion": "neutral"}
/// ```
#[derive(Debug, Deserialize)]
struct TraceFrame {
    timestamp_ms: Option<u64>,
    landmarks: Option<Vec<[i32; 2]>>,
    bbox: Option<FaceBbox>,
    emotion: Option<String>,
}

/// Replays pre-detected frames from a JSON-lines trace
pub struct TraceReader<R> {
    reader: R,
    line_number: usize,
    frames: u64,
    last_timestamp_ns: Option<u64>,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            frames: 0,
            last_timestamp_ns: None,
        }
    }

    fn parse(&self, line: &str) -> Result<FrameObservation, SessionError> {
        let trace_error = |message: String| SessionError::Trace {
            line: self.line_number,
            message,
        };

        let frame: TraceFrame =
            serde_json::from_str(line).map_err(|e| trace_error(e.to_string()))?;

        let face = match frame.landmarks {
            Some(points) => {
                let points = points.into_iter().map(|[x, y]| Point::new(x, y)).collect();
                let landmarks = LandmarkSet::new(points).map_err(|e| trace_error(e.to_string()))?;
                let bbox = frame.bbox.unwrap_or_else(|| landmarks.bounding_box());
                Some(FaceDetection { bbox, landmarks })
            }
            None => None,
        };

        // "---" is what the UI shows when no emotion could be read
        let emotion = match frame.emotion.as_deref() {
            None | Some("---") | Some("") => None,
            Some(label) => Some(
                label
                    .parse::<Emotion>()
                    .map_err(|e| trace_error(e.to_string()))?,
            ),
        };

        let timestamp_ns = match frame.timestamp_ms {
            Some(ms) => ms
                .checked_mul(1_000_000)
                .ok_or_else(|| trace_error(format!("timestamp_ms {} out of range", ms)))?,
            // Untimed lines follow the previous line by one nominal frame
            None => self
                .last_timestamp_ns
                .map_or(0, |last| last.saturating_add(TRACE_FRAME_NS)),
        };

        Ok(FrameObservation {
            timestamp_ns,
            face,
            emotion,
        })
    }
}

impl<R: BufRead> ObservationSource for TraceReader<R> {
    fn next_observation(&mut self) -> Result<Option<FrameObservation>, SessionError> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_number += 1;
            if self.reader.read_line(&mut line)? == 0 {
                debug!("Trace exhausted after {} frames", self.frames);
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let observation = self.parse(line.trim())?;
        self.last_timestamp_ns = Some(observation.timestamp_ns);
        self.frames += 1;
        Ok(Some(observation))
    }
}

/// Live pipeline: frame source -> landmark/emotion observer
pub struct CameraFeed<S> {
    source: S,
    observer: FaceObserver,
}

impl<S: FrameSource> CameraFeed<S> {
    pub fn new(source: S, observer: FaceObserver) -> Self {
        Self { source, observer }
    }
}

impl<S: FrameSource> ObservationSource for CameraFeed<S> {
    fn next_observation(&mut self) -> Result<Option<FrameObservation>, SessionError> {
        match self.source.next_frame()? {
            Some(frame) => Ok(Some(self.observer.observe(&frame)?)),
            None => Ok(None),
        }
    }
}
