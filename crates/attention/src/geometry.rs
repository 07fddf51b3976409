//! Facial landmark geometry and per-frame features

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::detector::FaceBbox;
use crate::AttentionError;

/// Points produced by the 68-point face alignment model
pub const LANDMARK_COUNT: usize = 68;

/// Landmark index ranges (iBUG 300-W ordering)
pub const LEFT_EYE: Range<usize> = 36..42;
pub const RIGHT_EYE: Range<usize> = 42..48;
pub const MOUTH: Range<usize> = 48..68;
pub const NOSE_TIP: usize = 30;
pub const CHIN: usize = 8;

/// EAR returned when the eye corners coincide; reads as "probably open"
pub const DEGENERATE_EAR: f64 = 0.3;

/// 2-D pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// The 68 landmarks of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self, AttentionError> {
        if points.len() != LANDMARK_COUNT {
            return Err(AttentionError::Landmarks(format!(
                "expected {} points, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn left_eye(&self) -> &[Point] {
        &self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> &[Point] {
        &self.points[RIGHT_EYE]
    }

    pub fn mouth(&self) -> &[Point] {
        &self.points[MOUTH]
    }

    pub fn nose_tip(&self) -> Point {
        self.points[NOSE_TIP]
    }

    pub fn chin(&self) -> Point {
        self.points[CHIN]
    }

    /// Tight box around all landmarks
    pub fn bounding_box(&self) -> FaceBbox {
        let min_x = self.points.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = self.points.iter().map(|p| p.x).max().unwrap_or(0);
        let min_y = self.points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = self.points.iter().map(|p| p.y).max().unwrap_or(0);
        FaceBbox {
            x: min_x,
            y: min_y,
            width: max_x.abs_diff(min_x),
            height: max_y.abs_diff(min_y),
        }
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = AttentionError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

/// Eye aspect ratio of a six-point eye contour.
///
/// `(|p1-p5| + |p2-p4|) / (2 |p0-p3|)`
pub fn eye_aspect_ratio(eye: &[Point]) -> f64 {
    debug_assert!(eye.len() >= 6);
    let a = eye[1].distance(&eye[5]);
    let b = eye[2].distance(&eye[4]);
    let c = eye[0].distance(&eye[3]);
    if c == 0.0 {
        return DEGENERATE_EAR;
    }
    (a + b) / (2.0 * c)
}

/// Mouth aspect ratio of the 20-point mouth contour.
///
/// `(|m2-m10| + |m4-m8|) / (2 |m0-m6|)`, i.e. landmarks 51-59, 53-57 over 49-55
pub fn mouth_aspect_ratio(mouth: &[Point]) -> f64 {
    debug_assert!(mouth.len() >= 11);
    let a = mouth[2].distance(&mouth[10]);
    let b = mouth[4].distance(&mouth[8]);
    let c = mouth[0].distance(&mouth[6]);
    if c == 0.0 {
        return 0.0;
    }
    (a + b) / (2.0 * c)
}

/// Geometric features of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSample {
    /// Mean of left and right eye aspect ratio
    pub ear: f64,
    /// Mouth aspect ratio
    pub mar: f64,
    /// |nose.x - chin.x| in pixels
    pub posture_deviation: f64,
    /// Nose tip sits below the chin (head dropped)
    pub posture_drop: bool,
}

impl FeatureSample {
    pub fn extract(landmarks: &LandmarkSet) -> Self {
        let left = eye_aspect_ratio(landmarks.left_eye());
        let right = eye_aspect_ratio(landmarks.right_eye());
        let nose = landmarks.nose_tip();
        let chin = landmarks.chin();

        Self {
            ear: (left + right) / 2.0,
            mar: mouth_aspect_ratio(landmarks.mouth()),
            posture_deviation: (f64::from(nose.x) - f64::from(chin.x)).abs(),
            posture_drop: nose.y > chin.y,
        }
    }
}

/// Synthetic faces for tests across the crate
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Upright face with open eyes (EAR 0.3) and a closed mouth (MAR 0.2)
    pub fn face() -> Vec<Point> {
        let mut points = vec![Point::new(100, 100); LANDMARK_COUNT];
        points[CHIN] = Point::new(100, 200);
        points[NOSE_TIP] = Point::new(100, 120);
        set_eye(&mut points, LEFT_EYE.start, 60, 0.3);
        set_eye(&mut points, RIGHT_EYE.start, 120, 0.3);
        set_mouth(&mut points, 0.2);
        points
    }

    /// Six-point eye, 20px wide, whose aspect ratio is exactly `ear`
    pub fn set_eye(points: &mut [Point], start: usize, x: i32, ear: f64) {
        let half = (ear * 20.0 / 2.0).round() as i32;
        points[start] = Point::new(x, 80);
        points[start + 1] = Point::new(x + 6, 80 - half);
        points[start + 2] = Point::new(x + 14, 80 - half);
        points[start + 3] = Point::new(x + 20, 80);
        points[start + 4] = Point::new(x + 14, 80 + half);
        points[start + 5] = Point::new(x + 6, 80 + half);
    }

    /// Mouth 40px wide whose aspect ratio is exactly `mar`
    pub fn set_mouth(points: &mut [Point], mar: f64) {
        let m = MOUTH.start;
        let half = (mar * 40.0 / 2.0).round() as i32;
        points[m] = Point::new(80, 160);
        points[m + 6] = Point::new(120, 160);
        points[m + 2] = Point::new(95, 160 - half);
        points[m + 10] = Point::new(95, 160 + half);
        points[m + 4] = Point::new(105, 160 - half);
        points[m + 8] = Point::new(105, 160 + half);
    }

    pub fn with_ear(ear: f64) -> LandmarkSet {
        let mut points = face();
        set_eye(&mut points, LEFT_EYE.start, 60, ear);
        set_eye(&mut points, RIGHT_EYE.start, 120, ear);
        LandmarkSet::new(points).unwrap()
    }

    pub fn with_mar(mar: f64) -> LandmarkSet {
        let mut points = face();
        set_mouth(&mut points, mar);
        LandmarkSet::new(points).unwrap()
    }

    pub fn with_nose(x: i32, y: i32) -> LandmarkSet {
        let mut points = face();
        points[NOSE_TIP] = Point::new(x, y);
        LandmarkSet::new(points).unwrap()
    }

    pub fn focused() -> LandmarkSet {
        LandmarkSet::new(face()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn test_eye_aspect_ratio() {
        let eye = [
            Point::new(0, 0),
            Point::new(3, -2),
            Point::new(7, -2),
            Point::new(10, 0),
            Point::new(7, 2),
            Point::new(3, 2),
        ];
        // (4 + 4) / (2 * 10)
        assert!((eye_aspect_ratio(&eye) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_eye_falls_back() {
        let eye = [
            Point::new(5, 5),
            Point::new(5, 3),
            Point::new(6, 3),
            Point::new(5, 5),
            Point::new(6, 7),
            Point::new(5, 7),
        ];
        assert_eq!(eye_aspect_ratio(&eye), DEGENERATE_EAR);
    }

    #[test]
    fn test_degenerate_mouth_is_zero() {
        let mut mouth = vec![Point::new(10, 10); 20];
        mouth[2] = Point::new(10, 0);
        mouth[10] = Point::new(10, 20);
        assert_eq!(mouth_aspect_ratio(&mouth), 0.0);
    }

    #[test]
    fn test_mouth_pairs_use_contour_indices() {
        let mut points = fixtures::face();
        fixtures::set_mouth(&mut points, 0.75);
        // Outer lip points not part of the ratio must not matter
        points[MOUTH.start + 3] = Point::new(0, 0);
        points[MOUTH.start + 9] = Point::new(500, 500);
        let set = LandmarkSet::new(points).unwrap();
        assert!((mouth_aspect_ratio(set.mouth()) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_wrong_point_count() {
        assert!(matches!(
            LandmarkSet::new(vec![Point::default(); 5]),
            Err(AttentionError::Landmarks(_))
        ));
    }

    #[test]
    fn test_extract_features() {
        let sample = FeatureSample::extract(&fixtures::focused());
        assert!((sample.ear - 0.3).abs() < 1e-9);
        assert!((sample.mar - 0.2).abs() < 1e-9);
        assert_eq!(sample.posture_deviation, 0.0);
        assert!(!sample.posture_drop);
    }

    #[test]
    fn test_posture_features() {
        let sample = FeatureSample::extract(&fixtures::with_nose(150, 210));
        assert_eq!(sample.posture_deviation, 50.0);
        assert!(sample.posture_drop);
    }

    #[test]
    fn test_bounding_box_spans_full_range() {
        let mut points = vec![Point::new(0, 0); LANDMARK_COUNT];
        points[0] = Point::new(i32::MIN, i32::MIN);
        points[1] = Point::new(i32::MAX, i32::MAX);
        let bbox = LandmarkSet::new(points).unwrap().bounding_box();
        assert_eq!(bbox.x, i32::MIN);
        assert_eq!(bbox.width, u32::MAX);
        assert_eq!(bbox.height, u32::MAX);
    }

    #[test]
    fn test_bounding_box_and_serde() {
        let set = fixtures::focused();
        let bbox = set.bounding_box();
        assert_eq!(bbox.x, 60);
        assert_eq!(bbox.y, 77);
        assert_eq!(bbox.height, 123);

        let json = serde_json::to_string(&set).unwrap();
        let back: LandmarkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_str::<LandmarkSet>("[{\"x\":1,\"y\":2}]").is_err());
    }
}
