//! Object detector collaborator.

use crate::engine::Rect;
use crate::integration::source::Frame;
use crate::integration::tracker::CornerDetection;

/// One detected object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class name reported by the model
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Box in frame pixels
    pub bbox: Rect,
}

impl Detection {
    /// Build from the detector's center-size output (cx, cy, w, h).
    pub fn from_xywh(label: impl Into<String>, confidence: f32, bbox: [f32; 4]) -> Self {
        let [cx, cy, w, h] = bbox;
        Self {
            label: label.into(),
            confidence,
            bbox: Rect::from_xywh(cx, cy, w, h),
        }
    }

    /// Corner-format input for the tracker.
    pub fn to_corner(&self) -> CornerDetection {
        CornerDetection::from_rect(self.bbox, self.confidence)
    }
}

/// Trait for object detection backends.
///
/// Implement this to plug a detection model into the pipeline. Errors are
/// fatal to the run: the pipeline never continues on partial detections.
///
/// # Example
///
/// ```ignore
/// use perimeter_guard::integration::{Detection, Detector, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl Detector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference on frame.image
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector {
    type Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}
