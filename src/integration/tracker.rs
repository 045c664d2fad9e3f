//! Multi-object tracker collaborator.

use crate::engine::{Rect, TrackedObject};

/// Detection input for the tracker, in corner format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerDetection {
    /// Bounding box; read as (x1, y1, x2, y2) by trackers
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
}

impl CornerDetection {
    /// Create a detection from corner coordinates.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
        }
    }

    /// Create a detection from an existing box.
    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self { bbox, score }
    }
}

/// Assigns persistent identities to detections across frames.
///
/// Called once per admitted frame, also with an empty slice, so the tracker
/// can age out lost objects. Association parameters (max age, minimum hits,
/// IoU threshold) belong to the implementation.
pub trait ObjectTracker {
    type Error;

    fn update(&mut self, detections: &[CornerDetection]) -> Result<Vec<TrackedObject>, Self::Error>;
}
