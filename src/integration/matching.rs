//! Pairs tracker output with this frame's detections to recover label and
//! confidence for each track.

use ndarray::Array2;

use crate::engine::{Rect, TrackedObject, iou_batch};
use crate::integration::detector::Detection;

/// Label used for a track no detection overlaps.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A track together with the class and score of its matched detection.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTrack {
    pub track: TrackedObject,
    pub label: String,
    pub confidence: f32,
}

/// Optimal one-to-one assignment on a cost matrix.
///
/// Returns, for every row, the column it was assigned to if its cost is
/// within `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> Vec<Option<usize>> {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return vec![None; num_rows];
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);
    for ((i, j), &cost) in cost_matrix.indexed_iter() {
        padded[[i, j]] = f64::from(cost);
    }

    let Ok((row_to_col, _)) = lapjv::lapjv(&padded) else {
        return vec![None; num_rows];
    };

    row_to_col
        .into_iter()
        .take(num_rows)
        .enumerate()
        .map(|(row, col)| (col < num_cols && cost_matrix[[row, col]] <= thresh).then_some(col))
        .collect()
}

/// Attach label and confidence to each track from the detection its box
/// overlaps best. Tracks keep their input order.
pub fn label_tracks(tracks: &[TrackedObject], detections: &[Detection]) -> Vec<LabeledTrack> {
    let track_boxes: Vec<Rect> = tracks.iter().map(|t| t.bbox).collect();
    let det_boxes: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
    let cost = iou_batch(&track_boxes, &det_boxes).mapv(|iou| 1.0 - iou);

    // Any overlap at all is accepted: a zero-IoU pair costs exactly 1.0.
    let assignment = linear_assignment(&cost, 1.0 - f32::EPSILON);

    tracks
        .iter()
        .zip(assignment)
        .map(|(track, matched)| match matched.map(|j| &detections[j]) {
            Some(det) => LabeledTrack {
                track: *track,
                label: det.label.clone(),
                confidence: det.confidence,
            },
            None => LabeledTrack {
                track: *track,
                label: UNKNOWN_LABEL.to_string(),
                confidence: 0.0,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_prefers_global_optimum() {
        // Row 0 is slightly better on column 0, but row 1 only fits column 0.
        let cost = ndarray::array![[0.1, 0.2], [0.15, 0.9]];
        assert_eq!(linear_assignment(&cost, 0.5), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_assignment_threshold_and_shapes() {
        let cost = ndarray::array![[0.8], [0.3]];
        assert_eq!(linear_assignment(&cost, 0.5), vec![None, Some(0)]);
        assert_eq!(linear_assignment(&Array2::zeros((2, 0)), 0.5), vec![None, None]);
        assert!(linear_assignment(&Array2::zeros((0, 3)), 0.5).is_empty());
    }

    #[test]
    fn test_label_tracks() {
        let tracks = [
            TrackedObject::from_tlbr(100.0, 100.0, 140.0, 180.0, 4),
            TrackedObject::from_tlbr(0.0, 0.0, 20.0, 20.0, 9),
            TrackedObject::from_tlbr(300.0, 300.0, 310.0, 310.0, 2),
        ];
        let detections = [
            Detection::from_xywh("car", 0.75, [10.0, 10.0, 20.0, 20.0]),
            Detection::from_xywh("person", 0.9, [121.0, 141.0, 40.0, 80.0]),
        ];

        let labeled = label_tracks(&tracks, &detections);
        let summary: Vec<(u64, &str, f32)> = labeled
            .iter()
            .map(|l| (l.track.id, l.label.as_str(), l.confidence))
            .collect();
        assert_eq!(
            summary,
            vec![(4, "person", 0.9), (9, "car", 0.75), (2, UNKNOWN_LABEL, 0.0)]
        );
    }
}
