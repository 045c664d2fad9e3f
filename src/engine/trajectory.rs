//! Per-track centroid history for the current activity episode.

use std::collections::{HashMap, VecDeque};

use nalgebra::Point2;
use ndarray::{Array2, Axis};

use crate::engine::rect::Rect;

/// Bounded centroid history keyed by track id.
///
/// Each history keeps at most `capacity` samples, oldest evicted first. The
/// classifier only reads the most recent `2 × duration` samples, so a capacity
/// of `2 × duration` never changes its output.
#[derive(Debug, Clone)]
pub struct TrajectoryStore {
    capacity: usize,
    histories: HashMap<u64, VecDeque<Point2<f32>>>,
}

impl TrajectoryStore {
    /// Create an empty store keeping at most `capacity` samples per track.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            histories: HashMap::new(),
        }
    }

    /// Append the centroid of `bbox` to the history of `track_id`.
    pub fn record(&mut self, track_id: u64, bbox: &Rect) -> Point2<f32> {
        let centroid = bbox.centroid();
        let capacity = self.capacity;
        let history = self
            .histories
            .entry(track_id)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        if history.len() == capacity {
            history.pop_front();
        }
        history.push_back(centroid);
        centroid
    }

    /// Samples recorded for `track_id`, oldest first.
    pub fn history(&self, track_id: u64) -> Option<&VecDeque<Point2<f32>>> {
        self.histories.get(&track_id)
    }

    /// Number of retained samples for `track_id`.
    pub fn len(&self, track_id: u64) -> usize {
        self.histories.get(&track_id).map_or(0, VecDeque::len)
    }

    /// Most recent centroid of `track_id`.
    pub fn latest(&self, track_id: u64) -> Option<Point2<f32>> {
        self.histories.get(&track_id)?.back().copied()
    }

    /// Component-wise mean of the last `window` samples of `track_id`.
    pub fn window_mean(&self, track_id: u64, window: usize) -> Option<Point2<f32>> {
        let history = self.histories.get(&track_id)?;
        let take = window.min(history.len());
        if take == 0 {
            return None;
        }

        let samples: Vec<f32> = history
            .iter()
            .skip(history.len() - take)
            .flat_map(|p| [p.x, p.y])
            .collect();
        let samples = Array2::from_shape_vec((take, 2), samples).ok()?;
        let mean = samples.mean_axis(Axis(0))?;
        Some(Point2::new(mean[0], mean[1]))
    }

    /// Maximum number of samples kept per track.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tracks with at least one sample.
    pub fn track_count(&self) -> usize {
        self.histories.len()
    }

    /// Whether no track has been recorded.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Drop every history.
    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_at(cx: f32, cy: f32) -> Rect {
        Rect::from_xywh(cx, cy, 20.0, 20.0)
    }

    #[test]
    fn test_record_appends_centroids() {
        let mut store = TrajectoryStore::new(10);
        assert_eq!(store.record(7, &box_at(100.0, 50.0)), Point2::new(100.0, 50.0));
        store.record(7, &box_at(104.0, 50.0));
        store.record(9, &box_at(0.0, 0.0));

        assert_eq!(store.len(7), 2);
        assert_eq!(store.len(9), 1);
        assert_eq!(store.len(42), 0);
        assert_eq!(store.latest(7), Some(Point2::new(104.0, 50.0)));
        assert_eq!(store.track_count(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = TrajectoryStore::new(3);
        for x in 0..5 {
            store.record(1, &box_at(x as f32, 0.0));
        }
        let xs: Vec<f32> = store.history(1).unwrap().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_window_mean_uses_latest_samples() {
        let mut store = TrajectoryStore::new(10);
        for x in [0.0, 10.0, 20.0, 30.0] {
            store.record(1, &box_at(x, 8.0));
        }
        assert_eq!(store.window_mean(1, 2), Some(Point2::new(25.0, 8.0)));
        assert_eq!(store.window_mean(1, 10), Some(Point2::new(15.0, 8.0)));
        assert_eq!(store.window_mean(2, 10), None);
    }

    #[test]
    fn test_clear() {
        let mut store = TrajectoryStore::new(4);
        store.record(1, &box_at(1.0, 1.0));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(1), 0);
    }
}
