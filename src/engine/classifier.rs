//! Decides whether a track crossed the boundary moving in the forbidden direction.

use nalgebra::Point2;

use crate::engine::config::EngineConfig;
use crate::engine::direction::BoundaryLine;
use crate::engine::track::TrackedObject;
use crate::engine::trajectory::TrajectoryStore;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct DirectionClassifier {
    boundary: BoundaryLine,
    duration: usize,
    min_dist: f32,
}

impl DirectionClassifier {
    /// Create a classifier for `boundary`.
    pub fn new(boundary: BoundaryLine, duration: usize, min_dist: f32) -> Self {
        Self {
            boundary,
            duration,
            min_dist,
        }
    }

    /// Create a classifier from a validated engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.boundary()?, config.duration, config.min_dist))
    }

    /// Get the boundary line.
    pub fn boundary(&self) -> &BoundaryLine {
        &self.boundary
    }

    /// Minimum number of samples before a track is evaluated.
    pub fn duration(&self) -> usize {
        self.duration
    }

    /// Number of recent samples averaged into the reference point.
    pub fn window(&self) -> usize {
        2 * self.duration
    }

    /// Crossing test for one track given its current centroid and the mean of
    /// its recent window.
    pub fn is_violation(&self, current: &Point2<f32>, reference: &Point2<f32>) -> bool {
        if !self.boundary.is_crossed_by(current) {
            return false;
        }

        let diff = current - reference;
        let along = self.boundary.direction().axis().of_vector(&diff);
        let heading_forbidden = if self.boundary.direction().is_increasing() {
            along > 0.0
        } else {
            along < 0.0
        };

        heading_forbidden && along.abs() >= self.min_dist
    }

    /// Evaluate every track of this frame, in tracker order.
    ///
    /// `store` must already hold this frame's centroids. Tracks with fewer
    /// than `duration` samples are skipped.
    pub fn classify(&self, tracks: &[TrackedObject], store: &TrajectoryStore) -> Vec<TrackedObject> {
        tracks
            .iter()
            .filter(|track| store.len(track.id) >= self.duration)
            .filter(|track| {
                let current = track.bbox.centroid();
                store
                    .window_mean(track.id, self.window())
                    .is_some_and(|reference| self.is_violation(&current, &reference))
            })
            .copied()
            .collect()
    }
}
