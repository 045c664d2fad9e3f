//! Per-frame decision flow: admission, trajectory update, classification, dedup.

use crate::engine::classifier::DirectionClassifier;
use crate::engine::config::EngineConfig;
use crate::engine::controller::{ActivityController, EpisodeState};
use crate::engine::direction::BoundaryLine;
use crate::engine::track::TrackedObject;
use crate::error::ConfigError;

/// The perimeter-violation engine.
///
/// Owns all per-episode state. Drive it once per processed frame:
/// [`on_quiet`](Self::on_quiet) when the motion gate is negative, otherwise
/// [`on_motion`](Self::on_motion) and, if the frame is admitted,
/// [`evaluate`](Self::evaluate) with the tracker output.
#[derive(Debug, Clone)]
pub struct PerimeterEngine {
    config: EngineConfig,
    classifier: DirectionClassifier,
    controller: ActivityController,
}

impl PerimeterEngine {
    /// Create an engine, validating `config` and computing the boundary line.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let classifier = DirectionClassifier::from_config(&config)?;
        let controller = ActivityController::new(config.window(), config.admission);
        Ok(Self {
            config,
            classifier,
            controller,
        })
    }

    /// Motion present; `detection_count` objects detected. Returns whether the
    /// frame should be tracked and evaluated.
    pub fn on_motion(&mut self, detection_count: usize) -> bool {
        self.controller.on_motion(detection_count)
    }

    /// No motion on this frame: end the episode, if any.
    pub fn on_quiet(&mut self) {
        self.controller.on_quiet();
    }

    /// Record this frame's tracks and return the ones that newly violate the
    /// perimeter, in tracker order. Returned ids are marked alarmed for the
    /// rest of the episode.
    pub fn evaluate(&mut self, tracks: &[TrackedObject]) -> Vec<TrackedObject> {
        let episode = self.controller.episode_mut();
        for track in tracks {
            episode.trajectories.record(track.id, &track.bbox);
        }

        let violators = self.classifier.classify(tracks, &episode.trajectories);
        episode.alarmed.claim_new(violators)
    }

    /// Get the configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the boundary line, fixed for the whole run.
    pub fn boundary(&self) -> &BoundaryLine {
        self.classifier.boundary()
    }

    /// Current episode state.
    pub fn state(&self) -> EpisodeState {
        self.controller.state()
    }

    /// Get a reference to the activity controller and its episode state.
    pub fn controller(&self) -> &ActivityController {
        &self.controller
    }
}
