//! Activity episode lifecycle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::alarm::AlarmedSet;
use crate::engine::trajectory::TrajectoryStore;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeState {
    /// No episode in progress
    #[default]
    Idle,
    /// A motion burst with detections is being tracked
    Active,
}

/// Which motion-positive frames are admitted to tracking and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Admit every motion-positive frame, whether or not an episode has
    /// started.
    #[default]
    Always,
    /// Admit only while an episode is active. Changes alert timing relative
    /// to `Always`; opt in explicitly.
    ActiveOnly,
}

/// State accumulated over one episode. Reset as a unit.
#[derive(Debug, Clone)]
pub struct Episode {
    pub trajectories: TrajectoryStore,
    pub alarmed: AlarmedSet,
}

impl Episode {
    fn new(history_capacity: usize) -> Self {
        Self {
            trajectories: TrajectoryStore::new(history_capacity),
            alarmed: AlarmedSet::new(),
        }
    }

    fn reset(&mut self) {
        self.trajectories.clear();
        self.alarmed.clear();
    }
}

#[derive(Debug, Clone)]
pub struct ActivityController {
    state: EpisodeState,
    policy: AdmissionPolicy,
    admitted_frames: u64,
    episodes_started: u64,
    episode: Episode,
}

impl ActivityController {
    /// Create an idle controller. Histories hold `history_capacity` samples.
    pub fn new(history_capacity: usize, policy: AdmissionPolicy) -> Self {
        Self {
            state: EpisodeState::Idle,
            policy,
            admitted_frames: 0,
            episodes_started: 0,
            episode: Episode::new(history_capacity),
        }
    }

    /// Motion was seen on this frame and the detector returned
    /// `detection_count` objects. Returns whether the frame is admitted.
    pub fn on_motion(&mut self, detection_count: usize) -> bool {
        if detection_count > 0 && self.state == EpisodeState::Idle {
            self.episode.reset();
            self.state = EpisodeState::Active;
            self.episodes_started += 1;
            debug!(episode = self.episodes_started, "activity episode started");
        }

        let admitted = match self.policy {
            AdmissionPolicy::Always => true,
            AdmissionPolicy::ActiveOnly => self.state == EpisodeState::Active,
        };
        if admitted {
            self.admitted_frames += 1;
        }
        admitted
    }

    /// No motion on this frame: close the episode and drop its state.
    pub fn on_quiet(&mut self) {
        if self.state == EpisodeState::Active {
            debug!(
                episode = self.episodes_started,
                frames = self.admitted_frames,
                alarmed = self.episode.alarmed.len(),
                "activity episode ended"
            );
        }
        self.admitted_frames = 0;
        self.episode.reset();
        self.state = EpisodeState::Idle;
    }

    /// Current episode state.
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// Get the admission policy.
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Frames admitted since the last quiet frame.
    pub fn admitted_frames(&self) -> u64 {
        self.admitted_frames
    }

    /// Number of episodes started since creation.
    pub fn episodes_started(&self) -> u64 {
        self.episodes_started
    }

    /// Get a reference to the current episode state.
    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Get a mutable reference to the current episode state.
    pub fn episode_mut(&mut self) -> &mut Episode {
        &mut self.episode
    }
}
