//! Perimeter-violation decision engine.
//!
//! Pure, single-threaded and free of I/O. Everything upstream (frames, motion,
//! detection, tracking) and downstream (rendering, persistence) lives in
//! [`crate::integration`].

mod alarm;
mod classifier;
mod config;
mod controller;
mod direction;
mod perimeter;
mod rect;
mod track;
mod trajectory;

pub use alarm::AlarmedSet;
pub use classifier::DirectionClassifier;
pub use config::EngineConfig;
pub use controller::{ActivityController, AdmissionPolicy, Episode, EpisodeState};
pub use direction::{Axis, BoundaryLine, Direction};
pub use perimeter::PerimeterEngine;
pub use rect::{Rect, iou_batch};
pub use track::TrackedObject;
pub use trajectory::TrajectoryStore;
