//! Perimeter-violation alarm engine for video surveillance.
//!
//! Given tracked objects (boxes with persistent ids) frame by frame, the
//! engine decides whether an object crossed a boundary line while moving in a
//! forbidden direction, and raises at most one alert per track per activity
//! episode.
//!
//! - [`engine`]: the decision core (episode lifecycle, trajectories, crossing
//!   classifier, dedup). No I/O.
//! - [`integration`]: collaborator traits and the frame pipeline around it.

pub mod config;
pub mod engine;
pub mod error;
pub mod integration;

pub use config::AppConfig;
pub use engine::{
    BoundaryLine, Direction, EngineConfig, EpisodeState, PerimeterEngine, Rect, TrackedObject,
};
pub use error::{ConfigError, PipelineError, ReplayError, SinkError, SourceError};
pub use integration::{AlertEvent, SurveillancePipeline};
