//! Collaborators around the engine: video sources, motion gate, detector and
//! tracker traits, alert rendering and persistence, and the pipeline that
//! runs them frame by frame.
//!
//! Detector and tracker are traits so any inference backend or tracking
//! algorithm can be plugged in. The shipped implementations replay a
//! recorded log.
//!
//! Video files and cameras are read through OpenCV when the `video-capture`
//! feature is enabled.

#[cfg(feature = "video-capture")]
mod capture;
mod detector;
mod matching;
mod motion;
mod orchestrator;
mod pipeline;
mod render;
mod replay;
mod sink;
mod source;
mod tracker;

#[cfg(feature = "video-capture")]
pub use capture::{VideoFileSource, open_camera};
pub use detector::{Detection, Detector};
pub use matching::{LabeledTrack, UNKNOWN_LABEL, label_tracks, linear_assignment};
pub use motion::{FrameDiffGate, MotionGate};
pub use orchestrator::{AlertEvent, AlertOrchestrator};
pub use pipeline::{FrameProcessor, PipelineSettings, RunSummary, SurveillancePipeline};
pub use render::{AlertRenderer, caption};
pub use replay::{ReplayDetector, ReplayLog, ReplayTracker};
pub use sink::{AlertSink, ArtifactNamer, DEFAULT_PREFIX, JpegFileSink};
pub use source::{FileSource, Frame, LiveSource, VideoSource};
pub use tracker::{CornerDetection, ObjectTracker};
