//! Error types shared by the engine and its collaborators.

use std::path::PathBuf;

/// Rejected configuration. Raised before any boundary line is computed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown direction `{0}`, expected one of: right, left, up, down")]
    UnknownDirection(String),
    #[error("ratio must be at least 2, got {0}")]
    RatioTooSmall(u32),
    #[error("frame size must be positive")]
    ZeroFrameSize,
    #[error("duration must be at least 1 sample")]
    ZeroDuration,
    #[error("min_dist must be a finite, non-negative number of pixels, got {0}")]
    InvalidMinDist(f32),
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to load font {path}")]
    Font {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Video source failures. `Open` and `Empty` are raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A frame directory, video file or camera could not be opened.
    #[error("cannot open video source {origin}")]
    Open {
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Reading or decoding a frame failed mid-stream.
    #[error("failed to read a frame from {origin}")]
    Read {
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("video source {0} contains no frames")]
    Empty(PathBuf),
}

/// Alert artifact persistence failure. Never fatal to the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write alert artifact {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure loading a recorded detection/tracking log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read replay log {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed replay record on line {line}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal stream-processing error surfaced by the pipeline run loop.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("detector failed on frame {tick}")]
    Detector {
        tick: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("tracker failed on frame {tick}")]
    Tracker {
        tick: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
