use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perimeter_guard::engine::{AdmissionPolicy, Direction, EngineConfig, PerimeterEngine};
use perimeter_guard::integration::{
    AlertOrchestrator, AlertRenderer, FileSource, FrameDiffGate, FrameProcessor, JpegFileSink,
    ReplayLog, SurveillancePipeline, VideoSource,
};
use perimeter_guard::AppConfig;

/// Raise an alert when a tracked object crosses the boundary line in the
/// forbidden direction.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file; other flags are ignored except the inputs
    /// (--frames, --video, --annotations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of frames, read in file-name order
    #[arg(long, conflicts_with = "video")]
    frames: Option<PathBuf>,

    /// Video file; the camera is opened when neither this nor --frames is given
    #[arg(long)]
    video: Option<PathBuf>,

    /// Camera index used when no other input is given
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// Recorded detections and tracks, one JSON object per frame
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Forbidden moving direction: right, left, up or down
    #[arg(long, default_value_t = Direction::Right)]
    direction: Direction,

    /// Boundary sits frame_size / ratio in from the edge being approached
    #[arg(long, default_value_t = 2)]
    ratio: u32,

    /// Frames are resized to a square of this side, in pixels
    #[arg(long, default_value_t = 480)]
    frame_size: u32,

    /// Samples before a track is evaluated; the smoothing window is twice this
    #[arg(long, default_value_t = 5)]
    duration: usize,

    /// Minimum displacement along the axis, in pixels
    #[arg(long, default_value_t = 3.0)]
    min_dist: f32,

    /// Only evaluate frames once an episode has started
    #[arg(long)]
    active_only: bool,

    /// Minimum moving-region area, in pixels
    #[arg(long, default_value_t = 200)]
    min_area: u32,

    /// Process one frame in every N
    #[arg(long, default_value_t = 5)]
    freq: u32,

    /// Directory for alert frames
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Device identifier embedded in alert file names
    #[arg(long, default_value_t = 1)]
    device_id: u32,

    /// Alert file name prefix
    #[arg(long, default_value = perimeter_guard::integration::DEFAULT_PREFIX)]
    prefix: String,

    /// TrueType font for box captions
    #[arg(long)]
    font: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig {
                engine: EngineConfig {
                    direction: self.direction,
                    ratio: self.ratio,
                    frame_size: self.frame_size,
                    duration: self.duration,
                    min_dist: self.min_dist,
                    admission: if self.active_only {
                        AdmissionPolicy::ActiveOnly
                    } else {
                        AdmissionPolicy::Always
                    },
                },
                min_area: self.min_area,
                freq: self.freq,
                save_path: self.save_path,
                device_id: self.device_id,
                artifact_prefix: self.prefix,
                font_path: self.font,
                frames: None,
                video: None,
                camera: self.camera,
                annotations: None,
            },
        };
        if self.frames.is_some() {
            config.frames = self.frames;
        }
        if self.video.is_some() {
            config.video = self.video;
        }
        if self.annotations.is_some() {
            config.annotations = self.annotations;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Frames queued between the camera thread and the pipeline.
#[cfg(feature = "video-capture")]
const CAMERA_QUEUE: usize = 4;

/// A frame directory wins, then a video file, then the camera.
fn open_source(config: &AppConfig) -> Result<Box<dyn VideoSource>> {
    if let Some(dir) = &config.frames {
        return Ok(Box::new(FileSource::open(dir)?));
    }
    open_capture(config)
}

#[cfg(feature = "video-capture")]
fn open_capture(config: &AppConfig) -> Result<Box<dyn VideoSource>> {
    use perimeter_guard::integration::{VideoFileSource, open_camera};

    let source: Box<dyn VideoSource> = match &config.video {
        Some(path) => Box::new(VideoFileSource::open(path)?),
        None => Box::new(open_camera(config.camera, CAMERA_QUEUE)?),
    };
    Ok(source)
}

#[cfg(not(feature = "video-capture"))]
fn open_capture(config: &AppConfig) -> Result<Box<dyn VideoSource>> {
    match &config.video {
        Some(path) => anyhow::bail!(
            "cannot read {}: built without the `video-capture` feature",
            path.display()
        ),
        None => anyhow::bail!(
            "no --frames given, and camera {} needs the `video-capture` feature",
            config.camera
        ),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("perimeter_guard=info")),
        )
        .init();

    let config = Args::parse().into_config()?;

    let (detector, tracker) = match &config.annotations {
        Some(path) => ReplayLog::load(path)?,
        None => ReplayLog::default(),
    }
    .into_collaborators();

    if let Some(dir) = &config.save_path {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create save path {}", dir.display()))?;
    }
    let renderer = match &config.font_path {
        Some(path) => AlertRenderer::with_font_file(path)?,
        None => AlertRenderer::new(),
    };
    let orchestrator = AlertOrchestrator::new(renderer, JpegFileSink, config.artifact_namer());

    let engine = PerimeterEngine::new(config.engine.clone())?;
    let processor = FrameProcessor::new(
        FrameDiffGate::default(),
        detector,
        tracker,
        engine,
        orchestrator,
        config.min_area,
    );
    let source = open_source(&config)?;
    let mut pipeline = SurveillancePipeline::new(source, processor, config.pipeline_settings());

    let summary = pipeline.run().context("stream processing failed")?;
    info!(
        frames = summary.frames_read,
        alerts = summary.alerts,
        "done"
    );
    Ok(())
}
