//! SurveillancePipeline: video source, motion gate, detector, tracker and
//! engine run frame by frame.

use image::RgbImage;
use image::imageops::{self, FilterType};
use tracing::info;

use crate::engine::{PerimeterEngine, TrackedObject};
use crate::error::PipelineError;
use crate::integration::detector::{Detection, Detector};
use crate::integration::motion::MotionGate;
use crate::integration::orchestrator::{AlertEvent, AlertOrchestrator};
use crate::integration::sink::AlertSink;
use crate::integration::source::{Frame, VideoSource};
use crate::integration::tracker::{CornerDetection, ObjectTracker};

/// Per-run knobs that are not engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Minimum moving-region area handed to the motion gate
    pub min_area: u32,
    /// Process one frame in every `freq`; 0 behaves as 1
    pub freq: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_area: 200,
            freq: 5,
        }
    }
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_processed: u64,
    pub alerts: u64,
}

/// The per-frame stages, everything except the video source.
pub struct FrameProcessor<M, D, T, S>
where
    M: MotionGate,
    D: Detector,
    T: ObjectTracker,
    S: AlertSink,
{
    motion: M,
    detector: D,
    tracker: T,
    engine: PerimeterEngine,
    orchestrator: AlertOrchestrator<S>,
    min_area: u32,
}

impl<M, D, T, S> FrameProcessor<M, D, T, S>
where
    M: MotionGate,
    D: Detector,
    D::Error: std::error::Error + Send + Sync + 'static,
    T: ObjectTracker,
    T::Error: std::error::Error + Send + Sync + 'static,
    S: AlertSink,
{
    /// Create a processor from its stages.
    pub fn new(
        motion: M,
        detector: D,
        tracker: T,
        engine: PerimeterEngine,
        orchestrator: AlertOrchestrator<S>,
        min_area: u32,
    ) -> Self {
        Self {
            motion,
            detector,
            tracker,
            engine,
            orchestrator,
            min_area,
        }
    }

    /// Run one frame through motion gate, detector, tracker and engine.
    ///
    /// The frame is resized to the engine's square frame size first.
    /// Detector and tracker failures are returned, never skipped.
    pub fn process(&mut self, frame: Frame) -> Result<Vec<AlertEvent>, PipelineError> {
        let frame = self.ensure_square(frame);

        if !self.motion.has_motion(&frame.image, self.min_area) {
            self.engine.on_quiet();
            return Ok(Vec::new());
        }

        let detections = self
            .detector
            .detect(&frame)
            .map_err(|e| PipelineError::Detector {
                tick: frame.tick,
                source: Box::new(e),
            })?;

        if !self.engine.on_motion(detections.len()) {
            return Ok(Vec::new());
        }

        let tracks = self.track(&frame, &detections)?;
        Ok(self
            .orchestrator
            .handle(&mut self.engine, &frame.image, &detections, &tracks))
    }

    fn track(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
    ) -> Result<Vec<TrackedObject>, PipelineError> {
        let corners: Vec<CornerDetection> = detections.iter().map(Detection::to_corner).collect();
        self.tracker
            .update(&corners)
            .map_err(|e| PipelineError::Tracker {
                tick: frame.tick,
                source: Box::new(e),
            })
    }

    fn ensure_square(&self, frame: Frame) -> Frame {
        let size = self.engine.config().frame_size;
        if frame.image.dimensions() == (size, size) {
            return frame;
        }
        let image: RgbImage = imageops::resize(&frame.image, size, size, FilterType::Triangle);
        Frame::new(frame.tick, image)
    }

    /// Get a reference to the perimeter engine.
    pub fn engine(&self) -> &PerimeterEngine {
        &self.engine
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Get a reference to the alert orchestrator.
    pub fn orchestrator(&self) -> &AlertOrchestrator<S> {
        &self.orchestrator
    }
}

/// Releases the source when dropped, whichever way `run` exits.
struct ReleaseGuard<'a, V: VideoSource>(&'a mut V);

impl<V: VideoSource> Drop for ReleaseGuard<'_, V> {
    fn drop(&mut self) {
        self.0.release();
        info!("resources released");
    }
}

/// End-to-end pipeline over a video source.
pub struct SurveillancePipeline<V, M, D, T, S>
where
    V: VideoSource,
    M: MotionGate,
    D: Detector,
    T: ObjectTracker,
    S: AlertSink,
{
    source: V,
    processor: FrameProcessor<M, D, T, S>,
    freq: u32,
}

impl<V, M, D, T, S> SurveillancePipeline<V, M, D, T, S>
where
    V: VideoSource,
    M: MotionGate,
    D: Detector,
    D::Error: std::error::Error + Send + Sync + 'static,
    T: ObjectTracker,
    T::Error: std::error::Error + Send + Sync + 'static,
    S: AlertSink,
{
    /// Create a pipeline over `source`.
    pub fn new(source: V, processor: FrameProcessor<M, D, T, S>, settings: PipelineSettings) -> Self {
        Self {
            source,
            processor,
            freq: settings.freq.max(1),
        }
    }

    /// Read frames until the source ends, processing one in every `freq`.
    ///
    /// Every frame is read so the stream keeps advancing. The source is
    /// released before returning, also on error.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let boundary = self.processor.engine().boundary();
        info!(
            direction = %boundary.direction(),
            boundary = boundary.position(),
            freq = self.freq,
            "pipeline started"
        );

        let mut source = ReleaseGuard(&mut self.source);
        let mut summary = RunSummary::default();
        let mut frame_count: u64 = 0;

        while let Some(frame) = source.0.next_frame()? {
            let should_process = frame_count % u64::from(self.freq) == 0;
            frame_count += 1;
            summary.frames_read += 1;
            if !should_process {
                continue;
            }

            summary.frames_processed += 1;
            let alerts = self.processor.process(frame)?;
            summary.alerts += alerts.len() as u64;
        }

        info!(
            frames = summary.frames_read,
            processed = summary.frames_processed,
            alerts = summary.alerts,
            "no more frames"
        );
        Ok(summary)
    }

    /// Get a reference to the video source.
    pub fn source(&self) -> &V {
        &self.source
    }

    /// Get a reference to the frame processor.
    pub fn processor(&self) -> &FrameProcessor<M, D, T, S> {
        &self.processor
    }

    /// Get a mutable reference to the frame processor.
    pub fn processor_mut(&mut self) -> &mut FrameProcessor<M, D, T, S> {
        &mut self.processor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, EpisodeState};
    use crate::error::{SinkError, SourceError};
    use crate::integration::render::AlertRenderer;
    use crate::integration::sink::ArtifactNamer;
    use std::collections::VecDeque;
    use std::path::Path;

    struct ScriptedSource {
        frames: u64,
        next: u64,
        released: bool,
    }

    impl VideoSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            if self.next == self.frames {
                return Ok(None);
            }
            self.next += 1;
            Ok(Some(Frame::new(self.next - 1, RgbImage::new(48, 48))))
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    struct ScriptedMotion(VecDeque<bool>);

    impl MotionGate for ScriptedMotion {
        fn has_motion(&mut self, _frame: &RgbImage, _min_area: u32) -> bool {
            self.0.pop_front().unwrap_or(false)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("model crashed")]
    struct ModelCrash;

    struct MockDetector {
        fail_at: Option<u64>,
        calls: usize,
    }

    impl Detector for MockDetector {
        type Error = ModelCrash;

        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
            self.calls += 1;
            if self.fail_at == Some(frame.tick) {
                return Err(ModelCrash);
            }
            Ok(vec![Detection::from_xywh("person", 0.9, [10.0, 10.0, 4.0, 4.0])])
        }
    }

    struct MockTracker {
        seen: Vec<usize>,
    }

    impl ObjectTracker for MockTracker {
        type Error = std::convert::Infallible;

        fn update(&mut self, detections: &[CornerDetection]) -> Result<Vec<TrackedObject>, Self::Error> {
            self.seen.push(detections.len());
            Ok(vec![])
        }
    }

    struct NullSink;

    impl AlertSink for NullSink {
        fn persist(&mut self, _image: &RgbImage, _path: &Path) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn pipeline(
        frames: u64,
        motion: &[bool],
        fail_at: Option<u64>,
        freq: u32,
    ) -> SurveillancePipeline<ScriptedSource, ScriptedMotion, MockDetector, MockTracker, NullSink> {
        let engine = PerimeterEngine::new(EngineConfig {
            frame_size: 48,
            ..Default::default()
        })
        .unwrap();
        let orchestrator = AlertOrchestrator::new(AlertRenderer::new(), NullSink, ArtifactNamer::default());
        let processor = FrameProcessor::new(
            ScriptedMotion(motion.iter().copied().collect()),
            MockDetector { fail_at, calls: 0 },
            MockTracker { seen: Vec::new() },
            engine,
            orchestrator,
            10,
        );
        SurveillancePipeline::new(
            ScriptedSource {
                frames,
                next: 0,
                released: false,
            },
            processor,
            PipelineSettings { min_area: 10, freq },
        )
    }

    #[test]
    fn test_run_throttles_and_releases() {
        let mut pipeline = pipeline(10, &[true, true, true, true], None, 3);
        let summary = pipeline.run().unwrap();

        assert_eq!(summary.frames_read, 10);
        // ticks 0, 3, 6, 9
        assert_eq!(summary.frames_processed, 4);
        assert!(pipeline.source().released);
        assert_eq!(pipeline.processor().tracker().seen, vec![1, 1, 1, 1]);
        assert_eq!(pipeline.processor().engine().state(), EpisodeState::Active);
    }

    #[test]
    fn test_quiet_frames_skip_detector() {
        let mut pipeline = pipeline(3, &[false, true, false], None, 1);
        pipeline.run().unwrap();
        assert_eq!(pipeline.processor().detector().calls, 1);
        assert_eq!(pipeline.processor().engine().state(), EpisodeState::Idle);
    }

    #[test]
    fn test_detector_failure_is_fatal_and_releases() {
        let mut pipeline = pipeline(5, &[true; 5], Some(2), 1);
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::Detector { tick: 2, .. }));
        assert!(pipeline.source().released);
        assert_eq!(pipeline.processor().tracker().seen.len(), 2);
    }
}
