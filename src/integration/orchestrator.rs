//! Turns tracker output into alert events and artifacts.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use image::RgbImage;
use tracing::{info, warn};

use crate::engine::{PerimeterEngine, Rect, TrackedObject};
use crate::integration::detector::Detection;
use crate::integration::matching::{LabeledTrack, label_tracks};
use crate::integration::render::AlertRenderer;
use crate::integration::sink::{AlertSink, ArtifactNamer};

/// One alert, emitted at most once per track per activity episode.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub track_id: u64,
    pub bbox: Rect,
    pub label: String,
    pub confidence: f32,
    pub emitted_at: DateTime<Local>,
    /// Where the annotated frame was written; `None` if persisting failed
    pub artifact: Option<PathBuf>,
}

pub struct AlertOrchestrator<S: AlertSink> {
    renderer: AlertRenderer,
    sink: S,
    namer: ArtifactNamer,
}

impl<S: AlertSink> AlertOrchestrator<S> {
    /// Create an orchestrator rendering with `renderer` and persisting through `sink`.
    pub fn new(renderer: AlertRenderer, sink: S, namer: ArtifactNamer) -> Self {
        Self {
            renderer,
            sink,
            namer,
        }
    }

    /// Feed one admitted frame's tracks through the engine and emit alerts
    /// for the tracks that newly violate the perimeter.
    ///
    /// All new violators of the frame are drawn onto a single artifact. A
    /// failed write is logged and the alerts are still returned.
    pub fn handle(
        &mut self,
        engine: &mut PerimeterEngine,
        frame: &RgbImage,
        detections: &[Detection],
        tracks: &[TrackedObject],
    ) -> Vec<AlertEvent> {
        let violators = engine.evaluate(tracks);
        if violators.is_empty() {
            return Vec::new();
        }

        let labeled = label_tracks(tracks, detections);
        let alerted: Vec<LabeledTrack> = violators
            .iter()
            .filter_map(|v| labeled.iter().find(|l| l.track.id == v.id).cloned())
            .collect();

        let annotated = self.renderer.annotate(frame, &alerted);
        let emitted_at = Local::now();
        let path = self.namer.path_for(&emitted_at);
        let artifact = match self.sink.persist(&annotated, &path) {
            Ok(()) => {
                info!(path = %path.display(), tracks = alerted.len(), "alert frame saved");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "failed to save alert frame");
                None
            }
        };

        alerted
            .into_iter()
            .map(|l| AlertEvent {
                track_id: l.track.id,
                bbox: l.track.bbox,
                label: l.label,
                confidence: l.confidence,
                emitted_at,
                artifact: artifact.clone(),
            })
            .collect()
    }

    /// Get a reference to the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the underlying sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Get the artifact namer.
    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }
}
