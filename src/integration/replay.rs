//! Detector and tracker collaborators backed by a recorded JSON-lines log.
//!
//! Each line describes one frame tick:
//!
//! ```text
//! {"frame": 12, "detections": [{"label": "person", "confidence": 0.91, "bbox": [cx, cy, w, h]}],
//!  "tracks": [[x1, y1, x2, y2, id]]}
//! ```
//!
//! Coordinates are in the resized (square) frame the engine sees. Ticks
//! without a line have no detections and no tracks.

use std::cell::Cell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io::BufRead;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use crate::engine::TrackedObject;
use crate::error::ReplayError;
use crate::integration::detector::{Detection, Detector};
use crate::integration::source::Frame;
use crate::integration::tracker::{CornerDetection, ObjectTracker};

#[derive(Debug, Clone, Deserialize)]
struct RecordedDetection {
    label: String,
    confidence: f32,
    bbox: [f32; 4],
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RecordedTrack(f32, f32, f32, f32, u64);

#[derive(Debug, Clone, Deserialize)]
struct ReplayRecord {
    frame: u64,
    #[serde(default)]
    detections: Vec<RecordedDetection>,
    #[serde(default)]
    tracks: Vec<RecordedTrack>,
}

/// Recorded detections and tracks, keyed by frame tick.
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    records: HashMap<u64, ReplayRecord>,
}

impl ReplayLog {
    /// Load a JSON-lines log from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(|err| match err {
            ReplayError::Read { source, .. } => ReplayError::Read {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse from any line reader. Blank lines are ignored; a later record
    /// for the same tick replaces an earlier one.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut records = HashMap::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ReplayError::Read {
                path: Default::default(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayRecord =
                serde_json::from_str(&line).map_err(|source| ReplayError::Record {
                    line: index + 1,
                    source,
                })?;
            records.insert(record.frame, record);
        }
        Ok(Self { records })
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log records no frame.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split into a detector and a tracker replaying this log. The tracker
    /// answers for the tick of the detector's most recent call.
    pub fn into_collaborators(self) -> (ReplayDetector, ReplayTracker) {
        let log = Rc::new(self);
        let cursor = Rc::new(Cell::new(None));
        (
            ReplayDetector {
                log: Rc::clone(&log),
                cursor: Rc::clone(&cursor),
            },
            ReplayTracker { log, cursor },
        )
    }

    fn detections(&self, tick: u64) -> Vec<Detection> {
        self.records.get(&tick).map_or_else(Vec::new, |record| {
            record
                .detections
                .iter()
                .map(|d| Detection::from_xywh(d.label.clone(), d.confidence, d.bbox))
                .collect()
        })
    }

    fn tracks(&self, tick: u64) -> Vec<TrackedObject> {
        self.records.get(&tick).map_or_else(Vec::new, |record| {
            record
                .tracks
                .iter()
                .map(|&RecordedTrack(x1, y1, x2, y2, id)| TrackedObject::from_tlbr(x1, y1, x2, y2, id))
                .collect()
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReplayDetector {
    log: Rc<ReplayLog>,
    cursor: Rc<Cell<Option<u64>>>,
}

impl Detector for ReplayDetector {
    type Error = Infallible;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        self.cursor.set(Some(frame.tick));
        Ok(self.log.detections(frame.tick))
    }
}

#[derive(Debug, Clone)]
pub struct ReplayTracker {
    log: Rc<ReplayLog>,
    cursor: Rc<Cell<Option<u64>>>,
}

impl ObjectTracker for ReplayTracker {
    type Error = Infallible;

    fn update(&mut self, _detections: &[CornerDetection]) -> Result<Vec<TrackedObject>, Self::Error> {
        Ok(self
            .cursor
            .get()
            .map_or_else(Vec::new, |tick| self.log.tracks(tick)))
    }
}
