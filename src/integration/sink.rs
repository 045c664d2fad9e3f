//! Alert artifact persistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};

use crate::error::SinkError;

/// Default artifact file-name prefix.
pub const DEFAULT_PREFIX: &str = "perimeter";

/// Stores an annotated alert image. Failures are reported, never fatal.
pub trait AlertSink {
    fn persist(&mut self, image: &RgbImage, path: &Path) -> Result<(), SinkError>;
}

/// Writes artifacts as JPEG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegFileSink;

impl AlertSink for JpegFileSink {
    fn persist(&mut self, image: &RgbImage, path: &Path) -> Result<(), SinkError> {
        image
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(|source| SinkError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Builds `<prefix>_<device_id>_<YYYYMMDDHHMMSS>.jpg` artifact paths.
///
/// Timestamps have one-second resolution, so two alerts in the same second
/// share a path and the later one overwrites the earlier.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    prefix: String,
    device_id: u32,
    dir: Option<PathBuf>,
}

impl ArtifactNamer {
    /// Create a namer. Without `dir`, paths are relative to the working directory.
    pub fn new(prefix: impl Into<String>, device_id: u32, dir: Option<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            device_id,
            dir,
        }
    }

    /// File name for an alert raised at `at`.
    pub fn file_name(&self, at: &DateTime<Local>) -> String {
        format!(
            "{}_{}_{}.jpg",
            self.prefix,
            self.device_id,
            at.format("%Y%m%d%H%M%S")
        )
    }

    /// Full path in the configured directory, or relative to the working
    /// directory when none is set.
    pub fn path_for(&self, at: &DateTime<Local>) -> PathBuf {
        let name = self.file_name(at);
        match &self.dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Directory artifacts are written to, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl Default for ArtifactNamer {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, 1, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        let namer = ArtifactNamer::new("gate", 12, None);
        assert_eq!(namer.file_name(&at()), "gate_12_20240309070501.jpg");
        assert_eq!(namer.path_for(&at()), PathBuf::from("gate_12_20240309070501.jpg"));
    }

    #[test]
    fn test_path_in_directory() {
        let namer = ArtifactNamer::new(DEFAULT_PREFIX, 1, Some(PathBuf::from("/var/alerts")));
        assert_eq!(
            namer.path_for(&at()),
            PathBuf::from("/var/alerts/perimeter_1_20240309070501.jpg")
        );
    }

    #[test]
    fn test_jpeg_sink_writes_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::new(8, 8);
        let mut sink = JpegFileSink;

        let path = dir.path().join("alert.jpg");
        sink.persist(&image, &path).unwrap();
        assert!(path.is_file());

        let missing = dir.path().join("no/such/dir/alert.jpg");
        assert!(matches!(
            sink.persist(&image, &missing),
            Err(SinkError::Write { .. })
        ));
    }
}
