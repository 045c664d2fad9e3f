//! OpenCV-backed video sources: video files and local cameras.

use std::path::{Path, PathBuf};

use image::RgbImage;
use opencv::core::{Mat, StsUnmatchedSizes};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::{info, warn};

use crate::error::SourceError;
use crate::integration::source::{Frame, LiveSource, VideoSource};

/// Frames decoded from a video file, read on the calling thread.
pub struct VideoFileSource {
    path: PathBuf,
    capture: Option<VideoCapture>,
    tick: u64,
}

impl VideoFileSource {
    /// Open a video file. Fails if OpenCV finds no decodable stream in it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let origin = path.display().to_string();
        let capture = open_capture(&origin, || VideoCapture::from_file(&origin, videoio::CAP_ANY))?;

        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or_default();
        let frames = capture.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or_default();
        info!(path = %origin, fps, frames, "opened video file");

        Ok(Self {
            path,
            capture: Some(capture),
            tick: 0,
        })
    }

    /// Path of the video file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(None);
        };
        let image = grab_rgb(capture).map_err(|source| SourceError::Read {
            origin: self.path.display().to_string(),
            source: Box::new(source),
        })?;
        Ok(image.map(|image| {
            let tick = self.tick;
            self.tick += 1;
            Frame::new(tick, image)
        }))
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(err) = capture.release() {
                warn!(path = %self.path.display(), error = %err, "failed to release video file");
            }
        }
        info!(path = %self.path.display(), "video file released");
    }
}

/// Open local camera `index` and stream it through a capture thread.
///
/// At most `capacity` frames queue up; the capture thread blocks while the
/// pipeline is behind. A frame that fails to decode ends the stream.
pub fn open_camera(index: i32, capacity: usize) -> Result<LiveSource, SourceError> {
    let origin = format!("camera {index}");
    LiveSource::spawn(origin.clone(), capacity, move || {
        let mut capture = open_capture(&origin, || VideoCapture::new(index, videoio::CAP_ANY))?;
        Ok(move || match grab_rgb(&mut capture) {
            Ok(image) => image,
            Err(err) => {
                warn!(origin = %origin, error = %err, "camera read failed");
                None
            }
        })
    })
}

fn open_capture(
    origin: &str,
    open: impl FnOnce() -> opencv::Result<VideoCapture>,
) -> Result<VideoCapture, SourceError> {
    let open_error = |source: Box<dyn std::error::Error + Send + Sync>| SourceError::Open {
        origin: origin.to_string(),
        source,
    };
    let capture = open().map_err(|e| open_error(Box::new(e)))?;
    if !capture.is_opened().map_err(|e| open_error(Box::new(e)))? {
        return Err(open_error("no decodable video stream".into()));
    }
    Ok(capture)
}

/// Next frame as RGB, or `None` at end of stream.
fn grab_rgb(capture: &mut VideoCapture) -> opencv::Result<Option<RgbImage>> {
    let mut bgr = Mat::default();
    if !capture.read(&mut bgr)? || bgr.empty() {
        return Ok(None);
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    RgbImage::from_raw(width, height, rgb.data_bytes()?.to_vec())
        .map(Some)
        .ok_or_else(|| opencv::Error::new(StsUnmatchedSizes, "decoded frame does not match its size"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_video_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.mp4");
        match VideoFileSource::open(&path) {
            Err(SourceError::Open { origin, .. }) => assert_eq!(origin, path.display().to_string()),
            Err(other) => panic!("expected open error, got {other}"),
            Ok(_) => panic!("opened a missing file"),
        }
    }

    #[test]
    fn test_not_a_video_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"definitely not h264").unwrap();
        assert!(matches!(
            VideoFileSource::open(&path),
            Err(SourceError::Open { .. })
        ));
    }
}
