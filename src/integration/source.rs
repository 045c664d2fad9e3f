//! Video sources: a uniform "next frame or end of stream" contract.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::error::SourceError;

const FRAME_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// A decoded frame stamped with its position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based index of the frame in its source
    pub tick: u64,
    pub image: RgbImage,
}

impl Frame {
    /// Create a frame at position `tick`.
    pub fn new(tick: u64, image: RgbImage) -> Self {
        Self { tick, image }
    }
}

/// Ordered, possibly infinite sequence of frames.
pub trait VideoSource {
    /// Next frame, or `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Release any underlying handle. Called exactly once when the pipeline
    /// stops, on every exit path.
    fn release(&mut self) {}
}

impl<V: VideoSource + ?Sized> VideoSource for Box<V> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        (**self).next_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Frames read from a directory of still images, in file-name order.
#[derive(Debug)]
pub struct FileSource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
    tick: u64,
}

impl FileSource {
    /// Open a directory and queue its image files, sorted by name.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        let open_error = |source: std::io::Error| SourceError::Open {
            origin: dir.display().to_string(),
            source: Box::new(source),
        };
        let entries = std::fs::read_dir(&dir).map_err(open_error)?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry.map_err(open_error)?.path();
            if is_frame_file(&path) {
                frames.push(path);
            }
        }
        if frames.is_empty() {
            return Err(SourceError::Empty(dir));
        }
        frames.sort();

        info!(path = %dir.display(), frames = frames.len(), "opened frame directory");
        Ok(Self {
            dir,
            pending: frames.into(),
            tick: 0,
        })
    }

    /// Directory the frames are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

impl VideoSource for FileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        while let Some(path) = self.pending.pop_front() {
            let tick = self.tick;
            self.tick += 1;
            match image::open(&path) {
                Ok(image) => return Ok(Some(Frame::new(tick, image.to_rgb8()))),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping undecodable frame"),
            }
        }
        Ok(None)
    }

    fn release(&mut self) {
        self.pending.clear();
        info!(path = %self.dir.display(), "frame directory released");
    }
}

/// Frames pushed by a capture thread. The stream ends when every sender is
/// dropped or the capture loop stops.
///
/// Releasing drops the receiving end, so a capture thread blocked on `send`
/// gets an error and exits; a worker started with [`LiveSource::spawn`] is
/// then joined.
#[derive(Debug)]
pub struct LiveSource {
    frames: Option<Receiver<RgbImage>>,
    worker: Option<JoinHandle<()>>,
    tick: u64,
}

impl LiveSource {
    /// Wrap the receiving end of a capture channel.
    pub fn new(frames: Receiver<RgbImage>) -> Self {
        Self {
            frames: Some(frames),
            worker: None,
            tick: 0,
        }
    }

    /// A live source and the sender a capture thread feeds it through.
    /// `capacity` bounds how many frames may queue before the sender blocks.
    pub fn channel(capacity: usize) -> (Sender<RgbImage>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (tx, Self::new(rx))
    }

    /// Run a capture loop on its own thread.
    ///
    /// `open` runs on the worker thread, so the device handle never crosses
    /// threads. Its result is awaited before returning: an open failure is
    /// returned here, not as an empty stream. The returned grabber is polled
    /// until it yields `None` or the source is released.
    pub fn spawn<O, G>(origin: impl Into<String>, capacity: usize, open: O) -> Result<Self, SourceError>
    where
        O: FnOnce() -> Result<G, SourceError> + Send + 'static,
        G: FnMut() -> Option<RgbImage>,
    {
        let origin = origin.into();
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread_origin = origin.clone();
        let worker = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                let mut grab = match open() {
                    Ok(grab) => {
                        let _ = ready_tx.send(Ok(()));
                        grab
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                while let Some(image) = grab() {
                    if tx.send(image).is_err() {
                        break;
                    }
                }
                debug!(origin = %thread_origin, "capture loop stopped");
            })
            .map_err(|source| SourceError::Open {
                origin: origin.clone(),
                source: Box::new(source),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(origin = %origin, "live capture started");
                Ok(Self {
                    frames: Some(rx),
                    worker: Some(worker),
                    tick: 0,
                })
            }
            Ok(Err(err)) => {
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                let _ = worker.join();
                Err(SourceError::Open {
                    origin,
                    source: "capture thread exited before opening the device".into(),
                })
            }
        }
    }

    /// Whether the receiving end has been released.
    pub fn is_released(&self) -> bool {
        self.frames.is_none()
    }
}

impl VideoSource for LiveSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(frames) = &self.frames else {
            return Ok(None);
        };
        match frames.recv() {
            Ok(image) => {
                let tick = self.tick;
                self.tick += 1;
                Ok(Some(Frame::new(tick, image)))
            }
            Err(_) => Ok(None),
        }
    }

    fn release(&mut self) {
        // Dropping the receiver fails any pending or future send.
        drop(self.frames.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("capture thread panicked");
            }
        }
        info!("live source released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_file_source_reads_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            RgbImage::from_pixel(4, 4, image::Rgb([shade, 0, 0]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = FileSource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);
        let shades: Vec<(u64, u8)> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| (f.tick, f.image.get_pixel(0, 0)[0]))
            .collect();
        assert_eq!(shades, vec![(0, 10), (1, 20), (2, 30)]);
    }

    #[test]
    fn test_file_source_skips_corrupt_frames() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0.jpg"), b"not a jpeg").unwrap();
        RgbImage::new(2, 2).save(dir.path().join("1.png")).unwrap();

        let mut source = FileSource::open(dir.path()).unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.tick, 1);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_file_source_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(FileSource::open(dir.path()), Err(SourceError::Empty(_))));
        assert!(matches!(
            FileSource::open(dir.path().join("missing")),
            Err(SourceError::Open { .. })
        ));
    }

    #[test]
    fn test_live_source_ends_when_senders_drop() {
        let (tx, mut source) = LiveSource::channel(4);
        tx.send(RgbImage::new(2, 2)).unwrap();
        tx.send(RgbImage::new(2, 2)).unwrap();
        drop(tx);

        assert_eq!(source.next_frame().unwrap().unwrap().tick, 0);
        assert_eq!(source.next_frame().unwrap().unwrap().tick, 1);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_live_source_release_stops_stream() {
        let (tx, mut source) = LiveSource::channel(4);
        tx.send(RgbImage::new(2, 2)).unwrap();
        source.release();
        assert!(source.is_released());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_live_source_release_unblocks_sender() {
        let (tx, mut source) = LiveSource::channel(1);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let capture = thread::spawn(move || {
            let mut sent = 0;
            while tx.send(RgbImage::new(2, 2)).is_ok() {
                sent += 1;
            }
            done_tx.send(sent).unwrap();
        });

        assert_eq!(source.next_frame().unwrap().unwrap().tick, 0);
        source.release();

        let sent = done_rx.recv_timeout(Duration::from_secs(2));
        assert!(sent.is_ok(), "capture thread still blocked after release");
        capture.join().unwrap();
    }

    #[test]
    fn test_spawned_capture_streams_and_joins_on_release() {
        let mut source = LiveSource::spawn("counter", 2, || {
            let mut shade = 0u8;
            Ok(move || {
                shade = shade.wrapping_add(1);
                Some(RgbImage::from_pixel(2, 2, image::Rgb([shade, 0, 0])))
            })
        })
        .unwrap();

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!((first.tick, first.image.get_pixel(0, 0)[0]), (0, 1));
        assert_eq!((second.tick, second.image.get_pixel(0, 0)[0]), (1, 2));

        // Joins the endless capture loop; hangs if the worker never sees the
        // closed channel.
        source.release();
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_spawned_capture_ends_with_grabber() {
        let mut source = LiveSource::spawn("three frames", 8, || {
            let mut left = 3;
            Ok(move || {
                left -= 1;
                (left >= 0).then(|| RgbImage::new(2, 2))
            })
        })
        .unwrap();
        let frames = std::iter::from_fn(|| source.next_frame().unwrap()).count();
        assert_eq!(frames, 3);
        source.release();
    }

    #[test]
    fn test_spawn_reports_open_failure() {
        let result = LiveSource::spawn("/dev/video9", 1, || {
            Err::<fn() -> Option<RgbImage>, _>(SourceError::Open {
                origin: "/dev/video9".to_string(),
                source: "no such device".into(),
            })
        });
        match result {
            Err(SourceError::Open { origin, .. }) => assert_eq!(origin, "/dev/video9"),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
