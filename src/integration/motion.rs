//! Motion gate: decides whether a frame contains significant movement.

use std::collections::HashMap;

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{Connectivity, connected_components};

/// Reports whether a frame contains a moving region of at least `min_area`
/// pixels. Stateful: implementations may keep a background model.
pub trait MotionGate {
    fn has_motion(&mut self, frame: &RgbImage, min_area: u32) -> bool;
}

/// Difference against the previous frame.
///
/// Pixels whose grayscale value changed by more than `threshold` form a
/// foreground mask. The mask is opened to drop speckle, dilated to merge
/// fragments of one object, then split into 8-connected regions. Motion is
/// reported when any region reaches `min_area` pixels.
#[derive(Debug, Clone)]
pub struct FrameDiffGate {
    previous: Option<GrayImage>,
    threshold: u8,
    dilation: u8,
}

impl Default for FrameDiffGate {
    fn default() -> Self {
        Self {
            previous: None,
            threshold: 25,
            dilation: 5,
        }
    }
}

impl FrameDiffGate {
    /// Create a gate with a per-pixel `threshold` and a `dilation` radius.
    pub fn new(threshold: u8, dilation: u8) -> Self {
        Self {
            previous: None,
            threshold,
            dilation,
        }
    }

    fn foreground(&self, previous: &GrayImage, current: &GrayImage) -> GrayImage {
        GrayImage::from_fn(current.width(), current.height(), |x, y| {
            let delta = previous.get_pixel(x, y)[0].abs_diff(current.get_pixel(x, y)[0]);
            if delta > self.threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl MotionGate for FrameDiffGate {
    fn has_motion(&mut self, frame: &RgbImage, min_area: u32) -> bool {
        let current = image::imageops::grayscale(frame);
        let Some(previous) = self.previous.replace(current) else {
            return false;
        };
        let Some(current) = self.previous.as_ref() else {
            return false;
        };
        if previous.dimensions() != current.dimensions() {
            return false;
        }

        let mask = self.foreground(&previous, current);
        let mask = imageproc::morphology::open(&mask, Norm::LInf, 1);
        let mask = imageproc::morphology::dilate(&mask, Norm::LInf, self.dilation);

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
        let mut areas: HashMap<u32, u32> = HashMap::new();
        for label in labels.pixels().map(|p| p[0]).filter(|&l| l != 0) {
            *areas.entry(label).or_default() += 1;
        }
        areas.values().any(|&area| area >= min_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame_with_square(offset: u32) -> RgbImage {
        let mut frame = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        for y in 20..36 {
            for x in offset..offset + 16 {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    #[test]
    fn test_first_frame_has_no_motion() {
        let mut gate = FrameDiffGate::default();
        assert!(!gate.has_motion(&frame_with_square(0), 1));
    }

    #[test]
    fn test_static_scene_has_no_motion() {
        let mut gate = FrameDiffGate::default();
        gate.has_motion(&frame_with_square(10), 1);
        assert!(!gate.has_motion(&frame_with_square(10), 1));
    }

    #[test]
    fn test_moving_square_is_motion() {
        let mut gate = FrameDiffGate::default();
        gate.has_motion(&frame_with_square(4), 50);
        assert!(gate.has_motion(&frame_with_square(30), 50));
    }

    #[test]
    fn test_small_change_below_min_area() {
        let mut gate = FrameDiffGate::new(25, 0);
        let still = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        let mut blip = still.clone();
        for y in 10..13 {
            for x in 10..13 {
                blip.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        gate.has_motion(&still, 100);
        assert!(!gate.has_motion(&blip, 100));
    }
}
