//! Draws alerted tracks onto a copy of the frame.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;

use crate::error::ConfigError;
use crate::integration::matching::LabeledTrack;

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([255, 225, 25]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
    Rgb([145, 30, 180]),
];

/// Stable color per class label.
fn label_color(label: &str) -> Rgb<u8> {
    let hash = label
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
    PALETTE[hash % PALETTE.len()]
}

/// Caption drawn above each box, e.g. `ID: 3 person [0.87]`.
pub fn caption(track: &LabeledTrack) -> String {
    format!(
        "ID: {} {} [{:.2}]",
        track.track.id, track.label, track.confidence
    )
}

pub struct AlertRenderer {
    font: Option<FontVec>,
    scale: f32,
}

impl Default for AlertRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlertRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRenderer")
            .field("font", &self.font.is_some())
            .field("scale", &self.scale)
            .finish()
    }
}

impl AlertRenderer {
    /// Boxes only, no captions.
    pub fn new() -> Self {
        Self {
            font: None,
            scale: 16.0,
        }
    }

    /// Boxes with captions set in the TrueType/OpenType font at `path`.
    pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let font_error = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Font {
            path: path.to_path_buf(),
            source,
        };
        let bytes = std::fs::read(path).map_err(|e| font_error(Box::new(e)))?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| font_error(Box::new(e)))?;
        Ok(Self {
            font: Some(font),
            scale: 16.0,
        })
    }

    /// Whether captions are drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Copy of `frame` with a 2 px box (and caption, if a font is loaded) for
    /// each of `tracks`.
    pub fn annotate(&self, frame: &RgbImage, tracks: &[LabeledTrack]) -> RgbImage {
        let mut canvas = frame.clone();
        for labeled in tracks {
            let color = label_color(&labeled.label);
            let [x1, y1, x2, y2] = labeled.track.bbox.to_tlbr();
            let (x, y) = (x1.round() as i32, y1.round() as i32);
            let width = (x2 - x1).round().max(1.0) as u32;
            let height = (y2 - y1).round().max(1.0) as u32;

            draw_hollow_rect_mut(&mut canvas, PixelRect::at(x, y).of_size(width, height), color);
            if width > 2 && height > 2 {
                let inner = PixelRect::at(x + 1, y + 1).of_size(width - 2, height - 2);
                draw_hollow_rect_mut(&mut canvas, inner, color);
            }

            if let Some(font) = &self.font {
                let text_y = (y - 5 - self.scale as i32).max(0);
                draw_text_mut(
                    &mut canvas,
                    color,
                    x.max(0),
                    text_y,
                    PxScale::from(self.scale),
                    font,
                    &caption(labeled),
                );
            }
        }
        canvas
    }
}
