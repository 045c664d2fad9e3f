use crate::engine::rect::Rect;

/// One row of tracker output: a corner-format box with a persistent identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedObject {
    /// Identity assigned by the external tracker, stable across frames
    pub id: u64,
    /// Box for this frame
    pub bbox: Rect,
}

impl TrackedObject {
    /// Create a tracked object from an id and its box.
    pub fn new(id: u64, bbox: Rect) -> Self {
        Self { id, bbox }
    }

    /// Build from tracker corner output (x1, y1, x2, y2, id).
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32, id: u64) -> Self {
        Self::new(id, Rect::from_tlbr(x1, y1, x2, y2))
    }
}
