use std::collections::HashSet;

use crate::engine::track::TrackedObject;

/// Track ids that already raised an alert in the current episode.
///
/// Entries never expire on their own; the set is only emptied when the
/// episode ends.
#[derive(Debug, Clone, Default)]
pub struct AlarmedSet {
    ids: HashSet<u64>,
    order: Vec<u64>,
}

impl AlarmedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `track_id` already alerted this episode.
    pub fn contains(&self, track_id: u64) -> bool {
        self.ids.contains(&track_id)
    }

    /// Keep the violators not yet alarmed, in the order given, and mark them
    /// alarmed. A repeated id within `violators` is kept once.
    pub fn claim_new(&mut self, violators: Vec<TrackedObject>) -> Vec<TrackedObject> {
        violators
            .into_iter()
            .filter(|track| {
                let fresh = self.ids.insert(track.id);
                if fresh {
                    self.order.push(track.id);
                }
                fresh
            })
            .collect()
    }

    /// Alarmed ids in the order they were first claimed.
    pub fn ids(&self) -> &[u64] {
        &self.order
    }

    /// Number of alarmed tracks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no track has alerted yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forget every alarmed id.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
    }
}
