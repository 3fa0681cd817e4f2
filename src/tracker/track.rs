//! Single object track: identity, state estimate, and per-frame history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tracker::geometry::{Point, Rect};
use crate::tracker::kalman_filter::{KalmanConfig, KalmanFilter};
use crate::tracker::track_state::TrackState;

/// Minimal persisted form of a track: enough to re-seed its identity and
/// last known state into a fresh tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub class: Option<String>,
    pub bbox: Option<Rect>,
}

/// Single tracked object.
///
/// A passive aggregate: the owning tracker writes every field during
/// `update`; the track itself only carries state and history.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Current position estimate
    pub position: Point,
    /// Frames in a row this track has gone undetected
    pub skipped_frames: u32,
    /// Bounded trail of past position estimates, oldest first
    pub trace: VecDeque<Point>,
    /// Bounded trail of past bounding boxes, oldest first; populated only
    /// when box recording is enabled
    pub bbox_trace: VecDeque<Rect>,
    /// Per-frame class labels, `None` marking undetected frames; populated
    /// only when class recording is enabled. Majority-vote resolution is
    /// left to whoever terminates or exports the track.
    pub class_history: Vec<Option<String>>,
    /// Motion estimator, present when the tracker runs with estimation
    pub(crate) filter: Option<KalmanFilter>,
}

impl Track {
    pub(crate) fn new(track_id: u64, position: Point, kalman: Option<&KalmanConfig>) -> Self {
        Self {
            track_id,
            state: TrackState::New,
            position,
            skipped_frames: 0,
            trace: VecDeque::new(),
            bbox_trace: VecDeque::new(),
            class_history: Vec::new(),
            filter: kalman.map(|config| KalmanFilter::new(config, position)),
        }
    }

    /// Append the current position to the trace, evicting the oldest
    /// entries beyond `max_len`.
    pub(crate) fn push_trace(&mut self, max_len: usize) {
        self.trace.push_back(self.position);
        while self.trace.len() > max_len {
            self.trace.pop_front();
        }
    }

    pub(crate) fn push_bbox(&mut self, bbox: Rect, max_len: usize) {
        self.bbox_trace.push_back(bbox);
        while self.bbox_trace.len() > max_len {
            self.bbox_trace.pop_front();
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    /// Most recent recorded bounding box, if any.
    pub fn last_bbox(&self) -> Option<Rect> {
        self.bbox_trace.back().copied()
    }

    /// Most recent recorded class label, if any frame carried one.
    pub fn last_class(&self) -> Option<&str> {
        self.class_history
            .iter()
            .rev()
            .find_map(|label| label.as_deref())
    }
}
