//! Main centroid tracker: assignment-driven identity management with
//! Kalman-filter buffer-and-recover occlusion handling.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, trace};

use crate::tracker::geometry::{Point, Rect};
use crate::tracker::kalman_filter::KalmanConfig;
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::track::{Track, TrackRecord};
use crate::tracker::track_state::TrackState;

/// Caller contract violations surfaced by the tracker.
///
/// The matched/coasting/new/removed branching inside `update` is ordinary
/// policy, never an error; these cover only malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    /// classes or boxes not index-aligned with the detections
    #[error("input length mismatch: expected {expected} {field}, got {got}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    /// input supplied for a feature the tracker was built without
    #[error("{field} supplied but {field} recording is disabled for this tracker")]
    FeatureDisabled { field: &'static str },
    /// feature enabled at construction but input missing this frame
    #[error("{field} recording is enabled but no {field} were supplied")]
    FeatureMissing { field: &'static str },
    /// restore attempted with an id that is still live
    #[error("cannot restore track {0}: id is already live")]
    DuplicateId(u64),
}

/// Policy for the bounding-box history of a track that went undetected
/// this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoastBoxPolicy {
    /// Carry the last known box forward, assuming the object kept its size
    /// through the occlusion.
    #[default]
    RepeatLast,
    /// Record nothing for undetected frames.
    Skip,
}

/// Configuration for the centroid tracker, fixed for the instance's
/// lifetime.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum Euclidean distance at which a track still prefers a real
    /// detection over its synthetic no-match column.
    pub dist_thresh: f32,
    /// Undetected frames a track survives before removal.
    pub max_frames_to_skip: u32,
    /// Bound on the position and bounding-box traces.
    pub max_trace_length: usize,
    /// First track id handed out.
    pub initial_track_id: u64,
    /// Drive track positions with a Kalman filter instead of raw detections.
    pub use_kalman: bool,
    /// Motion model tuning, used when `use_kalman` is set.
    pub kalman: KalmanConfig,
    /// Record per-frame class labels on each track.
    pub record_classes: bool,
    /// Record a bounding-box trail on each track.
    pub record_boxes: bool,
    /// Box history policy for undetected frames.
    pub coast_box_policy: CoastBoxPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dist_thresh: 50.0,
            max_frames_to_skip: 30,
            max_trace_length: 30,
            initial_track_id: 0,
            use_kalman: true,
            kalman: KalmanConfig::default(),
            record_classes: false,
            record_boxes: false,
            coast_box_policy: CoastBoxPolicy::default(),
        }
    }
}

/// One observed object in a single frame.
///
/// Ephemeral: exists only to carry a detector's output into an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Detection centroid
    pub position: Point,
    /// Predicted class label, when the detector provides one
    pub class: Option<String>,
    /// Bounding box, when the detector provides one
    pub bbox: Option<Rect>,
}

impl Detection {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            class: None,
            bbox: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_bbox(mut self, bbox: Rect) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Multi-object tracker assigning persistent identities to per-frame
/// detection centroids.
///
/// Tracks live in an ordered id-to-track arena; ids are handed out by a
/// monotonic counter and are never reused after removal, except through an
/// explicit [`CentroidTracker::restore_track`].
pub struct CentroidTracker {
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
    config: TrackerConfig,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: config.initial_track_id,
            config,
        }
    }

    /// Live tracks in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Advance the tracker by one frame.
    ///
    /// `classes` and `boxes`, when the tracker records them, must be
    /// index-aligned with `detections`; a length mismatch fails fast
    /// without touching any track.
    pub fn update(
        &mut self,
        detections: &[Point],
        classes: Option<&[Option<String>]>,
        boxes: Option<&[Rect]>,
    ) -> Result<(), TrackError> {
        self.validate_inputs(detections.len(), classes, boxes)?;

        // Bootstrap: nothing to associate against.
        if self.tracks.is_empty() {
            for (j, &position) in detections.iter().enumerate() {
                self.spawn_track(
                    position,
                    classes.and_then(|c| c[j].clone()),
                    boxes.map(|b| b[j]),
                );
            }
            return Ok(());
        }

        let ids: Vec<u64> = self.tracks.keys().copied().collect();
        let positions: Vec<Point> = ids.iter().map(|id| self.tracks[id].position).collect();

        let cost = matching::distance_matrix(&positions, detections);
        let padded = matching::pad_no_match(&cost, self.config.dist_thresh);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&padded, detections.len());

        trace!(
            tracks = ids.len(),
            detections = detections.len(),
            ?matches,
            ?unmatched_tracks,
            ?unmatched_detections,
            "assignment solved"
        );

        // Unmatched tracks go on coasting and edge toward removal.
        let mut removed: Vec<u64> = Vec::new();
        for &row in &unmatched_tracks {
            let id = ids[row];
            if let Some(track) = self.tracks.get_mut(&id) {
                track.skipped_frames += 1;
                track.state = TrackState::Coasting;
                if track.skipped_frames > self.config.max_frames_to_skip {
                    removed.push(id);
                }
            }
        }

        // Deletion by stable id keeps the id-to-outcome pairing intact no
        // matter how many tracks die in the same pass.
        for id in removed {
            if let Some(mut track) = self.tracks.remove(&id) {
                track.mark_removed();
                debug!(
                    track_id = id,
                    skipped = track.skipped_frames,
                    "removed track"
                );
            }
        }

        // Births from detections nothing claimed.
        for &j in &unmatched_detections {
            self.spawn_track(
                detections[j],
                classes.and_then(|c| c[j].clone()),
                boxes.map(|b| b[j]),
            );
        }

        // Matched tracks: fold in the real measurement.
        for &(row, det_idx) in &matches {
            let id = ids[row];
            let Some(track) = self.tracks.get_mut(&id) else {
                continue;
            };
            track.skipped_frames = 0;
            track.state = TrackState::Tracked;
            if let Some(classes) = classes {
                track.class_history.push(classes[det_idx].clone());
            }
            if let Some(boxes) = boxes {
                track.push_bbox(boxes[det_idx], self.config.max_trace_length);
            }
            let measurement = detections[det_idx];
            if let Some(filter) = track.filter.as_mut() {
                filter.predict();
                track.position = filter.correct(Some(measurement));
            } else {
                track.position = measurement;
            }
            track.push_trace(self.config.max_trace_length);
        }

        // Coasting survivors: advance on the motion estimate alone.
        for &row in &unmatched_tracks {
            let id = ids[row];
            let Some(track) = self.tracks.get_mut(&id) else {
                continue; // removed earlier this pass
            };
            if self.config.record_classes {
                track.class_history.push(None);
            }
            if self.config.record_boxes
                && self.config.coast_box_policy == CoastBoxPolicy::RepeatLast
            {
                if let Some(last) = track.last_bbox() {
                    track.push_bbox(last, self.config.max_trace_length);
                }
            }
            if let Some(filter) = track.filter.as_mut() {
                filter.predict();
                // A single-point history carries no velocity worth trusting;
                // hold position until the track has some past to lean on.
                if track.trace.len() > 1 {
                    track.position = filter.correct(None);
                }
            }
            track.push_trace(self.config.max_trace_length);
        }

        Ok(())
    }

    /// Re-seed a track from a persisted record, keeping its exact id.
    ///
    /// The id generator is advanced past the restored id, so every id
    /// handed out afterwards exceeds all restored ones.
    pub fn restore_track(&mut self, record: &TrackRecord) -> Result<(), TrackError> {
        if self.tracks.contains_key(&record.id) {
            return Err(TrackError::DuplicateId(record.id));
        }

        let position = Point::new(record.x, record.y);
        let mut track = Track::new(record.id, position, self.kalman_config());
        if self.config.record_classes {
            track.class_history.push(record.class.clone());
        }
        if self.config.record_boxes {
            if let Some(bbox) = record.bbox {
                track.push_bbox(bbox, self.config.max_trace_length);
            }
        }
        track.push_trace(self.config.max_trace_length);

        self.next_id = self.next_id.max(record.id + 1);
        debug!(track_id = record.id, "restored track");
        self.tracks.insert(record.id, track);
        Ok(())
    }

    /// Continue counting track ids from `latest + 1`.
    pub fn set_starting_id(&mut self, latest: u64) {
        self.next_id = latest + 1;
    }

    /// Drop every live track, leaving the configuration untouched.
    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
    }

    fn kalman_config(&self) -> Option<&KalmanConfig> {
        self.config.use_kalman.then_some(&self.config.kalman)
    }

    fn spawn_track(&mut self, position: Point, class: Option<String>, bbox: Option<Rect>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let mut track = Track::new(id, position, self.kalman_config());
        if self.config.record_classes {
            track.class_history.push(class);
        }
        if self.config.record_boxes {
            if let Some(bbox) = bbox {
                track.push_bbox(bbox, self.config.max_trace_length);
            }
        }
        track.push_trace(self.config.max_trace_length);

        debug!(track_id = id, x = position.x, y = position.y, "started new track");
        self.tracks.insert(id, track);
        id
    }

    fn validate_inputs(
        &self,
        num_detections: usize,
        classes: Option<&[Option<String>]>,
        boxes: Option<&[Rect]>,
    ) -> Result<(), TrackError> {
        match (self.config.record_classes, classes) {
            (true, None) => return Err(TrackError::FeatureMissing { field: "classes" }),
            (false, Some(_)) => return Err(TrackError::FeatureDisabled { field: "classes" }),
            (true, Some(c)) if c.len() != num_detections => {
                return Err(TrackError::LengthMismatch {
                    field: "classes",
                    expected: num_detections,
                    got: c.len(),
                });
            }
            _ => {}
        }
        match (self.config.record_boxes, boxes) {
            (true, None) => return Err(TrackError::FeatureMissing { field: "boxes" }),
            (false, Some(_)) => return Err(TrackError::FeatureDisabled { field: "boxes" }),
            (true, Some(b)) if b.len() != num_detections => {
                return Err(TrackError::LengthMismatch {
                    field: "boxes",
                    expected: num_detections,
                    got: b.len(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config() -> TrackerConfig {
        TrackerConfig {
            dist_thresh: 5.0,
            max_frames_to_skip: 2,
            max_trace_length: 10,
            use_kalman: false,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn test_bootstrap_creates_one_track_per_detection() {
        let mut tracker = CentroidTracker::new(plain_config());
        tracker
            .update(&[Point::new(0.0, 0.0), Point::new(10.0, 10.0)], None, None)
            .unwrap();

        let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(tracker.tracks().all(|t| t.state == TrackState::New));
    }

    #[test]
    fn test_set_starting_id() {
        let mut tracker = CentroidTracker::new(plain_config());
        tracker.set_starting_id(41);
        tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();
        assert_eq!(tracker.tracks().next().map(|t| t.track_id), Some(42));
    }

    #[test]
    fn test_clear_tracks_preserves_configuration() {
        let mut tracker = CentroidTracker::new(plain_config());
        tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();
        assert_eq!(tracker.len(), 1);

        tracker.clear_tracks();
        assert!(tracker.is_empty());
        assert_eq!(tracker.config().dist_thresh, 5.0);
        assert_eq!(tracker.config().max_frames_to_skip, 2);
    }

    #[test]
    fn test_restore_duplicate_id_is_rejected() {
        let mut tracker = CentroidTracker::new(plain_config());
        let record = TrackRecord {
            id: 3,
            x: 1.0,
            y: 2.0,
            class: None,
            bbox: None,
        };
        tracker.restore_track(&record).unwrap();
        assert_eq!(tracker.restore_track(&record), Err(TrackError::DuplicateId(3)));
    }

    #[test]
    fn test_input_validation() {
        let mut tracker = CentroidTracker::new(TrackerConfig {
            record_classes: true,
            ..plain_config()
        });
        let detections = [Point::new(0.0, 0.0), Point::new(5.0, 5.0)];

        assert_eq!(
            tracker.update(&detections, None, None),
            Err(TrackError::FeatureMissing { field: "classes" })
        );
        assert_eq!(
            tracker.update(&detections, Some(&[Some("ant".to_string())]), None),
            Err(TrackError::LengthMismatch {
                field: "classes",
                expected: 2,
                got: 1,
            })
        );
        assert_eq!(
            tracker.update(
                &detections,
                Some(&[Some("ant".to_string()), None]),
                Some(&[Rect::default(), Rect::default()]),
            ),
            Err(TrackError::FeatureDisabled { field: "boxes" })
        );
        // failed updates must not have touched the track set
        assert!(tracker.is_empty());
    }
}
