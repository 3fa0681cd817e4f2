//! TrackerPipeline for combining detection with tracking.

use thiserror::Error;

use crate::tracker::{CentroidTracker, Point, Rect, Track, TrackError, TrackerConfig};

use super::DetectionSource;

/// Failure of one pipeline frame: either the detector or the tracker
/// rejected it.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    #[error("detector failed")]
    Detector(#[source] E),
    #[error(transparent)]
    Tracker(#[from] TrackError),
}

/// A combined tracker that bundles detection inference with centroid
/// tracking.
///
/// This struct provides a convenient way to run end-to-end tracking by
/// combining any [`DetectionSource`] with a [`CentroidTracker`]: each
/// frame's detections are split into the tracker's index-aligned input
/// form according to the tracker's configuration.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: CentroidTracker,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Self {
        Self {
            detector,
            tracker: CentroidTracker::new(config),
        }
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }

    /// Process a single frame and return a snapshot of the live tracks.
    ///
    /// Runs detection on the input image, feeds the detections to the
    /// tracker, and returns the updated track set.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Track>, PipelineError<D::Error>> {
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detector)?;

        let positions: Vec<Point> = detections.iter().map(|d| d.position).collect();

        let classes: Option<Vec<Option<String>>> = self
            .tracker
            .config()
            .record_classes
            .then(|| detections.iter().map(|d| d.class.clone()).collect());

        let boxes: Option<Vec<Rect>> = if self.tracker.config().record_boxes {
            let mut rects = Vec::with_capacity(detections.len());
            for det in &detections {
                let rect = det
                    .bbox
                    .ok_or(TrackError::FeatureMissing { field: "boxes" })?;
                rects.push(rect);
            }
            Some(rects)
        } else {
            None
        };

        self.tracker
            .update(&positions, classes.as_deref(), boxes.as_deref())?;

        Ok(self.tracker.tracks().cloned().collect())
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut CentroidTracker {
        &mut self.tracker
    }
}
