//! Multi-object tracking over 2D detection centroids.
//!
//! Detectors hand over per-frame centroids (optionally with class labels
//! and bounding boxes) but no identity; this crate links them across
//! frames into persistent tracks. Association is a minimum-cost Hungarian
//! matching over Euclidean distance with a synthetic "no-match" column per
//! track, and each track carries a constant-acceleration Kalman filter so
//! it can coast through short occlusions and be recovered near its
//! predicted position.
//!
//! # Example
//!
//! ```
//! use buffertrack_rs::{CentroidTracker, TrackerConfig};
//! use buffertrack_rs::tracker::Point;
//!
//! let mut tracker = CentroidTracker::new(TrackerConfig::default());
//! tracker.update(&[Point::new(10.0, 10.0)], None, None)?;
//! tracker.update(&[Point::new(12.0, 11.0)], None, None)?;
//!
//! let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
//! assert_eq!(ids, vec![0]);
//! # Ok::<(), buffertrack_rs::TrackError>(())
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{CentroidTracker, Detection, Point, Rect, TrackError, TrackerConfig};
