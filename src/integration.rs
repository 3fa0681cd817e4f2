//! Integration module for connecting object detection backends with the
//! tracker.
//!
//! The detector itself is an external collaborator; this module provides
//! the seam — traits and utilities for feeding any detection source into
//! a [`crate::CentroidTracker`].

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{PipelineError, TrackerPipeline};
