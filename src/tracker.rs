mod centroid_tracker;
mod geometry;
mod kalman_filter;
mod matching;
mod track;
mod track_state;

pub use centroid_tracker::{
    CentroidTracker, CoastBoxPolicy, Detection, TrackError, TrackerConfig,
};
pub use geometry::{Point, Rect};
pub use kalman_filter::{KalmanConfig, KalmanFilter};
pub use track::{Track, TrackRecord};
pub use track_state::TrackState;
