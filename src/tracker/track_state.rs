/// Track state enumeration for the object tracking lifecycle.
///
/// A track never returns to `New`; once `Removed`, its identity is gone
/// for good and a reappearing object starts over as a new track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, born this frame
    #[default]
    New,
    /// Matched to a real detection this frame
    Tracked,
    /// Undetected this frame, surviving on its motion estimate
    Coasting,
    /// Removed from tracking
    Removed,
}
