use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::vision_error::VisionError;
use crate::tracking::domain::tracker_state::TrackerState;

/// Domain interface for a stateful, frame-by-frame object tracker.
pub trait ObjectTracker: Send {
    /// Starts background processing. Calling it while running is a no-op.
    fn run(&mut self) -> Result<(), VisionError>;

    /// Stops background processing and waits until it has quiesced.
    /// Calling it while idle is a no-op.
    fn stop(&mut self);

    /// Feeds one frame and updates the tracked set.
    fn process(&mut self, frame: &Frame) -> Result<(), VisionError>;

    /// Current positions of the objects ready to be shown.
    fn objects(&self) -> Vec<Rect>;

    fn state(&self) -> TrackerState;
}
