use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;

/// Domain interface for a single detection stage.
///
/// Size setters ignore non-positive requests so that "no override" can be
/// passed through without clobbering the current configuration.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, VisionError>;

    fn min_object_size(&self) -> ObjectSize;

    fn max_object_size(&self) -> ObjectSize;

    fn set_min_object_size(&mut self, size: ObjectSize);

    fn set_max_object_size(&mut self, size: ObjectSize);
}

/// A detector shared between the caller's thread and the tracker's worker.
pub type SharedDetector = Arc<Mutex<dyn ObjectDetector>>;

pub fn share<D: ObjectDetector + 'static>(detector: D) -> SharedDetector {
    Arc::new(Mutex::new(detector))
}
