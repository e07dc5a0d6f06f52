use std::path::Path;

use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;

/// Domain interface for a trained object classifier.
///
/// Scans the whole frame at every scale allowed by `params` and returns
/// grouped hits in frame coordinates.
pub trait Classifier: Send {
    /// True when the classifier holds no usable model.
    fn is_empty(&self) -> bool;

    /// Smallest window the classifier can evaluate.
    fn native_size(&self) -> ObjectSize;

    fn detect_multi_scale(
        &self,
        frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Rect>, VisionError>;
}

/// Builds classifiers from their on-disk source.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, VisionError>;
}
