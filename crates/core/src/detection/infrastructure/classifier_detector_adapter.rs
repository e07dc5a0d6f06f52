use crate::detection::domain::classifier::Classifier;
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;

/// Presents one classifier as an [`ObjectDetector`] with its own parameters.
///
/// The adapter keeps no state between calls apart from the parameters.
pub struct DetectorAdapter {
    classifier: Box<dyn Classifier>,
    params: DetectionParams,
}

impl DetectorAdapter {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self::with_params(classifier, DetectionParams::default())
    }

    pub fn with_params(classifier: Box<dyn Classifier>, params: DetectionParams) -> Self {
        log::debug!("DetectorAdapter created ({:?})", params);
        Self { classifier, params }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }
}

impl ObjectDetector for DetectorAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, VisionError> {
        if self.classifier.is_empty() {
            return Err(VisionError::EmptyClassifier);
        }
        let p = &self.params;
        log::trace!(
            "DetectorAdapter::detect: scale_factor={:.2}, min_neighbors={}, min_obj_size=({}x{}), max_obj_size=({}x{})",
            p.scale_factor,
            p.min_neighbors,
            p.min_object_size.width,
            p.min_object_size.height,
            p.max_object_size.width,
            p.max_object_size.height
        );
        self.classifier.detect_multi_scale(frame, p)
    }

    fn min_object_size(&self) -> ObjectSize {
        self.params.min_object_size
    }

    fn max_object_size(&self) -> ObjectSize {
        self.params.max_object_size
    }

    fn set_min_object_size(&mut self, size: ObjectSize) {
        if size.is_positive() {
            self.params.min_object_size = size;
        }
    }

    fn set_max_object_size(&mut self, size: ObjectSize) {
        if size.is_positive() {
            self.params.max_object_size = size;
        }
    }
}

impl Drop for DetectorAdapter {
    fn drop(&mut self) {
        log::debug!("DetectorAdapter dropped");
    }
}
