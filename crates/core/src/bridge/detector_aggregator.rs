use std::sync::PoisonError;

use crate::detection::domain::object_detector::{share, SharedDetector};
use crate::detection::infrastructure::classifier_detector_adapter::DetectorAdapter;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;
use crate::tracking::domain::object_tracker::ObjectTracker;
use crate::tracking::domain::tracker_parameters::TrackerParameters;
use crate::tracking::domain::tracker_state::TrackerState;
use crate::tracking::infrastructure::detection_based_tracker::DetectionBasedTracker;

/// One tracker together with the two detectors it was built from.
///
/// The main detector keeps a handle here so its size limits can be changed
/// while the tracker runs. The tracking detector's minimum size is owned by
/// the tracker, which derives it from each tracked object.
pub struct DetectorAggregator {
    main_detector: SharedDetector,
    tracking_detector: SharedDetector,
    tracker: DetectionBasedTracker,
}

impl DetectorAggregator {
    pub fn new(main: DetectorAdapter, tracking: DetectorAdapter, params: TrackerParameters) -> Self {
        let main_detector = share(main);
        let tracking_detector = share(tracking);
        let tracker =
            DetectionBasedTracker::new(main_detector.clone(), tracking_detector.clone(), params);
        Self {
            main_detector,
            tracking_detector,
            tracker,
        }
    }

    pub fn start(&mut self) -> Result<(), VisionError> {
        self.tracker.run()
    }

    pub fn stop(&mut self) {
        self.tracker.stop();
    }

    /// Feeds one frame and returns the objects currently shown.
    pub fn process(&mut self, frame: &Frame) -> Result<Vec<Rect>, VisionError> {
        self.tracker.process(frame)?;
        Ok(self.tracker.objects())
    }

    pub fn set_main_min_object_size(&self, size: ObjectSize) {
        self.main_detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_min_object_size(size);
    }

    pub fn main_min_object_size(&self) -> ObjectSize {
        self.main_detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .min_object_size()
    }

    pub fn tracking_min_object_size(&self) -> ObjectSize {
        self.tracking_detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .min_object_size()
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }
}

impl Drop for DetectorAggregator {
    fn drop(&mut self) {
        self.tracker.stop();
    }
}
