//! Detection-based tracker combining a slow and a fast detector.
//!
//! The main detector scans whole frames on a background worker. Its results,
//! or the predicted positions of already tracked objects when no fresh
//! result is available, become search regions for the tracking detector,
//! which re-detects inside an enlarged window around each region on the
//! caller's thread. Matches are associated to tracked objects by overlap.

use std::sync::{MutexGuard, PoisonError};
use std::time::Duration;

use crate::detection::domain::object_detector::{ObjectDetector, SharedDetector};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;
use crate::tracking::domain::object_tracker::ObjectTracker;
use crate::tracking::domain::tracked_object::TrackedObject;
use crate::tracking::domain::tracker_parameters::TrackerParameters;
use crate::tracking::domain::tracker_state::TrackerState;
use crate::tracking::infrastructure::detection_worker::DetectionWorker;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Correspondence {
    New,
    Intersected,
    Track(usize),
}

pub struct DetectionBasedTracker {
    main_detector: SharedDetector,
    tracking_detector: SharedDetector,
    params: TrackerParameters,
    state: TrackerState,
    worker: Option<DetectionWorker>,
    tracked: Vec<TrackedObject>,
    next_id: u32,
}

impl DetectionBasedTracker {
    pub fn new(
        main_detector: SharedDetector,
        tracking_detector: SharedDetector,
        params: TrackerParameters,
    ) -> Self {
        Self {
            main_detector,
            tracking_detector,
            params,
            state: TrackerState::Idle,
            worker: None,
            tracked: Vec::new(),
            next_id: 1,
        }
    }

    pub fn params(&self) -> &TrackerParameters {
        &self.params
    }

    pub fn tracked_objects(&self) -> &[TrackedObject] {
        &self.tracked
    }

    fn predicted_regions(&self) -> Vec<Rect> {
        self.tracked
            .iter()
            .map(|obj| obj.predicted_region(self.params.coeff_object_speed_using_in_prediction))
            .filter(|r| !r.is_empty())
            .collect()
    }

    fn detect_in_region(
        &self,
        frame: &Frame,
        region: &Rect,
        found: &mut Vec<Rect>,
    ) -> Result<(), VisionError> {
        let search = region
            .inflate_about_center(self.params.coeff_tracking_window_size)
            .clamp_to(frame.width(), frame.height());
        if search.is_empty() {
            return Ok(());
        }
        let side = (region.width.min(region.height) as f64 * self.params.coeff_object_size_to_track)
            .round() as i32;
        let roi = frame.crop(&search);

        let mut detector = lock_detector(&self.tracking_detector);
        detector.set_min_object_size(ObjectSize::square(side));
        for r in detector.detect(&roi)? {
            found.push(r.translate(search.x, search.y));
        }
        Ok(())
    }

    fn update_tracked_objects(&mut self, detected: &[Rect]) {
        for obj in &mut self.tracked {
            obj.num_detected_frames += 1;
        }

        let mut correspondence = vec![Correspondence::New; detected.len()];
        for (i, obj) in self.tracked.iter_mut().enumerate() {
            let prev = obj.last_position();
            let mut best: Option<(usize, i64)> = None;
            for (j, rect) in detected.iter().enumerate() {
                if correspondence[j] != Correspondence::New {
                    continue;
                }
                let area = prev.intersection(rect).area();
                if area > 0 {
                    correspondence[j] = Correspondence::Intersected;
                    if best.map_or(true, |(_, best_area)| area > best_area) {
                        best = Some((j, area));
                    }
                }
            }

            match best {
                Some((best_idx, _)) => {
                    correspondence[best_idx] = Correspondence::Track(i);
                    // Detections overlapping the winner are duplicates of it.
                    for (j, rect) in detected.iter().enumerate() {
                        if matches!(correspondence[j], Correspondence::Track(_)) {
                            continue;
                        }
                        if rect.intersection(&detected[best_idx]).area() > 0 {
                            correspondence[j] = Correspondence::Intersected;
                        }
                    }
                }
                None => obj.num_frames_not_detected += 1,
            }
        }

        let keep = self.params.num_last_positions_to_track;
        for (j, rect) in detected.iter().enumerate() {
            match correspondence[j] {
                Correspondence::Track(i) => self.tracked[i].push_position(*rect, keep),
                Correspondence::New => {
                    log::debug!("Tracking new object {} at {:?}", self.next_id, rect);
                    self.tracked.push(TrackedObject::new(self.next_id, *rect));
                    self.next_id = self.next_id.wrapping_add(1).max(1);
                }
                Correspondence::Intersected => {}
            }
        }

        let params = &self.params;
        self.tracked.retain(|obj| {
            let expired = obj.is_expired(params);
            if expired {
                log::debug!("Dropping object {}", obj.id);
            }
            !expired
        });
    }
}

fn lock_detector(detector: &SharedDetector) -> MutexGuard<'_, dyn ObjectDetector + 'static> {
    detector.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ObjectTracker for DetectionBasedTracker {
    fn run(&mut self) -> Result<(), VisionError> {
        if self.state.is_running() {
            if self.worker.as_ref().is_some_and(DetectionWorker::is_alive) {
                return Ok(());
            }
            log::warn!("Detection worker exited unexpectedly, restarting it");
            self.stop();
        }
        let period = Duration::from_millis(self.params.min_detection_period_ms);
        self.worker = Some(DetectionWorker::spawn(self.main_detector.clone(), period)?);
        self.state = TrackerState::Running;
        log::info!("Tracker running");
        Ok(())
    }

    fn stop(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            self.state = TrackerState::Idle;
            return;
        };
        self.state = TrackerState::Stopping;
        worker.shutdown();
        self.state = TrackerState::Idle;
        log::info!("Tracker stopped");
    }

    fn process(&mut self, frame: &Frame) -> Result<(), VisionError> {
        let fresh = match &self.worker {
            Some(worker) => {
                let fresh = worker.take_result();
                worker.offer(frame);
                fresh?
            }
            None => None,
        };

        let regions = match fresh {
            Some(rects) => {
                log::trace!("Search regions from main detection: {}", rects.len());
                rects
            }
            None => self.predicted_regions(),
        };

        let mut found = Vec::new();
        for region in &regions {
            self.detect_in_region(frame, region, &mut found)?;
        }
        self.update_tracked_objects(&found);
        Ok(())
    }

    fn objects(&self) -> Vec<Rect> {
        self.tracked
            .iter()
            .filter_map(|obj| obj.position_to_show(&self.params))
            .collect()
    }

    fn state(&self) -> TrackerState {
        self.state
    }
}

impl Drop for DetectionBasedTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
