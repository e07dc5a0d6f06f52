use serde::{Deserialize, Serialize};

/// Policy knobs of the detection-based tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParameters {
    /// Consecutive misses after which a shown object is dropped.
    pub max_track_lifetime: usize,
    /// Minimum time between two main detections, in milliseconds.
    pub min_detection_period_ms: u64,
    pub num_last_positions_to_track: usize,
    /// Updates an object must survive before it is reported.
    pub num_steps_to_wait_before_first_show: usize,
    pub num_steps_to_track_without_detecting_if_object_has_not_been_shown: usize,
    pub num_steps_to_show_without_detecting: usize,
    /// Search window around a tracked object, relative to its size.
    pub coeff_tracking_window_size: f64,
    /// Tracking detector minimum size, relative to the tracked object.
    pub coeff_object_size_to_track: f64,
    pub coeff_object_speed_using_in_prediction: f64,
}

impl Default for TrackerParameters {
    fn default() -> Self {
        Self {
            max_track_lifetime: 5,
            min_detection_period_ms: 0,
            num_last_positions_to_track: 4,
            num_steps_to_wait_before_first_show: 6,
            num_steps_to_track_without_detecting_if_object_has_not_been_shown: 3,
            num_steps_to_show_without_detecting: 3,
            coeff_tracking_window_size: 2.0,
            coeff_object_size_to_track: 0.85,
            coeff_object_speed_using_in_prediction: 0.8,
        }
    }
}
