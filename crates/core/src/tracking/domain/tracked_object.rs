use std::collections::VecDeque;

use crate::shared::rect::Rect;
use crate::tracking::domain::tracker_parameters::TrackerParameters;

/// Smoothing weights for the reported size, newest position first.
const SIZE_SMOOTHING_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Smoothing weights for the reported center, newest position first.
const POSITION_SMOOTHING_WEIGHTS: [f64; 1] = [1.0];

/// One object followed across frames.
///
/// `num_detected_frames` counts tracker updates since the object appeared;
/// `num_frames_not_detected` counts consecutive updates without a match.
#[derive(Clone, Debug)]
pub struct TrackedObject {
    pub id: u32,
    positions: VecDeque<Rect>,
    pub num_detected_frames: usize,
    pub num_frames_not_detected: usize,
}

impl TrackedObject {
    pub fn new(id: u32, rect: Rect) -> Self {
        Self {
            id,
            positions: VecDeque::from([rect]),
            num_detected_frames: 1,
            num_frames_not_detected: 0,
        }
    }

    pub fn last_position(&self) -> Rect {
        self.positions.back().copied().unwrap_or_default()
    }

    pub fn positions(&self) -> &VecDeque<Rect> {
        &self.positions
    }

    pub fn push_position(&mut self, rect: Rect, keep: usize) {
        self.positions.push_back(rect);
        while self.positions.len() > keep.max(1) {
            self.positions.pop_front();
        }
        self.num_frames_not_detected = 0;
    }

    /// Last position shifted by the most recent center velocity.
    pub fn predicted_region(&self, speed_coeff: f64) -> Rect {
        let n = self.positions.len();
        let last = self.last_position();
        if n < 2 {
            return last;
        }
        let (cx, cy) = last.center();
        let (px, py) = self.positions[n - 2].center();
        last.translate(
            ((cx - px) * speed_coeff).round() as i32,
            ((cy - py) * speed_coeff).round() as i32,
        )
    }

    pub fn is_shown(&self, params: &TrackerParameters) -> bool {
        self.num_detected_frames > params.num_steps_to_wait_before_first_show
            && self.num_frames_not_detected <= params.num_steps_to_show_without_detecting
    }

    pub fn is_expired(&self, params: &TrackerParameters) -> bool {
        self.num_frames_not_detected > params.max_track_lifetime
            || (self.num_detected_frames <= params.num_steps_to_wait_before_first_show
                && self.num_frames_not_detected
                    > params.num_steps_to_track_without_detecting_if_object_has_not_been_shown)
    }

    /// Smoothed rect to report, or `None` while the object is hidden.
    pub fn position_to_show(&self, params: &TrackerParameters) -> Option<Rect> {
        if !self.is_shown(params) || self.positions.is_empty() {
            return None;
        }
        let newest_first = || self.positions.iter().rev();

        let mut w = 0.0;
        let mut h = 0.0;
        let mut sum = 0.0;
        for (r, weight) in newest_first().zip(SIZE_SMOOTHING_WEIGHTS) {
            w += r.width as f64 * weight;
            h += r.height as f64 * weight;
            sum += weight;
        }
        w /= sum;
        h /= sum;

        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut sum = 0.0;
        for (r, weight) in newest_first().zip(POSITION_SMOOTHING_WEIGHTS) {
            let (x, y) = r.center();
            cx += x * weight;
            cy += y * weight;
            sum += weight;
        }
        cx /= sum;
        cy /= sum;

        let rect = Rect::new(
            (cx - w / 2.0).round() as i32,
            (cy - h / 2.0).round() as i32,
            w.round() as i32,
            h.round() as i32,
        );
        (!rect.is_empty()).then_some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TrackerParameters {
        TrackerParameters::default()
    }

    fn shown_object(rect: Rect) -> TrackedObject {
        let mut obj = TrackedObject::new(1, rect);
        obj.num_detected_frames = params().num_steps_to_wait_before_first_show + 1;
        obj
    }

    #[test]
    fn test_new_object_is_hidden() {
        let obj = TrackedObject::new(1, Rect::new(0, 0, 10, 10));
        assert!(obj.position_to_show(&params()).is_none());
    }

    #[test]
    fn test_shown_after_wait_period() {
        let obj = shown_object(Rect::new(10, 20, 30, 30));
        assert_eq!(obj.position_to_show(&params()), Some(Rect::new(10, 20, 30, 30)));
    }

    #[test]
    fn test_hidden_after_too_many_misses() {
        let mut obj = shown_object(Rect::new(10, 20, 30, 30));
        obj.num_frames_not_detected = params().num_steps_to_show_without_detecting + 1;
        assert!(obj.position_to_show(&params()).is_none());
    }

    #[test]
    fn test_size_is_smoothed_over_last_three() {
        let mut obj = shown_object(Rect::new(0, 0, 10, 10));
        obj.push_position(Rect::new(0, 0, 20, 20), 4);
        obj.push_position(Rect::new(0, 0, 30, 30), 4);
        // 30*0.5 + 20*0.3 + 10*0.2 = 23
        let shown = obj.position_to_show(&params()).unwrap();
        assert_eq!(shown.width, 23);
        // centered on the newest position (15, 15), up to rounding
        let (cx, cy) = shown.center();
        assert!((cx - 15.0).abs() <= 1.0);
        assert!((cy - 15.0).abs() <= 1.0);
    }

    #[test]
    fn test_push_keeps_bounded_history_and_resets_misses() {
        let mut obj = TrackedObject::new(1, Rect::new(0, 0, 10, 10));
        obj.num_frames_not_detected = 2;
        for i in 1..10 {
            obj.push_position(Rect::new(i, 0, 10, 10), 4);
        }
        assert_eq!(obj.positions().len(), 4);
        assert_eq!(obj.last_position().x, 9);
        assert_eq!(obj.num_frames_not_detected, 0);
    }

    #[test]
    fn test_prediction_follows_velocity() {
        let mut obj = TrackedObject::new(1, Rect::new(0, 0, 10, 10));
        obj.push_position(Rect::new(10, 0, 10, 10), 4);
        // shift = 10 * 0.8 = 8
        assert_eq!(obj.predicted_region(0.8), Rect::new(18, 0, 10, 10));
    }

    #[test]
    fn test_prediction_without_history_is_last_position() {
        let obj = TrackedObject::new(1, Rect::new(5, 5, 10, 10));
        assert_eq!(obj.predicted_region(0.8), Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn test_unshown_object_expires_quickly() {
        let mut obj = TrackedObject::new(1, Rect::new(0, 0, 10, 10));
        obj.num_frames_not_detected = 3;
        assert!(!obj.is_expired(&params()));
        obj.num_frames_not_detected = 4;
        assert!(obj.is_expired(&params()));
    }

    #[test]
    fn test_shown_object_expires_after_lifetime() {
        let mut obj = shown_object(Rect::new(0, 0, 10, 10));
        obj.num_frames_not_detected = 5;
        assert!(!obj.is_expired(&params()));
        obj.num_frames_not_detected = 6;
        assert!(obj.is_expired(&params()));
    }
}
