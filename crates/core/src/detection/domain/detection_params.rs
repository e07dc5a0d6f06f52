use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR};
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;

/// Tunable geometry and sensitivity of one multi-scale detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub min_object_size: ObjectSize,
    pub max_object_size: ObjectSize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_object_size: ObjectSize::UNBOUNDED,
            max_object_size: ObjectSize::UNBOUNDED,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.scale_factor.is_nan() || self.scale_factor <= 1.0 {
            return Err(VisionError::InvalidParameter(format!(
                "scale_factor must be > 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.max_object_size.is_positive()
            && self.min_object_size.is_positive()
            && (self.max_object_size.width < self.min_object_size.width
                || self.max_object_size.height < self.min_object_size.height)
        {
            return Err(VisionError::InvalidParameter(format!(
                "max_object_size {}x{} is smaller than min_object_size {}x{}",
                self.max_object_size.width,
                self.max_object_size.height,
                self.min_object_size.width,
                self.min_object_size.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DetectionParams::default().validate().is_ok());
    }

    #[rstest]
    #[case::one(1.0)]
    #[case::below_one(0.5)]
    #[case::nan(f64::NAN)]
    fn test_scale_factor_must_exceed_one(#[case] scale_factor: f64) {
        let params = DetectionParams {
            scale_factor,
            ..DetectionParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(VisionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_max_smaller_than_min_is_rejected() {
        let params = DetectionParams {
            min_object_size: ObjectSize::square(50),
            max_object_size: ObjectSize::square(40),
            ..DetectionParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let params: DetectionParams = serde_json::from_str(r#"{"min_neighbors": 5}"#).unwrap();
        assert_eq!(params.min_neighbors, 5);
        assert_eq!(params.scale_factor, DEFAULT_SCALE_FACTOR);
        assert_eq!(params.min_object_size, ObjectSize::UNBOUNDED);
    }
}
