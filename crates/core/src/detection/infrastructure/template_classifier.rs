//! Grayscale template classifier.
//!
//! The "model" is a small grayscale image of the object. Detection slides a
//! window over the frame at every pyramid scale, samples it down to the
//! template's resolution and scores it with normalized cross-correlation.
//! Windows scoring above the match threshold are grouped like cascade hits.

use std::path::Path;

use ndarray::Array2;

use crate::detection::domain::classifier::{Classifier, ClassifierLoader};
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::infrastructure::rect_grouping::group_rectangles;
use crate::shared::constants::{DEFAULT_MATCH_THRESHOLD, GROUP_EPS};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;
use crate::shared::vision_error::VisionError;

/// Windows with less intensity variance than this are flat and never match.
const MIN_WINDOW_VARIANCE: f32 = 1e-3;

pub struct TemplateClassifier {
    /// Zero-mean template intensities.
    template: Array2<f32>,
    template_norm: f32,
    match_threshold: f32,
}

impl TemplateClassifier {
    /// Returns `None` when the template is empty or has no contrast.
    pub fn from_luma(luma: Array2<f32>, match_threshold: f32) -> Option<Self> {
        if luma.is_empty() {
            return None;
        }
        let mean = luma.mean()?;
        let template = luma.mapv(|v| v - mean);
        let template_norm = template.mapv(|v| v * v).sum().sqrt();
        if template_norm <= f32::EPSILON {
            return None;
        }
        Some(Self {
            template,
            template_norm,
            match_threshold,
        })
    }

    pub fn load(path: &Path, match_threshold: f32) -> Result<Self, VisionError> {
        let image = image::open(path).map_err(|source| VisionError::ClassifierLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let luma = Frame::from_image(&image, 0).luma();
        Self::from_luma(luma, match_threshold)
            .ok_or_else(|| VisionError::EmptyTemplate(path.to_path_buf()))
    }

    fn scan_scale(&self, luma: &Array2<f32>, scale: f64, window: ObjectSize, hits: &mut Vec<Rect>) {
        let (th, tw) = self.template.dim();
        let (fh, fw) = luma.dim();
        let rows: Vec<usize> = (0..th)
            .map(|t| ((t as f64 + 0.5) * scale) as usize)
            .collect();
        let cols: Vec<usize> = (0..tw)
            .map(|t| ((t as f64 + 0.5) * scale) as usize)
            .collect();
        let step = (scale.round() as usize).max(1);
        let n = (th * tw) as f32;

        for y in (0..=fh - window.height as usize).step_by(step) {
            for x in (0..=fw - window.width as usize).step_by(step) {
                let mut sum = 0.0f32;
                let mut sum_sq = 0.0f32;
                let mut cross = 0.0f32;
                for (ty, &dy) in rows.iter().enumerate() {
                    for (tx, &dx) in cols.iter().enumerate() {
                        let v = luma[[y + dy, x + dx]];
                        sum += v;
                        sum_sq += v * v;
                        cross += v * self.template[[ty, tx]];
                    }
                }
                let variance = sum_sq - sum * sum / n;
                if variance <= MIN_WINDOW_VARIANCE * n {
                    continue;
                }
                let score = cross / (variance.sqrt() * self.template_norm);
                if score >= self.match_threshold {
                    hits.push(Rect::new(x as i32, y as i32, window.width, window.height));
                }
            }
        }
    }
}

impl Classifier for TemplateClassifier {
    fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    fn native_size(&self) -> ObjectSize {
        let (h, w) = self.template.dim();
        ObjectSize::new(w as i32, h as i32)
    }

    fn detect_multi_scale(
        &self,
        frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Rect>, VisionError> {
        if self.is_empty() {
            return Err(VisionError::EmptyClassifier);
        }
        params.validate()?;
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let native = self.native_size();
        let min = if params.min_object_size.is_positive() {
            params.min_object_size
        } else {
            native
        };
        let max = if params.max_object_size.is_positive() {
            params.max_object_size
        } else {
            ObjectSize::new(frame.width() as i32, frame.height() as i32)
        };

        let luma = frame.luma();
        let mut hits = Vec::new();
        let mut scale = 1.0f64;
        loop {
            let window = ObjectSize::new(
                (native.width as f64 * scale).round() as i32,
                (native.height as f64 * scale).round() as i32,
            );
            if window.width > frame.width() as i32
                || window.height > frame.height() as i32
                || window.width > max.width
                || window.height > max.height
            {
                break;
            }
            if window.width >= min.width && window.height >= min.height {
                self.scan_scale(&luma, scale, window, &mut hits);
            }
            scale *= params.scale_factor;
        }

        log::trace!("template classifier: {} raw hits", hits.len());
        Ok(group_rectangles(&hits, params.min_neighbors, GROUP_EPS))
    }
}

/// Loads [`TemplateClassifier`]s from grayscale (or color) image files.
pub struct TemplateClassifierLoader {
    match_threshold: f32,
}

impl TemplateClassifierLoader {
    pub fn new(match_threshold: f32) -> Self {
        Self { match_threshold }
    }
}

impl Default for TemplateClassifierLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl ClassifierLoader for TemplateClassifierLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, VisionError> {
        let classifier = TemplateClassifier::load(path, self.match_threshold)?;
        log::debug!(
            "Loaded template classifier {} ({}x{})",
            path.display(),
            classifier.native_size().width,
            classifier.native_size().height
        );
        Ok(Box::new(classifier))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn loaded() -> (tempfile::TempDir, TemplateClassifier) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        let classifier = TemplateClassifier::load(&path, DEFAULT_MATCH_THRESHOLD).unwrap();
        (dir, classifier)
    }

    #[test]
    fn test_native_size_is_template_size() {
        let (_dir, classifier) = loaded();
        assert_eq!(classifier.native_size(), ObjectSize::square(TEMPLATE_SIZE as i32));
    }

    #[test]
    fn test_finds_object_at_native_scale() {
        let (_dir, classifier) = loaded();
        let frame = frame_with_object(80, 80, 30, 20, TEMPLATE_SIZE);
        let found = classifier
            .detect_multi_scale(&frame, &DetectionParams::default())
            .unwrap();

        let truth = Rect::new(30, 20, 24, 24);
        assert_eq!(found.len(), 1);
        assert!(found[0].iou(&truth) > 0.5, "got {:?}", found[0]);
    }

    #[test]
    fn test_finds_enlarged_object() {
        let (_dir, classifier) = loaded();
        let frame = frame_with_object(120, 120, 20, 30, 48);
        let params = DetectionParams {
            min_neighbors: 0,
            ..DetectionParams::default()
        };
        let found = classifier.detect_multi_scale(&frame, &params).unwrap();

        let truth = Rect::new(20, 30, 48, 48);
        assert!(found.iter().any(|r| r.iou(&truth) > 0.5));
    }

    #[test]
    fn test_blank_frame_has_no_detections() {
        let (_dir, classifier) = loaded();
        let found = classifier
            .detect_multi_scale(&blank_frame(64, 64), &DetectionParams::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_min_size_above_object_suppresses_it() {
        let (_dir, classifier) = loaded();
        let frame = frame_with_object(80, 80, 30, 20, TEMPLATE_SIZE);
        let params = DetectionParams {
            min_object_size: ObjectSize::square(40),
            ..DetectionParams::default()
        };
        assert!(classifier.detect_multi_scale(&frame, &params).unwrap().is_empty());
    }

    #[test]
    fn test_max_size_below_native_scans_nothing() {
        let (_dir, classifier) = loaded();
        let frame = frame_with_object(80, 80, 30, 20, TEMPLATE_SIZE);
        let params = DetectionParams {
            max_object_size: ObjectSize::square(10),
            ..DetectionParams::default()
        };
        assert!(classifier.detect_multi_scale(&frame, &params).unwrap().is_empty());
    }

    #[test]
    fn test_frame_smaller_than_template() {
        let (_dir, classifier) = loaded();
        let found = classifier
            .detect_multi_scale(&blank_frame(10, 10), &DetectionParams::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_scale_factor_is_rejected() {
        let (_dir, classifier) = loaded();
        let params = DetectionParams {
            scale_factor: 1.0,
            ..DetectionParams::default()
        };
        let result = classifier.detect_multi_scale(&blank_frame(64, 64), &params);
        assert!(matches!(result, Err(VisionError::InvalidParameter(_))));
    }

    #[test]
    fn test_flat_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        image::GrayImage::from_pixel(16, 16, image::Luma([90])).save(&path).unwrap();

        let result = TemplateClassifier::load(&path, DEFAULT_MATCH_THRESHOLD);
        assert!(matches!(result, Err(VisionError::EmptyTemplate(_))));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let loader = TemplateClassifierLoader::default();
        let result = loader.load(Path::new("/nonexistent/classifier.png"));
        assert!(matches!(result, Err(VisionError::ClassifierLoad { .. })));
    }

    #[test]
    fn test_loader_produces_usable_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path());
        let classifier = TemplateClassifierLoader::default().load(&path).unwrap();
        assert!(!classifier.is_empty());
    }
}
