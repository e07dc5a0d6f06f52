pub mod classifier_detector_adapter;
pub mod rect_grouping;
pub mod template_classifier;
