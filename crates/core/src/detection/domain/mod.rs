pub mod classifier;
pub mod detection_params;
pub mod object_detector;
