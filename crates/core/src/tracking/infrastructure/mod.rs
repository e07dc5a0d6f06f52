pub mod detection_based_tracker;
pub mod detection_worker;
