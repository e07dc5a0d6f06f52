pub mod object_tracker;
pub mod tracked_object;
pub mod tracker_parameters;
pub mod tracker_state;
