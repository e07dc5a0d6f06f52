pub mod detector_aggregator;
pub mod exception_translator;
pub mod handle;
pub mod handle_table;
pub mod lifecycle_bridge;
pub mod tracker_session;
