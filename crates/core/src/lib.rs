pub mod bridge;
pub mod detection;
pub mod shared;
pub mod tracking;
