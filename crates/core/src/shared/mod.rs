pub mod config;
pub mod constants;
pub mod frame;
pub mod panic;
pub mod rect;
pub mod size;
pub mod vision_error;
