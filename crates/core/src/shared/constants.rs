/// Image pyramid step between detection scales.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;

/// Raw hits a cluster needs beyond this count to survive grouping.
pub const DEFAULT_MIN_NEIGHBORS: u32 = 2;

/// Minimum normalized cross-correlation for a window to count as a hit.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.8;

/// Relative tolerance used when clustering raw hits.
pub const GROUP_EPS: f64 = 0.2;

/// Fraction of the frame height the CLI uses as minimum face size.
pub const DEFAULT_RELATIVE_FACE_SIZE: f32 = 0.2;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "pgm"];
