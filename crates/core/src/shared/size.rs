use serde::{Deserialize, Serialize};

/// Width × height pair used for detector size limits.
///
/// `0x0` is the unbounded sentinel: as a minimum it falls back to the
/// classifier's native window, as a maximum to the frame size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSize {
    pub width: i32,
    pub height: i32,
}

impl ObjectSize {
    pub const UNBOUNDED: ObjectSize = ObjectSize {
        width: 0,
        height: 0,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: i32) -> Self {
        Self::new(side, side)
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_unbounded(&self) -> bool {
        !self.is_positive()
    }
}

/// Absolute face size for a frame of the given height, as a fraction of it.
///
/// Returns 0 ("unset") when the rounded size is not positive.
pub fn relative_face_size(frame_height: u32, fraction: f32) -> i32 {
    let size = (frame_height as f32 * fraction).round() as i32;
    size.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ObjectSize::new(10, 10), true)]
    #[case(ObjectSize::new(0, 10), false)]
    #[case(ObjectSize::new(10, -1), false)]
    #[case(ObjectSize::UNBOUNDED, false)]
    fn test_is_positive(#[case] size: ObjectSize, #[case] expected: bool) {
        assert_eq!(size.is_positive(), expected);
        assert_eq!(size.is_unbounded(), !expected);
    }

    #[test]
    fn test_square() {
        assert_eq!(ObjectSize::square(7), ObjectSize::new(7, 7));
    }

    #[rstest]
    #[case(480, 0.2, 96)]
    #[case(720, 0.2, 144)]
    #[case(2, 0.2, 0)]
    #[case(480, 0.0, 0)]
    fn test_relative_face_size(#[case] height: u32, #[case] fraction: f32, #[case] expected: i32) {
        assert_eq!(relative_face_size(height, fraction), expected);
    }
}
