/// Opaque 64-bit token naming one live tracker.
///
/// Low 32 bits hold the slot index plus one, high 32 bits the slot's
/// generation. The all-zero value is never issued and means "no tracker".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub(crate) fn pack(index: usize, generation: u32) -> Self {
        let slot = (index as u64 + 1) & u64::from(u32::MAX);
        Handle((u64::from(generation) << 32) | slot)
    }

    pub(crate) fn unpack(self) -> Option<(usize, u32)> {
        let slot = self.0 & u64::from(u32::MAX);
        if slot == 0 {
            return None;
        }
        Some(((slot - 1) as usize, (self.0 >> 32) as u32))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(0, 7)]
    #[case(41, 1)]
    #[case(u32::MAX as usize - 1, u32::MAX)]
    fn test_pack_unpack(#[case] index: usize, #[case] generation: u32) {
        let handle = Handle::pack(index, generation);
        assert!(!handle.is_null());
        assert_eq!(handle.unpack(), Some((index, generation)));
    }

    #[test]
    fn test_null_does_not_unpack() {
        assert!(Handle::NULL.is_null());
        assert_eq!(Handle::NULL.unpack(), None);
        assert_eq!(Handle::from_raw(5 << 32).unpack(), None);
    }

    #[test]
    fn test_raw_round_trip() {
        let handle = Handle::pack(3, 2);
        assert_eq!(Handle::from_raw(handle.as_raw()), handle);
    }
}
