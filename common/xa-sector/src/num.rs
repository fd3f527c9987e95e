use std::ops::RangeInclusive;

pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;
}

impl GetBit for u8 {
    #[inline]
    fn bit(self, i: u8) -> bool {
        debug_assert!(i < 8);
        self & (1 << i) != 0
    }

    #[inline]
    fn bits(self, range: RangeInclusive<u8>) -> Self {
        let start = *range.start();
        let end = *range.end();
        debug_assert!(end < 8);

        // Widen so that a full 0..=7 range does not overflow the mask shift
        ((u16::from(self) >> start) & ((1 << (end - start + 1)) - 1)) as u8
    }
}
