use std::fmt::{Display, Formatter};

/// Sector address from the 3-byte header following the sync pattern.
///
/// Values are decoded from packed BCD but not range-checked, so a corrupt header can produce
/// e.g. 165 minutes rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CdTime {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl CdTime {
    #[must_use]
    pub const fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self { minutes, seconds, frames }
    }

    #[must_use]
    pub fn from_bcd([minutes, seconds, frames]: [u8; 3]) -> Self {
        Self { minutes: bcd_to_u8(minutes), seconds: bcd_to_u8(seconds), frames: bcd_to_u8(frames) }
    }
}

impl Display for CdTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minutes, self.seconds, self.frames)
    }
}

/// Decode a packed BCD byte; high nibble is tens, low nibble is units.
///
/// Nibbles above 9 are passed through arithmetically, e.g. 0x1A decodes to 20.
#[must_use]
pub fn bcd_to_u8(byte: u8) -> u8 {
    (byte & 0x0F) + (byte >> 4) * 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_decode() {
        assert_eq!(bcd_to_u8(0x27), 27);
        assert_eq!(bcd_to_u8(0x00), 0);
        assert_eq!(bcd_to_u8(0x99), 99);
        assert_eq!(bcd_to_u8(0x59), 59);
    }

    #[test]
    fn bcd_decode_invalid_digits() {
        // Not validated, decoded as tens * 10 + units
        assert_eq!(bcd_to_u8(0x1A), 20);
        assert_eq!(bcd_to_u8(0xA0), 100);
        assert_eq!(bcd_to_u8(0xFF), 165);
    }

    #[test]
    fn from_bcd_header() {
        assert_eq!(CdTime::from_bcd([0x01, 0x59, 0x74]), CdTime::new(1, 59, 74));
        assert_eq!(CdTime::from_bcd([0x00, 0x02, 0x00]), CdTime::new(0, 2, 0));
    }

    #[test]
    fn display() {
        assert_eq!(CdTime::new(0, 2, 16).to_string(), "00:02:16");
        assert_eq!(CdTime::new(71, 9, 74).to_string(), "71:09:74");
        assert_eq!(CdTime::new(0, 0, 0).to_string(), "00:00:00");
    }
}
