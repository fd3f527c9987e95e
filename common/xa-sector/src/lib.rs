//! Decoding of raw 2352-byte CD-ROM sectors, including the CD-ROM XA Mode 2 subheader

pub mod cdtime;
mod num;
pub mod sector;

pub use cdtime::CdTime;
pub use sector::{Sector, SectorMode, StreamType, Subheader, Submode, XaForm};

use std::ops::Range;
use thiserror::Error;

// 12 sync bytes + 4 header bytes + 2336 bytes whose layout depends on the mode
pub const BYTES_PER_SECTOR: usize = 2352;

pub const SYNC_PATTERN: [u8; 12] =
    [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

pub const SYNC_RANGE: Range<usize> = 0..12;
pub const TIME_RANGE: Range<usize> = 12..15;
pub const MODE_OFFSET: usize = 15;

// Mode 1: 2048 data bytes, 4 EDC bytes, 8 zero bytes, 276 ECC bytes
pub const MODE1_DATA_RANGE: Range<usize> = 16..2064;
pub const MODE1_CHECKSUM_RANGE: Range<usize> = 2064..2068;

// Mode 2 (XA): 4-byte subheader, repeated once, then form-dependent data
pub const SUBHEADER_RANGE: Range<usize> = 16..20;
pub const FORM1_DATA_RANGE: Range<usize> = 24..2072;
pub const FORM1_CHECKSUM_RANGE: Range<usize> = 2072..2076;
pub const FORM2_DATA_RANGE: Range<usize> = 24..2348;
pub const FORM2_CHECKSUM_RANGE: Range<usize> = 2348..2352;

// Shared by Mode 1 and Mode 2 Form 1
pub const ECC_RANGE: Range<usize> = 2076..2352;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XaSectorError {
    #[error("Sector length is {len}, expected {}", BYTES_PER_SECTOR)]
    BadLength { len: usize },
    #[error("Sector does not begin with the sync pattern")]
    BadSync,
    #[error("Unrecognized sector mode {0}")]
    UnknownMode(u8),
}

pub type XaSectorResult<T> = Result<T, XaSectorError>;
