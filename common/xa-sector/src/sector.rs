//! Code for parsing a raw sector into its header, XA subheader, and payload slices


use crate::cdtime::CdTime;
use crate::num::GetBit;
use crate::{XaSectorError, XaSectorResult};
use std::fmt::{Display, Formatter};

/// The XA submode byte, bit 0 first: EOR, video, audio, data, trigger, form 2, real-time, EOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Submode(u8);

impl Submode {
    /// Submode of a Form 2 sector with no other flags set, as written to padding sectors.
    pub const FORM2_ONLY: Self = Self(0x20);

    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn end_of_record(self) -> bool {
        self.0.bit(0)
    }

    #[must_use]
    pub fn video(self) -> bool {
        self.0.bit(1)
    }

    #[must_use]
    pub fn audio(self) -> bool {
        self.0.bit(2)
    }

    #[must_use]
    pub fn data(self) -> bool {
        self.0.bit(3)
    }

    #[must_use]
    pub fn trigger(self) -> bool {
        self.0.bit(4)
    }

    #[must_use]
    pub fn form2(self) -> bool {
        self.0.bit(5)
    }

    #[must_use]
    pub fn real_time(self) -> bool {
        self.0.bit(6)
    }

    #[must_use]
    pub fn end_of_file(self) -> bool {
        self.0.bit(7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subheader {
    pub file: u8,
    /// Always in 0..=31
    pub channel: u8,
    pub submode: Submode,
    pub coding_info: u8,
}

impl Subheader {
    #[must_use]
    pub fn from_bytes([file, channel, submode, coding_info]: [u8; 4]) -> Self {
        Self { file, channel: channel.bits(0..=4), submode: Submode(submode), coding_info }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XaForm {
    Form1,
    Form2,
}

impl XaForm {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Form1 => 1,
            Self::Form2 => 2,
        }
    }
}

/// Content type of a sector, as used to group extracted streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
    Data,
    Untyped,
}

impl StreamType {
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Data => "data",
            Self::Untyped => "untyped",
        }
    }
}

impl Display for StreamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorMode<'a> {
    /// Mode 0, no user data
    Empty,
    Mode1 {
        data: &'a [u8],
        checksum: &'a [u8],
        ecc: &'a [u8],
    },
    /// Mode 2 with a CD-ROM XA subheader
    Mode2 {
        subheader: Subheader,
        form: XaForm,
        data: &'a [u8],
        checksum: &'a [u8],
        /// Not present in Form 2 sectors
        ecc: Option<&'a [u8]>,
    },
}

/// A decoded view over one raw sector. Payload slices borrow from the input block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector<'a> {
    pub time: CdTime,
    pub mode: SectorMode<'a>,
}

impl<'a> Sector<'a> {
    /// Parse a raw 2352-byte sector.
    ///
    /// EDC and ECC bytes are located but never verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is not exactly 2352 bytes, does not start with the sync
    /// pattern, or has a mode byte other than 0, 1, or 2.
    pub fn parse(block: &'a [u8]) -> XaSectorResult<Self> {
        if block.len() != crate::BYTES_PER_SECTOR {
            return Err(XaSectorError::BadLength { len: block.len() });
        }

        if block[crate::SYNC_RANGE] != crate::SYNC_PATTERN {
            return Err(XaSectorError::BadSync);
        }

        let time_bytes: [u8; 3] = block[crate::TIME_RANGE].try_into().unwrap();
        let time = CdTime::from_bcd(time_bytes);

        let mode = match block[crate::MODE_OFFSET] {
            0 => SectorMode::Empty,
            1 => SectorMode::Mode1 {
                data: &block[crate::MODE1_DATA_RANGE],
                checksum: &block[crate::MODE1_CHECKSUM_RANGE],
                ecc: &block[crate::ECC_RANGE],
            },
            2 => parse_mode_2(block),
            mode => return Err(XaSectorError::UnknownMode(mode)),
        };

        let sector = Self { time, mode };
        log::trace!("Parsed sector: {sector}");

        Ok(sector)
    }

    /// The raw mode byte: 0, 1, or 2.
    #[must_use]
    pub fn mode_number(&self) -> u8 {
        match self.mode {
            SectorMode::Empty => 0,
            SectorMode::Mode1 { .. } => 1,
            SectorMode::Mode2 { .. } => 2,
        }
    }

    /// User data bytes: 0 bytes for mode 0, 2048 for Mode 1 and Form 1, 2324 for Form 2.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        match self.mode {
            SectorMode::Empty => &[],
            SectorMode::Mode1 { data, .. } | SectorMode::Mode2 { data, .. } => data,
        }
    }

    #[must_use]
    pub fn checksum(&self) -> Option<&'a [u8]> {
        match self.mode {
            SectorMode::Empty => None,
            SectorMode::Mode1 { checksum, .. } | SectorMode::Mode2 { checksum, .. } => {
                Some(checksum)
            }
        }
    }

    #[must_use]
    pub fn ecc(&self) -> Option<&'a [u8]> {
        match self.mode {
            SectorMode::Empty => None,
            SectorMode::Mode1 { ecc, .. } => Some(ecc),
            SectorMode::Mode2 { ecc, .. } => ecc,
        }
    }

    #[must_use]
    pub fn subheader(&self) -> Option<Subheader> {
        match self.mode {
            SectorMode::Mode2 { subheader, .. } => Some(subheader),
            SectorMode::Empty | SectorMode::Mode1 { .. } => None,
        }
    }

    #[must_use]
    pub fn form(&self) -> Option<XaForm> {
        match self.mode {
            SectorMode::Mode2 { form, .. } => Some(form),
            SectorMode::Empty | SectorMode::Mode1 { .. } => None,
        }
    }

    /// Whether this sector only pads the track: mode 0, or a Form 2 sector whose submode is
    /// exactly 0x20 (form 2 flag set and nothing else).
    #[must_use]
    pub fn is_filler(&self) -> bool {
        match self.mode {
            SectorMode::Empty => true,
            SectorMode::Mode2 { subheader, form: XaForm::Form2, .. } => {
                subheader.submode == Submode::FORM2_ONLY
            }
            SectorMode::Mode1 { .. } | SectorMode::Mode2 { .. } => false,
        }
    }

    /// Classify by submode type bits with priority video, then audio, then data. Sectors without
    /// an XA subheader are always untyped.
    #[must_use]
    pub fn stream_type(&self) -> StreamType {
        let Some(subheader) = self.subheader() else { return StreamType::Untyped };

        let submode = subheader.submode;
        if submode.video() {
            StreamType::Video
        } else if submode.audio() {
            StreamType::Audio
        } else if submode.data() {
            StreamType::Data
        } else {
            StreamType::Untyped
        }
    }
}

fn parse_mode_2(block: &[u8]) -> SectorMode<'_> {
    let subheader_bytes: [u8; 4] = block[crate::SUBHEADER_RANGE].try_into().unwrap();
    let subheader = Subheader::from_bytes(subheader_bytes);

    if subheader.submode.form2() {
        SectorMode::Mode2 {
            subheader,
            form: XaForm::Form2,
            data: &block[crate::FORM2_DATA_RANGE],
            checksum: &block[crate::FORM2_CHECKSUM_RANGE],
            ecc: None,
        }
    } else {
        SectorMode::Mode2 {
            subheader,
            form: XaForm::Form1,
            data: &block[crate::FORM1_DATA_RANGE],
            checksum: &block[crate::FORM1_CHECKSUM_RANGE],
            ecc: Some(&block[crate::ECC_RANGE]),
        }
    }
}

impl Display for Sector<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ", self.time)?;

        match self.mode {
            SectorMode::Empty => f.write_str("Empty")?,
            SectorMode::Mode1 { .. } => f.write_str("Mode1")?,
            SectorMode::Mode2 { subheader, form, .. } => {
                let submode = subheader.submode;
                let types: Vec<&str> = [
                    (submode.video(), "Video"),
                    (submode.audio(), "Audio"),
                    (submode.data(), "Data"),
                ]
                .into_iter()
                .filter_map(|(set, label)| set.then_some(label))
                .collect();
                let type_label = if types.is_empty() { String::from("None") } else { types.join("/") };

                write!(
                    f,
                    "Mode2/Form{} {type_label} F{:02x} C{:02x}",
                    form.number(),
                    subheader.file,
                    subheader.channel
                )?;
            }
        }

        write!(f, " [{}]", self.data().len())
    }
}
