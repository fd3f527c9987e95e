//! Demultiplexing of a raw CD-ROM XA track into per-stream files
//!
//! Each sector's payload is appended to `<root>/<type>/<file>/<channel>`, where type is one of
//! `video`, `audio`, `data`, or `untyped`, and file and channel are 2-digit lowercase hex.

pub mod extractor;
pub mod output;

pub use extractor::{ExtractSummary, Extractor, StopReason};
pub use output::{Destination, OutputFiles};

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use thiserror::Error;
use xa_sector::XaSectorError;

pub const DEFAULT_MAX_OPEN_FILES: usize = 16;

/// How to route sectors that have no XA subheader (mode 0 and Mode 1), and which therefore have
/// no file or channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum NonXaPolicy {
    /// Write to `untyped/00/00`
    #[default]
    Fallback,
    /// Abort the extraction
    Reject,
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub output_root: PathBuf,
    pub verbose: bool,
    pub non_xa_policy: NonXaPolicy,
    pub skip_filler: bool,
    /// 0 opens and closes the destination file on every write
    pub max_open_files: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            verbose: false,
            non_xa_policy: NonXaPolicy::default(),
            skip_filler: false,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error decoding sector {index}: {source}")]
    Sector {
        index: u64,
        #[source]
        source: XaSectorError,
    },
    #[error("Sector {index} is a mode {mode} sector with no XA subheader")]
    NonXaSector { index: u64, mode: u8 },
    #[error("I/O error reading input: {0}")]
    Read(#[source] io::Error),
    #[error("Error creating directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error opening output file '{path}': {source}")]
    OpenOutput {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error writing to output file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error writing sector listing: {0}")]
    Verbose(#[source] io::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Extract every sector in `input` under `output_root` using the default policies, printing a
/// listing line per sector to stdout if `verbose` is set.
///
/// Returns the number of sectors processed.
///
/// # Errors
///
/// Returns an error on the first malformed sector or filesystem failure. Output written for
/// earlier sectors is left in place.
pub fn run<R: Read>(input: R, output_root: &Path, verbose: bool) -> ExtractResult<u64> {
    let config =
        ExtractConfig { output_root: output_root.to_path_buf(), verbose, ..ExtractConfig::default() };

    let stop = AtomicBool::new(false);
    let summary = Extractor::new(config).run(input, io::stdout().lock(), &stop)?;

    Ok(summary.sectors)
}
