//! The sequential sector loop: read, parse, route, append


use crate::output::{Destination, OutputFiles};
use crate::{ExtractConfig, ExtractError, ExtractResult, NonXaPolicy};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use xa_sector::{BYTES_PER_SECTOR, Sector, StreamType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    EndOfStream,
    /// The stop flag was raised between sectors
    Interrupted,
    /// The sector listing could not be written because its reader went away
    OutputClosed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub sectors: u64,
    pub bytes_written: u64,
    pub filler_skipped: u64,
    pub non_xa: u64,
    pub outputs: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    #[must_use]
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Process every sector in `input` in order, appending each payload to its destination file.
    ///
    /// If verbose, one line per sector is written to `listing` before its payload is written.
    /// `stop` is checked before each sector is read; once set, the run ends after the sector in
    /// flight with [`StopReason::Interrupted`].
    ///
    /// # Errors
    ///
    /// Returns an error on a read failure, a malformed or truncated sector, a non-XA sector under
    /// [`NonXaPolicy::Reject`], or any filesystem failure. All output written before the failing
    /// sector is kept.
    pub fn run<R: Read, W: Write>(
        &self,
        mut input: R,
        mut listing: W,
        stop: &AtomicBool,
    ) -> ExtractResult<ExtractSummary> {
        let mut outputs =
            OutputFiles::new(self.config.output_root.clone(), self.config.max_open_files);
        outputs.create_root()?;

        log::info!("Extracting sectors into '{}'", outputs.root().display());

        let mut summary = ExtractSummary::default();
        let mut block = [0; BYTES_PER_SECTOR];

        summary.stop_reason = loop {
            if stop.load(Ordering::Relaxed) {
                log::info!("Stopping extraction after {} sectors", summary.sectors);
                break StopReason::Interrupted;
            }

            let len = read_block(&mut input, &mut block).map_err(ExtractError::Read)?;
            if len == 0 {
                break StopReason::EndOfStream;
            }

            let index = summary.sectors;
            let sector = Sector::parse(&block[..len])
                .map_err(|source| ExtractError::Sector { index, source })?;

            if self.config.verbose {
                if let Err(err) = writeln!(listing, "{index:06} {sector}") {
                    if err.kind() == io::ErrorKind::BrokenPipe {
                        break StopReason::OutputClosed;
                    }
                    return Err(ExtractError::Verbose(err));
                }
            }

            if self.config.skip_filler && sector.is_filler() {
                log::debug!("Skipping filler sector {index} at {}", sector.time);
                summary.filler_skipped += 1;
            } else {
                let destination = self.destination(&sector, index, &mut summary)?;
                log::debug!(
                    "Sector {index} ({sector}) -> {}",
                    destination.relative_path().display()
                );

                let data = sector.data();
                outputs.append(destination, data)?;
                summary.bytes_written += data.len() as u64;
            }

            summary.sectors += 1;
        };

        outputs.close_all();
        summary.outputs = outputs.destination_count();

        if summary.stop_reason != StopReason::OutputClosed {
            match listing.flush() {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    summary.stop_reason = StopReason::OutputClosed;
                }
                Err(err) => return Err(ExtractError::Verbose(err)),
            }
        }

        log::info!(
            "Extracted {} sectors ({} bytes) into {} files",
            summary.sectors,
            summary.bytes_written,
            summary.outputs
        );
        if summary.filler_skipped != 0 {
            log::info!("Skipped {} filler sectors", summary.filler_skipped);
        }

        Ok(summary)
    }

    fn destination(
        &self,
        sector: &Sector<'_>,
        index: u64,
        summary: &mut ExtractSummary,
    ) -> ExtractResult<Destination> {
        if let Some(subheader) = sector.subheader() {
            return Ok(Destination {
                stream_type: sector.stream_type(),
                file: subheader.file,
                channel: subheader.channel,
            });
        }

        match self.config.non_xa_policy {
            NonXaPolicy::Fallback => {
                if summary.non_xa == 0 {
                    log::warn!(
                        "Sector {index} at {} is mode {} with no XA subheader; routing non-XA sectors to file 00 channel 00",
                        sector.time,
                        sector.mode_number()
                    );
                }
                summary.non_xa += 1;

                Ok(Destination { stream_type: StreamType::Untyped, file: 0, channel: 0 })
            }
            NonXaPolicy::Reject => {
                Err(ExtractError::NonXaSector { index, mode: sector.mode_number() })
            }
        }
    }
}

// Fill `buf` unless the input ends first; returns the number of bytes read
fn read_block<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(filled)
}
