use clap::Parser;
use env_logger::Env;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use xa_extract::{ExtractConfig, ExtractSummary, Extractor, NonXaPolicy, StopReason};

/// Extract the video, audio, and data streams from a raw CD-ROM XA track (2352-byte sectors).
///
/// Payloads are written to <DIRECTORY>/<type>/<file>/<channel>, where type is one of video, audio,
/// data, or untyped, and file and channel are 2-digit hex numbers.
#[derive(Parser)]
#[command(name = "xax", version)]
struct Args {
    /// Raw track file path; reads stdin if not set or set to '-'
    #[arg(short = 'i', long)]
    input_file: Option<PathBuf>,

    /// Directory to extract into
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,

    /// Print one line per sector to stdout
    #[arg(short = 'v', long, default_value_t)]
    verbose: bool,

    /// How to route mode 0 and Mode 1 sectors, which have no file or channel number
    #[arg(long = "non-xa", value_enum, default_value_t = NonXaPolicy::Fallback)]
    non_xa_policy: NonXaPolicy,

    /// Do not write filler sectors (mode 0, or Form 2 with no other submode flags)
    #[arg(long, default_value_t)]
    skip_filler: bool,

    /// Maximum number of output files to hold open at once; 0 reopens the file on every write
    #[arg(long, default_value_t = xa_extract::DEFAULT_MAX_OPEN_FILES)]
    max_open_files: usize,
}

impl Args {
    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            output_root: self.directory.clone(),
            verbose: self.verbose,
            non_xa_policy: self.non_xa_policy,
            skip_filler: self.skip_filler,
            max_open_files: self.max_open_files,
        }
    }

    fn open_input(&self) -> anyhow::Result<Box<dyn Read>> {
        match &self.input_file {
            Some(path) if path.as_os_str() != "-" => {
                let file = File::open(path).map_err(|err| {
                    anyhow::anyhow!("Unable to open input file '{}': {err}", path.display())
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            _ => Ok(Box::new(io::stdin().lock())),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let exit_code = report(run(&args), &mut io::stdout());
    process::exit(exit_code);
}

// Error messages already embed their underlying cause, so only the top level is printed
fn report<W: Write>(result: anyhow::Result<ExtractSummary>, out: &mut W) -> i32 {
    match result {
        Ok(summary) => {
            match summary.stop_reason {
                StopReason::EndOfStream => {}
                StopReason::Interrupted => log::info!("Interrupted"),
                StopReason::OutputClosed => log::debug!("Sector listing output closed"),
            }
            0
        }
        Err(err) => {
            // Nothing more can be done if stdout is gone
            let _ = writeln!(out, "{err}");
            1
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExtractSummary> {
    let stop = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&stop))?;

    let input = args.open_input()?;
    let extractor = Extractor::new(args.extract_config());

    log::debug!("Running with config {:?}", extractor.config());

    let summary = extractor.run(input, io::stdout().lock(), &stop)?;
    Ok(summary)
}

// First interrupt stops after the sector in flight; a second one exits immediately
fn install_interrupt_handler(stop: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        if stop.swap(true, Ordering::Relaxed) {
            process::exit(0);
        }
    })
    .map_err(|err| anyhow::anyhow!("Unable to install interrupt handler: {err}"))
}
