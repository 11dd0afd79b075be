use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use decode::{convert_stream, ExtraDataDecoder, NalLengthSize, DEFAULT_OUTPUT_PATH};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Convert AVCC framed H.264 (MP4 `avcC` extra data or length-prefixed samples) to Annex B.
#[derive(Parser, Debug)]
#[command(name = "annexb", version)]
#[command(group(ArgGroup::new("mode").required(true).args(["extra", "stream"])))]
struct Args {
    /// AVCC configuration record; its SPS/PPS replace the contents of the output
    #[arg(long, value_name = "FILE")]
    extra: Option<PathBuf>,

    /// Length-prefixed AVCC stream; converted units are appended to the output
    #[arg(long, value_name = "FILE")]
    stream: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Width of the stream's NAL length prefix (lengthSizeMinusOne + 1); stream mode only
    #[arg(
        long,
        default_value_t = 4,
        value_parser = clap::value_parser!(u8).range(1..=4),
        requires = "stream"
    )]
    length_size: u8,

    /// Log every NAL unit
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Extra(PathBuf),
    Stream(PathBuf),
}

impl Args {
    fn mode(&self) -> Result<Mode> {
        match (&self.extra, &self.stream) {
            (Some(path), None) => Ok(Mode::Extra(path.clone())),
            (None, Some(path)) => Ok(Mode::Stream(path.clone())),
            _ => bail!("exactly one of --extra or --stream is required"),
        }
    }
}

/// Accepts the single-dash mode tokens (`-extra`, `-stream`) alongside the long flags.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-extra") => OsString::from("--extra"),
            Some("-stream") => OsString::from("--stream"),
            _ => arg,
        })
        .collect()
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse_from(normalize_args(std::env::args_os()));
    init_tracing(args.verbose);
    debug!(?args, "parsed arguments");

    match args.mode()? {
        Mode::Extra(input) => {
            let decoder = ExtraDataDecoder::from_file_path(&input)
                .with_context(|| format!("unable to load extra data {}", input.display()))?;
            let record = decoder
                .convert(&args.output)
                .with_context(|| {
                    format!("unable to convert extra data {}", decoder.path().display())
                })?;
            print!("{record}");
        }
        Mode::Stream(input) => {
            let length_size = NalLengthSize::new(args.length_size)?;
            let summary = convert_stream(&input, &args.output, length_size)
                .with_context(|| format!("unable to convert stream {}", input.display()))?;
            println!("{summary}");
        }
    }

    println!("Conversion complete: {}", args.output.display());
    Ok(())
}
