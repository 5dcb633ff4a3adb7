use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs::File, path::PathBuf};

use jpeg_splice::{scan_segments, splice_files, MetadataSet, SpliceOptions};

#[derive(Parser, Debug)]
#[command(
    name = "jpeg-splice",
    version,
    about = "Copy Exif and other metadata segments from one JPEG into another"
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Splice metadata segments from a donor JPEG into a target JPEG
    Splice {
        /// JPEG to take metadata segments from
        #[arg(long = "from", value_name = "DONOR")]
        donor: PathBuf,

        /// JPEG to take image segments from (overwritten unless --output is given)
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Write the result here instead of overwriting the target
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Additional marker to treat as metadata, in hex (e.g. E2 for ICC profiles)
        #[arg(long = "keep-marker", value_name = "HEX", value_parser = parse_marker)]
        keep_markers: Vec<u8>,

        /// Do not carry the target's modification time over to the result
        #[arg(long)]
        no_preserve_mtime: bool,
    },

    /// List the marker segments of JPEG files
    Inspect {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_marker(s: &str) -> std::result::Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid marker '{}': {}", s, e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Splice {
            donor,
            target,
            output,
            keep_markers,
            no_preserve_mtime,
        } => {
            let metadata = keep_markers
                .iter()
                .fold(MetadataSet::default(), |set, &marker| set.with(marker));
            let options = SpliceOptions::new()
                .metadata(metadata)
                .preserve_modified_time(!no_preserve_mtime);
            let destination = output.unwrap_or_else(|| target.clone());

            let report = splice_files(&donor, &target, &destination, &options).with_context(|| {
                format!(
                    "splicing metadata from {} into {}",
                    donor.display(),
                    target.display()
                )
            })?;

            log::info!(
                "{}: {} metadata segments from {}, {} image segments, {} bytes",
                destination.display(),
                report.donor.kept,
                donor.display(),
                report.target.kept,
                report.bytes_written
            );
        }

        Command::Inspect { files } => {
            for path in files {
                let file =
                    File::open(&path).with_context(|| format!("opening {}", path.display()))?;
                let segments = scan_segments(file)
                    .with_context(|| format!("reading {}", path.display()))?;

                println!("{}:", path.display());
                for segment in &segments {
                    let length = segment
                        .length
                        .map_or_else(|| "-".to_string(), |len| len.to_string());
                    print!(
                        "  {:>10}  FF{:02X}  {:<6} length {:>6}",
                        segment.offset,
                        segment.marker,
                        segment.label(),
                        length
                    );
                    if segment.entropy_len > 0 {
                        print!("  + {} bytes scan data", segment.entropy_len);
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}
