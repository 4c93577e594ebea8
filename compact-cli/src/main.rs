//! Compact telegram decoder CLI application.
//!
//! Receives Compact telegrams over UDP (or reads captured telegrams from
//! disk), decodes them and prints a short summary per segment.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use compact_core::{decode_segment, output, CompactSegment};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::UdpSocket;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Largest payload a single UDP datagram can carry.
const MAX_DATAGRAM_LEN: usize = 65_535;

/// Decoder for Compact telegrams sent by multi-layer LiDAR sensors.
#[derive(Parser, Debug)]
#[command(name = "compact-decode")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Number of segments to print a summary line for
    #[arg(short, long, default_value_t = 5, global = true)]
    show: usize,

    /// Write every decoded echo to this CSV file
    #[arg(long, value_name = "PATH", global = true)]
    csv: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Receive telegrams from the sensor over UDP
    Listen {
        /// Local address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// UDP port the sensor streams to
        #[arg(short, long, default_value_t = 2115)]
        port: u16,

        /// Number of datagrams to receive before exiting
        #[arg(short, long, default_value_t = 20)]
        count: u64,
    },

    /// Decode captured telegrams, one telegram per file
    File {
        /// Input telegram files
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(quiet: bool, len: u64) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );
    Ok(pb)
}

/// Decodes one telegram, reporting failures instead of aborting the run.
fn decode_and_report(
    label: &str,
    buffer: &[u8],
    progress: &ProgressBar,
    segments: &mut Vec<CompactSegment>,
    failures: &mut usize,
) {
    match decode_segment(buffer) {
        Ok(segment) => {
            debug!(label, len = buffer.len(), modules = segment.modules.len(), "Decoded segment");
            segments.push(segment);
        }
        Err(err) => {
            warn!(label, len = buffer.len(), %err, "Failed to decode telegram");
            progress.println(format!("{label}: {err}"));
            *failures += 1;
        }
    }
    progress.inc(1);
}

/// One-line description of a segment's first module.
fn summarize(segment: &CompactSegment) -> String {
    let Some(module) = segment.modules.first() else {
        return format!("Telegram {}: no modules", segment.header.telegram_counter);
    };
    let meta = &module.meta_data;
    let start_angle = meta
        .theta_start
        .first()
        .map_or_else(|| "-".to_string(), |theta| format!("{theta:.4} rad"));
    let distance = module
        .beam(6, 0)
        .and_then(|beam| beam.echoes.first())
        .and_then(|echo| echo.distance)
        .map_or_else(|| "-".to_string(), |d| format!("{d} mm"));

    format!(
        "Frame number: {}, segment counter: {:03}, start angle: {}, distance: {}",
        meta.frame_number, meta.segment_counter, start_angle, distance
    )
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();
    let mut segments = Vec::new();
    let mut failures = 0usize;
    let received;

    match &args.command {
        Command::Listen { bind, port, count } => {
            let socket = UdpSocket::bind((bind.as_str(), *port))
                .with_context(|| format!("Failed to bind UDP socket on {bind}:{port}"))?;
            if !args.quiet {
                eprintln!("Waiting to receive {count} Compact segments on UDP port {port}.");
                eprintln!("Press Ctrl+C to cancel.");
            }

            let progress = progress_bar(args.quiet, *count)?;
            let mut buffer = vec![0u8; MAX_DATAGRAM_LEN];
            for i in 0..*count {
                let (len, sender) = socket
                    .recv_from(&mut buffer)
                    .context("Failed to receive datagram")?;
                debug!(%sender, len, "Received datagram");
                let label = format!("Segment {}", i + 1);
                decode_and_report(&label, &buffer[..len], &progress, &mut segments, &mut failures);
            }
            progress.finish_and_clear();
            received = *count;
        }
        Command::File { inputs } => {
            let progress = progress_bar(args.quiet, inputs.len() as u64)?;
            for input in inputs {
                let buffer = std::fs::read(input)
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let label = input.display().to_string();
                decode_and_report(&label, &buffer, &progress, &mut segments, &mut failures);
            }
            progress.finish_and_clear();
            received = inputs.len() as u64;
        }
    }

    for segment in segments.iter().take(args.show) {
        println!("{}", summarize(segment));
    }

    if let Some(csv_path) = &args.csv {
        output::write_csv(csv_path, &segments).context("Failed to write CSV output")?;
        if !args.quiet {
            eprintln!("Wrote {} segments to {:?}", segments.len(), csv_path);
        }
    }

    if !args.quiet {
        let total_duration = start_time.elapsed();
        let echoes: usize = segments.iter().map(CompactSegment::echo_count).sum();
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Telegrams:    {}", received);
        eprintln!("  Decoded:      {}", segments.len());
        eprintln!("  Failed:       {}", failures);
        eprintln!("  Echoes:       {}", echoes);
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}
