//! vmprint CLI
//!
//! A host harness for the vmprint forwarder. It plays the part of a VM:
//! registers the sinks described by `vmprint.toml` for one handle, renders a
//! printf-style template through the print or error path, and releases the
//! handle again.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vmprint::{Arg, Forwarder, VmHandle};

mod args;
mod config;
mod sinks;

/// Render a printf-style template through a VM print or error sink
#[derive(Parser, Debug)]
#[command(name = "vmprint-cli")]
#[command(about = "Format a message and forward it to a VM host sink", long_about = None)]
#[command(version)]
struct Args {
    /// printf-style format string, e.g. "code=%d msg=%s"
    #[arg(value_name = "FORMAT")]
    format: String,

    /// Arguments for the format string (prefix with i: u: f: s: p: to force a type)
    #[arg(value_name = "ARGS", allow_negative_numbers = true)]
    args: Vec<String>,

    /// VM handle to print for (decimal or 0x hex)
    #[arg(long, value_name = "HANDLE", default_value = "1", value_parser = args::parse_handle)]
    handle: usize,

    /// Use the error path instead of the print path
    #[arg(short, long)]
    error: bool,

    /// Path to configuration file (vmprint.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::debug!("vmprint CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using vmprint library v{}", vmprint::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let values = args::parse_args(&args.args).context("Invalid template argument")?;
    let handle = VmHandle::new(args.handle);

    let forwarder = Forwarder::new(config.forwarder.clone());
    sinks::install(&forwarder, handle, &config.sinks)?;

    let rendered: Vec<Arg<'_>> = values.iter().map(args::CliArg::as_arg).collect();
    let result = if args.error {
        forwarder.error(handle, &args.format, &rendered)
    } else {
        forwarder.print(handle, &args.format, &rendered)
    };

    forwarder.release(handle);
    result.with_context(|| format!("Failed to format {:?}", args.format))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
