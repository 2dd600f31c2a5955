use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::{Filtered, LevelFilter, Targets},
    fmt::{self, format},
    prelude::*,
    registry::LookupSpan,
};

type FileLayer<S> = Filtered<fmt::Layer<S, format::DefaultFields, format::Format, File>, Targets, S>;

/// Target prefix shared by the library and the binary.
const SPECIES_TARGET: &str = "species";

fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Species events follow the verbosity flags; other crates never go below WARN.
fn console_filter(verbosity: u8, quiet: bool) -> Targets {
    let level = console_level(verbosity, quiet);
    Targets::new()
        .with_target(SPECIES_TARGET, level)
        .with_default(level.min(LevelFilter::WARN))
}

/// The log file keeps at least the DEBUG trail of ingestion and queries, even with
/// `--quiet`.
fn file_filter(verbosity: u8) -> Targets {
    Targets::new()
        .with_target(
            SPECIES_TARGET,
            console_level(verbosity, false).max(LevelFilter::DEBUG),
        )
        .with_default(LevelFilter::WARN)
}

fn file_layer<S>(path: &Path, verbosity: u8) -> Result<FileLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let file = File::create(path).map_err(CliError::Io)?;
    Ok(fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(file_filter(verbosity)))
}

/// Installs the global subscriber: compact output on stderr, plus a plain-text
/// copy in `log_file` when one is given.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_filter(verbosity, quiet));

    let file_layer = log_file
        .map(|path| file_layer(path, verbosity))
        .transpose()?;

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}
