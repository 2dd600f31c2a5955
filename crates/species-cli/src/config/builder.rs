use super::defaults::{CONFIG_FILE_NAME, DefaultsConfig};
use super::file::FileConfig;
use super::models::{AppConfig, OutputConfig, OutputFormat};
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub precision: Option<usize>,
}

/// Merges command-line flags, the configuration file and built-in defaults, in
/// that order of precedence.
///
/// `default_database` is only called when neither the flags nor the file name a
/// database directory.
pub fn build_config(
    overrides: &CliOverrides,
    default_database: impl FnOnce() -> Result<PathBuf>,
) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let (file_config, file_dir) =
        load_file_config(overrides.config.as_deref(), Path::new(CONFIG_FILE_NAME))?;

    let database_file = file_config.database.unwrap_or_default();
    let database_path = match (&overrides.database, database_file.path) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) if path.is_relative() => file_dir.join(path),
        (None, Some(path)) => path,
        (None, None) => default_database()?,
    };

    let output_file = file_config.output.unwrap_or_default();
    let output = OutputConfig {
        format: overrides
            .format
            .or(output_file.format)
            .unwrap_or(defaults.output_format),
        precision: overrides
            .precision
            .or(output_file.precision)
            .unwrap_or(defaults.precision),
    };

    debug!(
        "Resolved database path {:?}, output {:?}",
        database_path, output
    );
    Ok(AppConfig {
        database_path,
        output,
    })
}

/// Reads `explicit`, which must exist, or else `fallback` when it exists.
///
/// Returns the configuration and the directory that relative paths in it are
/// resolved against.
fn load_file_config(explicit: Option<&Path>, fallback: &Path) -> Result<(FileConfig, PathBuf)> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(CliError::Config(format!(
                "Configuration file does not exist: {}",
                path.display()
            )));
        }
        Some(path) => path,
        None if fallback.is_file() => fallback,
        None => return Ok((FileConfig::default(), PathBuf::new())),
    };

    let config = FileConfig::from_file(path)?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok((config, dir))
}
