use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Aligned columns for reading in a terminal.
    #[default]
    Table,
    /// Comma-separated values with a header row.
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub precision: usize,
}

pub struct AppConfig {
    pub database_path: PathBuf,
    pub output: OutputConfig,
}
