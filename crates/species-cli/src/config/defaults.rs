use super::models::OutputFormat;

/// Configuration file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "species.toml";

pub struct DefaultsConfig {
    pub output_format: OutputFormat,
    pub precision: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Table,
            precision: 6,
        }
    }
}
