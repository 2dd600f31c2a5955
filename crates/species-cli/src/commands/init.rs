use crate::cli::InitArgs;
use crate::config::defaults::{CONFIG_FILE_NAME, DefaultsConfig};
use crate::config::models::OutputFormat;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn render_config(database: &Path) -> Result<String> {
    let database = database.to_str().ok_or_else(|| {
        CliError::Argument(format!("Database path is not valid UTF-8: {:?}", database))
    })?;
    let defaults = DefaultsConfig::default();
    let format = match defaults.output_format {
        OutputFormat::Table => "table",
        OutputFormat::Csv => "csv",
    };

    Ok(format!(
        "# species configuration\n\
         \n\
         [database]\n\
         path = {}\n\
         \n\
         [output]\n\
         # \"table\" or \"csv\"\n\
         format = \"{}\"\n\
         precision = {}\n",
        toml::Value::String(database.to_string()),
        format,
        defaults.precision
    ))
}

/// Writes a default configuration pointing at `database` and creates the database.
pub fn write_config(config_path: &Path, database: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }
    fs::write(config_path, render_config(database)?)?;
    DataManager::open_database(database)?;
    Ok(())
}

pub fn run(args: InitArgs, config: Option<PathBuf>, database: PathBuf) -> Result<()> {
    let config_path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    write_config(&config_path, &database, args.force)?;
    info!("Wrote {:?} with database {:?}", config_path, database);
    println!("Configuration written to {}", config_path.display());
    println!("Database directory: {}", database.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::FileConfig;
    use tempfile::tempdir;

    #[test]
    fn written_config_parses_back() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let database = dir.path().join("db");

        write_config(&config_path, &database, false).unwrap();

        let config = FileConfig::from_file(&config_path).unwrap();
        assert_eq!(config.database.unwrap().path, Some(database.clone()));
        let output = config.output.unwrap();
        assert_eq!(output.format, Some(OutputFormat::Table));
        assert_eq!(output.precision, Some(6));
        assert!(database.is_dir());
    }

    #[test]
    fn existing_config_is_kept_without_force() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[output]\nprecision = 2\n").unwrap();

        let result = write_config(&config_path, &dir.path().join("db"), false);
        assert!(matches!(result, Err(CliError::Config(_))));
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "[output]\nprecision = 2\n"
        );

        write_config(&config_path, &dir.path().join("db"), true).unwrap();
        assert!(fs::read_to_string(&config_path).unwrap().contains("[database]"));
    }
}
