use crate::error::{CliError, Result};
use directories::ProjectDirs;
use species::engine::database::Database;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PATH_CONFIG_FILE: &str = "path.conf";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "species", "species")
        .ok_or_else(|| CliError::Data("Could not determine the user's home directory.".to_string()))
}

/// Locates the database directory, either the one stored with `db set-path` or
/// the OS-specific default.
#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    /// Opens the database at `path`, creating the directory when missing.
    pub fn open_database(path: &Path) -> Result<Database> {
        info!("Opening database at {:?}", path);
        Ok(Database::open(path)?)
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        write_path_config(&Self::get_path_config_file()?, path)
    }

    pub fn reset_path() -> Result<()> {
        let config_path = Self::get_path_config_file()?;
        if config_path.exists() {
            fs::remove_file(config_path)?;
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        match read_path_config(&Self::get_path_config_file()?)? {
            Some(path) => Ok(path),
            None => Self::get_default_data_path(),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(PATH_CONFIG_FILE))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("database"))
    }
}

fn read_path_config(config_path: &Path) -> Result<Option<PathBuf>> {
    if !config_path.exists() {
        return Ok(None);
    }
    let custom_path = fs::read_to_string(config_path)?;
    let custom_path = custom_path.trim();
    if custom_path.is_empty() {
        warn!("Custom path config file is empty, falling back to default path.");
        return Ok(None);
    }
    Ok(Some(PathBuf::from(custom_path)))
}

fn write_path_config(config_path: &Path, path: &Path) -> Result<()> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let text = absolute.to_str().ok_or_else(|| {
        CliError::Argument(format!("Database path is not valid UTF-8: {:?}", absolute))
    })?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, text)?;
    Ok(())
}
