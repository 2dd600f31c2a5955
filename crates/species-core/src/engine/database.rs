use super::catalog::{GridStore, PhotometricFilterCatalog};
use super::config::ModelOptions;
use super::error::{DatasetKind, ReadError};
use super::progress::{Progress, ProgressReporter};
use crate::core::interpolate::log_wavelengths;
use crate::core::io::ascii::{AsciiError, SpectrumFile, TransmissionCurve, TransmissionFile};
use crate::core::io::baraffe::{BaraffeError, BaraffeFile};
use crate::core::io::tables::{IsochroneCsv, IsochroneTable, ModelGridCsv, TableError};
use crate::core::io::traits::{DataFile, WritableDataFile};
use crate::core::models::filter::{DetectorType, FilterError, FilterProfile};
use crate::core::models::isochrone::{GridError, IsochroneGrid, IsochroneModel};
use crate::core::models::spectrum::{ModelGrid, ModelGridError, Spectrum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Name of the dataset index inside a database directory.
pub const INDEX_FILE: &str = "index.toml";

/// Calibration tag of the spectrum that defines the Vega magnitude system.
pub const VEGA_TAG: &str = "vega";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("File I/O error for '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to read isochrone file '{}': {source}", .path.display())]
    Isochrones { path: PathBuf, source: BaraffeError },
    #[error("Failed to access table '{}': {source}", .path.display())]
    Table { path: PathBuf, source: TableError },
    #[error("Failed to access column file '{}': {source}", .path.display())]
    Columns { path: PathBuf, source: AsciiError },
    #[error("Invalid filter profile '{id}': {source}")]
    Filter { id: String, source: FilterError },
    #[error("Invalid model grid '{name}': {source}")]
    Model {
        name: String,
        source: ModelGridError,
    },
    #[error("Invalid isochrone grid '{tag}': {source}")]
    Grid { tag: String, source: GridError },
    #[error("TOML parsing error for '{}': {source}", .path.display())]
    IndexParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize the database index: {0}")]
    IndexSerialize(#[from] toml::ser::Error),
    #[error(
        "Invalid dataset tag '{0}': tags must be non-empty and may not contain '\\', '..' or '__'"
    )]
    InvalidTag(String),
}

fn io_error(path: &Path, source: io::Error) -> DatabaseError {
    DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn validate_tag(tag: &str) -> Result<(), DatabaseError> {
    let valid = !tag.trim().is_empty()
        && !tag.starts_with('/')
        && !tag.contains('\\')
        && !tag.contains("..")
        && !tag.contains("__");
    if valid {
        Ok(())
    } else {
        Err(DatabaseError::InvalidTag(tag.to_string()))
    }
}

/// File stem of a dataset; filter identifiers such as `MKO/NSFCam.J` contain `/`.
fn file_stem(tag: &str) -> String {
    tag.replace('/', "__")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct IsochroneEntry {
    model: IsochroneModel,
    file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ModelEntry {
    file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FilterEntry {
    file: String,
    #[serde(default)]
    detector: DetectorType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CalibrationEntry {
    file: String,
}

/// Contents of `index.toml`; file names are relative to the database root.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Index {
    isochrones: BTreeMap<String, IsochroneEntry>,
    models: BTreeMap<String, ModelEntry>,
    filters: BTreeMap<String, FilterEntry>,
    calibration: BTreeMap<String, CalibrationEntry>,
}

/// Named isochrone grids, model spectrum grids, filter profiles and calibration
/// spectra.
///
/// A database created with [`Database::in_memory`] lives only as long as the value.
/// One created with [`Database::open`] writes every addition through to its
/// directory:
///
/// ```text
/// <root>/index.toml
/// <root>/isochrones/<tag>.csv
/// <root>/models/<tag>.csv
/// <root>/filters/<id>.dat
/// <root>/calibration/<tag>.dat
/// ```
///
/// Adding a dataset under an existing tag replaces it.
#[derive(Debug, Default)]
pub struct Database {
    root: Option<PathBuf>,
    index: Index,
    isochrones: BTreeMap<String, IsochroneGrid>,
    models: BTreeMap<String, ModelGrid>,
    filters: BTreeMap<String, FilterProfile>,
    calibration: BTreeMap<String, Spectrum>,
}

impl Database {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the database stored in `root`, creating the directory if needed, and
    /// loads every indexed dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the index is invalid or
    /// an indexed dataset cannot be read.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn open(root: &Path) -> Result<Self, DatabaseError> {
        fs::create_dir_all(root).map_err(|source| io_error(root, source))?;

        let index_path = root.join(INDEX_FILE);
        let index: Index = if index_path.is_file() {
            let content =
                fs::read_to_string(&index_path).map_err(|source| io_error(&index_path, source))?;
            toml::from_str(&content).map_err(|source| DatabaseError::IndexParse {
                path: index_path.clone(),
                source,
            })?
        } else {
            debug!("No index file found; starting with an empty database.");
            Index::default()
        };

        let mut db = Self {
            root: Some(root.to_path_buf()),
            ..Self::default()
        };

        for (tag, entry) in &index.isochrones {
            let path = root.join(&entry.file);
            let table = IsochroneCsv::read_from_path(&path)
                .map_err(|source| DatabaseError::Table { path, source })?;
            let grid = table
                .into_grid(entry.model)
                .map_err(|source| DatabaseError::Grid {
                    tag: tag.clone(),
                    source,
                })?;
            db.isochrones.insert(tag.clone(), grid);
        }

        for (name, entry) in &index.models {
            let path = root.join(&entry.file);
            let grid = ModelGridCsv::read_from_path(&path)
                .map_err(|source| DatabaseError::Table { path, source })?;
            db.models.insert(name.clone(), grid);
        }

        for (id, entry) in &index.filters {
            let path = root.join(&entry.file);
            let curve = TransmissionFile::read_from_path(&path)
                .map_err(|source| DatabaseError::Columns { path, source })?;
            let profile = FilterProfile::new(curve.wavelength, curve.transmission, entry.detector)
                .map_err(|source| DatabaseError::Filter {
                    id: id.clone(),
                    source,
                })?;
            db.filters.insert(id.clone(), profile);
        }

        for (tag, entry) in &index.calibration {
            let path = root.join(&entry.file);
            let spectrum = SpectrumFile::read_from_path(&path)
                .map_err(|source| DatabaseError::Columns { path, source })?;
            db.calibration.insert(tag.clone(), spectrum);
        }

        db.index = index;
        info!(
            "Opened database with {} isochrone grid(s), {} model grid(s), {} filter(s) and {} calibration spectra.",
            db.isochrones.len(),
            db.models.len(),
            db.filters.len(),
            db.calibration.len()
        );
        Ok(db)
    }

    /// Directory of a persistent database.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Parses an isochrone file in the Baraffe/AMES layout and stores it under `tag`.
    #[instrument(skip_all, fields(tag = %tag, path = %path.display()))]
    pub fn add_isochrones(
        &mut self,
        path: &Path,
        tag: &str,
    ) -> Result<&IsochroneGrid, DatabaseError> {
        validate_tag(tag)?;
        info!("Reading isochrone data.");
        let grid = BaraffeFile::read_from_path(path).map_err(|source| DatabaseError::Isochrones {
            path: path.to_path_buf(),
            source,
        })?;
        self.insert_isochrones(tag, grid)
    }

    #[instrument(skip(self, grid))]
    pub fn insert_isochrones(
        &mut self,
        tag: &str,
        grid: IsochroneGrid,
    ) -> Result<&IsochroneGrid, DatabaseError> {
        validate_tag(tag)?;
        if self.isochrones.contains_key(tag) {
            warn!("Replacing the existing isochrone grid '{}'.", tag);
        }

        if let Some((file, path)) = self.dataset_file("isochrones", tag, "csv")? {
            IsochroneCsv::write_to_path(&IsochroneTable::from_grid(&grid), &path)
                .map_err(|source| DatabaseError::Table { path, source })?;
            let entry = IsochroneEntry {
                model: grid.model(),
                file,
            };
            self.index.isochrones.insert(tag.to_string(), entry);
            self.save_index()?;
        }

        let (min_age, max_age) = grid.age_range();
        info!(
            "Stored isochrone grid '{}': {} points, {} ages ({}-{} Myr), filters [{}].",
            tag,
            grid.len(),
            grid.ages().len(),
            min_age,
            max_age,
            grid.filters().join(", ")
        );
        self.isochrones.insert(tag.to_string(), grid);
        Ok(&self.isochrones[tag])
    }

    /// Reads a model spectrum grid from a long-form CSV file, restricts it according
    /// to `options` and stores it under `name`.
    #[instrument(skip_all, fields(name = %name, source = %source.display()))]
    pub fn add_model(
        &mut self,
        name: &str,
        source: &Path,
        options: &ModelOptions,
        reporter: &ProgressReporter,
    ) -> Result<&ModelGrid, DatabaseError> {
        validate_tag(name)?;
        let raw = reporter
            .phase("Reading model grid", || ModelGridCsv::read_from_path(source))
            .map_err(|err| DatabaseError::Table {
                path: source.to_path_buf(),
                source: err,
            })?;
        info!(
            "Read {} spectra with {} wavelengths each.",
            raw.node_count(),
            raw.wavelength().len()
        );

        let model_error = |source| DatabaseError::Model {
            name: name.to_string(),
            source,
        };
        let mut grid = raw
            .select(options.teff_range, options.logg_range, options.wavel_range)
            .map_err(model_error)?;

        if let Some(resolution) = options.spec_res {
            let range = options.wavel_range.unwrap_or_else(|| {
                let wavelength = grid.wavelength();
                (wavelength[0], wavelength[wavelength.len() - 1])
            });
            let wavelengths = log_wavelengths(range, resolution);
            debug!(
                "Resampling onto {} wavelengths at R = {}.",
                wavelengths.len(),
                resolution
            );

            reporter.report(Progress::PhaseStart {
                name: "Resampling spectra",
            });
            reporter.report(Progress::TaskStart {
                total_steps: grid.node_count() as u64,
            });
            let resampled = grid.resampled(&wavelengths, || reporter.report(Progress::TaskIncrement));
            reporter.report(Progress::TaskFinish);
            reporter.report(Progress::PhaseFinish);
            grid = resampled.map_err(model_error)?;
        }

        self.insert_model(name, grid)
    }

    #[instrument(skip(self, grid))]
    pub fn insert_model(&mut self, name: &str, grid: ModelGrid) -> Result<&ModelGrid, DatabaseError> {
        validate_tag(name)?;
        if self.models.contains_key(name) {
            warn!("Replacing the existing model grid '{}'.", name);
        }

        if let Some((file, path)) = self.dataset_file("models", name, "csv")? {
            ModelGridCsv::write_to_path(&grid, &path)
                .map_err(|source| DatabaseError::Table { path, source })?;
            self.index
                .models
                .insert(name.to_string(), ModelEntry { file });
            self.save_index()?;
        }

        let bounds = grid.bounds();
        info!(
            "Stored model grid '{}': {} spectra, teff {:?} K, logg {:?}, {} wavelengths.",
            name,
            grid.node_count(),
            bounds.teff,
            bounds.logg,
            grid.wavelength().len()
        );
        self.models.insert(name.to_string(), grid);
        Ok(&self.models[name])
    }

    /// Reads a filter transmission curve from a two-column text file.
    #[instrument(skip_all, fields(filter_id = %filter_id, path = %path.display()))]
    pub fn add_filter(
        &mut self,
        filter_id: &str,
        path: &Path,
        detector: DetectorType,
    ) -> Result<&FilterProfile, DatabaseError> {
        validate_tag(filter_id)?;
        let curve = TransmissionFile::read_from_path(path).map_err(|source| DatabaseError::Columns {
            path: path.to_path_buf(),
            source,
        })?;
        let profile = FilterProfile::new(curve.wavelength, curve.transmission, detector).map_err(
            |source| DatabaseError::Filter {
                id: filter_id.to_string(),
                source,
            },
        )?;
        self.insert_filter(filter_id, profile)
    }

    #[instrument(skip(self, profile))]
    pub fn insert_filter(
        &mut self,
        filter_id: &str,
        profile: FilterProfile,
    ) -> Result<&FilterProfile, DatabaseError> {
        validate_tag(filter_id)?;
        if self.filters.contains_key(filter_id) {
            warn!("Replacing the existing filter profile '{}'.", filter_id);
        }

        if let Some((file, path)) = self.dataset_file("filters", filter_id, "dat")? {
            TransmissionFile::write_to_path(&TransmissionCurve::from(&profile), &path)
                .map_err(|source| DatabaseError::Columns { path, source })?;
            let entry = FilterEntry {
                file,
                detector: profile.detector(),
            };
            self.index.filters.insert(filter_id.to_string(), entry);
            self.save_index()?;
        }

        let (lower, upper) = profile.wavel_range();
        info!(
            "Stored filter '{}': {:.3}-{:.3} um, {} detector.",
            filter_id,
            lower,
            upper,
            profile.detector()
        );
        self.filters.insert(filter_id.to_string(), profile);
        Ok(&self.filters[filter_id])
    }

    /// Reads a calibration spectrum from a two-column text file. The spectrum of Vega
    /// is stored under [`VEGA_TAG`].
    #[instrument(skip_all, fields(tag = %tag, path = %path.display()))]
    pub fn add_calibration(&mut self, tag: &str, path: &Path) -> Result<&Spectrum, DatabaseError> {
        validate_tag(tag)?;
        let spectrum = SpectrumFile::read_from_path(path).map_err(|source| DatabaseError::Columns {
            path: path.to_path_buf(),
            source,
        })?;
        self.insert_calibration(tag, spectrum)
    }

    #[instrument(skip(self, spectrum))]
    pub fn insert_calibration(
        &mut self,
        tag: &str,
        spectrum: Spectrum,
    ) -> Result<&Spectrum, DatabaseError> {
        validate_tag(tag)?;
        if self.calibration.contains_key(tag) {
            warn!("Replacing the existing calibration spectrum '{}'.", tag);
        }

        if let Some((file, path)) = self.dataset_file("calibration", tag, "dat")? {
            SpectrumFile::write_to_path(&spectrum, &path)
                .map_err(|source| DatabaseError::Columns { path, source })?;
            self.index
                .calibration
                .insert(tag.to_string(), CalibrationEntry { file });
            self.save_index()?;
        }

        info!(
            "Stored calibration spectrum '{}' with {} points.",
            tag,
            spectrum.len()
        );
        self.calibration.insert(tag.to_string(), spectrum);
        Ok(&self.calibration[tag])
    }

    pub fn isochrones(&self) -> impl Iterator<Item = (&str, &IsochroneGrid)> + '_ {
        self.isochrones.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelGrid)> + '_ {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &FilterProfile)> + '_ {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn calibration(&self) -> impl Iterator<Item = (&str, &Spectrum)> + '_ {
        self.calibration.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relative file name and absolute path of a dataset file, or `None` for an
    /// in-memory database. Creates the dataset directory.
    fn dataset_file(
        &self,
        dir: &str,
        tag: &str,
        extension: &str,
    ) -> Result<Option<(String, PathBuf)>, DatabaseError> {
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let dir_path = root.join(dir);
        fs::create_dir_all(&dir_path).map_err(|source| io_error(&dir_path, source))?;
        let file = format!("{}/{}.{}", dir, file_stem(tag), extension);
        let path = root.join(&file);
        Ok(Some((file, path)))
    }

    fn save_index(&self) -> Result<(), DatabaseError> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let content = toml::to_string_pretty(&self.index)?;
        let path = root.join(INDEX_FILE);
        fs::write(&path, content).map_err(|source| io_error(&path, source))
    }
}

impl GridStore for Database {
    fn get_isochrone_grid(&self, tag: &str) -> Result<&IsochroneGrid, ReadError> {
        self.isochrones.get(tag).ok_or_else(|| ReadError::UnknownTag {
            kind: DatasetKind::Isochrones,
            tag: tag.to_string(),
        })
    }

    fn get_model_grid(&self, tag: &str) -> Result<&ModelGrid, ReadError> {
        self.models.get(tag).ok_or_else(|| ReadError::UnknownTag {
            kind: DatasetKind::Model,
            tag: tag.to_string(),
        })
    }
}

impl PhotometricFilterCatalog for Database {
    fn get_transmission(&self, filter_id: &str) -> Result<&FilterProfile, ReadError> {
        self.filters
            .get(filter_id)
            .ok_or_else(|| ReadError::FilterNotFound {
                filter: filter_id.to_string(),
                location: "filter catalog".to_string(),
            })
    }

    fn zero_point_spectrum(&self) -> Result<&Spectrum, ReadError> {
        self.calibration
            .get(VEGA_TAG)
            .ok_or_else(|| ReadError::MissingZeroPoint(VEGA_TAG.to_string()))
    }
}
