use crate::cli::{AddModelArgs, DbArgs, DbCommands};
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::progress::IngestProgress;
use species::engine::config::ModelOptions;
use species::engine::database::Database;
use species::engine::progress::ProgressReporter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(args: DbArgs, database_path: &Path) -> Result<()> {
    match args.command {
        DbCommands::AddIsochrones { file, tag } => {
            let mut db = DataManager::open_database(database_path)?;
            let grid = db.add_isochrones(&file, &tag)?;
            println!(
                "Added isochrone grid '{}' with {} ages and {} filters.",
                tag,
                grid.ages().len(),
                grid.filters().len()
            );
        }
        DbCommands::AddModel(args) => {
            handle_add_model(args, database_path)?;
        }
        DbCommands::AddFilter { id, file, detector } => {
            let mut db = DataManager::open_database(database_path)?;
            let profile = db.add_filter(&id, &file, detector.into())?;
            let (min, max) = profile.wavel_range();
            println!("Added filter '{}' covering {} - {} um.", id, min, max);
        }
        DbCommands::AddCalibration { file, tag } => {
            let mut db = DataManager::open_database(database_path)?;
            let spectrum = db.add_calibration(&tag, &file)?;
            println!(
                "Added calibration spectrum '{}' with {} wavelengths.",
                tag,
                spectrum.len()
            );
        }
        DbCommands::List => {
            let db = DataManager::open_database(database_path)?;
            write_listing(&db, &mut io::stdout().lock())?;
        }
        DbCommands::Path => {
            println!("{}", database_path.display());
        }
        DbCommands::SetPath { path } => {
            DataManager::set_custom_path(&path)?;
            println!("Database path set to: {}", path.display());
        }
        DbCommands::ResetPath => {
            DataManager::reset_path()?;
            let manager = DataManager::new()?;
            println!(
                "Database path reset to default: {}",
                manager.get_data_path().display()
            );
        }
    }
    Ok(())
}

fn range(name: &str, values: Option<Vec<f64>>) -> Result<Option<(f64, f64)>> {
    match values.as_deref() {
        None => Ok(None),
        Some([min, max]) => Ok(Some((*min, *max))),
        Some(other) => Err(CliError::Argument(format!(
            "--{} takes exactly two values, got {}",
            name,
            other.len()
        ))),
    }
}

/// Translates the command-line restrictions into validated [`ModelOptions`].
pub fn model_options(args: &AddModelArgs) -> Result<ModelOptions> {
    let mut builder = ModelOptions::builder();
    if let Some((min, max)) = range("wavel-range", args.wavel_range.clone())? {
        builder = builder.wavel_range(min, max);
    }
    if let Some((min, max)) = range("teff-range", args.teff_range.clone())? {
        builder = builder.teff_range(min, max);
    }
    if let Some((min, max)) = range("logg-range", args.logg_range.clone())? {
        builder = builder.logg_range(min, max);
    }
    if let Some(resolution) = args.spec_res {
        builder = builder.spec_res(resolution);
    }
    Ok(builder.build()?)
}

fn handle_add_model(args: AddModelArgs, database_path: &Path) -> Result<()> {
    let options = model_options(&args)?;
    let mut db = DataManager::open_database(database_path)?;

    let progress = IngestProgress::new(&args.name);
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let grid = db.add_model(&args.name, &args.grid, &options, &reporter)?;

    let bounds = grid.bounds();
    info!(
        "Model grid '{}' stored with bounds {:?} after: {}.",
        args.name,
        bounds,
        progress.completed_phases().join(", ")
    );
    println!(
        "Added model grid '{}': {} spectra, Teff {} - {} K, log g {} - {}, {} wavelengths.",
        args.name,
        grid.node_count(),
        bounds.teff.0,
        bounds.teff.1,
        bounds.logg.0,
        bounds.logg.1,
        grid.wavelength().len()
    );
    Ok(())
}

/// Writes one line per stored dataset, grouped by kind.
pub fn write_listing(db: &Database, out: &mut impl Write) -> io::Result<()> {
    let root = db
        .root()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("(in memory)"));
    writeln!(out, "Database: {}", root.display())?;

    writeln!(out, "\nIsochrone grids:")?;
    for (tag, grid) in db.isochrones() {
        let (min, max) = grid.age_range();
        writeln!(
            out,
            "  {:<24} {} | ages {} - {} Myr | filters: {}",
            tag,
            grid.model(),
            min,
            max,
            grid.filters().join(", ")
        )?;
    }

    writeln!(out, "\nModel spectrum grids:")?;
    for (name, grid) in db.models() {
        let bounds = grid.bounds();
        writeln!(
            out,
            "  {:<24} Teff {} - {} K | log g {} - {} | {} wavelengths",
            name,
            bounds.teff.0,
            bounds.teff.1,
            bounds.logg.0,
            bounds.logg.1,
            grid.wavelength().len()
        )?;
    }

    writeln!(out, "\nFilters:")?;
    for (id, profile) in db.filters() {
        let (min, max) = profile.wavel_range();
        writeln!(
            out,
            "  {:<24} {} - {} um, mean {:.4} um | {} counting",
            id,
            min,
            max,
            profile.mean_wavelength(),
            profile.detector()
        )?;
    }

    writeln!(out, "\nCalibration spectra:")?;
    for (tag, spectrum) in db.calibration() {
        let (min, max) = spectrum.wavel_range();
        writeln!(out, "  {:<24} {} - {} um", tag, min, max)?;
    }
    Ok(())
}
