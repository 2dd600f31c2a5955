use crate::config::models::OutputFormat;
use crate::utils::parser::{self, MassGrid};
use clap::{Args, Parser, Subcommand, ValueEnum};
use species::core::models::boxes::FilterPair;
use species::core::models::filter::DetectorType;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "species CLI - Interpolated isochrones, color-magnitude and color-color relations from evolutionary model grids.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to the configuration file (defaults to ./species.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database directory, overriding the configuration file and the stored path
    #[arg(short, long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file and create the database directory.
    Init(InitArgs),
    /// Manage the datasets stored in the database.
    Db(DbArgs),
    /// Interpolate an isochrone grid using its tabulated magnitudes.
    Isochrone(IsochroneArgs),
    /// Color-magnitude relation with magnitudes synthesized from a model spectrum grid.
    ColorMag(ColorMagArgs),
    /// Color-color relation with magnitudes synthesized from a model spectrum grid.
    ColorColor(ColorColorArgs),
}

impl Commands {
    /// Query arguments of the isochrone commands.
    pub fn query(&self) -> Option<&QueryArgs> {
        match self {
            Commands::Isochrone(args) => Some(&args.query),
            Commands::ColorMag(args) => Some(&args.query),
            Commands::ColorColor(args) => Some(&args.query),
            Commands::Init(_) | Commands::Db(_) => None,
        }
    }
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `db` subcommand.
#[derive(Args, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,
}

/// Available commands for database management.
#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Add an isochrone grid in the Baraffe/AMES text layout.
    AddIsochrones {
        /// The isochrone file to read.
        file: PathBuf,
        /// The tag under which the grid is stored (e.g., 'ames-cond').
        tag: String,
    },
    /// Add a model spectrum grid from a long-form CSV file.
    AddModel(AddModelArgs),
    /// Add a filter transmission curve from a two-column text file.
    AddFilter {
        /// Filter identifier (e.g., 'MKO/NSFCam.J').
        id: String,
        /// The transmission curve to read.
        file: PathBuf,
        /// How the detector counts incoming light.
        #[arg(long, value_enum, default_value_t = DetectorArg::Energy)]
        detector: DetectorArg,
    },
    /// Add a calibration spectrum from a two-column text file.
    AddCalibration {
        /// The spectrum to read (wavelength in um, flux in W m-2 um-1).
        file: PathBuf,
        /// The tag under which the spectrum is stored.
        #[arg(long, default_value = "vega")]
        tag: String,
    },
    /// List every stored dataset.
    List,
    /// Show the absolute path to the database directory.
    Path,
    /// Set a custom path for the database directory.
    SetPath {
        /// The new database directory.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the database path to its default, OS-specific location.
    ResetPath,
}

#[derive(Args, Debug)]
pub struct AddModelArgs {
    /// Name under which the grid is stored (e.g., 'ames-cond').
    pub name: String,

    /// Long-form CSV with 'teff,logg,wavelength,flux' columns.
    #[arg(long, required = true, value_name = "PATH")]
    pub grid: PathBuf,

    /// Keep only wavelengths (um) within this range.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub wavel_range: Option<Vec<f64>>,

    /// Resample the spectra to this spectral resolution.
    #[arg(long, value_name = "R")]
    pub spec_res: Option<f64>,

    /// Keep only effective temperatures (K) within this range.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub teff_range: Option<Vec<f64>>,

    /// Keep only surface gravities (dex) within this range.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub logg_range: Option<Vec<f64>>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorArg {
    Energy,
    Photon,
}

impl From<DetectorArg> for DetectorType {
    fn from(arg: DetectorArg) -> Self {
        match arg {
            DetectorArg::Energy => DetectorType::Energy,
            DetectorArg::Photon => DetectorType::Photon,
        }
    }
}

/// Arguments shared by every isochrone query.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Tag of the isochrone grid.
    pub tag: String,

    /// Age (Myr).
    #[arg(short, long, required = true)]
    pub age: f64,

    /// Masses (M_Jup) as 'START:STOP:N' or a comma-separated list.
    #[arg(short, long, required = true, value_name = "SPEC", value_parser = parser::parse_masses)]
    pub masses: MassGrid,

    /// Output format, overriding the configuration file.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Decimal places in table output, overriding the configuration file.
    #[arg(short, long, value_name = "DIGITS")]
    pub precision: Option<usize>,
}

#[derive(Args, Debug)]
pub struct IsochroneArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Filters of the color, as 'FILTER1,FILTER2'.
    #[arg(long, required = true, value_name = "F1,F2", value_parser = parser::parse_filter_pair)]
    pub color: FilterPair,

    /// Filter of the magnitude.
    #[arg(long, required = true, value_name = "FILTER")]
    pub mag: String,
}

#[derive(Args, Debug)]
pub struct ColorMagArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Model spectrum grid used for synthetic photometry.
    #[arg(long, required = true)]
    pub model: String,

    /// Filters of the color, as 'FILTER1,FILTER2'.
    #[arg(long, required = true, value_name = "F1,F2", value_parser = parser::parse_filter_pair)]
    pub color: FilterPair,

    /// Filter of the magnitude; must be one of the color filters.
    #[arg(long, required = true, value_name = "FILTER")]
    pub mag: String,
}

#[derive(Args, Debug)]
pub struct ColorColorArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Model spectrum grid used for synthetic photometry.
    #[arg(long, required = true)]
    pub model: String,

    /// Filters of the first color, as 'FILTER1,FILTER2'.
    #[arg(long, required = true, value_name = "F1,F2", value_parser = parser::parse_filter_pair)]
    pub color1: FilterPair,

    /// Filters of the second color, as 'FILTER3,FILTER4'.
    #[arg(long, required = true, value_name = "F3,F4", value_parser = parser::parse_filter_pair)]
    pub color2: FilterPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn color_magnitude_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "species",
            "-vv",
            "color-mag",
            "ames-cond",
            "--model",
            "ames-cond",
            "--age",
            "100",
            "--masses",
            "35:45:10",
            "--color",
            "MKO/NSFCam.J,MKO/NSFCam.H",
            "--mag",
            "MKO/NSFCam.J",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::ColorMag(args) = cli.command else {
            panic!("expected the color-mag command");
        };
        assert_eq!(args.query.tag, "ames-cond");
        assert_eq!(args.query.age, 100.0);
        assert_eq!(args.query.masses.values().len(), 10);
        assert_eq!(args.query.format, Some(OutputFormat::Csv));
        assert_eq!(args.color, FilterPair::new("MKO/NSFCam.J", "MKO/NSFCam.H"));
    }

    #[test]
    fn add_model_ranges_take_two_values() {
        let cli = Cli::try_parse_from([
            "species",
            "db",
            "add-model",
            "ames-cond",
            "--grid",
            "ames.csv",
            "--wavel-range",
            "0.5",
            "5",
            "--teff-range",
            "1000",
            "2000",
            "--spec-res",
            "100",
        ])
        .unwrap();

        let Commands::Db(DbArgs {
            command: DbCommands::AddModel(args),
        }) = cli.command
        else {
            panic!("expected the db add-model command");
        };
        assert_eq!(args.wavel_range, Some(vec![0.5, 5.0]));
        assert_eq!(args.teff_range, Some(vec![1000.0, 2000.0]));
        assert_eq!(args.spec_res, Some(100.0));
        assert_eq!(args.logg_range, None);
    }

    #[test]
    fn calibration_tag_defaults_to_vega() {
        let cli = Cli::try_parse_from(["species", "db", "add-calibration", "vega.dat"]).unwrap();
        let Commands::Db(DbArgs {
            command: DbCommands::AddCalibration { tag, .. },
        }) = cli.command
        else {
            panic!("expected the db add-calibration command");
        };
        assert_eq!(tag, "vega");
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["species", "-q", "-v", "db", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_masses_are_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "species",
            "isochrone",
            "ames-cond",
            "--age",
            "100",
            "--masses",
            "10:100",
            "--color",
            "J,H",
            "--mag",
            "J",
        ]);
        assert!(result.is_err());
    }
}
