use crate::cli::{ColorColorArgs, ColorMagArgs, IsochroneArgs, QueryArgs};
use crate::config::models::{AppConfig, OutputConfig, OutputFormat};
use crate::data::DataManager;
use crate::error::Result;
use species::core::models::boxes::{ColorColorBox, ColorMagBox, FilterPair, IsochroneBox};
use species::engine::database::Database;
use species::workflows::isochrone::IsochroneReader;
use std::io::{self, Write};
use tracing::info;

/// Named numeric columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

fn color_header(pair: &FilterPair) -> String {
    format!("{}-{}", pair.first, pair.second)
}

impl Table {
    fn new(columns: Vec<(String, Vec<f64>)>) -> Self {
        let (headers, columns) = columns.into_iter().unzip();
        Self { headers, columns }
    }

    fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn write(&self, output: &OutputConfig, out: &mut impl Write) -> Result<()> {
        match output.format {
            OutputFormat::Table => self.write_aligned(output.precision, out)?,
            OutputFormat::Csv => self.write_csv(out)?,
        }
        Ok(())
    }

    fn write_aligned(&self, precision: usize, out: &mut impl Write) -> io::Result<()> {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|column| column.iter().map(|v| format!("{:.*}", precision, v)).collect())
            .collect();
        let widths: Vec<usize> = self
            .headers
            .iter()
            .zip(&cells)
            .map(|(header, column)| {
                column
                    .iter()
                    .map(String::len)
                    .chain([header.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(header, &width)| format!("{:>width$}", header))
            .collect();
        writeln!(out, "{}", header_line.join("  "))?;

        for row in 0..self.rows() {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(column, &width)| format!("{:>width$}", column[row]))
                .collect();
            writeln!(out, "{}", line.join("  "))?;
        }
        Ok(())
    }

    fn write_csv(&self, out: &mut impl Write) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.headers)?;
        for row in 0..self.rows() {
            writer.write_record(self.columns.iter().map(|column| column[row].to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl From<IsochroneBox> for Table {
    fn from(b: IsochroneBox) -> Self {
        Table::new(vec![
            ("mass".to_string(), b.masses),
            ("teff".to_string(), b.teff),
            ("logg".to_string(), b.logg),
            (color_header(&b.filters_color), b.color),
            (b.filter_mag, b.magnitude),
        ])
    }
}

impl From<ColorMagBox> for Table {
    fn from(b: ColorMagBox) -> Self {
        Table::new(vec![
            ("mass".to_string(), b.sptype),
            (color_header(&b.filters_color), b.color),
            (b.filter_mag, b.magnitude),
        ])
    }
}

impl From<ColorColorBox> for Table {
    fn from(b: ColorColorBox) -> Self {
        Table::new(vec![
            ("mass".to_string(), b.sptype),
            (color_header(&b.filters.0), b.color1),
            (color_header(&b.filters.1), b.color2),
        ])
    }
}

pub fn isochrone(db: &Database, args: &IsochroneArgs) -> Result<IsochroneBox> {
    let reader = IsochroneReader::new(db, &args.query.tag)?;
    Ok(reader.get_isochrone(
        args.query.age,
        args.query.masses.values(),
        (args.color.first.as_str(), args.color.second.as_str()),
        &args.mag,
    )?)
}

pub fn color_magnitude(db: &Database, args: &ColorMagArgs) -> Result<ColorMagBox> {
    let reader = IsochroneReader::new(db, &args.query.tag)?;
    Ok(reader.get_color_magnitude(
        args.query.age,
        args.query.masses.values(),
        &args.model,
        (args.color.first.as_str(), args.color.second.as_str()),
        &args.mag,
    )?)
}

pub fn color_color(db: &Database, args: &ColorColorArgs) -> Result<ColorColorBox> {
    let reader = IsochroneReader::new(db, &args.query.tag)?;
    Ok(reader.get_color_color(
        args.query.age,
        args.query.masses.values(),
        &args.model,
        (
            (args.color1.first.as_str(), args.color1.second.as_str()),
            (args.color2.first.as_str(), args.color2.second.as_str()),
        ),
    )?)
}

fn print(table: Table, query: &QueryArgs, config: &AppConfig) -> Result<()> {
    let nan_rows = (0..table.rows())
        .filter(|&row| table.columns.iter().any(|column| column[row].is_nan()))
        .count();
    info!(
        "Computed {} rows for '{}' at {} Myr ({} with NaN values)",
        table.rows(),
        query.tag,
        query.age,
        nan_rows
    );
    table.write(&config.output, &mut io::stdout().lock())
}

pub fn run_isochrone(args: IsochroneArgs, config: &AppConfig) -> Result<()> {
    let db = DataManager::open_database(&config.database_path)?;
    let table = isochrone(&db, &args)?.into();
    print(table, &args.query, config)
}

pub fn run_color_magnitude(args: ColorMagArgs, config: &AppConfig) -> Result<()> {
    let db = DataManager::open_database(&config.database_path)?;
    let table = color_magnitude(&db, &args)?.into();
    print(table, &args.query, config)
}

pub fn run_color_color(args: ColorColorArgs, config: &AppConfig) -> Result<()> {
    let db = DataManager::open_database(&config.database_path)?;
    let table = color_color(&db, &args)?.into();
    print(table, &args.query, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::commands::fixtures::{self, H, J, KS};
    use crate::error::CliError;
    use clap::Parser;
    use species::core::models::filter::DetectorType;
    use species::engine::config::ModelOptions;
    use species::engine::error::ReadError;
    use species::engine::progress::ProgressReporter;
    use tempfile::{TempDir, tempdir};

    fn database() -> (TempDir, Database) {
        let dir = tempdir().unwrap();
        let files = fixtures::write_inputs(dir.path());
        let mut db = Database::open(&dir.path().join("db")).unwrap();
        db.add_isochrones(&files.isochrones, "sample").unwrap();
        db.add_model(
            "flat",
            &files.model,
            &ModelOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        for (id, path) in &files.filters {
            db.add_filter(id, path, DetectorType::Energy).unwrap();
        }
        db.add_calibration("vega", &files.vega).unwrap();
        (dir, db)
    }

    fn parse(args: &[&str]) -> Commands {
        let mut argv = vec!["species"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    fn text(table: &Table, format: OutputFormat, precision: usize) -> String {
        let mut buffer = Vec::new();
        table
            .write(&OutputConfig { format, precision }, &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn aligned_output_right_justifies_columns() {
        let table = Table::new(vec![
            ("mass".to_string(), vec![10.0, 100.0]),
            ("J-H".to_string(), vec![0.5, f64::NAN]),
        ]);
        assert_eq!(
            text(&table, OutputFormat::Table, 2),
            "  mass   J-H\n 10.00  0.50\n100.00   NaN\n"
        );
    }

    #[test]
    fn csv_output_keeps_full_precision() {
        let table = Table::new(vec![
            ("mass".to_string(), vec![35.0, 36.111111111111114]),
            ("MKO/NSFCam.J".to_string(), vec![11.25, f64::NAN]),
        ]);
        assert_eq!(
            text(&table, OutputFormat::Csv, 2),
            "mass,MKO/NSFCam.J\n35,11.25\n36.111111111111114,NaN\n"
        );
    }

    #[test]
    fn isochrone_query_uses_tabulated_magnitudes() {
        let (_dir, db) = database();
        let Commands::Isochrone(args) = parse(&[
            "isochrone",
            "sample",
            "--age",
            "100",
            "--masses",
            "30,35,40",
            "--color",
            "J,H",
            "--mag",
            "J",
        ]) else {
            panic!("expected the isochrone command");
        };

        let result = isochrone(&db, &args).unwrap();
        assert_eq!(result.masses, vec![30.0, 35.0, 40.0]);
        assert!(result.color[0].is_nan());
        assert!(result.magnitude[0].is_nan());
        assert!((result.color[1] - 0.5).abs() < 1e-9);
        assert!((result.color[2] - 0.5).abs() < 1e-9);
        assert!(result.magnitude[1] > result.magnitude[2]);

        let table: Table = result.into();
        assert_eq!(table.headers, vec!["mass", "teff", "logg", "J-H", "J"]);
    }

    #[test]
    fn color_queries_return_one_row_per_mass() {
        let (_dir, db) = database();
        let color = format!("{},{}", J, H);
        let Commands::ColorMag(args) = parse(&[
            "color-mag",
            "sample",
            "--model",
            "flat",
            "--age",
            "550",
            "--masses",
            "32:40:5",
            "--color",
            &color,
            "--mag",
            J,
        ]) else {
            panic!("expected the color-mag command");
        };
        let result = color_magnitude(&db, &args).unwrap();
        assert_eq!(result.sptype, args.query.masses.values());
        assert!(result.color.iter().all(|c| c.is_finite()));
        assert!(result.color.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-9));

        let color2 = format!("{},{}", H, KS);
        let Commands::ColorColor(args) = parse(&[
            "color-color",
            "sample",
            "--model",
            "flat",
            "--age",
            "550",
            "--masses",
            "32:40:5",
            "--color1",
            &color,
            "--color2",
            &color2,
        ]) else {
            panic!("expected the color-color command");
        };
        let result = color_color(&db, &args).unwrap();
        assert_eq!(result.color1.len(), 5);
        assert_eq!(result.color2.len(), 5);
        assert_eq!(result.sptype.iter().sum::<f64>(), 180.0);
    }

    #[test]
    fn age_outside_the_grid_is_an_error() {
        let (_dir, db) = database();
        let Commands::Isochrone(args) = parse(&[
            "isochrone",
            "sample",
            "--age",
            "5000",
            "--masses",
            "35",
            "--color",
            "J,H",
            "--mag",
            "J",
        ]) else {
            panic!("expected the isochrone command");
        };
        assert!(matches!(
            isochrone(&db, &args),
            Err(CliError::Read(ReadError::AgeOutOfRange { .. }))
        ));
    }
}
