use crate::core::io::traits::{DataFile, WritableDataFile};
use crate::core::models::isochrone::{GridError, IsochroneGrid, IsochroneModel, IsochroneRow};
use crate::core::models::spectrum::{ModelGrid, ModelGridError, Spectrum, SpectrumError};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Expected column '{expected}' at position {position}, found '{found}'")]
    UnexpectedColumn {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("Invalid number '{value}' in row {row}, column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Invalid isochrone grid: {0}")]
    Grid(#[from] GridError),
    #[error("Invalid model grid: {0}")]
    Model(#[from] ModelGridError),
    #[error("Invalid spectrum: {0}")]
    Spectrum(#[from] SpectrumError),
}

/// Leading columns of an isochrone table; the remaining columns are magnitudes.
pub const ISOCHRONE_COLUMNS: [&str; 6] = ["age", "mass", "teff", "log_lum", "logg", "radius"];

/// Flat tabular form of an isochrone grid.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneTable {
    pub filters: Vec<String>,
    pub rows: Vec<IsochroneRow>,
}

impl IsochroneTable {
    pub fn from_grid(grid: &IsochroneGrid) -> Self {
        Self {
            filters: grid.filters().to_vec(),
            rows: grid.rows().collect(),
        }
    }

    pub fn into_grid(self, model: IsochroneModel) -> Result<IsochroneGrid, GridError> {
        IsochroneGrid::new(model, self.filters, self.rows)
    }
}

/// CSV with the columns `age, mass, teff, log_lum, logg, radius` followed by one
/// magnitude column per filter.
pub struct IsochroneCsv;

impl DataFile for IsochroneCsv {
    type Data = IsochroneTable;
    type Error = TableError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, Self::Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        for (position, expected) in ISOCHRONE_COLUMNS.iter().enumerate() {
            let found = headers.get(position).unwrap_or("");
            if found != *expected {
                return Err(TableError::UnexpectedColumn {
                    position,
                    expected,
                    found: found.to_string(),
                });
            }
        }
        let filters: Vec<String> = headers
            .iter()
            .skip(ISOCHRONE_COLUMNS.len())
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            let values = record
                .iter()
                .zip(headers.iter())
                .map(|(value, column)| {
                    value.trim().parse::<f64>().map_err(|_| TableError::InvalidNumber {
                        row: index + 1,
                        column: column.to_string(),
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            rows.push(IsochroneRow {
                age: values[0],
                mass: values[1],
                teff: values[2],
                log_lum: values[3],
                logg: values[4],
                radius: values[5],
                magnitudes: values[ISOCHRONE_COLUMNS.len()..].to_vec(),
            });
        }

        Ok(IsochroneTable { filters, rows })
    }
}

impl WritableDataFile for IsochroneCsv {
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(
            ISOCHRONE_COLUMNS
                .iter()
                .copied()
                .chain(data.filters.iter().map(String::as_str)),
        )?;

        for row in &data.rows {
            let fields = [
                row.age, row.mass, row.teff, row.log_lum, row.logg, row.radius,
            ]
            .into_iter()
            .chain(row.magnitudes.iter().copied())
            .map(|v| v.to_string());
            csv_writer.write_record(fields)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SpectrumRecord {
    teff: f64,
    logg: f64,
    wavelength: f64,
    flux: f64,
}

/// Long-form CSV of a model grid: one `teff, logg, wavelength, flux` row per
/// wavelength of every node. The rows of a node must be contiguous.
pub struct ModelGridCsv;

impl DataFile for ModelGridCsv {
    type Data = ModelGrid;
    type Error = TableError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, Self::Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut nodes: Vec<(f64, f64, Vec<f64>, Vec<f64>)> = Vec::new();

        for result in csv_reader.deserialize::<SpectrumRecord>() {
            let record = result?;
            if let Some(node) = nodes
                .last_mut()
                .filter(|n| n.0 == record.teff && n.1 == record.logg)
            {
                node.2.push(record.wavelength);
                node.3.push(record.flux);
                continue;
            }
            nodes.push((
                record.teff,
                record.logg,
                vec![record.wavelength],
                vec![record.flux],
            ));
        }

        let spectra = nodes
            .into_iter()
            .map(|(teff, logg, wavelength, flux)| {
                Spectrum::new(wavelength, flux).map(|spectrum| (teff, logg, spectrum))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ModelGrid::from_spectra(spectra)?)
    }
}

impl WritableDataFile for ModelGridCsv {
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (teff, logg, flux) in data.nodes() {
            for (&wavelength, &flux) in data.wavelength().iter().zip(flux) {
                csv_writer.serialize(SpectrumRecord {
                    teff,
                    logg,
                    wavelength,
                    flux,
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::isochrone::tests::linear_grid;
    use crate::core::models::spectrum::tests::plane_grid;
    use std::io::Cursor;

    #[test]
    fn isochrone_table_round_trips_through_csv() {
        let grid = linear_grid();
        let mut buffer = Vec::new();
        IsochroneCsv::write_to(&IsochroneTable::from_grid(&grid), &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("age,mass,teff,log_lum,logg,radius,J,H\n"));

        let table = IsochroneCsv::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(table.into_grid(IsochroneModel::Baraffe).unwrap(), grid);
    }

    #[test]
    fn isochrone_table_preserves_nan_magnitudes() {
        let text = "age,mass,teff,log_lum,logg,radius,J\n10,5,1000,-4,4,1,NaN\n";
        let table = IsochroneCsv::read_from(&mut Cursor::new(text)).unwrap();
        assert!(table.rows[0].magnitudes[0].is_nan());
    }

    #[test]
    fn isochrone_table_requires_the_fixed_columns() {
        let text = "age,teff,mass,log_lum,logg,radius\n";
        let err = IsochroneCsv::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            TableError::UnexpectedColumn {
                position: 1,
                expected: "mass",
                ..
            }
        ));
    }

    #[test]
    fn isochrone_table_reports_invalid_numbers() {
        let text = "age,mass,teff,log_lum,logg,radius\n10,5,hot,-4,4,1\n";
        let err = IsochroneCsv::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, TableError::InvalidNumber { row: 1, .. }));
    }

    #[test]
    fn model_grid_round_trips_through_csv() {
        let grid = plane_grid();
        let mut buffer = Vec::new();
        ModelGridCsv::write_to(&grid, &mut buffer).unwrap();
        let read = ModelGridCsv::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(read, grid);
    }

    #[test]
    fn model_grid_with_missing_nodes_is_rejected() {
        let text = "teff,logg,wavelength,flux\n\
                    1000,4.0,1.0,1\n1000,4.0,2.0,1\n\
                    1000,4.5,1.0,1\n1000,4.5,2.0,1\n\
                    1500,4.0,1.0,1\n1500,4.0,2.0,1\n";
        let err = ModelGridCsv::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            TableError::Model(ModelGridError::MissingNode { .. })
        ));
    }
}
