//! Plain column files: one record per line, values separated by whitespace or
//! commas, `#` starting a comment.

use crate::core::io::traits::{DataFile, WritableDataFile};
use crate::core::models::filter::FilterProfile;
use crate::core::models::spectrum::{Spectrum, SpectrumError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsciiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid number '{token}' on line {line}")]
    InvalidNumber { line: usize, token: String },
    #[error("Line {line} has {found} column(s), at least {expected} are required")]
    TooFewColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid spectrum: {0}")]
    Spectrum(#[from] SpectrumError),
}

/// Reads the first `columns` values of every data line.
///
/// Extra columns are ignored, as are text after `#` and blank lines.
pub fn read_columns(
    reader: &mut impl BufRead,
    columns: usize,
) -> Result<Vec<Vec<f64>>, AsciiError> {
    let mut data = vec![Vec::new(); columns];

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < columns {
            return Err(AsciiError::TooFewColumns {
                line: line_num,
                expected: columns,
                found: tokens.len(),
            });
        }

        for (column, token) in data.iter_mut().zip(&tokens) {
            let value = token.parse().map_err(|_| AsciiError::InvalidNumber {
                line: line_num,
                token: token.to_string(),
            })?;
            column.push(value);
        }
    }

    Ok(data)
}

fn write_columns(
    writer: &mut impl Write,
    header: &str,
    first: &[f64],
    second: &[f64],
) -> io::Result<()> {
    writeln!(writer, "# {}", header)?;
    for (a, b) in first.iter().zip(second) {
        writeln!(writer, "{} {}", a, b)?;
    }
    Ok(())
}

/// Wavelength (um) and flux density (W m^-2 um^-1) columns.
pub struct SpectrumFile;

impl DataFile for SpectrumFile {
    type Data = Spectrum;
    type Error = AsciiError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, Self::Error> {
        let mut columns = read_columns(reader, 2)?.into_iter();
        let wavelength = columns.next().unwrap_or_default();
        let flux = columns.next().unwrap_or_default();
        Ok(Spectrum::new(wavelength, flux)?)
    }
}

impl WritableDataFile for SpectrumFile {
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error> {
        write_columns(
            writer,
            "Wavelength (um) - Flux (W m-2 um-1)",
            data.wavelength(),
            data.flux(),
        )?;
        Ok(())
    }
}

/// A transmission curve as tabulated, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionCurve {
    pub wavelength: Vec<f64>,
    pub transmission: Vec<f64>,
}

impl From<&FilterProfile> for TransmissionCurve {
    fn from(profile: &FilterProfile) -> Self {
        Self {
            wavelength: profile.wavelength().to_vec(),
            transmission: profile.transmission().to_vec(),
        }
    }
}

/// Wavelength (um) and fractional transmission columns.
pub struct TransmissionFile;

impl DataFile for TransmissionFile {
    type Data = TransmissionCurve;
    type Error = AsciiError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, Self::Error> {
        let mut columns = read_columns(reader, 2)?.into_iter();
        Ok(TransmissionCurve {
            wavelength: columns.next().unwrap_or_default(),
            transmission: columns.next().unwrap_or_default(),
        })
    }
}

impl WritableDataFile for TransmissionFile {
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error> {
        write_columns(
            writer,
            "Wavelength (um) - Transmission",
            &data.wavelength,
            &data.transmission,
        )?;
        Ok(())
    }
}
