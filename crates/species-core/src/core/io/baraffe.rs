use crate::core::constants::{gcm_to_rjup, msun_to_mjup};
use crate::core::io::columns::{Column, HEADER_ALIASES, is_unit_token};
use crate::core::io::traits::DataFile;
use crate::core::models::isochrone::{GridError, IsochroneGrid, IsochroneModel, IsochroneRow};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BaraffeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: BaraffeParseErrorKind,
    },
    #[error("Column header lacks the required '{0}' column")]
    MissingColumn(&'static str),
    #[error("File contains no column header line")]
    MissingHeader,
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

#[derive(Debug, Error)]
pub enum BaraffeParseErrorKind {
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Age line does not end with a number")]
    MissingAgeValue,
    #[error("Data row appears before any age line")]
    MissingAge,
    #[error("Data row appears before the column header")]
    MissingHeader,
    #[error("Expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("Column header differs from the first header of the file")]
    HeaderMismatch,
    #[error("Column '{0}' appears more than once in the header")]
    DuplicateColumn(String),
}

/// Column layout derived from a header line.
#[derive(Debug, Clone, PartialEq)]
struct Header {
    mass: usize,
    teff: usize,
    log_lum: usize,
    logg: usize,
    radius: Option<usize>,
    filters: Vec<(String, usize)>,
    width: usize,
}

impl Header {
    fn parse(line: &str, line_num: usize) -> Result<Self, BaraffeError> {
        let duplicate = |token: &str| BaraffeError::Parse {
            line: line_num,
            kind: BaraffeParseErrorKind::DuplicateColumn(token.to_string()),
        };
        let mut columns: Vec<(Column, usize)> = Vec::new();
        let mut filters: Vec<(String, usize)> = Vec::new();
        let mut width = 0;

        for token in line.split_whitespace().filter(|t| !is_unit_token(t)) {
            match HEADER_ALIASES.get(token) {
                Some(&column) => {
                    if columns.iter().any(|(c, _)| *c == column) {
                        return Err(duplicate(token));
                    }
                    columns.push((column, width));
                }
                None => {
                    if filters.iter().any(|(f, _)| f == token) {
                        return Err(duplicate(token));
                    }
                    filters.push((token.to_string(), width));
                }
            }
            width += 1;
        }

        let find = |wanted: Column| columns.iter().find(|(c, _)| *c == wanted).map(|(_, i)| *i);
        let require =
            |wanted: Column| find(wanted).ok_or(BaraffeError::MissingColumn(wanted.name()));
        Ok(Self {
            mass: require(Column::Mass)?,
            teff: require(Column::Teff)?,
            log_lum: require(Column::LogLum)?,
            logg: require(Column::LogG)?,
            radius: find(Column::Radius),
            filters,
            width,
        })
    }

    fn filter_names(&self) -> Vec<String> {
        self.filters.iter().map(|(name, _)| name.clone()).collect()
    }
}

fn is_header_line(line: &str) -> bool {
    line.split_whitespace()
        .any(|token| HEADER_ALIASES.get(token) == Some(&Column::LogG))
}

fn parse_number(token: &str, line: usize) -> Result<f64, BaraffeError> {
    token.parse().map_err(|_| BaraffeError::Parse {
        line,
        kind: BaraffeParseErrorKind::InvalidNumber(token.to_string()),
    })
}

/// Reader for Baraffe/AMES-style evolutionary tables.
///
/// The file consists of one block per age. A block starts with a line containing
/// `(Gyr)` whose last token is the age in Gyr, followed by a column header (the line
/// naming `lg(g)`) and whitespace-separated data rows. Lines that are blank, start
/// with `!` or `#`, or contain `---` are ignored. Header tokens that are not physical
/// columns are taken as filter names; tokens that only carry a unit, such as `(K)`,
/// occupy no column.
///
/// Values are converted on read: ages to Myr, masses to M_Jup, radii from
/// 10^9 cm to R_Jup.
pub struct BaraffeFile;

impl DataFile for BaraffeFile {
    type Data = IsochroneGrid;
    type Error = BaraffeError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, Self::Error> {
        let mut header: Option<Header> = None;
        let mut age: Option<f64> = None;
        let mut rows = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.is_empty()
                || trimmed.starts_with('!')
                || trimmed.starts_with('#')
                || trimmed.contains("---")
            {
                continue;
            }

            if trimmed.contains("(Gyr)") {
                let token = trimmed
                    .split(|c: char| c.is_whitespace() || c == '=')
                    .filter(|t| !t.is_empty())
                    .next_back()
                    .ok_or(BaraffeError::Parse {
                        line: line_num,
                        kind: BaraffeParseErrorKind::MissingAgeValue,
                    })?;
                let gyr = parse_number(token, line_num)?;
                debug!("Line {}: age block of {} Gyr", line_num, gyr);
                age = Some(gyr * 1.0e3);
                continue;
            }

            if is_header_line(trimmed) {
                let parsed = Header::parse(trimmed, line_num)?;
                match &header {
                    Some(existing) if *existing != parsed => {
                        return Err(BaraffeError::Parse {
                            line: line_num,
                            kind: BaraffeParseErrorKind::HeaderMismatch,
                        });
                    }
                    Some(_) => {}
                    None => header = Some(parsed),
                }
                continue;
            }

            let Some(layout) = header.as_ref() else {
                return Err(BaraffeError::Parse {
                    line: line_num,
                    kind: BaraffeParseErrorKind::MissingHeader,
                });
            };
            let Some(age) = age else {
                return Err(BaraffeError::Parse {
                    line: line_num,
                    kind: BaraffeParseErrorKind::MissingAge,
                });
            };

            let values = trimmed
                .split_whitespace()
                .map(|token| parse_number(token, line_num))
                .collect::<Result<Vec<f64>, _>>()?;
            if values.len() != layout.width {
                return Err(BaraffeError::Parse {
                    line: line_num,
                    kind: BaraffeParseErrorKind::ColumnCount {
                        expected: layout.width,
                        found: values.len(),
                    },
                });
            }

            rows.push(IsochroneRow {
                age,
                mass: msun_to_mjup(values[layout.mass]),
                teff: values[layout.teff],
                log_lum: values[layout.log_lum],
                logg: values[layout.logg],
                radius: layout
                    .radius
                    .map_or(f64::NAN, |index| gcm_to_rjup(values[index])),
                magnitudes: layout.filters.iter().map(|(_, i)| values[*i]).collect(),
            });
        }

        let layout = header.ok_or(BaraffeError::MissingHeader)?;
        debug!(
            "Parsed {} rows with {} filter column(s)",
            rows.len(),
            layout.filters.len()
        );
        Ok(IsochroneGrid::new(
            IsochroneModel::Baraffe,
            layout.filter_names(),
            rows,
        )?)
    }
}
