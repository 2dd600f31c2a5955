use crate::core::models::isochrone::GridError;
use crate::core::models::spectrum::ModelBounds;
use std::fmt;
use thiserror::Error;

/// The kinds of dataset a database stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Isochrones,
    Model,
    Filter,
    Calibration,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Isochrones => write!(f, "isochrone grid"),
            DatasetKind::Model => write!(f, "model spectrum grid"),
            DatasetKind::Filter => write!(f, "filter profile"),
            DatasetKind::Calibration => write!(f, "calibration spectrum"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadError {
    #[error("No {kind} is stored under the tag '{tag}'")]
    UnknownTag { kind: DatasetKind, tag: String },

    #[error("Age {age} Myr is outside the grid coverage [{min}, {max}] Myr")]
    AgeOutOfRange { age: f64, min: f64, max: f64 },

    #[error("Filter '{filter}' is not available in the {location}")]
    FilterNotFound { filter: String, location: String },

    #[error("Zero-point spectrum '{0}' is missing from the database")]
    MissingZeroPoint(String),

    #[error(
        "Parameters (teff = {teff}, logg = {logg}) are outside the model grid bounds (teff {:?}, logg {:?})",
        .bounds.teff,
        .bounds.logg
    )]
    ParameterOutOfBounds {
        teff: f64,
        logg: f64,
        bounds: ModelBounds,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<GridError> for ReadError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::AgeOutOfRange { age, min, max } => ReadError::AgeOutOfRange { age, min, max },
            other => ReadError::InvalidArgument(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_age_errors_map_to_age_out_of_range() {
        let err: ReadError = GridError::AgeOutOfRange {
            age: 1.0,
            min: 10.0,
            max: 100.0,
        }
        .into();
        assert_eq!(
            err,
            ReadError::AgeOutOfRange {
                age: 1.0,
                min: 10.0,
                max: 100.0
            }
        );
    }

    #[test]
    fn unknown_tag_message_names_the_dataset_kind() {
        let err = ReadError::UnknownTag {
            kind: DatasetKind::Model,
            tag: "ames-cond".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No model spectrum grid is stored under the tag 'ames-cond'"
        );
    }
}
