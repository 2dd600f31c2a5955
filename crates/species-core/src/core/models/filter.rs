use crate::core::interpolate::{interp1d, trapezoid};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// How the detector behind a filter counts incoming light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorType {
    /// Energy-counting detector (bolometer-like).
    #[default]
    Energy,
    /// Photon-counting detector (CCD-like); the integrand is weighted by wavelength.
    Photon,
}

impl fmt::Display for DetectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorType::Energy => write!(f, "energy"),
            DetectorType::Photon => write!(f, "photon"),
        }
    }
}

impl FromStr for DetectorType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "energy" => Ok(DetectorType::Energy),
            "photon" => Ok(DetectorType::Photon),
            _ => Err(FilterError::UnknownDetector(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("Wavelength and transmission lengths differ ({wavelength} vs {transmission})")]
    LengthMismatch {
        wavelength: usize,
        transmission: usize,
    },
    #[error("Filter profile has {0} usable points after cleaning, at least 2 are required")]
    TooShort(usize),
    #[error("Filter wavelengths must be strictly increasing (violated at index {0})")]
    NotIncreasing(usize),
    #[error("Non-finite {column} value {value} at index {index}")]
    NonFinite {
        column: &'static str,
        index: usize,
        value: f64,
    },
    #[error("Unknown detector type '{0}'. Expected 'energy' or 'photon'.")]
    UnknownDetector(String),
}

/// Transmission curve of a photometric filter (wavelength in um).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterProfile {
    wavelength: Vec<f64>,
    transmission: Vec<f64>,
    detector: DetectorType,
}

impl FilterProfile {
    /// Builds a profile, cleaning the raw curve first.
    ///
    /// Every value must be finite. Runs of zero transmission are trimmed to a single zero on each side of the
    /// passband. If any transmission is negative only the strictly positive points
    /// are kept.
    pub fn new(
        wavelength: Vec<f64>,
        transmission: Vec<f64>,
        detector: DetectorType,
    ) -> Result<Self, FilterError> {
        if wavelength.len() != transmission.len() {
            return Err(FilterError::LengthMismatch {
                wavelength: wavelength.len(),
                transmission: transmission.len(),
            });
        }

        for (column, values) in [("wavelength", &wavelength), ("transmission", &transmission)] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(FilterError::NonFinite {
                    column,
                    index,
                    value: values[index],
                });
            }
        }

        let (mut wavelength, mut transmission) = trim_zero_runs(wavelength, transmission);

        if transmission.iter().any(|&t| t < 0.0) {
            let min = transmission.iter().copied().fold(f64::INFINITY, f64::min);
            warn!(
                "Minimum transmission of the filter profile is negative ({:.2e}); points with a non-positive transmission are removed.",
                min
            );
            let (w, t): (Vec<f64>, Vec<f64>) = wavelength
                .into_iter()
                .zip(transmission)
                .filter(|&(_, t)| t > 0.0)
                .unzip();
            wavelength = w;
            transmission = t;
        }

        if wavelength.len() < 2 {
            return Err(FilterError::TooShort(wavelength.len()));
        }
        if let Some(index) = wavelength.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FilterError::NotIncreasing(index + 1));
        }

        Ok(Self {
            wavelength,
            transmission,
            detector,
        })
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn transmission(&self) -> &[f64] {
        &self.transmission
    }

    pub fn detector(&self) -> DetectorType {
        self.detector
    }

    pub fn wavel_range(&self) -> (f64, f64) {
        (self.wavelength[0], self.wavelength[self.wavelength.len() - 1])
    }

    /// Linearly interpolated transmission, NaN outside the profile.
    pub fn transmission_at(&self, wavelength: f64) -> f64 {
        interp1d(&self.wavelength, &self.transmission, wavelength)
    }

    /// Transmission-weighted mean wavelength.
    pub fn mean_wavelength(&self) -> f64 {
        let weighted: Vec<f64> = self
            .wavelength
            .iter()
            .zip(&self.transmission)
            .map(|(w, t)| w * t)
            .collect();
        trapezoid(&weighted, &self.wavelength) / trapezoid(&self.transmission, &self.wavelength)
    }
}

/// Removes points inside runs of zero transmission, keeping the zeros adjacent to
/// non-zero points.
fn trim_zero_runs(wavelength: Vec<f64>, transmission: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let n = transmission.len();
    let is_zero = |i: usize| transmission[i] == 0.0;
    let redundant = |i: usize| {
        if n < 2 {
            false
        } else if i == 0 {
            is_zero(0) && is_zero(1)
        } else if i == n - 1 {
            is_zero(n - 2) && is_zero(n - 1)
        } else {
            is_zero(i - 1) && is_zero(i) && is_zero(i + 1)
        }
    };

    let keep: Vec<usize> = (0..n).filter(|&i| !redundant(i)).collect();
    (
        keep.iter().map(|&i| wavelength[i]).collect(),
        keep.iter().map(|&i| transmission[i]).collect(),
    )
}
