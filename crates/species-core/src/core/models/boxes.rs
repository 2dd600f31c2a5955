//! Value objects returned by isochrone queries.
//!
//! Every sequence in a box is aligned index-for-index with the masses that were
//! requested; entries that could not be computed are NaN.

use super::isochrone::IsochroneModel;

/// Object type tag of boxes derived from model spectra.
pub const MODEL_OBJECT_TYPE: &str = "model";

/// A pair of filters whose magnitude difference defines a color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPair {
    pub first: String,
    pub second: String,
}

impl FilterPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl From<(&str, &str)> for FilterPair {
    fn from((first, second): (&str, &str)) -> Self {
        Self::new(first, second)
    }
}

impl std::fmt::Display for FilterPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.first, self.second)
    }
}

/// Isochrone at a single age, computed from the magnitudes tabulated in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneBox {
    pub model: IsochroneModel,
    pub age: f64,
    pub filters_color: FilterPair,
    pub filter_mag: String,
    pub color: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub teff: Vec<f64>,
    pub logg: Vec<f64>,
    pub masses: Vec<f64>,
}

/// Color-magnitude relation synthesized from a model spectrum grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMagBox {
    pub library: String,
    pub object_type: String,
    pub filters_color: FilterPair,
    pub filter_mag: String,
    pub color: Vec<f64>,
    pub magnitude: Vec<f64>,
    /// Spectral-type proxy; for model boxes this is the mass in M_Jup.
    pub sptype: Vec<f64>,
    pub names: Option<Vec<String>>,
}

/// Color-color relation synthesized from a model spectrum grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorColorBox {
    pub library: String,
    pub object_type: String,
    pub filters: (FilterPair, FilterPair),
    pub color1: Vec<f64>,
    pub color2: Vec<f64>,
    /// Spectral-type proxy; for model boxes this is the mass in M_Jup.
    pub sptype: Vec<f64>,
    pub names: Option<Vec<String>>,
}
