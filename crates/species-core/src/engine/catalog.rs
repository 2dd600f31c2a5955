//! Collaborator interfaces through which readers reach stored datasets.

use super::error::ReadError;
use crate::core::models::filter::FilterProfile;
use crate::core::models::isochrone::IsochroneGrid;
use crate::core::models::spectrum::{ModelGrid, Spectrum};

/// Retrieval of named grids.
pub trait GridStore {
    /// # Errors
    ///
    /// Returns [`ReadError::UnknownTag`] if no isochrone grid is stored under `tag`.
    fn get_isochrone_grid(&self, tag: &str) -> Result<&IsochroneGrid, ReadError>;

    /// # Errors
    ///
    /// Returns [`ReadError::UnknownTag`] if no model grid is stored under `tag`.
    fn get_model_grid(&self, tag: &str) -> Result<&ModelGrid, ReadError>;
}

/// Filter transmission curves and the spectrum defining the photometric system.
pub trait PhotometricFilterCatalog {
    /// # Errors
    ///
    /// Returns [`ReadError::FilterNotFound`] for an unknown filter identifier.
    fn get_transmission(&self, filter_id: &str) -> Result<&FilterProfile, ReadError>;

    /// The spectrum of Vega.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::MissingZeroPoint`] if it has not been added.
    fn zero_point_spectrum(&self) -> Result<&Spectrum, ReadError>;
}

/// Everything a reader needs from a store.
pub trait Datastore: GridStore + PhotometricFilterCatalog {}

impl<T: GridStore + PhotometricFilterCatalog + ?Sized> Datastore for T {}
