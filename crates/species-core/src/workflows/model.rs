use crate::core::constants::{GRAVITY, M_JUP, PARSEC};
use crate::core::models::spectrum::{ModelBounds, ModelGrid, Spectrum};
use crate::core::photometry::{Magnitude, SyntheticPhotometry};
use crate::engine::catalog::Datastore;
use crate::engine::error::ReadError;
use tracing::{debug, instrument};

/// Distance (pc) at which absolute magnitudes are defined.
pub const ABSOLUTE_DISTANCE: f64 = 10.0;

/// Physical parameters of a model spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    /// Effective temperature (K).
    pub teff: f64,
    /// Surface gravity, log10(g / cm s^-2).
    pub logg: f64,
    /// Mass (M_Jup); together with `logg` it sets the radius.
    pub mass: f64,
    /// Distance (pc).
    pub distance: f64,
}

impl ModelParams {
    /// Parameters at the absolute-magnitude distance of 10 pc.
    pub fn new(teff: f64, logg: f64, mass: f64) -> Self {
        Self {
            teff,
            logg,
            mass,
            distance: ABSOLUTE_DISTANCE,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Radius (m) implied by the mass and surface gravity.
    pub fn radius(&self) -> f64 {
        let gravity = 10f64.powf(self.logg) * 1e-2;
        (GRAVITY * self.mass * M_JUP / gravity).sqrt()
    }

    /// Dilution factor (R / d)^2 from the stellar surface to the observer.
    pub fn dilution(&self) -> f64 {
        (self.radius() / (self.distance * PARSEC)).powi(2)
    }
}

/// Reads interpolated spectra from a model grid and integrates them through one
/// filter.
#[derive(Debug, Clone)]
pub struct ModelReader<'a> {
    model: String,
    filter_id: String,
    grid: &'a ModelGrid,
    photometry: SyntheticPhotometry<'a>,
}

impl<'a> ModelReader<'a> {
    /// Binds the model grid `model`, the profile of `filter_id` and the Vega spectrum.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::UnknownTag`], [`ReadError::FilterNotFound`] or
    /// [`ReadError::MissingZeroPoint`] if a dataset is absent from the store.
    pub fn new<D: Datastore + ?Sized>(
        store: &'a D,
        model: &str,
        filter_id: &str,
    ) -> Result<Self, ReadError> {
        let grid = store.get_model_grid(model)?;
        let profile = store.get_transmission(filter_id)?;
        let zero_point = store.zero_point_spectrum()?;
        Ok(Self {
            model: model.to_string(),
            filter_id: filter_id.to_string(),
            grid,
            photometry: SyntheticPhotometry::new(profile, zero_point),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    pub fn photometry(&self) -> &SyntheticPhotometry<'a> {
        &self.photometry
    }

    pub fn bounds(&self) -> ModelBounds {
        self.grid.bounds()
    }

    /// Whether `(teff, logg)` lies inside the grid, bounds included.
    pub fn contains(&self, teff: f64, logg: f64) -> bool {
        self.bounds().contains(teff, logg)
    }

    /// The model spectrum at `params`, as observed from `params.distance`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::ParameterOutOfBounds`] outside the grid.
    #[instrument(skip_all, level = "debug", fields(model = %self.model))]
    pub fn get_model(&self, params: &ModelParams) -> Result<Spectrum, ReadError> {
        let spectrum = self
            .grid
            .interpolate(params.teff, params.logg)
            .ok_or(ReadError::ParameterOutOfBounds {
                teff: params.teff,
                logg: params.logg,
                bounds: self.bounds(),
            })?;
        let dilution = params.dilution();
        debug!(
            "Interpolated spectrum at teff = {}, logg = {}; dilution factor {:e}",
            params.teff, params.logg, dilution
        );
        Ok(spectrum.scaled(dilution))
    }

    /// Filter-averaged flux density (W m^-2 um^-1) of the model at `params`.
    pub fn get_flux(&self, params: &ModelParams) -> Result<f64, ReadError> {
        let spectrum = self.get_model(params)?;
        Ok(self
            .photometry
            .spectrum_to_flux(spectrum.wavelength(), spectrum.flux()))
    }

    /// Apparent magnitude at `params.distance` and the corresponding absolute
    /// magnitude.
    pub fn get_magnitude(&self, params: &ModelParams) -> Result<Magnitude, ReadError> {
        let spectrum = self.get_model(params)?;
        Ok(self.photometry.spectrum_to_magnitude(
            spectrum.wavelength(),
            spectrum.flux(),
            Some(params.distance),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::DatasetKind;
    use crate::workflows::fixtures::{J, database, database_without_vega};

    #[test]
    fn new_requires_every_dataset() {
        let db = database();
        assert!(matches!(
            ModelReader::new(&db, "missing", J),
            Err(ReadError::UnknownTag {
                kind: DatasetKind::Model,
                ..
            })
        ));
        assert!(matches!(
            ModelReader::new(&db, "plane", "Paranal/NACO.Lp"),
            Err(ReadError::FilterNotFound { .. })
        ));
        let db = database_without_vega();
        assert!(matches!(
            ModelReader::new(&db, "plane", J),
            Err(ReadError::MissingZeroPoint(_))
        ));
    }

    #[test]
    fn bounds_are_inclusive() {
        let db = database();
        let reader = ModelReader::new(&db, "plane", J).unwrap();
        assert_eq!(reader.bounds().teff, (1500.0, 3000.0));
        assert_eq!(reader.bounds().logg, (3.5, 5.5));
        assert!(reader.contains(1500.0, 5.5));
        assert!(!reader.contains(1499.9, 4.0));
        assert!(!reader.contains(2000.0, f64::NAN));

        let edge = reader.get_model(&ModelParams::new(3000.0, 5.5, 20.0)).unwrap();
        assert!(edge.flux().iter().all(|f| f.is_finite() && *f > 0.0));
        assert!(matches!(
            reader.get_model(&ModelParams::new(3000.1, 5.5, 20.0)),
            Err(ReadError::ParameterOutOfBounds { .. })
        ));
    }

    #[test]
    fn get_model_scales_by_the_dilution_factor() {
        let db = database();
        let reader = ModelReader::new(&db, "plane", J).unwrap();
        let params = ModelParams::new(2250.0, 4.25, 20.0);
        let spectrum = reader.get_model(&params).unwrap();

        let radius = (GRAVITY * 20.0 * M_JUP / (10f64.powf(4.25) * 1e-2)).sqrt();
        let expected = (2.25 + 4.25) * (radius / (10.0 * PARSEC)).powi(2);
        assert!(spectrum.flux().iter().all(|f| (f / expected - 1.0).abs() < 1e-12));
    }

    #[test]
    fn parameters_outside_the_grid_are_rejected() {
        let db = database();
        let reader = ModelReader::new(&db, "plane", J).unwrap();
        let result = reader.get_model(&ModelParams::new(4000.0, 4.0, 10.0));
        assert!(matches!(
            result,
            Err(ReadError::ParameterOutOfBounds { teff: 4000.0, .. })
        ));
    }

    #[test]
    fn magnitudes_follow_the_distance_modulus() {
        let db = database();
        let reader = ModelReader::new(&db, "plane", J).unwrap();
        let params = ModelParams::new(2000.0, 4.5, 30.0);

        let near = reader.get_magnitude(&params).unwrap();
        assert!((near.apparent - near.absolute.unwrap()).abs() < 1e-12);

        let far = reader.get_magnitude(&params.with_distance(100.0)).unwrap();
        assert!((far.apparent - near.apparent - 5.0).abs() < 1e-9);
        assert!((far.absolute.unwrap() - near.absolute.unwrap()).abs() < 1e-9);

        let flux = reader.get_flux(&params).unwrap();
        let zero_point = reader.photometry().zero_point();
        assert!((near.apparent - (0.03 - 2.5 * (flux / zero_point).log10())).abs() < 1e-12);
    }
}
