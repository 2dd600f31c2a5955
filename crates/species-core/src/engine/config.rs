use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid {name} [{min}, {max}]: bounds must be finite with min < max")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("Spectral resolution must be finite and positive, got {0}")]
    InvalidResolution(f64),
    #[error("Wavelength range must be positive, got [{min}, {max}] um")]
    NonPositiveWavelength { min: f64, max: f64 },
}

/// Restrictions applied when a model spectrum grid is added to a database.
///
/// All ranges are inclusive. Without `spec_res` the spectra keep their native
/// sampling and are only trimmed to `wavel_range`; with it they are rebinned onto
/// a logarithmic grid of that resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelOptions {
    /// Wavelength range (um).
    pub wavel_range: Option<(f64, f64)>,
    /// Spectral resolution (lambda / delta lambda) of the resampled spectra.
    pub spec_res: Option<f64>,
    /// Effective temperature range (K).
    pub teff_range: Option<(f64, f64)>,
    /// Surface gravity range (dex).
    pub logg_range: Option<(f64, f64)>,
}

impl ModelOptions {
    pub fn builder() -> ModelOptionsBuilder {
        ModelOptionsBuilder::new()
    }
}

#[derive(Default)]
pub struct ModelOptionsBuilder {
    wavel_range: Option<(f64, f64)>,
    spec_res: Option<f64>,
    teff_range: Option<(f64, f64)>,
    logg_range: Option<(f64, f64)>,
}

fn check_range(name: &'static str, range: Option<(f64, f64)>) -> Result<(), ConfigError> {
    match range {
        Some((min, max)) if !(min.is_finite() && max.is_finite() && min < max) => {
            Err(ConfigError::InvalidRange { name, min, max })
        }
        _ => Ok(()),
    }
}

impl ModelOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wavel_range(mut self, min: f64, max: f64) -> Self {
        self.wavel_range = Some((min, max));
        self
    }
    pub fn spec_res(mut self, resolution: f64) -> Self {
        self.spec_res = Some(resolution);
        self
    }
    pub fn teff_range(mut self, min: f64, max: f64) -> Self {
        self.teff_range = Some((min, max));
        self
    }
    pub fn logg_range(mut self, min: f64, max: f64) -> Self {
        self.logg_range = Some((min, max));
        self
    }

    pub fn build(self) -> Result<ModelOptions, ConfigError> {
        check_range("wavelength range", self.wavel_range)?;
        check_range("teff range", self.teff_range)?;
        check_range("logg range", self.logg_range)?;

        if let Some((min, max)) = self.wavel_range.filter(|&(min, _)| min <= 0.0) {
            return Err(ConfigError::NonPositiveWavelength { min, max });
        }
        if let Some(resolution) = self.spec_res.filter(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(ConfigError::InvalidResolution(resolution));
        }

        Ok(ModelOptions {
            wavel_range: self.wavel_range,
            spec_res: self.spec_res,
            teff_range: self.teff_range,
            logg_range: self.logg_range,
        })
    }
}
