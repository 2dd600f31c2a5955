//! Synthetic photometry: filter-averaged fluxes and magnitudes in the Vega system.

use crate::core::constants::VEGA_MAG;
use crate::core::interpolate::trapezoid;
use crate::core::models::filter::{DetectorType, FilterProfile};
use crate::core::models::spectrum::Spectrum;
use tracing::warn;

/// Transmission above which a spectrum edge is considered to cut into the passband.
const EDGE_TRANSMISSION_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnitude {
    pub apparent: f64,
    /// Only available when the distance of the source is known.
    pub absolute: Option<f64>,
}

/// Converts spectra into fluxes and magnitudes through one filter.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPhotometry<'a> {
    profile: &'a FilterProfile,
    zero_point_flux: f64,
    vega_mag: f64,
}

impl<'a> SyntheticPhotometry<'a> {
    /// `zero_point` is the spectrum of Vega that defines the photometric system. Its
    /// flux through the filter is integrated once here.
    pub fn new(profile: &'a FilterProfile, zero_point: &Spectrum) -> Self {
        Self {
            profile,
            zero_point_flux: filter_averaged_flux(
                profile,
                zero_point.wavelength(),
                zero_point.flux(),
            ),
            vega_mag: VEGA_MAG,
        }
    }

    pub fn with_vega_mag(mut self, vega_mag: f64) -> Self {
        self.vega_mag = vega_mag;
        self
    }

    pub fn profile(&self) -> &FilterProfile {
        self.profile
    }

    /// Filter-averaged flux density of a spectrum.
    ///
    /// Only spectrum points inside the filter's wavelength range contribute. Returns
    /// NaN when fewer than two points remain or the two slices differ in length.
    pub fn spectrum_to_flux(&self, wavelength: &[f64], flux: &[f64]) -> f64 {
        filter_averaged_flux(self.profile, wavelength, flux)
    }

    /// Flux of the zero-point spectrum through the filter.
    pub fn zero_point(&self) -> f64 {
        self.zero_point_flux
    }

    /// Vega magnitude of a spectrum; the absolute magnitude is computed when the
    /// distance (pc) is given.
    pub fn spectrum_to_magnitude(
        &self,
        wavelength: &[f64],
        flux: &[f64],
        distance: Option<f64>,
    ) -> Magnitude {
        let flux = self.spectrum_to_flux(wavelength, flux);
        let apparent = self.vega_mag - 2.5 * (flux / self.zero_point_flux).log10();
        Magnitude {
            apparent,
            absolute: distance.map(|d| apparent - 5.0 * d.log10() + 5.0),
        }
    }
}

fn filter_averaged_flux(profile: &FilterProfile, wavelength: &[f64], flux: &[f64]) -> f64 {
    if wavelength.len() != flux.len() {
        warn!(
            "Spectrum has {} wavelengths but {} flux values; the synthetic flux is NaN.",
            wavelength.len(),
            flux.len()
        );
        return f64::NAN;
    }

    let (Some(&first), Some(&last)) = (wavelength.first(), wavelength.last()) else {
        warn!("Cannot compute a synthetic flux from an empty spectrum.");
        return f64::NAN;
    };

    let edge_transmission = [
        profile.transmission_at(first),
        profile.transmission_at(last),
    ];
    if edge_transmission
        .iter()
        .any(|&t| t > EDGE_TRANSMISSION_THRESHOLD)
    {
        warn!(
            "The spectrum ({:.3}-{:.3} um) does not fully cover the filter profile ({:.3}-{:.3} um).",
            first,
            last,
            profile.wavel_range().0,
            profile.wavel_range().1
        );
    }

    let (lower, upper) = profile.wavel_range();
    let inside: Vec<usize> = (0..wavelength.len())
        .filter(|&i| wavelength[i] >= lower && wavelength[i] <= upper)
        .collect();
    if inside.len() < 2 {
        warn!(
            "Only {} spectrum point(s) fall within the filter profile; the synthetic flux is NaN.",
            inside.len()
        );
        return f64::NAN;
    }

    let w: Vec<f64> = inside.iter().map(|&i| wavelength[i]).collect();
    let t: Vec<f64> = w.iter().map(|&x| profile.transmission_at(x)).collect();

    let (numerator, denominator): (Vec<f64>, Vec<f64>) = match profile.detector() {
        DetectorType::Energy => inside
            .iter()
            .zip(&t)
            .map(|(&i, &ti)| (ti * flux[i], ti))
            .unzip(),
        DetectorType::Photon => inside
            .iter()
            .zip(&t)
            .map(|(&i, &ti)| (wavelength[i] * ti * flux[i], wavelength[i] * ti))
            .unzip(),
    };

    trapezoid(&numerator, &w) / trapezoid(&denominator, &w)
}
