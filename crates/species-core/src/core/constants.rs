//! Physical constants (SI units unless noted).

pub const GRAVITY: f64 = 6.67430e-11;
pub const PARSEC: f64 = 3.08567758149137e16;

// IAU 2015 nominal masses, GM / G with the CODATA 2018 value of G.
pub const M_SUN: f64 = 1.988409870698051e30;
pub const M_JUP: f64 = 1.8981245973360505e27;
pub const R_JUP: f64 = 7.1492e7;

/// Magnitude of Vega in every filter of the Vega system.
pub const VEGA_MAG: f64 = 0.03;

/// Solar masses to Jupiter masses.
pub fn msun_to_mjup(mass: f64) -> f64 {
    mass * M_SUN / M_JUP
}

/// Radius in units of 10^9 cm to Jupiter radii.
pub fn gcm_to_rjup(radius: f64) -> f64 {
    radius * 1e7 / R_JUP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_mass_in_jupiter_masses_matches_nominal_ratio() {
        let ratio = msun_to_mjup(1.0);
        assert!((ratio / 1047.5655146604772 - 1.0).abs() < 1e-12, "got {ratio}");
    }

    #[test]
    fn masses_follow_the_nominal_gravitational_parameters() {
        assert!((GRAVITY * M_SUN / 1.3271244e20 - 1.0).abs() < 1e-12);
        assert!((GRAVITY * M_JUP / 1.2668653e17 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn jupiter_radius_round_trips_through_gcm() {
        let r = gcm_to_rjup(R_JUP / 1e7);
        assert!((r - 1.0).abs() < 1e-12);
    }
}
