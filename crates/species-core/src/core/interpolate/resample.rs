//! Wavelength grids and flux-conserving resampling of spectra.

/// Number of points of the sample grid used to estimate the native resolution of a
/// logarithmic wavelength grid.
const SAMPLE_POINTS: usize = 100;

/// Logarithmically spaced wavelengths covering `range` that sample a spectral
/// resolution of `resolution` with two points per resolution element.
pub fn log_wavelengths(range: (f64, f64), resolution: f64) -> Vec<f64> {
    let (lower, upper) = range;
    let samples = logspace(lower, upper, SAMPLE_POINTS);
    let mean_resolution = samples
        .windows(2)
        .map(|w| 0.5 * (w[1] + w[0]) / (w[1] - w[0]))
        .sum::<f64>()
        / (SAMPLE_POINTS - 1) as f64;

    let n = (2.0 * SAMPLE_POINTS as f64 * resolution / mean_resolution).ceil() as usize + 1;
    logspace(lower, upper, n.max(2))
}

fn logspace(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    let (log_lower, log_upper) = (lower.log10(), upper.log10());
    let step = (log_upper - log_lower) / (n - 1) as f64;
    let mut values: Vec<f64> = (0..n)
        .map(|i| 10f64.powf(log_lower + i as f64 * step))
        .collect();
    values[0] = lower;
    values[n - 1] = upper;
    values
}

/// Bin edges around the points of a wavelength grid: midpoints between neighbours,
/// extrapolated by half a bin at both ends.
fn bin_edges(wavelength: &[f64]) -> Vec<f64> {
    let n = wavelength.len();
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(wavelength[0] - 0.5 * (wavelength[1] - wavelength[0]));
    edges.extend(wavelength.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    edges.push(wavelength[n - 1] + 0.5 * (wavelength[n - 1] - wavelength[n - 2]));
    edges
}

/// Rebins `old_flux` sampled at `old_wavelength` onto `new_wavelength`, conserving the
/// integrated flux. Old bins that partially overlap a new bin contribute in
/// proportion to the overlap. New bins extending beyond the old grid are NaN.
pub fn resample_flux(old_wavelength: &[f64], old_flux: &[f64], new_wavelength: &[f64]) -> Vec<f64> {
    if old_wavelength.len() < 2
        || old_wavelength.len() != old_flux.len()
        || new_wavelength.len() < 2
    {
        return vec![f64::NAN; new_wavelength.len()];
    }

    let old_edges = bin_edges(old_wavelength);
    let new_edges = bin_edges(new_wavelength);
    let (old_first, old_last) = (old_edges[0], old_edges[old_edges.len() - 1]);
    let inner = &old_edges[1..];

    new_edges
        .windows(2)
        .map(|bin| {
            let (lo, hi) = (bin[0], bin[1]);
            if lo < old_first || hi > old_last {
                return f64::NAN;
            }

            let start = inner.partition_point(|&edge| edge <= lo);
            let stop = inner.partition_point(|&edge| edge < hi);
            if start == stop {
                return old_flux[start];
            }

            let mut weighted = 0.0;
            let mut total = 0.0;
            for k in start..=stop {
                let width = if k == start {
                    old_edges[k + 1] - lo
                } else if k == stop {
                    hi - old_edges[k]
                } else {
                    old_edges[k + 1] - old_edges[k]
                };
                weighted += width * old_flux[k];
                total += width;
            }
            weighted / total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interpolate::linear::linspace;

    #[test]
    fn log_wavelengths_span_the_range_and_increase() {
        let grid = log_wavelengths((1.0, 5.0), 100.0);
        assert_eq!(grid[0], 1.0);
        assert_eq!(*grid.last().unwrap(), 5.0);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn log_wavelengths_sample_twice_per_resolution_element() {
        let resolution = 100.0;
        let grid = log_wavelengths((1.0, 5.0), resolution);
        let mid = grid.len() / 2;
        let sampling = grid[mid] / (grid[mid + 1] - grid[mid]);
        assert!(
            (sampling / (2.0 * resolution) - 1.0).abs() < 0.02,
            "sampling {sampling}"
        );
    }

    #[test]
    fn constant_flux_is_preserved() {
        let old = linspace(1.0, 2.0, 101);
        let flux = vec![3.5; old.len()];
        let new = linspace(1.1, 1.9, 17);
        let resampled = resample_flux(&old, &flux, &new);
        assert!(resampled.iter().all(|f| (f - 3.5).abs() < 1e-12));
    }

    #[test]
    fn integrated_flux_is_conserved_for_a_linear_spectrum() {
        let old = linspace(1.0, 2.0, 201);
        let flux: Vec<f64> = old.iter().map(|w| 2.0 * w + 1.0).collect();
        let new = linspace(1.2, 1.8, 13);
        let resampled = resample_flux(&old, &flux, &new);
        for (w, f) in new.iter().zip(&resampled) {
            assert!((f - (2.0 * w + 1.0)).abs() < 1e-9, "at {w}: {f}");
        }
    }

    #[test]
    fn bins_beyond_the_old_grid_are_nan() {
        let old = linspace(1.0, 2.0, 11);
        let flux = vec![1.0; 11];
        let new = [0.5, 1.5, 2.5];
        let resampled = resample_flux(&old, &flux, &new);
        assert!(resampled[0].is_nan());
        assert!(resampled[2].is_nan());
    }
}
