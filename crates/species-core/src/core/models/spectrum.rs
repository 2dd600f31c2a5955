use crate::core::interpolate::{bilinear, resample_flux};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("A spectrum needs at least 2 points, found {0}")]
    TooShort(usize),
    #[error("Wavelength and flux lengths differ ({wavelength} vs {flux})")]
    LengthMismatch { wavelength: usize, flux: usize },
    #[error("Wavelengths must be finite and strictly increasing (violated at index {0})")]
    NotIncreasing(usize),
}

/// A spectrum with wavelengths in um and flux density in W m^-2 um^-1.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

fn check_wavelengths(wavelength: &[f64]) -> Result<(), SpectrumError> {
    if wavelength.len() < 2 {
        return Err(SpectrumError::TooShort(wavelength.len()));
    }
    if let Some(index) = wavelength.iter().position(|w| !w.is_finite()) {
        return Err(SpectrumError::NotIncreasing(index));
    }
    if let Some(index) = wavelength.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SpectrumError::NotIncreasing(index + 1));
    }
    Ok(())
}

impl Spectrum {
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavelength.len() != flux.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelength: wavelength.len(),
                flux: flux.len(),
            });
        }
        check_wavelengths(&wavelength)?;
        Ok(Self { wavelength, flux })
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn wavel_range(&self) -> (f64, f64) {
        (self.wavelength[0], self.wavelength[self.wavelength.len() - 1])
    }

    /// Multiplies the flux by a constant factor.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.flux.iter_mut().for_each(|f| *f *= factor);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelGridError {
    #[error("Model grid contains no spectra")]
    Empty,
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
    #[error("The {0} axis of the model grid must be finite and strictly increasing")]
    AxisNotIncreasing(&'static str),
    #[error("Flux array has {found} values but the grid shape requires {expected}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("Grid node (teff = {teff}, logg = {logg}) appears more than once")]
    DuplicateNode { teff: f64, logg: f64 },
    #[error("Grid node (teff = {teff}, logg = {logg}) is missing; model grids must be regular")]
    MissingNode { teff: f64, logg: f64 },
    #[error("Spectrum at (teff = {teff}, logg = {logg}) uses a different wavelength grid")]
    WavelengthMismatch { teff: f64, logg: f64 },
    #[error("The requested {0} selects no part of the model grid")]
    EmptySelection(&'static str),
}

/// Parameter bounds of a model grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub teff: (f64, f64),
    pub logg: (f64, f64),
}

impl ModelBounds {
    /// Inclusive containment test.
    pub fn contains(&self, teff: f64, logg: f64) -> bool {
        teff >= self.teff.0 && teff <= self.teff.1 && logg >= self.logg.0 && logg <= self.logg.1
    }
}

/// A regular grid of model spectra over effective temperature and surface gravity.
///
/// Flux is stored row-major as `[teff][logg][wavelength]`; every node shares the
/// same wavelength axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGrid {
    teff: Vec<f64>,
    logg: Vec<f64>,
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

fn check_axis(axis: &[f64], name: &'static str) -> Result<(), ModelGridError> {
    if axis.is_empty() {
        return Err(ModelGridError::Empty);
    }
    let increasing = axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[1] > w[0]);
    if increasing {
        Ok(())
    } else {
        Err(ModelGridError::AxisNotIncreasing(name))
    }
}

impl ModelGrid {
    pub fn new(
        teff: Vec<f64>,
        logg: Vec<f64>,
        wavelength: Vec<f64>,
        flux: Vec<f64>,
    ) -> Result<Self, ModelGridError> {
        check_axis(&teff, "teff")?;
        check_axis(&logg, "logg")?;
        check_wavelengths(&wavelength)?;

        let expected = teff.len() * logg.len() * wavelength.len();
        if flux.len() != expected {
            return Err(ModelGridError::ShapeMismatch {
                expected,
                found: flux.len(),
            });
        }

        Ok(Self {
            teff,
            logg,
            wavelength,
            flux,
        })
    }

    /// Assembles a grid from individual `(teff, logg, spectrum)` nodes.
    ///
    /// The nodes may come in any order but must cover every combination of the
    /// distinct teff and logg values exactly once and share one wavelength axis.
    pub fn from_spectra(nodes: Vec<(f64, f64, Spectrum)>) -> Result<Self, ModelGridError> {
        let first = nodes.first().ok_or(ModelGridError::Empty)?;
        let wavelength = first.2.wavelength().to_vec();

        let mut by_node: BTreeMap<(u64, u64), (f64, f64, Vec<f64>)> = BTreeMap::new();
        for (teff, logg, spectrum) in nodes {
            if spectrum.wavelength() != wavelength.as_slice() {
                return Err(ModelGridError::WavelengthMismatch { teff, logg });
            }
            let key = (ordered_bits(teff), ordered_bits(logg));
            if by_node.insert(key, (teff, logg, spectrum.flux)).is_some() {
                return Err(ModelGridError::DuplicateNode { teff, logg });
            }
        }

        let mut teff_axis: Vec<f64> = by_node.values().map(|n| n.0).collect();
        teff_axis.sort_by(f64::total_cmp);
        teff_axis.dedup();
        let mut logg_axis: Vec<f64> = by_node.values().map(|n| n.1).collect();
        logg_axis.sort_by(f64::total_cmp);
        logg_axis.dedup();

        let mut flux = Vec::with_capacity(teff_axis.len() * logg_axis.len() * wavelength.len());
        for &teff in &teff_axis {
            for &logg in &logg_axis {
                let node = by_node
                    .remove(&(ordered_bits(teff), ordered_bits(logg)))
                    .ok_or(ModelGridError::MissingNode { teff, logg })?;
                flux.extend_from_slice(&node.2);
            }
        }

        Self::new(teff_axis, logg_axis, wavelength, flux)
    }

    pub fn teff(&self) -> &[f64] {
        &self.teff
    }

    pub fn logg(&self) -> &[f64] {
        &self.logg
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn node_count(&self) -> usize {
        self.teff.len() * self.logg.len()
    }

    pub fn bounds(&self) -> ModelBounds {
        ModelBounds {
            teff: (self.teff[0], self.teff[self.teff.len() - 1]),
            logg: (self.logg[0], self.logg[self.logg.len() - 1]),
        }
    }

    /// Flux of the node at `(teff index, logg index)`.
    pub fn flux_at(&self, i: usize, j: usize) -> &[f64] {
        let n = self.wavelength.len();
        let start = (i * self.logg.len() + j) * n;
        &self.flux[start..start + n]
    }

    /// Every node as `(teff, logg, flux)`, teff-major.
    pub fn nodes(&self) -> impl Iterator<Item = (f64, f64, &[f64])> + '_ {
        self.teff.iter().enumerate().flat_map(move |(i, &teff)| {
            self.logg
                .iter()
                .enumerate()
                .map(move |(j, &logg)| (teff, logg, self.flux_at(i, j)))
        })
    }

    /// Bilinear interpolation of the flux at `(teff, logg)`; `None` outside the grid.
    pub fn interpolate(&self, teff: f64, logg: f64) -> Option<Spectrum> {
        let weights = bilinear(&self.teff, &self.logg, teff, logg)?;
        let mut flux = vec![0.0; self.wavelength.len()];
        for (i, j, w) in weights.corners() {
            for (out, &value) in flux.iter_mut().zip(self.flux_at(i, j)) {
                *out += w * value;
            }
        }
        Some(Spectrum {
            wavelength: self.wavelength.clone(),
            flux,
        })
    }

    /// Restricts the grid to inclusive parameter and wavelength ranges.
    pub fn select(
        &self,
        teff_range: Option<(f64, f64)>,
        logg_range: Option<(f64, f64)>,
        wavel_range: Option<(f64, f64)>,
    ) -> Result<Self, ModelGridError> {
        let within = |range: Option<(f64, f64)>, v: f64| {
            range.is_none_or(|(lower, upper)| v >= lower && v <= upper)
        };
        let teff_idx: Vec<usize> = (0..self.teff.len())
            .filter(|&i| within(teff_range, self.teff[i]))
            .collect();
        let logg_idx: Vec<usize> = (0..self.logg.len())
            .filter(|&j| within(logg_range, self.logg[j]))
            .collect();
        let wavel_idx: Vec<usize> = (0..self.wavelength.len())
            .filter(|&k| within(wavel_range, self.wavelength[k]))
            .collect();

        if teff_idx.is_empty() {
            return Err(ModelGridError::EmptySelection("teff range"));
        }
        if logg_idx.is_empty() {
            return Err(ModelGridError::EmptySelection("logg range"));
        }
        if wavel_idx.len() < 2 {
            return Err(ModelGridError::EmptySelection("wavelength range"));
        }

        let mut flux = Vec::with_capacity(teff_idx.len() * logg_idx.len() * wavel_idx.len());
        for &i in &teff_idx {
            for &j in &logg_idx {
                let node = self.flux_at(i, j);
                flux.extend(wavel_idx.iter().map(|&k| node[k]));
            }
        }

        Self::new(
            teff_idx.iter().map(|&i| self.teff[i]).collect(),
            logg_idx.iter().map(|&j| self.logg[j]).collect(),
            wavel_idx.iter().map(|&k| self.wavelength[k]).collect(),
            flux,
        )
    }

    /// Rebins every spectrum onto `new_wavelength`, dropping wavelengths that the
    /// current grid does not cover. `on_node` is called once per resampled node.
    pub fn resampled(
        &self,
        new_wavelength: &[f64],
        mut on_node: impl FnMut(),
    ) -> Result<Self, ModelGridError> {
        let coverage = resample_flux(
            &self.wavelength,
            &vec![0.0; self.wavelength.len()],
            new_wavelength,
        );
        let keep: Vec<usize> = (0..new_wavelength.len())
            .filter(|&k| !coverage[k].is_nan())
            .collect();
        if keep.len() < 2 {
            return Err(ModelGridError::EmptySelection("resampling wavelength range"));
        }

        let mut flux = Vec::with_capacity(self.node_count() * keep.len());
        for i in 0..self.teff.len() {
            for j in 0..self.logg.len() {
                let resampled = resample_flux(&self.wavelength, self.flux_at(i, j), new_wavelength);
                flux.extend(keep.iter().map(|&k| resampled[k]));
                on_node();
            }
        }

        Self::new(
            self.teff.clone(),
            self.logg.clone(),
            keep.iter().map(|&k| new_wavelength[k]).collect(),
            flux,
        )
    }
}

/// Total-order key for an `f64`, usable in ordered maps.
fn ordered_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::interpolate::linspace;

    /// Flux that is linear in teff and logg and flat in wavelength:
    /// `teff / 1000 + logg`.
    pub(crate) fn plane_grid() -> ModelGrid {
        let wavelength = linspace(0.5, 6.0, 221);
        let mut nodes = Vec::new();
        for &teff in &[1500.0, 2000.0, 2500.0, 3000.0] {
            for &logg in &[3.5, 4.0, 4.5, 5.0, 5.5] {
                let flux = vec![teff / 1000.0 + logg; wavelength.len()];
                nodes.push((teff, logg, Spectrum::new(wavelength.clone(), flux).unwrap()));
            }
        }
        ModelGrid::from_spectra(nodes).unwrap()
    }

    #[test]
    fn spectrum_new_validates_input() {
        assert_eq!(
            Spectrum::new(vec![1.0], vec![1.0]),
            Err(SpectrumError::TooShort(1))
        );
        assert_eq!(
            Spectrum::new(vec![1.0, 2.0], vec![1.0]),
            Err(SpectrumError::LengthMismatch {
                wavelength: 2,
                flux: 1
            })
        );
        assert_eq!(
            Spectrum::new(vec![1.0, 2.0, 2.0], vec![1.0; 3]),
            Err(SpectrumError::NotIncreasing(2))
        );
    }

    #[test]
    fn from_spectra_builds_sorted_axes() {
        let grid = plane_grid();
        assert_eq!(grid.teff(), &[1500.0, 2000.0, 2500.0, 3000.0]);
        assert_eq!(grid.logg(), &[3.5, 4.0, 4.5, 5.0, 5.5]);
        assert_eq!(grid.node_count(), 20);
        assert_eq!(grid.flux_at(1, 2)[0], 2.0 + 4.5);
    }

    #[test]
    fn from_spectra_rejects_irregular_grids() {
        let w = vec![1.0, 2.0];
        let s = |v: f64| Spectrum::new(w.clone(), vec![v, v]).unwrap();
        let result = ModelGrid::from_spectra(vec![
            (1000.0, 4.0, s(1.0)),
            (1000.0, 4.5, s(1.0)),
            (1500.0, 4.0, s(1.0)),
        ]);
        assert_eq!(
            result,
            Err(ModelGridError::MissingNode {
                teff: 1500.0,
                logg: 4.5
            })
        );
    }

    #[test]
    fn from_spectra_rejects_duplicates_and_mismatched_wavelengths() {
        let s = |w: Vec<f64>| Spectrum::new(w, vec![1.0, 1.0]).unwrap();
        let duplicate = ModelGrid::from_spectra(vec![
            (1000.0, 4.0, s(vec![1.0, 2.0])),
            (1000.0, 4.0, s(vec![1.0, 2.0])),
        ]);
        assert!(matches!(duplicate, Err(ModelGridError::DuplicateNode { .. })));

        let mismatch = ModelGrid::from_spectra(vec![
            (1000.0, 4.0, s(vec![1.0, 2.0])),
            (1000.0, 4.5, s(vec![1.0, 3.0])),
        ]);
        assert!(matches!(
            mismatch,
            Err(ModelGridError::WavelengthMismatch { .. })
        ));
    }

    #[test]
    fn interpolation_reproduces_the_plane() {
        let grid = plane_grid();
        let spectrum = grid.interpolate(2210.0, 4.3).unwrap();
        assert!(spectrum.flux().iter().all(|f| (f - (2.21 + 4.3)).abs() < 1e-12));
        assert!(grid.interpolate(3100.0, 4.3).is_none());
    }

    #[test]
    fn grid_edges_are_inside_the_bounds() {
        let grid = plane_grid();
        let bounds = grid.bounds();
        for (teff, logg, expected) in [
            (1500.0, 3.5, 5.0),
            (1500.0, 5.5, 7.0),
            (3000.0, 3.5, 6.5),
            (3000.0, 5.5, 8.5),
            (2250.0, 5.5, 7.75),
        ] {
            assert!(bounds.contains(teff, logg), "({teff}, {logg})");
            let spectrum = grid.interpolate(teff, logg).unwrap();
            assert!(spectrum.flux().iter().all(|f| (f - expected).abs() < 1e-12));
        }

        for (teff, logg) in [(1500.0 - 1e-9, 4.0), (3000.0 + 1e-9, 4.0), (2000.0, 5.5 + 1e-12)] {
            assert!(!bounds.contains(teff, logg), "({teff}, {logg})");
            assert!(grid.interpolate(teff, logg).is_none());
        }
    }

    #[test]
    fn select_restricts_axes_and_wavelengths() {
        let grid = plane_grid();
        let selected = grid
            .select(Some((2000.0, 2500.0)), None, Some((1.0, 5.0)))
            .unwrap();
        assert_eq!(selected.teff(), &[2000.0, 2500.0]);
        assert_eq!(selected.logg().len(), 5);
        assert!(selected.wavelength()[0] >= 1.0);
        assert!(*selected.wavelength().last().unwrap() <= 5.0);
        assert_eq!(selected.flux_at(0, 0)[0], 2.0 + 3.5);

        assert_eq!(
            grid.select(Some((100.0, 200.0)), None, None),
            Err(ModelGridError::EmptySelection("teff range"))
        );
    }

    #[test]
    fn resampling_keeps_flat_spectra_flat_and_reports_each_node() {
        let grid = plane_grid();
        let mut count = 0;
        let new_wavelength = linspace(0.2, 5.0, 97);
        let resampled = grid.resampled(&new_wavelength, || count += 1).unwrap();

        assert_eq!(count, 20);
        assert!(resampled.wavelength()[0] > 0.5);
        assert!(resampled.flux_at(3, 4).iter().all(|f| (f - 8.5).abs() < 1e-12));
    }
}
