use crate::core::interpolate::{Bracket, locate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Family of evolutionary models an isochrone grid was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsochroneModel {
    /// Baraffe/AMES-style tables with one block per age.
    Baraffe,
}

impl fmt::Display for IsochroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsochroneModel::Baraffe => write!(f, "baraffe"),
        }
    }
}

/// A single flat grid record: one (age, mass) node with its properties.
///
/// Units: age in Myr, mass in M_Jup, `teff` in K, `log_lum` as log10(L/L_sun),
/// `logg` in dex (cgs), `radius` in R_Jup. `magnitudes` follow the filter order of
/// the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneRow {
    pub age: f64,
    pub mass: f64,
    pub teff: f64,
    pub log_lum: f64,
    pub logg: f64,
    pub radius: f64,
    pub magnitudes: Vec<f64>,
}

/// Properties of one node of a track, or of an interpolated point.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochronePoint {
    pub mass: f64,
    pub teff: f64,
    pub log_lum: f64,
    pub logg: f64,
    pub radius: f64,
    pub magnitudes: Vec<f64>,
}

impl IsochronePoint {
    fn mix(lower: &Self, upper: &Self, weight: f64) -> Self {
        let lerp = |a: f64, b: f64| (1.0 - weight) * a + weight * b;
        Self {
            mass: lerp(lower.mass, upper.mass),
            teff: lerp(lower.teff, upper.teff),
            log_lum: lerp(lower.log_lum, upper.log_lum),
            logg: lerp(lower.logg, upper.logg),
            radius: lerp(lower.radius, upper.radius),
            magnitudes: lower
                .magnitudes
                .iter()
                .zip(&upper.magnitudes)
                .map(|(&a, &b)| lerp(a, b))
                .collect(),
        }
    }
}

/// All grid nodes sharing one age, sorted by strictly increasing mass.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneTrack {
    age: f64,
    masses: Vec<f64>,
    points: Vec<IsochronePoint>,
}

impl IsochroneTrack {
    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn points(&self) -> &[IsochronePoint] {
        &self.points
    }

    pub fn mass_range(&self) -> (f64, f64) {
        (self.masses[0], self.masses[self.masses.len() - 1])
    }

    /// Linear interpolation along the track; `None` outside its mass span.
    pub fn interpolate(&self, mass: f64) -> Option<IsochronePoint> {
        let bracket = locate(&self.masses, mass)?;
        let lower = &self.points[bracket.lower];
        if bracket.is_exact() {
            return Some(lower.clone());
        }
        let mut point = IsochronePoint::mix(lower, &self.points[bracket.upper], bracket.weight);
        point.mass = mass;
        Some(point)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Isochrone grid contains no points")]
    Empty,
    #[error("Non-finite age or mass in grid point (age = {age}, mass = {mass})")]
    NonFinite { age: f64, mass: f64 },
    #[error("Duplicate grid point at age = {age} Myr, mass = {mass} M_Jup")]
    DuplicatePoint { age: f64, mass: f64 },
    #[error(
        "Grid point (age = {age}, mass = {mass}) has {found} magnitudes but the grid defines {expected} filters"
    )]
    MagnitudeCount {
        age: f64,
        mass: f64,
        expected: usize,
        found: usize,
    },
    #[error("Filter '{0}' appears more than once in the grid")]
    DuplicateFilter(String),
    #[error("Age {age} Myr is outside the grid coverage [{min}, {max}] Myr")]
    AgeOutOfRange { age: f64, min: f64, max: f64 },
}

/// An evolutionary model grid organised as tracks of constant age.
///
/// Invariants upheld by [`IsochroneGrid::new`]: at least one point, unique
/// (age, mass) pairs, tracks sorted by strictly increasing age, points within a
/// track sorted by strictly increasing mass, and one magnitude per filter on every
/// point.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneGrid {
    model: IsochroneModel,
    filters: Vec<String>,
    ages: Vec<f64>,
    tracks: Vec<IsochroneTrack>,
}

impl IsochroneGrid {
    pub fn new(
        model: IsochroneModel,
        filters: Vec<String>,
        mut rows: Vec<IsochroneRow>,
    ) -> Result<Self, GridError> {
        if rows.is_empty() {
            return Err(GridError::Empty);
        }

        let mut seen = HashSet::new();
        for name in &filters {
            if !seen.insert(name.as_str()) {
                return Err(GridError::DuplicateFilter(name.clone()));
            }
        }

        for row in &rows {
            if !row.age.is_finite() || !row.mass.is_finite() {
                return Err(GridError::NonFinite {
                    age: row.age,
                    mass: row.mass,
                });
            }
            if row.magnitudes.len() != filters.len() {
                return Err(GridError::MagnitudeCount {
                    age: row.age,
                    mass: row.mass,
                    expected: filters.len(),
                    found: row.magnitudes.len(),
                });
            }
        }

        rows.sort_by(|a, b| a.age.total_cmp(&b.age).then(a.mass.total_cmp(&b.mass)));

        let mut tracks: Vec<IsochroneTrack> = Vec::new();
        for row in rows {
            let point = IsochronePoint {
                mass: row.mass,
                teff: row.teff,
                log_lum: row.log_lum,
                logg: row.logg,
                radius: row.radius,
                magnitudes: row.magnitudes,
            };
            if let Some(track) = tracks.last_mut().filter(|t| t.age == row.age) {
                if track.masses.last() == Some(&row.mass) {
                    return Err(GridError::DuplicatePoint {
                        age: row.age,
                        mass: row.mass,
                    });
                }
                track.masses.push(row.mass);
                track.points.push(point);
                continue;
            }
            tracks.push(IsochroneTrack {
                age: row.age,
                masses: vec![row.mass],
                points: vec![point],
            });
        }

        let ages = tracks.iter().map(|t| t.age).collect();
        Ok(Self {
            model,
            filters,
            ages,
            tracks,
        })
    }

    pub fn model(&self) -> IsochroneModel {
        self.model
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn filter_index(&self, filter: &str) -> Option<usize> {
        self.filters.iter().position(|f| f == filter)
    }

    pub fn tracks(&self) -> &[IsochroneTrack] {
        &self.tracks
    }

    pub fn ages(&self) -> &[f64] {
        &self.ages
    }

    pub fn age_range(&self) -> (f64, f64) {
        (self.ages[0], self.ages[self.ages.len() - 1])
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.tracks.iter().map(|t| t.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Brackets `age` between the two neighbouring tracks.
    pub fn age_bracket(&self, age: f64) -> Result<Bracket, GridError> {
        locate(&self.ages, age).ok_or_else(|| {
            let (min, max) = self.age_range();
            GridError::AgeOutOfRange { age, min, max }
        })
    }

    /// Interpolates all properties at `mass` for a previously located age.
    ///
    /// Each contributing track is interpolated linearly in mass, then the track
    /// values are blended linearly in age. Returns `None` when `mass` is outside the
    /// mass span of any contributing track.
    pub fn interpolate(&self, age: &Bracket, mass: f64) -> Option<IsochronePoint> {
        let lower = self.tracks[age.lower].interpolate(mass)?;
        if age.is_exact() {
            return Some(lower);
        }
        let upper = self.tracks[age.upper].interpolate(mass)?;
        let mut point = IsochronePoint::mix(&lower, &upper, age.weight);
        point.mass = mass;
        Some(point)
    }

    /// Flat records of every grid point, ordered by age then mass.
    pub fn rows(&self) -> impl Iterator<Item = IsochroneRow> + '_ {
        self.tracks.iter().flat_map(|track| {
            track.points.iter().map(move |p| IsochroneRow {
                age: track.age,
                mass: p.mass,
                teff: p.teff,
                log_lum: p.log_lum,
                logg: p.logg,
                radius: p.radius,
                magnitudes: p.magnitudes.clone(),
            })
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A grid whose properties are linear in age and mass:
    /// teff = 1000 + 10 * mass + 2 * age, logg = 3 + 0.01 * mass + 0.001 * age,
    /// J = 20 - 0.1 * mass, H = 19.5 - 0.12 * mass.
    pub(crate) fn linear_grid() -> IsochroneGrid {
        let mut rows = Vec::new();
        for &age in &[10.0, 100.0, 1000.0] {
            for i in 0..=12 {
                let mass = 5.0 + 10.0 * i as f64;
                rows.push(IsochroneRow {
                    age,
                    mass,
                    teff: 1000.0 + 10.0 * mass + 2.0 * age,
                    log_lum: -5.0 + 0.02 * mass,
                    logg: 3.0 + 0.01 * mass + 0.001 * age,
                    radius: 1.0 + 0.001 * mass,
                    magnitudes: vec![20.0 - 0.1 * mass, 19.5 - 0.12 * mass],
                });
            }
        }
        IsochroneGrid::new(
            IsochroneModel::Baraffe,
            vec!["J".to_string(), "H".to_string()],
            rows,
        )
        .unwrap()
    }

    fn row(age: f64, mass: f64) -> IsochroneRow {
        IsochroneRow {
            age,
            mass,
            teff: 1000.0,
            log_lum: -4.0,
            logg: 4.0,
            radius: 1.0,
            magnitudes: vec![],
        }
    }

    #[test]
    fn new_sorts_rows_into_tracks() {
        let grid = IsochroneGrid::new(
            IsochroneModel::Baraffe,
            vec![],
            vec![row(100.0, 20.0), row(10.0, 5.0), row(100.0, 10.0), row(10.0, 1.0)],
        )
        .unwrap();

        assert_eq!(grid.ages(), &[10.0, 100.0]);
        assert_eq!(grid.tracks()[0].mass_range(), (1.0, 5.0));
        assert_eq!(grid.tracks()[1].mass_range(), (10.0, 20.0));
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn new_rejects_duplicate_points() {
        let result = IsochroneGrid::new(
            IsochroneModel::Baraffe,
            vec![],
            vec![row(10.0, 5.0), row(10.0, 5.0)],
        );
        assert!(matches!(result, Err(GridError::DuplicatePoint { .. })));
    }

    #[test]
    fn new_rejects_magnitude_count_mismatch() {
        let result = IsochroneGrid::new(
            IsochroneModel::Baraffe,
            vec!["J".to_string()],
            vec![row(10.0, 5.0)],
        );
        assert!(matches!(
            result,
            Err(GridError::MagnitudeCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
    }

    #[test]
    fn new_rejects_empty_and_non_finite_input() {
        assert_eq!(
            IsochroneGrid::new(IsochroneModel::Baraffe, vec![], vec![]),
            Err(GridError::Empty)
        );
        let result = IsochroneGrid::new(IsochroneModel::Baraffe, vec![], vec![row(f64::NAN, 1.0)]);
        assert!(matches!(result, Err(GridError::NonFinite { .. })));
    }

    #[test]
    fn interpolation_is_exact_for_linear_surfaces() {
        let grid = linear_grid();
        let bracket = grid.age_bracket(55.0).unwrap();
        let point = grid.interpolate(&bracket, 42.0).unwrap();

        assert!((point.teff - (1000.0 + 420.0 + 110.0)).abs() < 1e-9);
        assert!((point.logg - (3.0 + 0.42 + 0.055)).abs() < 1e-12);
        assert!((point.magnitudes[0] - (20.0 - 4.2)).abs() < 1e-12);
        assert_eq!(point.mass, 42.0);
    }

    #[test]
    fn exact_age_uses_a_single_track() {
        let grid = linear_grid();
        let bracket = grid.age_bracket(100.0).unwrap();
        assert!(bracket.is_exact());
        let point = grid.interpolate(&bracket, 15.0).unwrap();
        assert_eq!(point.teff, 1000.0 + 150.0 + 200.0);
    }

    #[test]
    fn mass_outside_a_track_is_none() {
        let grid = linear_grid();
        let bracket = grid.age_bracket(100.0).unwrap();
        assert!(grid.interpolate(&bracket, 4.0).is_none());
        assert!(grid.interpolate(&bracket, 125.1).is_none());
    }

    #[test]
    fn age_outside_the_grid_is_an_error() {
        let grid = linear_grid();
        assert_eq!(
            grid.age_bracket(5000.0),
            Err(GridError::AgeOutOfRange {
                age: 5000.0,
                min: 10.0,
                max: 1000.0
            })
        );
    }

    #[test]
    fn rows_round_trip_through_new() {
        let grid = linear_grid();
        let rebuilt = IsochroneGrid::new(
            grid.model(),
            grid.filters().to_vec(),
            grid.rows().collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, grid);
    }
}
