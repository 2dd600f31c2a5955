use super::model::{ModelParams, ModelReader};
use crate::core::models::boxes::{
    ColorColorBox, ColorMagBox, FilterPair, IsochroneBox, MODEL_OBJECT_TYPE,
};
use crate::core::models::isochrone::{IsochroneGrid, IsochronePoint};
use crate::engine::catalog::Datastore;
use crate::engine::error::ReadError;
use tracing::{debug, instrument, warn};

/// One value per point, NaN where the point is missing.
fn column(points: &[Option<IsochronePoint>], value: impl Fn(&IsochronePoint) -> f64) -> Vec<f64> {
    points
        .iter()
        .map(|p| p.as_ref().map_or(f64::NAN, &value))
        .collect()
}

/// Queries one stored isochrone grid.
///
/// Every query interpolates the grid at the requested age and at each requested
/// mass: the age is bracketed by the two neighbouring tracks, quantities are
/// interpolated linearly in mass along each track and then linearly in age. All
/// output sequences are aligned with the input masses. A mass outside the span of a
/// contributing track yields NaN at its index; an age outside the grid is an error.
#[derive(Debug)]
pub struct IsochroneReader<'a, D: Datastore + ?Sized> {
    store: &'a D,
    tag: String,
    grid: &'a IsochroneGrid,
}

impl<'a, D: Datastore + ?Sized> IsochroneReader<'a, D> {
    /// # Errors
    ///
    /// Returns [`ReadError::UnknownTag`] if no isochrone grid is stored under `tag`.
    pub fn new(store: &'a D, tag: &str) -> Result<Self, ReadError> {
        let grid = store.get_isochrone_grid(tag)?;
        Ok(Self {
            store,
            tag: tag.to_string(),
            grid,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn grid(&self) -> &IsochroneGrid {
        self.grid
    }

    /// Isochrone at `age` (Myr) using the magnitudes tabulated in the grid.
    ///
    /// The color is `magnitude(filters_color.0) - magnitude(filters_color.1)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::FilterNotFound`] for a filter the grid does not tabulate
    /// and [`ReadError::AgeOutOfRange`] for an age outside the grid.
    #[instrument(skip_all, fields(tag = %self.tag, age = age))]
    pub fn get_isochrone(
        &self,
        age: f64,
        masses: &[f64],
        filters_color: (&str, &str),
        filter_mag: &str,
    ) -> Result<IsochroneBox, ReadError> {
        let first = self.filter_column(filters_color.0)?;
        let second = self.filter_column(filters_color.1)?;
        let reference = self.filter_column(filter_mag)?;

        let points = self.interpolate(age, masses)?;

        Ok(IsochroneBox {
            model: self.grid.model(),
            age,
            filters_color: filters_color.into(),
            filter_mag: filter_mag.to_string(),
            color: column(&points, |p| p.magnitudes[first] - p.magnitudes[second]),
            magnitude: column(&points, |p| p.magnitudes[reference]),
            teff: column(&points, |p| p.teff),
            logg: column(&points, |p| p.logg),
            masses: masses.to_vec(),
        })
    }

    /// Color-magnitude relation at `age` with magnitudes synthesized from the model
    /// spectrum grid `model`.
    ///
    /// `filters_color` and `filter_mag` are filter identifiers of the photometric
    /// catalog; `filter_mag` must be one of the two color filters.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidArgument`] if `filter_mag` is not a color filter,
    /// [`ReadError::AgeOutOfRange`] for an age outside the grid, and the errors of
    /// [`ModelReader::new`] for missing datasets.
    #[instrument(skip_all, fields(tag = %self.tag, model = %model, age = age))]
    pub fn get_color_magnitude(
        &self,
        age: f64,
        masses: &[f64],
        model: &str,
        filters_color: (&str, &str),
        filter_mag: &str,
    ) -> Result<ColorMagBox, ReadError> {
        if filter_mag != filters_color.0 && filter_mag != filters_color.1 {
            return Err(ReadError::InvalidArgument(format!(
                "The magnitude filter '{}' must be one of the color filters '{}' and '{}'",
                filter_mag, filters_color.0, filters_color.1
            )));
        }

        let points = self.interpolate(age, masses)?;
        let magnitudes =
            self.synthetic_magnitudes(&points, masses, model, &[filters_color.0, filters_color.1])?;
        let (first, second) = (&magnitudes[0], &magnitudes[1]);
        let reference = if filter_mag == filters_color.0 {
            first
        } else {
            second
        };

        Ok(ColorMagBox {
            library: model.to_string(),
            object_type: MODEL_OBJECT_TYPE.to_string(),
            filters_color: filters_color.into(),
            filter_mag: filter_mag.to_string(),
            color: first.iter().zip(second).map(|(a, b)| a - b).collect(),
            magnitude: reference.clone(),
            sptype: masses.to_vec(),
            names: None,
        })
    }

    /// Color-color relation at `age` with magnitudes synthesized from the model
    /// spectrum grid `model`. Filters shared by both colors are synthesized once.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::AgeOutOfRange`] for an age outside the grid and the
    /// errors of [`ModelReader::new`] for missing datasets.
    #[instrument(skip_all, fields(tag = %self.tag, model = %model, age = age))]
    pub fn get_color_color(
        &self,
        age: f64,
        masses: &[f64],
        model: &str,
        filters_colors: ((&str, &str), (&str, &str)),
    ) -> Result<ColorColorBox, ReadError> {
        let ((f1, f2), (f3, f4)) = filters_colors;
        let mut filters: Vec<&str> = Vec::with_capacity(4);
        for filter in [f1, f2, f3, f4] {
            if !filters.contains(&filter) {
                filters.push(filter);
            }
        }
        let index = |filter: &str| filters.iter().position(|f| *f == filter).unwrap_or(0);

        let points = self.interpolate(age, masses)?;
        let magnitudes = self.synthetic_magnitudes(&points, masses, model, &filters)?;
        let color = |a: &str, b: &str| -> Vec<f64> {
            magnitudes[index(a)]
                .iter()
                .zip(&magnitudes[index(b)])
                .map(|(x, y)| x - y)
                .collect()
        };

        Ok(ColorColorBox {
            library: model.to_string(),
            object_type: MODEL_OBJECT_TYPE.to_string(),
            filters: (FilterPair::new(f1, f2), FilterPair::new(f3, f4)),
            color1: color(f1, f2),
            color2: color(f3, f4),
            sptype: masses.to_vec(),
            names: None,
        })
    }

    fn filter_column(&self, filter: &str) -> Result<usize, ReadError> {
        self.grid
            .filter_index(filter)
            .ok_or_else(|| ReadError::FilterNotFound {
                filter: filter.to_string(),
                location: format!("isochrone grid '{}'", self.tag),
            })
    }

    /// Interpolates the grid at `age` for every mass; `None` marks masses outside
    /// the grid.
    fn interpolate(&self, age: f64, masses: &[f64]) -> Result<Vec<Option<IsochronePoint>>, ReadError> {
        let bracket = self.grid.age_bracket(age)?;
        debug!(
            "Age {} Myr lies between tracks {} and {} (weight {:.4})",
            age, bracket.lower, bracket.upper, bracket.weight
        );

        let points: Vec<Option<IsochronePoint>> = masses
            .iter()
            .map(|&mass| {
                let point = self.grid.interpolate(&bracket, mass);
                if point.is_none() {
                    warn!(
                        "Mass {} M_Jup is outside the isochrone grid '{}' at {} Myr; the result is NaN.",
                        mass, self.tag, age
                    );
                }
                point
            })
            .collect();
        Ok(points)
    }

    /// Synthetic magnitudes at 10 pc, one row per filter, aligned with `masses`.
    fn synthetic_magnitudes(
        &self,
        points: &[Option<IsochronePoint>],
        masses: &[f64],
        model: &str,
        filters: &[&str],
    ) -> Result<Vec<Vec<f64>>, ReadError> {
        let readers = filters
            .iter()
            .map(|filter| ModelReader::new(self.store, model, filter))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = readers.first() else {
            return Ok(Vec::new());
        };

        let mut magnitudes = vec![vec![f64::NAN; masses.len()]; readers.len()];
        for (i, (point, &mass)) in points.iter().zip(masses).enumerate() {
            let Some(point) = point else {
                continue;
            };
            if !first.contains(point.teff, point.logg) {
                warn!(
                    "Teff = {:.1} K, log(g) = {:.3} (mass {} M_Jup) is outside the '{}' model grid; the result is NaN.",
                    point.teff, point.logg, mass, model
                );
                continue;
            }

            let spectrum = first.get_model(&ModelParams::new(point.teff, point.logg, mass))?;
            for (row, reader) in magnitudes.iter_mut().zip(&readers) {
                row[i] = reader
                    .photometry()
                    .spectrum_to_magnitude(spectrum.wavelength(), spectrum.flux(), None)
                    .apparent;
            }
        }

        Ok(magnitudes)
    }
}
