/// Position of a value on a strictly increasing axis.
///
/// Interpolated values are `(1 - weight) * v[lower] + weight * v[upper]`. An exact hit
/// on a node is represented with `lower == upper` and a weight of zero, so that it
/// never touches a neighbouring node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    pub weight: f64,
}

impl Bracket {
    pub fn exact(index: usize) -> Self {
        Self {
            lower: index,
            upper: index,
            weight: 0.0,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.lower == self.upper
    }

    /// Blends the values produced by `value_at` for the two bracketing nodes.
    #[inline]
    pub fn blend(&self, value_at: impl Fn(usize) -> f64) -> f64 {
        if self.is_exact() {
            value_at(self.lower)
        } else {
            (1.0 - self.weight) * value_at(self.lower) + self.weight * value_at(self.upper)
        }
    }

    #[inline]
    pub fn apply(&self, values: &[f64]) -> f64 {
        self.blend(|i| values[i])
    }
}

/// Locates `x` on a strictly increasing `axis`.
///
/// Returns `None` for an empty axis, a non-finite `x`, or an `x` outside
/// `[axis[0], axis[last]]`.
pub fn locate(axis: &[f64], x: f64) -> Option<Bracket> {
    let (first, last) = (*axis.first()?, *axis.last()?);
    if !x.is_finite() || x < first || x > last {
        return None;
    }

    let index = axis.partition_point(|&node| node < x);
    if axis[index] == x {
        return Some(Bracket::exact(index));
    }

    let (lower, upper) = (index - 1, index);
    let weight = (x - axis[lower]) / (axis[upper] - axis[lower]);
    Some(Bracket {
        lower,
        upper,
        weight,
    })
}

/// Linear interpolation of `ys(xs)` at `x`, NaN outside the tabulated range.
pub fn interp1d(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match locate(xs, x) {
        Some(bracket) => bracket.apply(ys),
        None => f64::NAN,
    }
}

/// Trapezoidal integral of `y` over `x`.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| 0.5 * (xw[1] - xw[0]) * (yw[0] + yw[1]))
        .sum()
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
///
/// The last value is set to exactly `stop`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = stop;
            values
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_returns_exact_bracket_on_nodes() {
        let axis = [1.0, 2.0, 4.0];
        assert_eq!(locate(&axis, 1.0), Some(Bracket::exact(0)));
        assert_eq!(locate(&axis, 2.0), Some(Bracket::exact(1)));
        assert_eq!(locate(&axis, 4.0), Some(Bracket::exact(2)));
    }

    #[test]
    fn locate_computes_fractional_weight_between_nodes() {
        let axis = [1.0, 2.0, 4.0];
        let bracket = locate(&axis, 3.0).unwrap();
        assert_eq!(bracket.lower, 1);
        assert_eq!(bracket.upper, 2);
        assert!((bracket.weight - 0.5).abs() < 1e-15);
    }

    #[test]
    fn locate_rejects_values_outside_the_axis() {
        let axis = [1.0, 2.0];
        assert!(locate(&axis, 0.999).is_none());
        assert!(locate(&axis, 2.001).is_none());
        assert!(locate(&axis, f64::NAN).is_none());
        assert!(locate(&[], 1.0).is_none());
    }

    #[test]
    fn single_node_axis_only_matches_its_node() {
        assert_eq!(locate(&[5.0], 5.0), Some(Bracket::exact(0)));
        assert!(locate(&[5.0], 5.1).is_none());
    }

    #[test]
    fn interp1d_is_linear_and_nan_outside() {
        let xs = [0.0, 10.0];
        let ys = [1.0, 3.0];
        assert!((interp1d(&xs, &ys, 2.5) - 1.5).abs() < 1e-15);
        assert!(interp1d(&xs, &ys, -1.0).is_nan());
    }

    #[test]
    fn trapezoid_integrates_a_line_exactly() {
        let x = [0.0, 1.0, 3.0];
        let y = [0.0, 2.0, 6.0];
        assert!((trapezoid(&y, &x) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn linspace_matches_endpoints_and_count() {
        let values = linspace(35.0, 45.0, 10);
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], 35.0);
        assert_eq!(values[9], 45.0);
        let sum: f64 = values.iter().sum();
        assert!((sum - 400.0).abs() < 1e-9);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 7.0, 1), vec![2.0]);
    }
}
