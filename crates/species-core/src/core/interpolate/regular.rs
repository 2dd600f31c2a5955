use super::linear::{Bracket, locate};

/// Bilinear interpolation weights on a regular two-dimensional grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bilinear {
    pub x: Bracket,
    pub y: Bracket,
}

impl Bilinear {
    /// The (x index, y index, weight) of every grid node contributing to the
    /// interpolant, in a fixed order. Nodes with zero weight from exact hits are
    /// skipped.
    pub fn corners(&self) -> Vec<(usize, usize, f64)> {
        let xs = weighted_nodes(&self.x);
        let ys = weighted_nodes(&self.y);
        let mut corners = Vec::with_capacity(xs.len() * ys.len());
        for &(i, wx) in &xs {
            for &(j, wy) in &ys {
                corners.push((i, j, wx * wy));
            }
        }
        corners
    }
}

fn weighted_nodes(bracket: &Bracket) -> Vec<(usize, f64)> {
    if bracket.is_exact() {
        vec![(bracket.lower, 1.0)]
    } else {
        vec![
            (bracket.lower, 1.0 - bracket.weight),
            (bracket.upper, bracket.weight),
        ]
    }
}

/// Locates `(x, y)` on the regular grid spanned by `x_axis` and `y_axis`.
pub fn bilinear(x_axis: &[f64], y_axis: &[f64], x: f64, y: f64) -> Option<Bilinear> {
    Some(Bilinear {
        x: locate(x_axis, x)?,
        y: locate(y_axis, y)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_reproduces_a_plane() {
        let xs = [1000.0, 2000.0, 3000.0];
        let ys = [3.5, 4.0, 4.5];
        let plane = |i: usize, j: usize| 2.0 * xs[i] - 100.0 * ys[j] + 7.0;

        let weights = bilinear(&xs, &ys, 2250.0, 4.2).unwrap();
        let value: f64 = weights
            .corners()
            .into_iter()
            .map(|(i, j, w)| w * plane(i, j))
            .sum();
        let expected = 2.0 * 2250.0 - 100.0 * 4.2 + 7.0;
        assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
    }

    #[test]
    fn exact_hit_uses_a_single_node() {
        let weights = bilinear(&[1.0, 2.0], &[5.0, 6.0], 2.0, 5.0).unwrap();
        assert_eq!(weights.corners(), vec![(1, 0, 1.0)]);
    }

    #[test]
    fn corner_weights_sum_to_one() {
        let weights = bilinear(&[0.0, 1.0], &[0.0, 1.0], 0.3, 0.8).unwrap();
        let total: f64 = weights.corners().iter().map(|c| c.2).sum();
        assert!((total - 1.0).abs() < 1e-15);
    }

    #[test]
    fn outside_either_axis_is_none() {
        assert!(bilinear(&[0.0, 1.0], &[0.0, 1.0], 1.5, 0.5).is_none());
        assert!(bilinear(&[0.0, 1.0], &[0.0, 1.0], 0.5, -0.5).is_none());
    }
}
