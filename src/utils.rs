//! Utility functions for poseval.

use nalgebra::Point2;

/// Ratio `numerator / denominator`, or NaN when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Mean of the non-NaN values, or NaN if there are none.
pub fn nan_mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// PoseTrack head size: `factor` times the diagonal of the head box.
pub fn head_size(x1: f64, y1: f64, x2: f64, y2: f64, factor: f64) -> f64 {
    factor * nalgebra::distance(&Point2::new(x1, y1), &Point2::new(x2, y2))
}

/// A closed polygon, used for ignore regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point2<f64>>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2<f64>>) -> Self {
        Self { vertices }
    }

    /// Even-odd test for a point strictly inside the polygon.
    ///
    /// Polygons with fewer than three vertices contain nothing.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
