//! Mathematical types and functions.

use cgmath::Point2;

/// A 2D point. `x` runs along the road and `y` across it.
pub type Point2d = Point2<f64>;

/// Tolerance used when comparing lengths that are expected to be exact.
pub(crate) const EPSILON: f64 = 1e-9;

/// The number of lanes of width `lane_width` needed to fit something `width` wide.
///
/// Always at least one lane, and robust to rounding error such as
/// `0.1 * 3 / 0.3` landing a hair above `1.0`.
pub fn lanes_required(width: f64, lane_width: f64) -> usize {
    let lanes = (width / lane_width - EPSILON).ceil();
    usize::max(lanes as usize, 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lanes_required_rounds_up() {
        assert_eq!(lanes_required(2.0, 2.0), 1);
        assert_eq!(lanes_required(2.1, 2.0), 2);
        assert_eq!(lanes_required(6.0, 5.0), 2);
        assert_eq!(lanes_required(0.1, 0.3 / 3.0), 1);
        assert_eq!(lanes_required(0.0, 2.0), 1);
    }
}
