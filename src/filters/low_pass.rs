use super::TrajectoryFilter;
use nalgebra::Vector2;

/// First-order low-pass filter
pub struct LowPassFilter {
    alpha: f64,
    last: Option<Vector2<f64>>,
}

impl LowPassFilter {
    /// Create a new first-order low-pass filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl TrajectoryFilter for LowPassFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        let filtered = match self.last {
            Some(last) => Vector2::new(
                self.alpha.mul_add(point.x - last.x, last.x),
                self.alpha.mul_add(point.y - last.y, last.y),
            ),
            None => point,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "LowPassFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_low_pass() {
        let mut filter = LowPassFilter::new(0.5);

        // First value passes through
        let p1 = filter.apply(Vector2::new(10.0, 20.0));
        assert_eq!(p1, Vector2::new(10.0, 20.0));

        // Second value is filtered
        let p2 = filter.apply(Vector2::new(20.0, 30.0));
        assert_eq!(p2, Vector2::new(15.0, 25.0)); // 10 + 0.5 * (20 - 10)
    }

    #[test]
    fn test_convergence_to_constant_input() {
        let mut filter = LowPassFilter::new(0.3);
        let target = Vector2::new(42.0, 84.0);
        let mut out = Vector2::zeros();
        for _ in 0..100 {
            out = filter.apply(target);
        }
        assert!((out - target).norm() < 1e-6);
    }
}
