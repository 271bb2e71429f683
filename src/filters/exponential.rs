use super::TrajectoryFilter;
use nalgebra::Vector2;

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<Vector2<f64>>,
}

impl ExponentialFilter {
    /// Create a new exponential filter
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

impl TrajectoryFilter for ExponentialFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        let filtered = match self.last {
            Some(last) => last + (point - last) * self.alpha,
            None => point,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
