use super::TrajectoryFilter;
use nalgebra::Vector2;
use std::collections::VecDeque;

/// Hampel filter for outlier removal: a point far from the window median
/// (in MAD-scaled units) is replaced by the median.
pub struct HampelFilter {
    window_size: usize,
    threshold: f64,
    buffer: VecDeque<Vector2<f64>>,
}

impl HampelFilter {
    /// Create a new Hampel filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is not odd or is zero, or if threshold is negative
    #[must_use]
    pub fn new(window_size: usize, threshold: f64) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Window size must be odd, got {}", window_size);
        assert!(threshold >= 0.0, "Threshold must be non-negative, got {}", threshold);
        Self {
            window_size,
            threshold,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn filter_axis(values: &[f64], new_value: f64, threshold: f64) -> f64 {
        if values.is_empty() {
            return new_value;
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.push(new_value);
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };

        let mut deviations: Vec<f64> = sorted.iter().map(|&x| (x - median).abs()).collect();
        deviations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mad = if deviations.len() % 2 == 0 {
            (deviations[deviations.len() / 2 - 1] + deviations[deviations.len() / 2]) / 2.0
        } else {
            deviations[deviations.len() / 2]
        };

        // Robust standard deviation estimate
        let sigma = 1.4826 * mad;

        if (new_value - median).abs() > threshold * sigma {
            median
        } else {
            new_value
        }
    }
}

impl TrajectoryFilter for HampelFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        let xs: Vec<f64> = self.buffer.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = self.buffer.iter().map(|p| p.y).collect();

        let filtered = Vector2::new(
            Self::filter_axis(&xs, point.x, self.threshold),
            Self::filter_axis(&ys, point.y, self.threshold),
        );

        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(filtered);

        filtered
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "HampelFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hampel_normal_values_pass() {
        let mut filter = HampelFilter::new(5, 3.0);

        for val in [10.0, 11.0, 10.5, 11.5, 10.2] {
            let out = filter.apply(Vector2::new(val, val));
            assert!((out.x - val).abs() < 0.1);
        }
    }

    #[test]
    fn test_hampel_replaces_outlier() {
        let mut filter = HampelFilter::new(5, 3.0);

        filter.apply(Vector2::new(10.0, 20.0));
        filter.apply(Vector2::new(11.0, 21.0));
        filter.apply(Vector2::new(10.5, 20.5));
        filter.apply(Vector2::new(11.5, 21.5));

        let out = filter.apply(Vector2::new(100.0, 200.0));
        assert!(out.x < 20.0);
        assert!(out.y < 30.0);
    }

    #[test]
    #[should_panic(expected = "Window size must be odd")]
    fn test_even_window_rejected() {
        let _ = HampelFilter::new(4, 3.0);
    }
}
