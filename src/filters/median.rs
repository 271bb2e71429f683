use super::TrajectoryFilter;
use nalgebra::Vector2;
use std::collections::VecDeque;

/// Median filter: each axis takes the median of the last `window_size` values
pub struct MedianFilter {
    window_size: usize,
    buffer: VecDeque<Vector2<f64>>,
}

impl MedianFilter {
    /// Create a new median filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn median(values: &mut [f64]) -> f64 {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        }
    }
}

impl TrajectoryFilter for MedianFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(point);

        let mut xs: Vec<f64> = self.buffer.iter().map(|p| p.x).collect();
        let mut ys: Vec<f64> = self.buffer.iter().map(|p| p.y).collect();
        Vector2::new(Self::median(&mut xs), Self::median(&mut ys))
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_rejects_spike() {
        let mut filter = MedianFilter::new(5);
        for _ in 0..4 {
            filter.apply(Vector2::new(10.0, 10.0));
        }
        // A single spike should not move the median
        let out = filter.apply(Vector2::new(1000.0, 1000.0));
        assert_eq!(out, Vector2::new(10.0, 10.0));
    }

    #[test]
    fn test_even_window_averages_middle() {
        let mut filter = MedianFilter::new(4);
        filter.apply(Vector2::new(1.0, 0.0));
        filter.apply(Vector2::new(2.0, 0.0));
        filter.apply(Vector2::new(3.0, 0.0));
        let out = filter.apply(Vector2::new(4.0, 0.0));
        assert_eq!(out.x, 2.5);
    }
}
