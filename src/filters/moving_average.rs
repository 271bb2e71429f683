use super::TrajectoryFilter;
use nalgebra::Vector2;
use std::collections::VecDeque;

/// Moving average filter over the last `window_size` points
pub struct MovingAverageFilter {
    window_size: usize,
    buffer: VecDeque<Vector2<f64>>,
}

impl MovingAverageFilter {
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }
}

impl TrajectoryFilter for MovingAverageFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(point);

        let sum: Vector2<f64> = self.buffer.iter().sum();
        sum / self.buffer.len() as f64
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut filter = MovingAverageFilter::new(3);

        let p1 = filter.apply(Vector2::new(10.0, 20.0));
        assert_eq!(p1, Vector2::new(10.0, 20.0));

        let p2 = filter.apply(Vector2::new(20.0, 30.0));
        assert_eq!(p2, Vector2::new(15.0, 25.0));

        let p3 = filter.apply(Vector2::new(30.0, 40.0));
        assert_eq!(p3, Vector2::new(20.0, 30.0));

        // Window is full, oldest value should be dropped
        let p4 = filter.apply(Vector2::new(40.0, 50.0));
        assert_eq!(p4, Vector2::new(30.0, 40.0));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = MovingAverageFilter::new(3);
        filter.apply(Vector2::new(100.0, 100.0));
        filter.reset();
        let p = filter.apply(Vector2::new(10.0, 20.0));
        assert_eq!(p, Vector2::new(10.0, 20.0));
    }
}
