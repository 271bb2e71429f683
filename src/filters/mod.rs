//! Trajectory filtering algorithms for smoothing joint paths.
//!
//! Each filter smooths the time series of one joint's 2D position. The
//! smoother instantiates one filter per joint so that state never leaks
//! between trajectories.

/// Kalman filter for optimal state estimation
pub mod kalman;

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

/// First-order low-pass filter for frequency-based smoothing
pub mod low_pass;

/// Hampel filter for robust outlier detection and smoothing
pub mod hampel;

use crate::Result;
use nalgebra::Vector2;

/// Trait for all trajectory filters
pub trait TrajectoryFilter: Send {
    /// Apply the filter to the next point of the trajectory
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64>;

    /// Reset filter state (called between joints / segments)
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes points through unchanged
pub struct NoFilter;

impl TrajectoryFilter for NoFilter {
    fn apply(&mut self, point: Vector2<f64>) -> Vector2<f64> {
        point
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a trajectory filter by type name with default parameters
pub fn create_filter(filter_type: &str) -> Result<Box<dyn TrajectoryFilter>> {
    use crate::constants::{
        DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_HAMPEL_THRESHOLD, DEFAULT_HAMPEL_WINDOW, DEFAULT_LOW_PASS_ALPHA,
        DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW,
    };

    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "kalman" => Ok(Box::new(kalman::KalmanFilter::new())),
        "moving_average" | "movingaverage" => Ok(Box::new(moving_average::MovingAverageFilter::new(
            DEFAULT_MOVING_AVERAGE_WINDOW,
        ))),
        "median" => Ok(Box::new(median::MedianFilter::new(DEFAULT_MEDIAN_WINDOW))),
        "exponential" => Ok(Box::new(exponential::ExponentialFilter::new(DEFAULT_EXPONENTIAL_ALPHA))),
        "lowpass" | "low_pass" => Ok(Box::new(low_pass::LowPassFilter::new(DEFAULT_LOW_PASS_ALPHA))),
        "hampel" => Ok(Box::new(hampel::HampelFilter::new(
            DEFAULT_HAMPEL_WINDOW,
            DEFAULT_HAMPEL_THRESHOLD,
        ))),
        _ => Err(crate::Error::ConfigError(format!(
            "Unknown trajectory filter type: {filter_type}"
        ))),
    }
}
