//! Configuration management for the swing analysis pipeline

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_ENTER_FRAMES, DEFAULT_ENTER_SPEED, DEFAULT_EXIT_FRAMES, DEFAULT_EXIT_SPEED,
    DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_HAMPEL_THRESHOLD, DEFAULT_HAMPEL_WINDOW, DEFAULT_HANDEDNESS_RATIO,
    DEFAULT_LOW_PASS_ALPHA, DEFAULT_MAX_SEGMENT_FRAMES, DEFAULT_MEDIAN_WINDOW, DEFAULT_MIN_SEGMENT_FRAMES,
    DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_SEQUENCE_LENGTH, SPEED_SMOOTHING_WINDOW,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Model artifact paths
    pub models: ModelConfig,

    /// Pose extraction parameters
    pub pose: PoseConfig,

    /// Trajectory smoothing parameters
    pub smoothing: SmoothingConfig,

    /// Swing segmentation parameters
    pub segmentation: SegmentationConfig,

    /// Feature extraction parameters
    pub features: FeatureConfig,

    /// Scoring parameters
    pub scoring: ScoringConfig,

    /// Overlay rendering parameters
    pub overlay: OverlayConfig,
}

/// Model artifact paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the single-person pose ONNX model
    pub pose_model: PathBuf,

    /// Path to the trained scoring ONNX model; `None` selects the heuristic
    /// scorer (subject to the fallback policy)
    pub scoring_model: Option<PathBuf>,

    /// Path to the reference statistics YAML, versioned with the model
    pub reference_stats: PathBuf,
}

/// Pose extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseConfig {
    /// Keypoints below this confidence are flagged low-confidence (0.0-1.0)
    pub confidence_threshold: f32,
}

/// Trajectory smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Per-joint trajectory filter: none, moving_average, median,
    /// exponential, low_pass, hampel, kalman
    pub filter: String,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Median filter window size (odd)
    pub median_window: usize,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,

    /// Low pass filter alpha
    pub low_pass_alpha: f64,

    /// Hampel filter window size (odd)
    pub hampel_window: usize,

    /// Hampel filter threshold in robust sigmas
    pub hampel_threshold: f64,
}

/// Swing segmentation parameters. All thresholds are tunable calibration
/// constants, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Wrist speed to enter a swing (normalized units per second)
    pub enter_speed: f32,

    /// Wrist speed to leave a swing; must not exceed `enter_speed`
    pub exit_speed: f32,

    /// Frames the enter condition must hold (noise-spike rejection)
    pub enter_frames: usize,

    /// Frames the exit condition must hold (hysteresis)
    pub exit_frames: usize,

    /// Segments shorter than this are discarded as noise
    pub min_segment_frames: usize,

    /// Segments longer than this are discarded
    pub max_segment_frames: usize,

    /// Moving-average kernel applied to the wrist speed series
    pub speed_smoothing_window: usize,

    /// Raise the enter threshold to the 75th speed percentile when it is higher
    pub adaptive_threshold: bool,

    /// Peak-acceleration ratio below which handedness inference is
    /// low-confidence
    pub handedness_ratio: f32,
}

/// Feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Resampled sequence length fed to the scoring model
    pub sequence_length: usize,
}

/// Scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Permit the deterministic heuristic scorer when no trained model is
    /// loadable. With this disabled, a missing model is a configuration error.
    pub allow_heuristic_fallback: bool,

    /// How many ranked feature deviations each report carries
    pub top_deviations: usize,
}

/// Overlay rendering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// How many attention-ranked frames to render
    pub top_frames: usize,

    /// Minimum confident joints for a frame to be renderable
    pub min_confident_joints: usize,

    /// How many deviation lines to composite onto the image
    pub text_deviations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pose_model: PathBuf::from("models/pose.onnx"),
            scoring_model: Some(PathBuf::from("models/swing_scorer.onnx")),
            reference_stats: PathBuf::from("models/reference_stats.yaml"),
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "moving_average".to_string(),
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            median_window: DEFAULT_MEDIAN_WINDOW,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
            low_pass_alpha: DEFAULT_LOW_PASS_ALPHA,
            hampel_window: DEFAULT_HAMPEL_WINDOW,
            hampel_threshold: DEFAULT_HAMPEL_THRESHOLD,
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            enter_speed: DEFAULT_ENTER_SPEED,
            exit_speed: DEFAULT_EXIT_SPEED,
            enter_frames: DEFAULT_ENTER_FRAMES,
            exit_frames: DEFAULT_EXIT_FRAMES,
            min_segment_frames: DEFAULT_MIN_SEGMENT_FRAMES,
            max_segment_frames: DEFAULT_MAX_SEGMENT_FRAMES,
            speed_smoothing_window: SPEED_SMOOTHING_WINDOW,
            adaptive_threshold: false,
            handedness_ratio: DEFAULT_HANDEDNESS_RATIO,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            allow_heuristic_fallback: true,
            top_deviations: 5,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            top_frames: 1,
            min_confident_joints: 8,
            text_deviations: 3,
        }
    }
}

impl SmoothingConfig {
    /// Create the configured trajectory filter
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown filter name.
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::TrajectoryFilter>> {
        use crate::filters::{
            create_filter, exponential::ExponentialFilter, hampel::HampelFilter, low_pass::LowPassFilter,
            median::MedianFilter, moving_average::MovingAverageFilter,
        };

        match self.filter.to_lowercase().as_str() {
            "moving_average" | "movingaverage" => Ok(Box::new(MovingAverageFilter::new(self.moving_average_window))),
            "median" => Ok(Box::new(MedianFilter::new(self.median_window))),
            "exponential" => Ok(Box::new(ExponentialFilter::new(self.exponential_alpha))),
            "lowpass" | "low_pass" => Ok(Box::new(LowPassFilter::new(self.low_pass_alpha))),
            "hampel" => Ok(Box::new(HampelFilter::new(self.hampel_window, self.hampel_threshold))),
            name => create_filter(name),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error when the file is unreadable or not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigError(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pose.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.smoothing.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.smoothing.median_window == 0 || self.smoothing.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }
        if self.smoothing.hampel_window == 0 || self.smoothing.hampel_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Hampel window size must be odd and greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing.exponential_alpha) || self.smoothing.exponential_alpha == 0.0 {
            return Err(Error::ConfigError("Exponential alpha must be in (0, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.smoothing.low_pass_alpha) || self.smoothing.low_pass_alpha == 0.0 {
            return Err(Error::ConfigError("Low pass alpha must be in (0, 1]".to_string()));
        }

        if self.segmentation.enter_speed <= 0.0 {
            return Err(Error::ConfigError("Enter speed must be positive".to_string()));
        }
        if self.segmentation.exit_speed > self.segmentation.enter_speed {
            return Err(Error::ConfigError(
                "Exit speed must not exceed enter speed (hysteresis)".to_string(),
            ));
        }
        if self.segmentation.enter_frames == 0 || self.segmentation.exit_frames == 0 {
            return Err(Error::ConfigError("Sustain windows must be greater than 0".to_string()));
        }
        if self.segmentation.min_segment_frames > self.segmentation.max_segment_frames {
            return Err(Error::ConfigError(
                "Minimum segment length exceeds the maximum".to_string(),
            ));
        }
        if self.segmentation.handedness_ratio < 1.0 {
            return Err(Error::ConfigError("Handedness ratio must be at least 1.0".to_string()));
        }

        if self.features.sequence_length < 2 {
            return Err(Error::ConfigError("Sequence length must be at least 2".to_string()));
        }

        if self.overlay.min_confident_joints > crate::constants::NUM_KEYPOINTS {
            return Err(Error::ConfigError(format!(
                "Minimum confident joints cannot exceed {}",
                crate::constants::NUM_KEYPOINTS
            )));
        }

        // The smoothing filter name must resolve
        self.smoothing.create_filter()?;

        // Model artifacts checked last so parameter errors surface first
        if !self.models.pose_model.exists() {
            return Err(Error::ConfigError(format!(
                "Pose model not found: {}",
                self.models.pose_model.display()
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Swing Analysis Configuration

# Model artifacts
models:
  pose_model: "models/pose.onnx"
  scoring_model: "models/swing_scorer.onnx"
  reference_stats: "models/reference_stats.yaml"

# Pose extraction
pose:
  confidence_threshold: 0.3

# Trajectory smoothing
smoothing:
  filter: "moving_average"
  moving_average_window: 5
  median_window: 5
  exponential_alpha: 0.5
  low_pass_alpha: 0.5
  hampel_window: 5
  hampel_threshold: 3.0

# Swing segmentation (speed thresholds in normalized units per second)
segmentation:
  enter_speed: 0.8
  exit_speed: 0.3
  enter_frames: 3
  exit_frames: 5
  min_segment_frames: 30
  max_segment_frames: 120
  speed_smoothing_window: 5
  adaptive_threshold: false
  handedness_ratio: 1.2

# Feature extraction
features:
  sequence_length: 90

# Scoring
scoring:
  allow_heuristic_fallback: true
  top_deviations: 5

# Overlay rendering
overlay:
  top_frames: 1
  min_confident_joints: 8
  text_deviations: 3
"#;
