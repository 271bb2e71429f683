//! Tennis swing analysis library.
//!
//! This library scores the quality of a single tennis stroke from
//! single-camera video using:
//! - ONNX Runtime for pose-network and scoring-model inference
//! - `OpenCV` for video decoding and overlay rendering
//! - Trajectory filtering algorithms for smoothing joint paths
//!
//! The analysis pipeline consists of:
//! 1. Per-frame pose keypoint extraction with a subject-tracking crop window
//! 2. Trajectory smoothing and gap-filling with kinematic derivatives
//! 3. Swing segmentation into biomechanical phases
//!    (preparation, backswing, contact, follow-through)
//! 4. Fixed-length kinematic feature extraction
//! 5. Quality scoring with temporal and joint attention
//!    (trained model, or a deterministic heuristic fallback)
//! 6. Feature-importance translation and diagnostic overlay rendering
//!
//! # Examples
//!
//! ## Analyzing a video
//!
//! ```no_run
//! use swing_analysis::config::AnalysisConfig;
//! use swing_analysis::pipeline::{AnalysisRequest, CancelToken, SwingAnalyzer};
//! use swing_analysis::segmentation::StrokeType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::from_file("config.yaml")?;
//! let analyzer = SwingAnalyzer::new(config)?;
//!
//! let request = AnalysisRequest {
//!     stroke: StrokeType::Forehand,
//!     handedness: None, // inferred from the video, flagged when ambiguous
//! };
//!
//! let analysis = analyzer.analyze_file("rally.mp4", &request, &CancelToken::new())?;
//! for report in &analysis.reports {
//!     println!(
//!         "frames {}..{}: score {:.0}",
//!         report.segment.start, report.segment.end, report.score.overall
//!     );
//!     for deviation in &report.score.feature_deviations {
//!         println!("  {}", deviation.describe());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using trajectory filters directly
//!
//! ```no_run
//! use nalgebra::Vector2;
//! use swing_analysis::filters::create_filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("kalman")?;
//! let smoothed = filter.apply(Vector2::new(0.41, 0.62));
//! println!("Filtered wrist position: ({:.3}, {:.3})", smoothed.x, smoothed.y);
//! filter.reset();
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancelling a long analysis
//!
//! ```no_run
//! use swing_analysis::pipeline::CancelToken;
//!
//! # fn main() {
//! let token = CancelToken::new();
//! let handle = token.clone();
//! // Hand `handle` to the caller; the pipeline checks it between frames
//! // and between segments, never mid-frame.
//! handle.cancel();
//! assert!(token.is_cancelled());
//! # }
//! ```

/// Per-frame pose keypoint extraction with crop tracking
pub mod pose_extraction;

/// Trajectory smoothing, gap-filling, and kinematic derivatives
pub mod smoothing;

/// Trajectory filtering algorithms for smoothing joint paths
pub mod filters;

/// Swing boundary detection and phase labeling
pub mod segmentation;

/// Kinematic feature engineering for swing segments
pub mod features;

/// Quality scoring: trained model and heuristic fallback
pub mod scoring;

/// Reference population statistics for z-scoring
pub mod reference_stats;

/// Feature-importance translation into coaching statements
pub mod importance;

/// Diagnostic overlay rendering
pub mod overlay;

/// End-to-end pipeline orchestration
pub mod pipeline;

/// Body keypoint model and crop windows
pub mod keypoints;

/// Video decoding and clip export
pub mod video;

/// Utility functions and checked casts
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
