//! End-to-end swing analysis orchestration.
//!
//! One [`SwingAnalyzer`] owns the pose session, the scorer, and the
//! reference statistics; it is constructed once from configuration and then
//! used for any number of videos. Frame-by-frame pose extraction is an
//! explicit sequential fold because each frame's crop window depends on the
//! previous frame's keypoints. Independent videos are embarrassingly
//! parallel: run one analyzer per worker (inference sessions are not shared
//! across threads).

use crate::config::AnalysisConfig;
use crate::features::{FeatureExtractor, SwingFeatures};
use crate::importance::ImportanceTranslator;
use crate::keypoints::{CropRegion, FrameData};
use crate::overlay::{OverlayImage, OverlayRenderer};
use crate::pose_extraction::PoseExtractor;
use crate::reference_stats::ReferenceStats;
use crate::scoring::{create_scorer, AnalysisScore, AttentionWeights, SwingScorer};
use crate::segmentation::{
    resolve_handedness, Handedness, HandednessResolution, Phase, PhaseBoundaries, StrokeType, SwingSegment,
    SwingSegmenter,
};
use crate::smoothing::{RawFrame, TrajectorySmoother};
use crate::video::load_video;
use crate::{Error, Result};
use log::{debug, info, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked between frames and between
/// segments, never mid-frame
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What the caller wants analyzed
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest {
    /// Stroke label for the video (selects the reference tables)
    pub stroke: StrokeType,
    /// Player handedness; `None` asks the pipeline to infer it
    pub handedness: Option<Handedness>,
}

/// Everything produced for one detected swing
#[derive(Debug, Serialize)]
pub struct SwingReport {
    pub segment: SwingSegment,
    /// Phase boundaries in segment-relative frame space
    pub boundaries: PhaseBoundaries,
    /// Per-frame phase labels for the segment
    pub phase_labels: Vec<Phase>,
    pub score: AnalysisScore,
    pub attention: AttentionWeights,
    /// Rendered overlays (PNG bytes are not serialized, frame indices are)
    pub overlays: Vec<OverlayImage>,
}

/// The full result of analyzing one video. An empty `reports` list means no
/// swing was detected — a valid outcome, distinct from failure.
#[derive(Debug, Serialize)]
pub struct VideoAnalysis {
    pub fps: f64,
    pub frame_count: usize,
    pub handedness: HandednessResolution,
    pub reports: Vec<SwingReport>,
}

/// The swing analysis pipeline: pose extraction → smoothing → segmentation
/// → features → scoring → importance + overlays
pub struct SwingAnalyzer {
    config: AnalysisConfig,
    pose: PoseExtractor,
    smoother: TrajectorySmoother,
    segmenter: SwingSegmenter,
    features: FeatureExtractor,
    scorer: Box<dyn SwingScorer>,
    translator: ImportanceTranslator,
    overlay: OverlayRenderer,
}

impl SwingAnalyzer {
    /// Build the pipeline from configuration. Loads the pose model, the
    /// scoring model (or selects the heuristic fallback), and the reference
    /// statistics exactly once.
    ///
    /// # Errors
    ///
    /// Configuration defects (invalid parameters, missing pose model, shape
    /// contract violations, missing model with fallback disabled) fail here,
    /// before any video is touched.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing swing analysis pipeline");

        let pose = PoseExtractor::new(&config.models.pose_model, config.pose.confidence_threshold)?;

        let stats = if config.models.reference_stats.exists() {
            Arc::new(ReferenceStats::from_file(&config.models.reference_stats)?)
        } else if config.scoring.allow_heuristic_fallback {
            warn!(
                "Reference statistics not found at {}, using uniform placeholder",
                config.models.reference_stats.display()
            );
            Arc::new(ReferenceStats::uniform())
        } else {
            return Err(Error::ConfigError(format!(
                "Reference statistics not found: {}",
                config.models.reference_stats.display()
            )));
        };

        let scorer = create_scorer(
            config.models.scoring_model.as_deref(),
            config.scoring.allow_heuristic_fallback,
            config.features.sequence_length,
            Arc::clone(&stats),
        )?;
        info!("Scoring with {}", scorer.name());

        Ok(Self {
            smoother: TrajectorySmoother::new(config.pose.confidence_threshold, &config.smoothing)?,
            segmenter: SwingSegmenter::new(config.segmentation.clone()),
            features: FeatureExtractor::new(config.features.sequence_length)?,
            translator: ImportanceTranslator::new(Arc::clone(&stats), config.scoring.top_deviations),
            overlay: OverlayRenderer::new(config.overlay.clone()),
            pose,
            scorer,
            config,
        })
    }

    /// Whether the active scorer is the heuristic fallback
    #[must_use]
    pub fn is_heuristic(&self) -> bool {
        self.scorer.is_heuristic()
    }

    /// Analyze a video file
    ///
    /// # Errors
    ///
    /// Propagates video decode failures, model-level failures, and
    /// cancellation; data defects inside the video are absorbed.
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        request: &AnalysisRequest,
        cancel: &CancelToken,
    ) -> Result<VideoAnalysis> {
        let video = load_video(&path)?;
        info!(
            "Analyzing {} ({} frames, {:.1} fps)",
            path.as_ref().display(),
            video.frames.len(),
            video.fps
        );
        self.analyze_frames(&video.frames, video.fps, request, cancel)
    }

    /// Analyze decoded frames
    ///
    /// # Errors
    ///
    /// See [`Self::analyze_file`].
    pub fn analyze_frames(
        &self,
        frames: &[Mat],
        fps: f64,
        request: &AnalysisRequest,
        cancel: &CancelToken,
    ) -> Result<VideoAnalysis> {
        if frames.is_empty() {
            return Err(Error::InvalidInput("No frames to analyze".to_string()));
        }

        let smoothed = self.track_and_smooth(frames, fps, cancel)?;

        let handedness = resolve_handedness(
            &smoothed,
            request.handedness,
            self.config.segmentation.handedness_ratio,
        );
        if handedness.low_confidence {
            warn!("Handedness is low-confidence; caller confirmation recommended");
        }

        let segments = self
            .segmenter
            .detect_segments(&smoothed, handedness.handedness, Some(request.stroke));
        info!("Detected {} swing segment(s)", segments.len());

        let mut reports = Vec::with_capacity(segments.len());
        for segment in segments {
            cancel.check()?;
            reports.push(self.score_segment(frames, &smoothed, segment, request, handedness.handedness)?);
        }

        Ok(VideoAnalysis {
            fps,
            frame_count: frames.len(),
            handedness,
            reports,
        })
    }

    /// Sequential pose-extraction fold with crop tracking, then smoothing.
    /// The crop window for frame t+1 is derived from frame t's keypoints, so
    /// this loop cannot be parallelized.
    fn track_and_smooth(&self, frames: &[Mat], fps: f64, cancel: &CancelToken) -> Result<Vec<FrameData>> {
        let (width, height) = (frames[0].cols(), frames[0].rows());
        let dt = if fps > 0.0 { 1.0 / fps } else { 1.0 / crate::constants::DEFAULT_FPS };

        let mut crop = CropRegion::full_frame(width, height);
        let mut raw = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            cancel.check()?;
            let keypoints = self.pose.extract(frame, &crop)?;
            crop = self.pose.next_crop_region(&keypoints, &crop, width, height);
            raw.push(RawFrame {
                timestamp: i as f64 * dt,
                keypoints,
            });
        }
        debug!("Extracted poses for {} frames", raw.len());

        self.smoother.smooth(&raw, fps)
    }

    /// Score one detected segment and assemble its report
    fn score_segment(
        &self,
        video_frames: &[Mat],
        smoothed: &[FrameData],
        segment: SwingSegment,
        request: &AnalysisRequest,
        handedness: Handedness,
    ) -> Result<SwingReport> {
        let boundaries = self.segmenter.label_phases(smoothed, &segment, handedness);
        let segment_frames = &smoothed[segment.start..segment.end];

        let features = self.features.extract(segment_frames, boundaries, handedness)?;
        let (mut score, attention) = self.scorer.score(&features, request.stroke)?;
        score.feature_deviations = self.translator.translate(&features, request.stroke, &attention);

        let overlays = self.render_overlays(video_frames, smoothed, &segment, &features, &score, &attention);

        debug!(
            "Segment {}..{}: score {:.1} ({} deviations, {} overlays)",
            segment.start,
            segment.end,
            score.overall,
            score.feature_deviations.len(),
            overlays.len()
        );

        Ok(SwingReport {
            phase_labels: boundaries.labels(segment.len()),
            segment,
            boundaries,
            score,
            attention,
            overlays,
        })
    }

    /// Overlay rendering must never sink an otherwise valid analysis
    fn render_overlays(
        &self,
        video_frames: &[Mat],
        smoothed: &[FrameData],
        segment: &SwingSegment,
        features: &SwingFeatures,
        score: &AnalysisScore,
        attention: &AttentionWeights,
    ) -> Vec<OverlayImage> {
        match self.overlay.render(
            video_frames,
            smoothed,
            segment,
            features,
            score,
            attention,
            self.config.pose.confidence_threshold,
        ) {
            Ok(overlays) => overlays,
            Err(e) => {
                warn!("Overlay rendering failed, continuing without images: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }
}
