//! Diagnostic overlay rendering.
//!
//! The frames with the highest temporal attention ("worst moments") get the
//! skeleton drawn on top of the source image, with joints implicated by
//! moderate/significant deviations highlighted in a warning color, plus the
//! score and top deviation text.

use crate::config::OverlayConfig;
use crate::features::{feature_joint, SwingFeatures};
use crate::importance::Severity;
use crate::keypoints::{FrameData, JointId, SKELETON_EDGES};
use crate::scoring::{AnalysisScore, AttentionWeights};
use crate::segmentation::SwingSegment;
use crate::utils::safe_cast::f32_to_i32_clamp;
use crate::Result;
use opencv::core::{Mat, Point, Scalar, Vector};
use opencv::imgcodecs;
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA};
use opencv::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

// BGR drawing colors
fn color_neutral() -> Scalar {
    Scalar::new(80.0, 220.0, 80.0, 0.0)
}
fn color_moderate() -> Scalar {
    Scalar::new(0.0, 165.0, 255.0, 0.0)
}
fn color_significant() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}
fn color_text() -> Scalar {
    Scalar::new(255.0, 255.0, 255.0, 0.0)
}

/// One rendered overlay, PNG-encoded, tagged with its source frame index
#[derive(Debug, Clone, Serialize)]
pub struct OverlayImage {
    /// Frame index in video frame space
    pub frame_index: usize,
    /// Encoded PNG bytes (omitted from serialized reports)
    #[serde(skip)]
    pub png: Vec<u8>,
}

/// Select up to `top_frames` segment-relative source frames by descending
/// temporal attention, skipping frames without enough confident joints.
/// Returns an empty list when no frame is usable.
#[must_use]
pub fn select_frames(
    attention: &AttentionWeights,
    features: &SwingFeatures,
    segment_frames: &[FrameData],
    confidence_threshold: f32,
    min_confident_joints: usize,
    top_frames: usize,
) -> Vec<usize> {
    let mut selected = Vec::new();
    for resampled in attention.top_frames(attention.temporal.len()) {
        let source = features.source_index(resampled);
        if selected.contains(&source) {
            continue;
        }
        let Some(frame) = segment_frames.get(source) else {
            continue;
        };
        if frame.confident_joint_count(confidence_threshold) < min_confident_joints {
            log::debug!("Skipping overlay frame {source}: too few confident joints");
            continue;
        }
        selected.push(source);
        if selected.len() >= top_frames {
            break;
        }
    }
    selected
}

/// Draws diagnostic skeletons and score text onto source frames
pub struct OverlayRenderer {
    config: OverlayConfig,
}

impl OverlayRenderer {
    #[must_use]
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    /// Render overlays for one scored swing.
    ///
    /// # Errors
    ///
    /// Returns an error only for drawing or encoding failures; unusable
    /// frames are skipped, and zero overlays is a valid outcome.
    pub fn render(
        &self,
        video_frames: &[Mat],
        smoothed: &[FrameData],
        segment: &SwingSegment,
        features: &SwingFeatures,
        score: &AnalysisScore,
        attention: &AttentionWeights,
        confidence_threshold: f32,
    ) -> Result<Vec<OverlayImage>> {
        let segment_frames = &smoothed[segment.start..segment.end];
        let chosen = select_frames(
            attention,
            features,
            segment_frames,
            confidence_threshold,
            self.config.min_confident_joints,
            self.config.top_frames,
        );

        // Joints implicated by moderate or worse deviations, with their
        // strongest severity
        let mut joint_severity: HashMap<JointId, Severity> = HashMap::new();
        for deviation in &score.feature_deviations {
            if deviation.severity < Severity::Moderate {
                continue;
            }
            if let Some(joint) = feature_joint(deviation.feature_index) {
                let entry = joint_severity.entry(joint).or_insert(deviation.severity);
                *entry = (*entry).max(deviation.severity);
            }
        }

        let mut overlays = Vec::with_capacity(chosen.len());
        for rel in chosen {
            let frame_index = segment.start + rel;
            let Some(source) = video_frames.get(frame_index) else {
                continue;
            };
            let mut canvas = source.try_clone()?;
            self.draw_skeleton(&mut canvas, &segment_frames[rel], &joint_severity, confidence_threshold)?;
            self.draw_text(&mut canvas, score)?;

            let mut buffer = Vector::new();
            imgcodecs::imencode(".png", &canvas, &mut buffer, &Vector::new())?;
            overlays.push(OverlayImage {
                frame_index,
                png: buffer.to_vec(),
            });
        }
        Ok(overlays)
    }

    fn draw_skeleton(
        &self,
        canvas: &mut Mat,
        frame: &FrameData,
        joint_severity: &HashMap<JointId, Severity>,
        confidence_threshold: f32,
    ) -> Result<()> {
        let (w, h) = (canvas.cols(), canvas.rows());
        let to_px = |joint: JointId| {
            let kp = frame.keypoints[joint.index()];
            Point::new(f32_to_i32_clamp(kp.x * w as f32, 0, w - 1), f32_to_i32_clamp(kp.y * h as f32, 0, h - 1))
        };

        for (a, b) in SKELETON_EDGES {
            let visible = frame.keypoints[a.index()].confidence >= confidence_threshold
                && frame.keypoints[b.index()].confidence >= confidence_threshold;
            if !visible {
                continue;
            }
            imgproc::line(canvas, to_px(a), to_px(b), color_neutral(), 2, LINE_AA, 0)?;
        }

        for joint in JointId::ALL {
            if frame.keypoints[joint.index()].confidence < confidence_threshold {
                continue;
            }
            let (color, radius) = match joint_severity.get(&joint) {
                Some(Severity::Significant) => (color_significant(), 7),
                Some(_) => (color_moderate(), 6),
                None => (color_neutral(), 4),
            };
            imgproc::circle(canvas, to_px(joint), radius, color, -1, LINE_8, 0)?;
        }
        Ok(())
    }

    fn draw_text(&self, canvas: &mut Mat, score: &AnalysisScore) -> Result<()> {
        let mut lines = vec![format!(
            "Score: {:.0}{}",
            score.overall,
            if score.heuristic { " (heuristic)" } else { "" }
        )];
        for deviation in score.feature_deviations.iter().take(self.config.text_deviations) {
            lines.push(deviation.describe());
        }

        for (i, line) in lines.iter().enumerate() {
            let origin = Point::new(12, 28 + 24 * i as i32);
            imgproc::put_text(
                canvas,
                line,
                origin,
                FONT_HERSHEY_SIMPLEX,
                0.6,
                color_text(),
                2,
                LINE_AA,
                false,
            )?;
        }
        Ok(())
    }
}
