//! Swing boundary detection and biomechanical phase labeling.
//!
//! A hysteresis state machine over the dominant wrist's speed finds swing
//! segments; within a segment, phases are assigned around the frame of peak
//! wrist speed (the contact moment).

use crate::config::SegmentationConfig;
use crate::keypoints::{hip_midpoint, FrameData, JointId};
use crate::utils::{percentile, smooth_signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied stroke label for a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeType {
    Forehand,
    Backhand,
    Serve,
}

impl StrokeType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StrokeType::Forehand => "forehand",
            StrokeType::Backhand => "backhand",
            StrokeType::Serve => "serve",
        }
    }
}

impl fmt::Display for StrokeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StrokeType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forehand" => Ok(StrokeType::Forehand),
            "backhand" => Ok(StrokeType::Backhand),
            "serve" => Ok(StrokeType::Serve),
            other => Err(crate::Error::InvalidInput(format!("Unknown stroke type: {other}"))),
        }
    }
}

/// Player handedness; decides which wrist drives segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// The wrist joint of the dominant hand
    #[must_use]
    pub fn dominant_wrist(self) -> JointId {
        match self {
            Handedness::Left => JointId::LeftWrist,
            Handedness::Right => JointId::RightWrist,
        }
    }
}

/// How handedness was determined for a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandednessResolution {
    pub handedness: Handedness,
    /// True when inferred from the video rather than supplied by the caller
    pub inferred: bool,
    /// True when the inference was ambiguous; callers should confirm
    pub low_confidence: bool,
}

/// Resolve handedness: a caller-supplied value always wins; otherwise infer
/// from which wrist shows the greater peak acceleration. An ambiguous
/// inference (peaks within `ratio_gate` of each other) is flagged
/// low-confidence rather than silently guessed.
#[must_use]
pub fn resolve_handedness(
    frames: &[FrameData],
    supplied: Option<Handedness>,
    ratio_gate: f32,
) -> HandednessResolution {
    if let Some(handedness) = supplied {
        return HandednessResolution {
            handedness,
            inferred: false,
            low_confidence: false,
        };
    }

    let peak = |wrist: JointId| {
        frames
            .iter()
            .map(|f| f.joint_acceleration(wrist))
            .fold(0.0f32, f32::max)
    };
    let left_peak = peak(JointId::LeftWrist);
    let right_peak = peak(JointId::RightWrist);

    let handedness = if left_peak > right_peak {
        Handedness::Left
    } else {
        Handedness::Right
    };

    let (hi, lo) = (left_peak.max(right_peak), left_peak.min(right_peak));
    let low_confidence = hi <= 0.0 || hi < lo * ratio_gate;

    if low_confidence {
        log::warn!(
            "Handedness inference ambiguous (left peak {left_peak:.3}, right peak {right_peak:.3}); \
             flagging low-confidence"
        );
    }

    HandednessResolution {
        handedness,
        inferred: true,
        low_confidence,
    }
}

/// Biomechanical phase of a frame within a swing. Frames outside any swing
/// are `None`. The order is the phase progression; labels within a segment
/// never regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    None,
    Preparation,
    Backswing,
    Contact,
    FollowThrough,
}

impl Phase {
    /// The four scored phases, in order
    pub const SCORED: [Phase; 4] = [Phase::Preparation, Phase::Backswing, Phase::Contact, Phase::FollowThrough];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::None => "none",
            Phase::Preparation => "preparation",
            Phase::Backswing => "backswing",
            Phase::Contact => "contact",
            Phase::FollowThrough => "follow_through",
        }
    }
}

/// Phase boundary indices, relative to the segment start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBoundaries {
    /// First frame of the backswing (frames before it are preparation)
    pub backswing_start: usize,
    /// The single contact frame (peak dominant-wrist speed)
    pub contact: usize,
}

impl PhaseBoundaries {
    /// Phase of a segment-relative frame index
    #[must_use]
    pub fn label(&self, index: usize) -> Phase {
        if index < self.backswing_start {
            Phase::Preparation
        } else if index < self.contact {
            Phase::Backswing
        } else if index == self.contact {
            Phase::Contact
        } else {
            Phase::FollowThrough
        }
    }

    /// Segment-relative frame range belonging to a phase
    #[must_use]
    pub fn range(&self, phase: Phase, segment_len: usize) -> std::ops::Range<usize> {
        match phase {
            Phase::None => 0..0,
            Phase::Preparation => 0..self.backswing_start.min(segment_len),
            Phase::Backswing => self.backswing_start.min(segment_len)..self.contact.min(segment_len),
            Phase::Contact => self.contact.min(segment_len)..(self.contact + 1).min(segment_len),
            Phase::FollowThrough => (self.contact + 1).min(segment_len)..segment_len,
        }
    }

    /// Per-frame labels for a segment of the given length
    #[must_use]
    pub fn labels(&self, segment_len: usize) -> Vec<Phase> {
        (0..segment_len).map(|i| self.label(i)).collect()
    }

    /// Rescale boundaries proportionally when a segment is resampled
    #[must_use]
    pub fn resampled(&self, source_len: usize, target_len: usize) -> PhaseBoundaries {
        if source_len <= 1 || target_len == 0 {
            return *self;
        }
        let scale = (target_len - 1) as f32 / (source_len - 1) as f32;
        PhaseBoundaries {
            backswing_start: ((self.backswing_start as f32) * scale).round() as usize,
            contact: ((self.contact as f32) * scale).round() as usize,
        }
    }
}

/// A contiguous frame range classified as one stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingSegment {
    /// First frame index (inclusive), in video frame space
    pub start: usize,
    /// End frame index (exclusive)
    pub end: usize,
    /// Caller-supplied stroke label carried with the segment
    pub stroke_hint: Option<StrokeType>,
}

impl SwingSegment {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Hysteresis states of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmenterState {
    Idle,
    InSwing,
}

/// Swing boundary detector and phase labeler
pub struct SwingSegmenter {
    config: SegmentationConfig,
}

impl SwingSegmenter {
    #[must_use]
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Dominant-wrist speed series, smoothed for thresholding
    fn speed_series(&self, frames: &[FrameData], handedness: Handedness) -> Vec<f32> {
        let wrist = handedness.dominant_wrist();
        let speeds: Vec<f32> = frames.iter().map(|f| f.joint_speed(wrist)).collect();
        smooth_signal(&speeds, self.config.speed_smoothing_window)
    }

    /// Detect swing segments in a smoothed frame sequence.
    ///
    /// Zero segments is a valid outcome, not an error. Segments shorter than
    /// the minimum duration (no clear velocity peak) or longer than the
    /// maximum are discarded as noise.
    #[must_use]
    pub fn detect_segments(
        &self,
        frames: &[FrameData],
        handedness: Handedness,
        stroke_hint: Option<StrokeType>,
    ) -> Vec<SwingSegment> {
        if frames.len() < self.config.min_segment_frames {
            return Vec::new();
        }

        let speeds = self.speed_series(frames, handedness);

        let mut enter = self.config.enter_speed;
        if self.config.adaptive_threshold {
            enter = enter.max(percentile(&speeds, 75.0));
        }
        let exit = self.config.exit_speed.min(enter);

        let mut segments = Vec::new();
        let mut state = SegmenterState::Idle;
        let mut run = 0usize; // consecutive frames satisfying the pending transition
        let mut start = 0usize;

        for (i, &speed) in speeds.iter().enumerate() {
            match state {
                SegmenterState::Idle => {
                    if speed > enter {
                        run += 1;
                        if run >= self.config.enter_frames {
                            state = SegmenterState::InSwing;
                            start = i + 1 - run;
                            run = 0;
                        }
                    } else {
                        run = 0;
                    }
                }
                SegmenterState::InSwing => {
                    if speed < exit {
                        run += 1;
                        if run >= self.config.exit_frames {
                            let end = i + 1 - run;
                            segments.push((start, end));
                            state = SegmenterState::Idle;
                            run = 0;
                        }
                    } else {
                        run = 0;
                    }
                }
            }
        }
        if state == SegmenterState::InSwing {
            segments.push((start, frames.len()));
        }

        segments
            .into_iter()
            .filter(|(s, e)| {
                let len = e - s;
                let keep = len >= self.config.min_segment_frames && len <= self.config.max_segment_frames;
                if !keep {
                    log::debug!("Discarding segment {s}..{e} ({len} frames) outside duration bounds");
                }
                keep
            })
            .map(|(start, end)| SwingSegment { start, end, stroke_hint })
            .collect()
    }

    /// Assign phase boundaries within a detected segment.
    ///
    /// Contact is the single frame of peak dominant-wrist speed. The
    /// backswing is the contiguous run before contact in which wrist
    /// displacement from the body centerline is increasing; everything
    /// before that run is preparation, everything after contact is
    /// follow-through.
    #[must_use]
    pub fn label_phases(&self, frames: &[FrameData], segment: &SwingSegment, handedness: Handedness) -> PhaseBoundaries {
        let slice = &frames[segment.start..segment.end];
        let wrist = handedness.dominant_wrist();

        let contact = slice
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.joint_speed(wrist)
                    .partial_cmp(&b.joint_speed(wrist))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        // Wrist displacement from the body centerline, per frame
        let displacement: Vec<f32> = slice
            .iter()
            .map(|f| (f.keypoints[wrist.index()].x - hip_midpoint(&f.keypoints).x).abs())
            .collect();

        let mut backswing_start = contact;
        while backswing_start > 0 && displacement[backswing_start - 1] < displacement[backswing_start] {
            backswing_start -= 1;
        }

        PhaseBoundaries {
            backswing_start,
            contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NUM_KEYPOINTS;
    use crate::keypoints::Keypoint;
    use nalgebra::Vector2;

    fn frame(speed: f32, wrist_x: f32) -> FrameData {
        let mut keypoints = [Keypoint::new(0.5, 0.5, 0.9); NUM_KEYPOINTS];
        keypoints[JointId::RightWrist.index()] = Keypoint::new(wrist_x, 0.4, 0.9);
        let mut velocities = [Vector2::zeros(); NUM_KEYPOINTS];
        velocities[JointId::RightWrist.index()] = Vector2::new(speed, 0.0);
        FrameData {
            timestamp: 0.0,
            keypoints,
            velocities: Some(velocities),
            accelerations: Some([Vector2::zeros(); NUM_KEYPOINTS]),
            joint_angles: [90.0; 8],
        }
    }

    fn config() -> SegmentationConfig {
        SegmentationConfig {
            enter_speed: 0.5,
            exit_speed: 0.2,
            enter_frames: 2,
            exit_frames: 2,
            min_segment_frames: 4,
            max_segment_frames: 200,
            speed_smoothing_window: 1,
            adaptive_threshold: false,
            handedness_ratio: 1.2,
        }
    }

    #[test]
    fn test_single_burst_detected() {
        let mut frames: Vec<FrameData> = (0..10).map(|_| frame(0.0, 0.5)).collect();
        frames.extend((0..10).map(|_| frame(1.0, 0.6)));
        frames.extend((0..10).map(|_| frame(0.0, 0.5)));

        let segmenter = SwingSegmenter::new(config());
        let segments = segmenter.detect_segments(&frames, Handedness::Right, None);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].start >= 9 && segments[0].start <= 11);
        assert!(segments[0].end >= 19 && segments[0].end <= 21);
    }

    #[test]
    fn test_noise_spike_rejected() {
        // A one-frame spike never satisfies the sustain window
        let mut frames: Vec<FrameData> = (0..10).map(|_| frame(0.0, 0.5)).collect();
        frames.push(frame(5.0, 0.6));
        frames.extend((0..10).map(|_| frame(0.0, 0.5)));

        let segmenter = SwingSegmenter::new(config());
        assert!(segmenter.detect_segments(&frames, Handedness::Right, None).is_empty());
    }

    #[test]
    fn test_short_segment_discarded() {
        let mut cfg = config();
        cfg.min_segment_frames = 8;
        let mut frames: Vec<FrameData> = (0..10).map(|_| frame(0.0, 0.5)).collect();
        frames.extend((0..5).map(|_| frame(1.0, 0.6)));
        frames.extend((0..10).map(|_| frame(0.0, 0.5)));

        let segmenter = SwingSegmenter::new(cfg);
        assert!(segmenter.detect_segments(&frames, Handedness::Right, None).is_empty());
    }

    #[test]
    fn test_phase_labels_monotonic() {
        // Displacement rises toward the peak-speed frame then falls
        let frames: Vec<FrameData> = (0..20)
            .map(|i| {
                let speed = if i == 12 { 2.0 } else { 0.8 };
                let x = 0.5 + 0.02 * (i.min(12) as f32);
                frame(speed, x)
            })
            .collect();
        let segment = SwingSegment {
            start: 0,
            end: frames.len(),
            stroke_hint: None,
        };

        let segmenter = SwingSegmenter::new(config());
        let boundaries = segmenter.label_phases(&frames, &segment, Handedness::Right);
        assert_eq!(boundaries.contact, 12);

        let labels = boundaries.labels(frames.len());
        for pair in labels.windows(2) {
            assert!(pair[0] <= pair[1], "phase regressed: {:?}", pair);
        }
        assert_eq!(labels[12], Phase::Contact);
        assert_eq!(labels[13], Phase::FollowThrough);
    }

    #[test]
    fn test_handedness_supplied_wins() {
        let frames = vec![frame(0.0, 0.5)];
        let res = resolve_handedness(&frames, Some(Handedness::Left), 1.2);
        assert_eq!(res.handedness, Handedness::Left);
        assert!(!res.inferred);
        assert!(!res.low_confidence);
    }

    #[test]
    fn test_handedness_ambiguous_flagged() {
        // No acceleration anywhere: inference has nothing to go on
        let frames = vec![frame(0.0, 0.5); 5];
        let res = resolve_handedness(&frames, None, 1.2);
        assert!(res.inferred);
        assert!(res.low_confidence);
    }

    #[test]
    fn test_boundary_resampling_proportional() {
        let boundaries = PhaseBoundaries {
            backswing_start: 30,
            contact: 60,
        };
        let resampled = boundaries.resampled(120, 90);
        assert_eq!(resampled.contact, 45);
        assert_eq!(resampled.backswing_start, 22);
    }
}
