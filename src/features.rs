//! Kinematic feature engineering for swing segments.
//!
//! A segment's frames are converted into a fixed-size feature matrix:
//! speed/acceleration pairs for the twelve limb joints, the eight anatomical
//! joint angles, and the subject-normalized positions of all seventeen
//! joints — 66 features per frame, resampled to a fixed sequence length so
//! every swing presents the same shape to the scoring model.
//!
//! Left-handed swings are mirrored to the canonical right-handed
//! orientation first, so a single model serves both.

use crate::constants::{EPSILON, NUM_FEATURES, NUM_JOINT_ANGLES, NUM_KEYPOINTS, NUM_MOTION_JOINTS};
use crate::keypoints::{
    compute_joint_angles, hip_midpoint, torso_length, FrameData, JointId, JOINT_ANGLE_NAMES, JOINT_ANGLE_TRIPLES,
    MOTION_JOINTS,
};
use crate::segmentation::{Handedness, PhaseBoundaries};
use crate::utils::lerp;
use crate::{Error, Result};
use ndarray::Array2;

/// Fixed-length feature representation of one swing
#[derive(Debug, Clone)]
pub struct SwingFeatures {
    /// `sequence_length × NUM_FEATURES` matrix
    pub matrix: Array2<f32>,
    /// Phase boundaries in resampled frame space
    pub boundaries: PhaseBoundaries,
    /// Frame count of the source segment before resampling
    pub source_len: usize,
}

impl SwingFeatures {
    /// Resampled sequence length
    #[must_use]
    pub fn sequence_length(&self) -> usize {
        self.matrix.nrows()
    }

    /// Map a resampled frame index back to a segment-relative source index
    #[must_use]
    pub fn source_index(&self, resampled: usize) -> usize {
        let seq_len = self.sequence_length();
        if seq_len <= 1 || self.source_len == 0 {
            return 0;
        }
        let scale = (self.source_len - 1) as f32 / (seq_len - 1) as f32;
        ((resampled as f32 * scale).round() as usize).min(self.source_len - 1)
    }
}

/// Converts smoothed frame sequences into model-ready feature matrices
pub struct FeatureExtractor {
    sequence_length: usize,
}

impl FeatureExtractor {
    /// # Errors
    ///
    /// Returns a configuration error if `sequence_length` is below 2.
    pub fn new(sequence_length: usize) -> Result<Self> {
        if sequence_length < 2 {
            return Err(Error::ConfigError(format!(
                "Sequence length must be at least 2, got {sequence_length}"
            )));
        }
        Ok(Self { sequence_length })
    }

    /// Extract the feature matrix for one segment's frames.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty segment; all other numeric edge
    /// cases are absorbed.
    pub fn extract(
        &self,
        frames: &[FrameData],
        boundaries: PhaseBoundaries,
        handedness: Handedness,
    ) -> Result<SwingFeatures> {
        if frames.is_empty() {
            return Err(Error::InvalidInput("Cannot extract features from an empty segment".to_string()));
        }

        let canonical: Vec<FrameData>;
        let frames = if handedness == Handedness::Left {
            canonical = frames.iter().map(mirror_frame).collect();
            &canonical[..]
        } else {
            frames
        };

        let rows: Vec<[f32; NUM_FEATURES]> = frames.iter().map(frame_features).collect();
        let matrix = resample_rows(&rows, self.sequence_length);

        Ok(SwingFeatures {
            matrix,
            boundaries: boundaries.resampled(frames.len(), self.sequence_length),
            source_len: frames.len(),
        })
    }
}

/// Mirror a frame to canonical right-handed orientation: left/right joints
/// swapped and x reflected about the image center. Angles are recomputed
/// from the mirrored positions.
fn mirror_frame(frame: &FrameData) -> FrameData {
    let mut keypoints = frame.keypoints;
    for joint in JointId::ALL {
        let src = frame.keypoints[joint.mirrored().index()];
        keypoints[joint.index()] = crate::keypoints::Keypoint::new(1.0 - src.x, src.y, src.confidence);
    }

    let swap_reflect = |field: &Option<[nalgebra::Vector2<f32>; NUM_KEYPOINTS]>| {
        field.map(|vecs| {
            let mut out = vecs;
            for joint in JointId::ALL {
                let v = vecs[joint.mirrored().index()];
                out[joint.index()] = nalgebra::Vector2::new(-v.x, v.y);
            }
            out
        })
    };

    FrameData {
        timestamp: frame.timestamp,
        keypoints,
        velocities: swap_reflect(&frame.velocities),
        accelerations: swap_reflect(&frame.accelerations),
        joint_angles: compute_joint_angles(&keypoints),
    }
}

/// One frame's feature row
fn frame_features(frame: &FrameData) -> [f32; NUM_FEATURES] {
    let mut row = [0.0f32; NUM_FEATURES];
    let mut i = 0;

    // Speed and acceleration magnitude per limb joint
    for joint in MOTION_JOINTS {
        row[i] = frame.joint_speed(joint);
        row[i + 1] = frame.joint_acceleration(joint);
        i += 2;
    }

    // Anatomical joint angles (smoothing guarantees no NaN here)
    for angle in frame.joint_angles {
        row[i] = if angle.is_nan() { 0.0 } else { angle };
        i += 1;
    }

    // Subject-normalized positions: hip-centered, torso-length-scaled
    let center = hip_midpoint(&frame.keypoints);
    let mut scale = torso_length(&frame.keypoints);
    if f64::from(scale) < EPSILON {
        scale = 1.0;
    }
    for joint in JointId::ALL {
        let p = frame.keypoints[joint.index()].position() - center;
        row[i] = p.x / scale;
        row[i + 1] = p.y / scale;
        i += 2;
    }

    debug_assert_eq!(i, NUM_FEATURES);
    row
}

/// Uniform-index linear resampling of feature rows to `target_len`
fn resample_rows(rows: &[[f32; NUM_FEATURES]], target_len: usize) -> Array2<f32> {
    let mut matrix = Array2::zeros((target_len, NUM_FEATURES));
    let n = rows.len();

    for t in 0..target_len {
        let src = if target_len <= 1 || n <= 1 {
            0.0
        } else {
            t as f32 * (n - 1) as f32 / (target_len - 1) as f32
        };
        let lo = src.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        let alpha = src - lo as f32;

        for f in 0..NUM_FEATURES {
            matrix[[t, f]] = lerp(rows[lo][f], rows[hi][f], alpha);
        }
    }
    matrix
}

/// Human-readable name of a feature index
#[must_use]
pub fn feature_name(index: usize) -> String {
    let motion_end = NUM_MOTION_JOINTS * 2;
    let angle_end = motion_end + NUM_JOINT_ANGLES;

    if index < motion_end {
        let joint = MOTION_JOINTS[index / 2];
        if index % 2 == 0 {
            format!("{}_speed", joint.name())
        } else {
            format!("{}_acceleration", joint.name())
        }
    } else if index < angle_end {
        JOINT_ANGLE_NAMES[index - motion_end].to_string()
    } else if index < NUM_FEATURES {
        let rel = index - angle_end;
        let joint = JointId::ALL[rel / 2];
        if rel % 2 == 0 {
            format!("{}_x", joint.name())
        } else {
            format!("{}_y", joint.name())
        }
    } else {
        format!("feature_{index}")
    }
}

/// The joint a feature is attributed to, for attention-weighted ranking.
/// Angle features belong to their vertex joint.
#[must_use]
pub fn feature_joint(index: usize) -> Option<JointId> {
    let motion_end = NUM_MOTION_JOINTS * 2;
    let angle_end = motion_end + NUM_JOINT_ANGLES;

    if index < motion_end {
        Some(MOTION_JOINTS[index / 2])
    } else if index < angle_end {
        Some(JOINT_ANGLE_TRIPLES[index - motion_end].1)
    } else if index < NUM_FEATURES {
        Some(JointId::ALL[(index - angle_end) / 2])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Keypoint;
    use nalgebra::Vector2;

    fn simple_frame(wrist_x: f32, speed: f32) -> FrameData {
        let mut keypoints = [Keypoint::new(0.5, 0.5, 0.9); NUM_KEYPOINTS];
        keypoints[JointId::LeftShoulder.index()] = Keypoint::new(0.45, 0.3, 0.9);
        keypoints[JointId::RightShoulder.index()] = Keypoint::new(0.55, 0.3, 0.9);
        keypoints[JointId::LeftHip.index()] = Keypoint::new(0.45, 0.6, 0.9);
        keypoints[JointId::RightHip.index()] = Keypoint::new(0.55, 0.6, 0.9);
        keypoints[JointId::RightWrist.index()] = Keypoint::new(wrist_x, 0.4, 0.9);
        let mut velocities = [Vector2::zeros(); NUM_KEYPOINTS];
        velocities[JointId::RightWrist.index()] = Vector2::new(speed, 0.0);
        FrameData {
            timestamp: 0.0,
            keypoints,
            velocities: Some(velocities),
            accelerations: Some([Vector2::zeros(); NUM_KEYPOINTS]),
            joint_angles: [90.0; NUM_JOINT_ANGLES],
        }
    }

    #[test]
    fn test_feature_count_and_shape() {
        assert_eq!(NUM_FEATURES, 66);
        let frames: Vec<FrameData> = (0..30).map(|_| simple_frame(0.6, 1.0)).collect();
        let extractor = FeatureExtractor::new(90).unwrap();
        let features = extractor
            .extract(&frames, PhaseBoundaries { backswing_start: 5, contact: 15 }, Handedness::Right)
            .unwrap();
        assert_eq!(features.matrix.shape(), &[90, 66]);
    }

    #[test]
    fn test_resampling_preserves_boundary_timing() {
        let frames: Vec<FrameData> = (0..30).map(|_| simple_frame(0.6, 1.0)).collect();
        let extractor = FeatureExtractor::new(90).unwrap();
        let features = extractor
            .extract(&frames, PhaseBoundaries { backswing_start: 0, contact: 29 }, Handedness::Right)
            .unwrap();
        // Contact at the last source frame stays at the last resampled frame
        assert_eq!(features.boundaries.contact, 89);
    }

    #[test]
    fn test_positions_centered_on_hips() {
        let frames = vec![simple_frame(0.6, 0.0); 3];
        let extractor = FeatureExtractor::new(10).unwrap();
        let features = extractor
            .extract(&frames, PhaseBoundaries { backswing_start: 0, contact: 1 }, Handedness::Right)
            .unwrap();

        // Hip midpoint x sits at feature index for left_hip_x .. average of hips is 0
        let angle_end = NUM_MOTION_JOINTS * 2 + NUM_JOINT_ANGLES;
        let lhip_x = features.matrix[[0, angle_end + JointId::LeftHip.index() * 2]];
        let rhip_x = features.matrix[[0, angle_end + JointId::RightHip.index() * 2]];
        assert!((lhip_x + rhip_x).abs() < 1e-5);
    }

    #[test]
    fn test_mirroring_canonicalizes_left_handed() {
        // A left-handed swing: the left wrist carries the motion
        let mut frame = simple_frame(0.5, 0.0);
        let mut velocities = frame.velocities.unwrap();
        velocities[JointId::RightWrist.index()] = Vector2::zeros();
        velocities[JointId::LeftWrist.index()] = Vector2::new(2.0, 0.0);
        frame.velocities = Some(velocities);
        let frames = vec![frame; 5];

        let extractor = FeatureExtractor::new(10).unwrap();
        let boundaries = PhaseBoundaries { backswing_start: 0, contact: 2 };
        let features = extractor.extract(&frames, boundaries, Handedness::Left).unwrap();

        // After mirroring, the dominant (left) wrist data lands in the
        // right-wrist feature slots
        let slot = |target: JointId| MOTION_JOINTS.iter().position(|&j| j == target).unwrap() * 2;
        assert!((features.matrix[[0, slot(JointId::RightWrist)]] - 2.0).abs() < 1e-5);
        assert!(features.matrix[[0, slot(JointId::LeftWrist)]].abs() < 1e-5);
    }

    #[test]
    fn test_feature_names_cover_layout() {
        assert_eq!(feature_name(0), "left_shoulder_speed");
        assert_eq!(feature_name(1), "left_shoulder_acceleration");
        assert_eq!(feature_name(24), "left_elbow_angle");
        assert_eq!(feature_name(32), "nose_x");
        assert_eq!(feature_name(65), "right_ankle_y");
        assert_eq!(feature_joint(24), Some(JointId::LeftElbow));
        assert_eq!(feature_joint(66), None);
    }

    #[test]
    fn test_source_index_round_trip() {
        let frames: Vec<FrameData> = (0..45).map(|_| simple_frame(0.6, 1.0)).collect();
        let extractor = FeatureExtractor::new(90).unwrap();
        let features = extractor
            .extract(&frames, PhaseBoundaries { backswing_start: 0, contact: 22 }, Handedness::Right)
            .unwrap();
        assert_eq!(features.source_index(0), 0);
        assert_eq!(features.source_index(89), 44);
    }
}
