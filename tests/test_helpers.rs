//! Shared synthetic-trajectory builders for integration tests
#![allow(dead_code)]

use nalgebra::Vector2;
use swing_analysis::config::SegmentationConfig;
use swing_analysis::constants::{NUM_JOINT_ANGLES, NUM_KEYPOINTS};
use swing_analysis::keypoints::{FrameData, JointId, Keypoint};
use swing_analysis::smoothing::RawFrame;

/// Frame rate used by all synthetic sequences
pub const FPS: f64 = 30.0;

/// A plausible standing pose: torso joints placed, everything confident
pub fn base_keypoints() -> [Keypoint; NUM_KEYPOINTS] {
    let mut kps = [Keypoint::new(0.5, 0.45, 0.9); NUM_KEYPOINTS];
    kps[JointId::Nose.index()] = Keypoint::new(0.5, 0.2, 0.9);
    kps[JointId::LeftShoulder.index()] = Keypoint::new(0.44, 0.32, 0.9);
    kps[JointId::RightShoulder.index()] = Keypoint::new(0.56, 0.32, 0.9);
    kps[JointId::LeftElbow.index()] = Keypoint::new(0.40, 0.42, 0.9);
    kps[JointId::RightElbow.index()] = Keypoint::new(0.60, 0.42, 0.9);
    kps[JointId::LeftWrist.index()] = Keypoint::new(0.38, 0.52, 0.9);
    kps[JointId::RightWrist.index()] = Keypoint::new(0.62, 0.52, 0.9);
    kps[JointId::LeftHip.index()] = Keypoint::new(0.46, 0.58, 0.9);
    kps[JointId::RightHip.index()] = Keypoint::new(0.54, 0.58, 0.9);
    kps[JointId::LeftKnee.index()] = Keypoint::new(0.45, 0.75, 0.9);
    kps[JointId::RightKnee.index()] = Keypoint::new(0.55, 0.75, 0.9);
    kps[JointId::LeftAnkle.index()] = Keypoint::new(0.45, 0.92, 0.9);
    kps[JointId::RightAnkle.index()] = Keypoint::new(0.55, 0.92, 0.9);
    kps
}

/// Raw frames where the right wrist oscillates fast inside the given bursts
/// and is still elsewhere. Burst speed is ~1.2 normalized units/second at
/// 30 fps, comfortably above the default enter threshold.
pub fn swing_video(bursts: &[(usize, usize)], total_frames: usize) -> Vec<RawFrame> {
    let mut frames = Vec::with_capacity(total_frames);
    let mut wrist_x = 0.62f32;
    let mut direction = 1.0f32;

    for t in 0..total_frames {
        let in_burst = bursts.iter().any(|&(start, end)| t >= start && t < end);
        if in_burst {
            // Oscillate so the wrist stays in frame
            if wrist_x > 0.85 {
                direction = -1.0;
            } else if wrist_x < 0.35 {
                direction = 1.0;
            }
            wrist_x += direction * 0.04;
        }

        let mut keypoints = base_keypoints();
        keypoints[JointId::RightWrist.index()] = Keypoint::new(wrist_x, 0.5, 0.9);
        frames.push(RawFrame {
            timestamp: t as f64 / FPS,
            keypoints,
        });
    }
    frames
}

/// A smoothed frame with an explicit dominant-wrist speed and position
pub fn frame_with_speed(speed: f32, wrist_x: f32) -> FrameData {
    let mut keypoints = base_keypoints();
    keypoints[JointId::RightWrist.index()] = Keypoint::new(wrist_x, 0.5, 0.9);
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

/// Segmentation parameters sized for the synthetic sequences
pub fn test_segmentation_config() -> SegmentationConfig {
    SegmentationConfig {
        enter_speed: 0.8,
        exit_speed: 0.3,
        enter_frames: 3,
        exit_frames: 5,
        min_segment_frames: 20,
        max_segment_frames: 200,
        speed_smoothing_window: 5,
        adaptive_threshold: false,
        handedness_ratio: 1.2,
    }
}
