//! Body keypoint model: joint identifiers, per-frame pose data, and the
//! subject-tracking crop window.
//!
//! The joint set follows the 17-point COCO layout used by single-person
//! pose networks. Coordinates are normalized image-space `[0, 1]` unless a
//! function says otherwise.

use crate::constants::{NUM_JOINT_ANGLES, NUM_KEYPOINTS};
use crate::utils::angle_between;
use nalgebra::Vector2;
use opencv::core::Rect;

/// Canonical body joint identifiers, index-stable with the pose network output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointId {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl JointId {
    /// All joints in index order
    pub const ALL: [JointId; NUM_KEYPOINTS] = [
        JointId::Nose,
        JointId::LeftEye,
        JointId::RightEye,
        JointId::LeftEar,
        JointId::RightEar,
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftElbow,
        JointId::RightElbow,
        JointId::LeftWrist,
        JointId::RightWrist,
        JointId::LeftHip,
        JointId::RightHip,
        JointId::LeftKnee,
        JointId::RightKnee,
        JointId::LeftAnkle,
        JointId::RightAnkle,
    ];

    /// Array index of this joint
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Joint for a raw network output index
    #[must_use]
    pub fn from_index(index: usize) -> Option<JointId> {
        Self::ALL.get(index).copied()
    }

    /// Display name matching the pose network's joint vocabulary
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            JointId::Nose => "nose",
            JointId::LeftEye => "left_eye",
            JointId::RightEye => "right_eye",
            JointId::LeftEar => "left_ear",
            JointId::RightEar => "right_ear",
            JointId::LeftShoulder => "left_shoulder",
            JointId::RightShoulder => "right_shoulder",
            JointId::LeftElbow => "left_elbow",
            JointId::RightElbow => "right_elbow",
            JointId::LeftWrist => "left_wrist",
            JointId::RightWrist => "right_wrist",
            JointId::LeftHip => "left_hip",
            JointId::RightHip => "right_hip",
            JointId::LeftKnee => "left_knee",
            JointId::RightKnee => "right_knee",
            JointId::LeftAnkle => "left_ankle",
            JointId::RightAnkle => "right_ankle",
        }
    }

    /// The contralateral joint (left ↔ right); midline joints map to themselves.
    /// Used when mirroring a left-handed sequence to canonical orientation.
    #[must_use]
    pub fn mirrored(self) -> JointId {
        match self {
            JointId::Nose => JointId::Nose,
            JointId::LeftEye => JointId::RightEye,
            JointId::RightEye => JointId::LeftEye,
            JointId::LeftEar => JointId::RightEar,
            JointId::RightEar => JointId::LeftEar,
            JointId::LeftShoulder => JointId::RightShoulder,
            JointId::RightShoulder => JointId::LeftShoulder,
            JointId::LeftElbow => JointId::RightElbow,
            JointId::RightElbow => JointId::LeftElbow,
            JointId::LeftWrist => JointId::RightWrist,
            JointId::RightWrist => JointId::LeftWrist,
            JointId::LeftHip => JointId::RightHip,
            JointId::RightHip => JointId::LeftHip,
            JointId::LeftKnee => JointId::RightKnee,
            JointId::RightKnee => JointId::LeftKnee,
            JointId::LeftAnkle => JointId::RightAnkle,
            JointId::RightAnkle => JointId::LeftAnkle,
        }
    }
}

/// Limb joints used for speed/acceleration features (face joints excluded)
pub const MOTION_JOINTS: [JointId; 12] = [
    JointId::LeftShoulder,
    JointId::RightShoulder,
    JointId::LeftElbow,
    JointId::RightElbow,
    JointId::LeftWrist,
    JointId::RightWrist,
    JointId::LeftHip,
    JointId::RightHip,
    JointId::LeftKnee,
    JointId::RightKnee,
    JointId::LeftAnkle,
    JointId::RightAnkle,
];

/// Skeleton edges drawn by the overlay renderer
pub const SKELETON_EDGES: [(JointId, JointId); 16] = [
    (JointId::LeftShoulder, JointId::RightShoulder),
    (JointId::LeftShoulder, JointId::LeftElbow),
    (JointId::LeftElbow, JointId::LeftWrist),
    (JointId::RightShoulder, JointId::RightElbow),
    (JointId::RightElbow, JointId::RightWrist),
    (JointId::LeftShoulder, JointId::LeftHip),
    (JointId::RightShoulder, JointId::RightHip),
    (JointId::LeftHip, JointId::RightHip),
    (JointId::LeftHip, JointId::LeftKnee),
    (JointId::LeftKnee, JointId::LeftAnkle),
    (JointId::RightHip, JointId::RightKnee),
    (JointId::RightKnee, JointId::RightAnkle),
    (JointId::Nose, JointId::LeftEye),
    (JointId::Nose, JointId::RightEye),
    (JointId::LeftEye, JointId::LeftEar),
    (JointId::RightEye, JointId::RightEar),
];

/// Anatomical angle definitions: (outer, vertex, outer). The reported angle
/// is at the vertex joint.
pub const JOINT_ANGLE_TRIPLES: [(JointId, JointId, JointId); NUM_JOINT_ANGLES] = [
    (JointId::LeftShoulder, JointId::LeftElbow, JointId::LeftWrist),
    (JointId::RightShoulder, JointId::RightElbow, JointId::RightWrist),
    (JointId::LeftElbow, JointId::LeftShoulder, JointId::LeftHip),
    (JointId::RightElbow, JointId::RightShoulder, JointId::RightHip),
    (JointId::LeftShoulder, JointId::LeftHip, JointId::LeftKnee),
    (JointId::RightShoulder, JointId::RightHip, JointId::RightKnee),
    (JointId::LeftHip, JointId::LeftKnee, JointId::LeftAnkle),
    (JointId::RightHip, JointId::RightKnee, JointId::RightAnkle),
];

/// Angle display names, index-aligned with [`JOINT_ANGLE_TRIPLES`]
pub const JOINT_ANGLE_NAMES: [&str; NUM_JOINT_ANGLES] = [
    "left_elbow_angle",
    "right_elbow_angle",
    "left_shoulder_angle",
    "right_shoulder_angle",
    "left_hip_angle",
    "right_hip_angle",
    "left_knee_angle",
    "right_knee_angle",
];

/// One tracked anatomical landmark for a frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    /// Normalized x coordinate
    pub x: f32,
    /// Normalized y coordinate
    pub y: f32,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl Keypoint {
    #[must_use]
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Position as a vector
    #[must_use]
    pub fn position(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }
}

/// Per-frame pose data after smoothing. Velocities are `None` on the first
/// frame of a sequence, accelerations on the first two.
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Seconds since the start of the video
    pub timestamp: f64,
    /// Smoothed keypoints, complete (no missing joints)
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
    /// Per-joint velocity in normalized units per second
    pub velocities: Option<[Vector2<f32>; NUM_KEYPOINTS]>,
    /// Per-joint acceleration in normalized units per second squared
    pub accelerations: Option<[Vector2<f32>; NUM_KEYPOINTS]>,
    /// The eight anatomical joint angles, degrees
    pub joint_angles: [f32; NUM_JOINT_ANGLES],
}

impl FrameData {
    /// Speed of a joint, or 0 when no velocity history exists yet
    #[must_use]
    pub fn joint_speed(&self, joint: JointId) -> f32 {
        self.velocities
            .map(|v| v[joint.index()].norm())
            .unwrap_or(0.0)
    }

    /// Acceleration magnitude of a joint, or 0 without history
    #[must_use]
    pub fn joint_acceleration(&self, joint: JointId) -> f32 {
        self.accelerations
            .map(|a| a[joint.index()].norm())
            .unwrap_or(0.0)
    }

    /// Count of keypoints at or above the given confidence
    #[must_use]
    pub fn confident_joint_count(&self, threshold: f32) -> usize {
        self.keypoints.iter().filter(|k| k.confidence >= threshold).count()
    }
}

/// Compute the eight anatomical joint angles from a keypoint set.
/// An angle whose joints are degenerate (coincident points) comes back as NaN;
/// callers that feed models must replace NaN before use.
#[must_use]
pub fn compute_joint_angles(keypoints: &[Keypoint; NUM_KEYPOINTS]) -> [f32; NUM_JOINT_ANGLES] {
    let mut angles = [f32::NAN; NUM_JOINT_ANGLES];
    for (i, (a, vertex, c)) in JOINT_ANGLE_TRIPLES.iter().enumerate() {
        angles[i] = angle_between(
            keypoints[a.index()].position(),
            keypoints[vertex.index()].position(),
            keypoints[c.index()].position(),
        );
    }
    angles
}

/// Midpoint of the two hips, the body center used for normalization and
/// centerline displacement
#[must_use]
pub fn hip_midpoint(keypoints: &[Keypoint; NUM_KEYPOINTS]) -> Vector2<f32> {
    (keypoints[JointId::LeftHip.index()].position() + keypoints[JointId::RightHip.index()].position()) / 2.0
}

/// Shoulder-midpoint to hip-midpoint distance, the subject-size estimate
#[must_use]
pub fn torso_length(keypoints: &[Keypoint; NUM_KEYPOINTS]) -> f32 {
    let shoulder_mid = (keypoints[JointId::LeftShoulder.index()].position()
        + keypoints[JointId::RightShoulder.index()].position())
        / 2.0;
    (shoulder_mid - hip_midpoint(keypoints)).norm()
}

/// Square subject-tracking window for the *next* frame, in normalized
/// coordinates. `size` is the full side length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub center_x: f32,
    pub center_y: f32,
    pub size: f32,
}

impl CropRegion {
    /// Window covering the whole frame (initial state before any detection)
    #[must_use]
    pub fn full_frame(image_width: i32, image_height: i32) -> Self {
        // The square covering the long side, centered on the image
        let (w, h) = (image_width as f32, image_height as f32);
        let size = if w > h { w / h } else { h / w };
        Self {
            center_x: 0.5,
            center_y: 0.5,
            size: size.max(1.0),
        }
    }

    /// Pixel rectangle of the window, clamped to image bounds
    #[must_use]
    pub fn to_pixel_rect(&self, image_width: i32, image_height: i32) -> Rect {
        let (w, h) = (image_width as f32, image_height as f32);
        let side = self.size * w.min(h);
        let x0 = (self.center_x * w - side / 2.0).max(0.0);
        let y0 = (self.center_y * h - side / 2.0).max(0.0);
        let x1 = (x0 + side).min(w);
        let y1 = (y0 + side).min(h);
        Rect::new(x0 as i32, y0 as i32, ((x1 - x0) as i32).max(1), ((y1 - y0) as i32).max(1))
    }
}
