//! Constants used throughout the library

/// Number of tracked body keypoints (COCO layout)
pub const NUM_KEYPOINTS: usize = 17;

/// Number of limb joints used for motion features (shoulders through ankles)
pub const NUM_MOTION_JOINTS: usize = 12;

/// Number of anatomical joint angles (elbows, shoulders, hips, knees)
pub const NUM_JOINT_ANGLES: usize = 8;

/// Total per-frame feature count:
/// 12 joints × (speed, acceleration magnitude) + 8 angles + 17 × (x, y)
pub const NUM_FEATURES: usize = NUM_MOTION_JOINTS * 2 + NUM_JOINT_ANGLES + NUM_KEYPOINTS * 2;

/// Default resampled sequence length fed to the scoring model
pub const DEFAULT_SEQUENCE_LENGTH: usize = 90;

/// Default frames per second assumption when the container reports none
pub const DEFAULT_FPS: f64 = 30.0;

/// Pose network square input size (pixels)
pub const POSE_INPUT_SIZE: i32 = 256;

/// Keypoints below this confidence are flagged low-confidence
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Minimum keypoint confidence for the crop-tracking logic
pub const MIN_CROP_KEYPOINT_SCORE: f32 = 0.2;

/// Crop window expansion ratios around the torso and the whole body
pub const TORSO_EXPANSION_RATIO: f32 = 1.9;
pub const BODY_EXPANSION_RATIO: f32 = 1.2;

/// Default swing segment duration bounds (frames)
pub const DEFAULT_MIN_SEGMENT_FRAMES: usize = 30;
pub const DEFAULT_MAX_SEGMENT_FRAMES: usize = 120;

/// Default wrist-speed hysteresis thresholds (normalized units per second)
pub const DEFAULT_ENTER_SPEED: f32 = 0.8;
pub const DEFAULT_EXIT_SPEED: f32 = 0.3;

/// Default sustain windows for the segmenter state machine (frames)
pub const DEFAULT_ENTER_FRAMES: usize = 3;
pub const DEFAULT_EXIT_FRAMES: usize = 5;

/// Moving-average kernel applied to the wrist speed series before thresholding
pub const SPEED_SMOOTHING_WINDOW: usize = 5;

/// Peak-acceleration ratio below which handedness inference is low-confidence
pub const DEFAULT_HANDEDNESS_RATIO: f32 = 1.2;

/// Severity tier thresholds on |z-score|
pub const Z_SLIGHT: f32 = 1.0;
pub const Z_MODERATE: f32 = 1.5;
pub const Z_SIGNIFICANT: f32 = 2.5;

/// Default window sizes for trajectory filters
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;
pub const DEFAULT_HAMPEL_WINDOW: usize = 5;

/// Default trajectory filter parameters
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;
pub const DEFAULT_LOW_PASS_ALPHA: f64 = 0.5;
pub const DEFAULT_HAMPEL_THRESHOLD: f64 = 3.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
