//! Trajectory smoothing and gap-filling.
//!
//! Low-confidence joint observations are replaced by linear interpolation
//! between the nearest confident frames, leading/trailing gaps are held at
//! the nearest known value, and a joint never seen confidently is pinned to
//! the frame midpoint. After gap-filling an optional trajectory filter is
//! applied per joint, then velocities, accelerations, and joint angles are
//! derived. No NaN leaves this stage.

use crate::config::SmoothingConfig;
use crate::constants::{EPSILON, NUM_KEYPOINTS};
use crate::keypoints::{compute_joint_angles, FrameData, Keypoint};
use crate::Result;
use nalgebra::Vector2;

/// Raw per-frame pose output before smoothing
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Seconds since the start of the video
    pub timestamp: f64,
    /// Keypoints as returned by the pose extractor (may be low-confidence or all-zero)
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

/// Gap-filler and kinematic derivative computer for keypoint trajectories
pub struct TrajectorySmoother {
    confidence_threshold: f32,
    config: SmoothingConfig,
}

impl TrajectorySmoother {
    /// Create a smoother. `config.filter` names the per-joint trajectory
    /// filter (`none` disables filtering).
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown filter name.
    pub fn new(confidence_threshold: f32, config: &SmoothingConfig) -> Result<Self> {
        // Validate the filter construction once up front so a typo fails at
        // configuration time, not in the middle of a video.
        config.create_filter()?;
        Ok(Self {
            confidence_threshold,
            config: config.clone(),
        })
    }

    /// Smooth a full video's raw frames into complete [`FrameData`].
    ///
    /// # Errors
    ///
    /// Only filter construction can fail, and that is validated in [`Self::new`].
    pub fn smooth(&self, raw: &[RawFrame], fps: f64) -> Result<Vec<FrameData>> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let dt = if fps > 0.0 { 1.0 / fps } else { 1.0 / crate::constants::DEFAULT_FPS };

        // Gap-fill each joint's trajectory across the whole sequence
        let mut positions: Vec<[Vector2<f64>; NUM_KEYPOINTS]> =
            vec![[Vector2::zeros(); NUM_KEYPOINTS]; raw.len()];
        for joint in 0..NUM_KEYPOINTS {
            let track = self.fill_joint_track(raw, joint);
            for (frame, p) in track.into_iter().enumerate() {
                positions[frame][joint] = p;
            }
        }

        // Optional per-joint trajectory filter, applied in time order
        if self.config.filter.to_lowercase() != "none" {
            for joint in 0..NUM_KEYPOINTS {
                let mut filter = self.config.create_filter()?;
                for frame_positions in positions.iter_mut() {
                    frame_positions[joint] = filter.apply(frame_positions[joint]);
                }
            }
        }

        // Assemble frames with derivatives and angles
        let mut frames: Vec<FrameData> = Vec::with_capacity(raw.len());
        let mut last_angles = [0.0f32; crate::constants::NUM_JOINT_ANGLES];
        for (t, raw_frame) in raw.iter().enumerate() {
            let mut keypoints = raw_frame.keypoints;
            for (joint, kp) in keypoints.iter_mut().enumerate() {
                kp.x = positions[t][joint].x as f32;
                kp.y = positions[t][joint].y as f32;
                kp.confidence = kp.confidence.clamp(0.0, 1.0);
            }

            let velocities = (t > 0).then(|| {
                let mut v = [Vector2::zeros(); NUM_KEYPOINTS];
                for joint in 0..NUM_KEYPOINTS {
                    let d = positions[t][joint] - positions[t - 1][joint];
                    v[joint] = Vector2::new((d.x / dt) as f32, (d.y / dt) as f32);
                }
                v
            });

            let accelerations = (t > 1).then(|| {
                let mut a = [Vector2::zeros(); NUM_KEYPOINTS];
                for joint in 0..NUM_KEYPOINTS {
                    let d = positions[t][joint] - positions[t - 1][joint] * 2.0 + positions[t - 2][joint];
                    a[joint] = Vector2::new((d.x / (dt * dt)) as f32, (d.y / (dt * dt)) as f32);
                }
                a
            });

            // Degenerate geometry (e.g. a frame with every joint pinned to the
            // same point) yields NaN angles; hold the last measurable value.
            let mut joint_angles = compute_joint_angles(&keypoints);
            for (angle, last) in joint_angles.iter_mut().zip(last_angles.iter_mut()) {
                if angle.is_nan() {
                    *angle = *last;
                } else {
                    *last = *angle;
                }
            }

            frames.push(FrameData {
                timestamp: raw_frame.timestamp,
                keypoints,
                velocities,
                accelerations,
                joint_angles,
            });
        }

        Ok(frames)
    }

    /// Gap-fill one joint's track across the sequence
    fn fill_joint_track(&self, raw: &[RawFrame], joint: usize) -> Vec<Vector2<f64>> {
        let confident: Vec<usize> = raw
            .iter()
            .enumerate()
            .filter(|(_, f)| f.keypoints[joint].confidence >= self.confidence_threshold)
            .map(|(i, _)| i)
            .collect();

        // Occluded for the entire video: pin to the frame midpoint
        if confident.is_empty() {
            return vec![Vector2::new(0.5, 0.5); raw.len()];
        }

        let pos = |i: usize| {
            let kp = &raw[i].keypoints[joint];
            Vector2::new(f64::from(kp.x), f64::from(kp.y))
        };

        let mut track = Vec::with_capacity(raw.len());
        let mut next_idx = 0usize; // index into `confident` of the next confident frame ≥ t
        for t in 0..raw.len() {
            while next_idx < confident.len() && confident[next_idx] < t {
                next_idx += 1;
            }
            let after = confident.get(next_idx).copied();
            let before = next_idx.checked_sub(1).map(|i| confident[i]);

            let p = match (before, after) {
                (_, Some(a)) if a == t => pos(t),
                (Some(b), Some(a)) => {
                    let span = (a - b) as f64;
                    let alpha = if span < EPSILON { 0.0 } else { (t - b) as f64 / span };
                    pos(b) + (pos(a) - pos(b)) * alpha
                }
                // Leading gap: hold the first confident value
                (None, Some(a)) => pos(a),
                // Trailing gap: hold the last confident value
                (Some(b), None) => pos(b),
                (None, None) => unreachable!("confident is non-empty"),
            };
            track.push(p);
        }
        track
    }
}
