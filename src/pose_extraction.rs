//! Per-frame pose keypoint extraction with subject-tracking crop windows.
//!
//! A pretrained single-person keypoint network is run over a square crop of
//! each frame; the crop for the next frame follows the detected torso so the
//! subject stays centered. The per-frame dependency (crop region derived
//! from the previous frame's keypoints) is why the pipeline folds over
//! frames sequentially.

use crate::constants::{
    BODY_EXPANSION_RATIO, MIN_CROP_KEYPOINT_SCORE, NUM_KEYPOINTS, POSE_INPUT_SIZE, TORSO_EXPANSION_RATIO,
};
use crate::keypoints::{CropRegion, JointId, Keypoint};
use crate::utils::safe_cast::usize_to_i32;
use crate::Result;
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, CV_32F, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Single-person keypoint detector using `ONNX` Runtime
pub struct PoseExtractor {
    session: Session,
    input_size: i32,
    confidence_threshold: f32,
}

impl PoseExtractor {
    /// Create a new pose extractor from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, confidence_threshold: f32) -> Result<Self> {
        log::info!(
            "Initializing PoseExtractor with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_extractor")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(crate::error::Error::ModelInputError(
                "Pose model has no inputs".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(crate::error::Error::ModelOutputError(
                "Pose model has no outputs".to_string(),
            ));
        }

        Ok(Self {
            session,
            input_size: POSE_INPUT_SIZE,
            confidence_threshold,
        })
    }

    /// Keypoint confidence threshold below which joints are flagged low-confidence
    #[must_use]
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Extract the 17 keypoints for one frame.
    ///
    /// An unreadable or degenerate frame yields an all-zero, zero-confidence
    /// set rather than an error; downstream stages tolerate frames with no
    /// usable joints.
    ///
    /// # Errors
    ///
    /// Returns an error only for model-level failures (inference error,
    /// malformed output tensor) — these are resource defects, not data defects.
    pub fn extract(&self, frame: &Mat, crop: &CropRegion) -> Result<[Keypoint; NUM_KEYPOINTS]> {
        if frame.empty() || frame.cols() < 2 || frame.rows() < 2 {
            log::warn!("Unreadable frame, emitting zero-confidence keypoints");
            return Ok([Keypoint::default(); NUM_KEYPOINTS]);
        }

        let rect = crop.to_pixel_rect(frame.cols(), frame.rows());
        let input = self.preprocess(frame, rect)?;
        let raw = self.forward(input)?;
        Ok(Self::postprocess(&raw, rect, frame.cols(), frame.rows()))
    }

    /// Crop the region of interest, pad it square, and resize to the network input
    fn preprocess(&self, frame: &Mat, rect: Rect) -> Result<Array4<f32>> {
        let roi = Mat::roi(frame, rect)?;

        // Pad the crop to a square canvas so aspect ratio is preserved
        let side = rect.width.max(rect.height);
        let mut canvas = Mat::new_rows_cols_with_default(side, side, CV_8UC3, Scalar::all(0.0))?;
        let mut dst = canvas.roi_mut(Rect::new(0, 0, rect.width, rect.height))?;
        roi.copy_to(&mut dst)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &canvas,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        // Convert BGR to RGB
        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        // Convert to f32 and normalize to [0, 1]
        let mut float_image = Mat::default();
        rgb.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let size = self.input_size as usize;
        let channels = 3;
        let mut data = vec![0.0f32; size * size * channels];
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<opencv::core::Vec3f>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                for ch in 0..channels {
                    data[(row * size + col) * channels + ch] = pixel[ch];
                }
            }
        }

        Array4::from_shape_vec((1, size, size, channels), data)
            .map_err(|e| crate::error::Error::ModelDataFormatError(format!("Failed to create input array: {e}")))
    }

    /// Run the network; output is a flat `[y, x, score]` triple per joint
    fn forward(&self, inputs: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::Error::ModelOutputError("No output from pose model".to_string()))?;

        let tensor = output.try_extract::<f32>()?;
        let view = tensor.view();
        let data = view
            .as_slice()
            .ok_or_else(|| crate::error::Error::ModelOutputError("Failed to read pose output data".to_string()))?;

        if data.len() < NUM_KEYPOINTS * 3 {
            return Err(crate::error::Error::ModelOutputError(format!(
                "Pose output too small: {} values, expected {}",
                data.len(),
                NUM_KEYPOINTS * 3
            )));
        }
        Ok(data.to_vec())
    }

    /// Map crop-space keypoints back to full-frame normalized coordinates
    fn postprocess(raw: &[f32], rect: Rect, image_width: i32, image_height: i32) -> [Keypoint; NUM_KEYPOINTS] {
        let side = rect.width.max(rect.height) as f32;
        let (w, h) = (image_width as f32, image_height as f32);

        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            // Network convention: row-major (y, x, score), normalized to the crop
            let y = raw[i * 3];
            let x = raw[i * 3 + 1];
            let score = raw[i * 3 + 2];

            kp.x = ((rect.x as f32 + x * side) / w).clamp(0.0, 1.0);
            kp.y = ((rect.y as f32 + y * side) / h).clamp(0.0, 1.0);
            kp.confidence = score.clamp(0.0, 1.0);
        }
        keypoints
    }

    /// Crop window for the next frame, derived from this frame's keypoints
    #[must_use]
    pub fn next_crop_region(
        &self,
        keypoints: &[Keypoint; NUM_KEYPOINTS],
        previous: &CropRegion,
        image_width: i32,
        image_height: i32,
    ) -> CropRegion {
        derive_crop_region(keypoints, previous, image_width, image_height)
    }
}

/// Whether enough of the torso is visible to re-center the crop window:
/// at least one hip and one shoulder above the minimum crop confidence.
#[must_use]
pub fn torso_visible(keypoints: &[Keypoint; NUM_KEYPOINTS]) -> bool {
    let conf = |j: JointId| keypoints[j.index()].confidence;
    (conf(JointId::LeftHip) > MIN_CROP_KEYPOINT_SCORE || conf(JointId::RightHip) > MIN_CROP_KEYPOINT_SCORE)
        && (conf(JointId::LeftShoulder) > MIN_CROP_KEYPOINT_SCORE
            || conf(JointId::RightShoulder) > MIN_CROP_KEYPOINT_SCORE)
}

/// Compute the next subject-tracking crop window.
///
/// Centers on the hip midpoint and sizes the window from the torso extent
/// (×1.9) and whole-body extent (×1.2), clamped to the frame. When the torso
/// is not confidently visible the previous window is reused unchanged; this
/// function never fails.
#[must_use]
pub fn derive_crop_region(
    keypoints: &[Keypoint; NUM_KEYPOINTS],
    previous: &CropRegion,
    image_width: i32,
    image_height: i32,
) -> CropRegion {
    if !torso_visible(keypoints) {
        return *previous;
    }

    let (w, h) = (image_width as f32, image_height as f32);
    let px = |j: JointId| (keypoints[j.index()].x * w, keypoints[j.index()].y * h);

    let (lhx, lhy) = px(JointId::LeftHip);
    let (rhx, rhy) = px(JointId::RightHip);
    let center_x = (lhx + rhx) / 2.0;
    let center_y = (lhy + rhy) / 2.0;

    let torso_joints = [
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftHip,
        JointId::RightHip,
    ];
    let mut max_torso_range: f32 = 0.0;
    for joint in torso_joints {
        let (x, y) = px(joint);
        max_torso_range = max_torso_range.max((center_x - x).abs()).max((center_y - y).abs());
    }

    let mut max_body_range: f32 = 0.0;
    for joint in JointId::ALL {
        if keypoints[joint.index()].confidence < MIN_CROP_KEYPOINT_SCORE {
            continue;
        }
        let (x, y) = px(joint);
        max_body_range = max_body_range.max((center_x - x).abs()).max((center_y - y).abs());
    }

    let mut half = (max_torso_range * TORSO_EXPANSION_RATIO).max(max_body_range * BODY_EXPANSION_RATIO);

    // Do not extend past the farthest frame border
    let border_max = center_x.max(w - center_x).max(center_y).max(h - center_y);
    half = half.min(border_max);

    if half > w.max(h) / 2.0 {
        return CropRegion::full_frame(image_width, image_height);
    }

    CropRegion {
        center_x: center_x / w,
        center_y: center_y / h,
        size: (half * 2.0) / w.min(h),
    }
}
