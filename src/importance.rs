//! Translation of attention weights and feature deviations into
//! coaching-relevant statements.
//!
//! Observed features are z-scored against the reference population; the
//! deviations most likely responsible for a low score are ranked by
//! |z| × the attention weight of the implicated joint.

use crate::constants::{NUM_FEATURES, NUM_KEYPOINTS, Z_MODERATE, Z_SIGNIFICANT, Z_SLIGHT};
use crate::features::{feature_joint, feature_name, SwingFeatures};
use crate::reference_stats::ReferenceStats;
use crate::scoring::AttentionWeights;
use crate::segmentation::StrokeType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Deviation severity tier by |z-score|
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Slight,
    Moderate,
    Significant,
}

impl Severity {
    /// Tier for an absolute z-score; `None` means within normal range
    /// (not reported)
    #[must_use]
    pub fn from_z(z_abs: f32) -> Option<Severity> {
        if z_abs >= Z_SIGNIFICANT {
            Some(Severity::Significant)
        } else if z_abs >= Z_MODERATE {
            Some(Severity::Moderate)
        } else if z_abs >= Z_SLIGHT {
            Some(Severity::Slight)
        } else {
            None
        }
    }
}

/// Which side of the reference mean the observation sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

/// One observed kinematic feature's deviation from the reference population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDeviation {
    pub feature_index: usize,
    pub name: String,
    pub actual: f32,
    pub reference_mean: f32,
    pub reference_std: f32,
    pub z_score: f32,
    pub severity: Severity,
    pub direction: Direction,
}

impl FeatureDeviation {
    /// Coaching-phrase rendering, e.g.
    /// "right elbow extension 2.7σ below reference"
    #[must_use]
    pub fn describe(&self) -> String {
        let direction = match self.direction {
            Direction::Above => "above",
            Direction::Below => "below",
        };
        format!(
            "{} {:.1}σ {} reference",
            coaching_phrase(&self.name),
            self.z_score.abs(),
            direction
        )
    }
}

/// Fixed feature-name-to-phrase lookup for coaching output
#[must_use]
pub fn coaching_phrase(feature: &str) -> String {
    match feature {
        "left_elbow_angle" => "left elbow extension".to_string(),
        "right_elbow_angle" => "right elbow extension".to_string(),
        "left_shoulder_angle" => "left shoulder rotation".to_string(),
        "right_shoulder_angle" => "right shoulder rotation".to_string(),
        "left_hip_angle" => "left hip rotation".to_string(),
        "right_hip_angle" => "right hip rotation".to_string(),
        "left_knee_angle" => "left knee bend".to_string(),
        "right_knee_angle" => "right knee bend".to_string(),
        other => {
            let readable = |joint: &str| joint.replace('_', " ");
            if let Some(joint) = other.strip_suffix("_speed") {
                format!("{} speed through the swing", readable(joint))
            } else if let Some(joint) = other.strip_suffix("_acceleration") {
                format!("{} drive", readable(joint))
            } else if let Some(joint) = other.strip_suffix("_x") {
                format!("{} horizontal positioning", readable(joint))
            } else if let Some(joint) = other.strip_suffix("_y") {
                format!("{} vertical positioning", readable(joint))
            } else {
                readable(other)
            }
        }
    }
}

/// Maps raw features and attention weights to ranked deviations
pub struct ImportanceTranslator {
    stats: Arc<ReferenceStats>,
    top_k: usize,
}

impl ImportanceTranslator {
    #[must_use]
    pub fn new(stats: Arc<ReferenceStats>, top_k: usize) -> Self {
        Self { stats, top_k }
    }

    /// Emit the top-K deviations for a swing, ranked by
    /// |z| × joint attention weight.
    #[must_use]
    pub fn translate(
        &self,
        features: &SwingFeatures,
        stroke: StrokeType,
        attention: &AttentionWeights,
    ) -> Vec<FeatureDeviation> {
        let Some(table) = self.stats.lookup(stroke, None) else {
            log::warn!("No reference statistics for {stroke}, skipping deviation analysis");
            return Vec::new();
        };

        let seq_len = features.sequence_length() as f32;
        let uniform_weight = 1.0 / NUM_KEYPOINTS as f32;

        let mut ranked: Vec<(f32, FeatureDeviation)> = Vec::new();
        for f in 0..NUM_FEATURES {
            let observed: f32 = features.matrix.column(f).sum() / seq_len;
            let stat = table[f];
            let z = stat.z_score(observed);
            let Some(severity) = Severity::from_z(z.abs()) else {
                continue;
            };

            let joint_weight = feature_joint(f)
                .and_then(|j| attention.joint.get(j.index()).copied())
                .unwrap_or(uniform_weight);

            ranked.push((
                z.abs() * joint_weight,
                FeatureDeviation {
                    feature_index: f,
                    name: feature_name(f),
                    actual: observed,
                    reference_mean: stat.mean,
                    reference_std: stat.std,
                    z_score: z,
                    severity,
                    direction: if z >= 0.0 { Direction::Above } else { Direction::Below },
                },
            ));
        }

        ranked.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().take(self.top_k).map(|(_, d)| d).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::PhaseBoundaries;
    use ndarray::Array2;

    fn features_with_column(index: usize, value: f32) -> SwingFeatures {
        let mut matrix = Array2::zeros((90, NUM_FEATURES));
        for t in 0..90 {
            matrix[[t, index]] = value;
        }
        SwingFeatures {
            matrix,
            boundaries: PhaseBoundaries {
                backswing_start: 20,
                contact: 45,
            },
            source_len: 90,
        }
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_z(0.5), None);
        assert_eq!(Severity::from_z(1.0), Some(Severity::Slight));
        assert_eq!(Severity::from_z(1.5), Some(Severity::Moderate));
        assert_eq!(Severity::from_z(2.5), Some(Severity::Significant));
        assert_eq!(Severity::from_z(10.0), Some(Severity::Significant));
    }

    #[test]
    fn test_translate_emits_only_deviant_features() {
        let translator = ImportanceTranslator::new(Arc::new(ReferenceStats::uniform()), 10);
        let attention = AttentionWeights::uniform(90, NUM_KEYPOINTS);

        // Uniform reference: z equals the raw value; one feature at 3.0
        let features = features_with_column(24, 3.0);
        let deviations = translator.translate(&features, StrokeType::Forehand, &attention);

        assert_eq!(deviations.len(), 1);
        assert_eq!(deviations[0].feature_index, 24);
        assert_eq!(deviations[0].severity, Severity::Significant);
        assert_eq!(deviations[0].direction, Direction::Above);
        assert!((deviations[0].z_score - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_translate_ranks_by_attention_weighted_z() {
        let translator = ImportanceTranslator::new(Arc::new(ReferenceStats::uniform()), 10);

        let mut features = features_with_column(0, 2.0); // left_shoulder_speed
        for t in 0..90 {
            features.matrix[[t, 10]] = 2.0; // right_wrist_speed
        }

        // Bias joint attention heavily toward the right wrist
        let mut attention = AttentionWeights::uniform(90, NUM_KEYPOINTS);
        attention.joint = vec![0.01; NUM_KEYPOINTS];
        attention.joint[crate::keypoints::JointId::RightWrist.index()] = 0.84;

        let deviations = translator.translate(&features, StrokeType::Forehand, &attention);
        assert!(deviations.len() >= 2);
        assert_eq!(deviations[0].name, "right_wrist_speed");
    }

    #[test]
    fn test_direction_below() {
        let translator = ImportanceTranslator::new(Arc::new(ReferenceStats::uniform()), 10);
        let attention = AttentionWeights::uniform(90, NUM_KEYPOINTS);
        let features = features_with_column(30, -2.0);
        let deviations = translator.translate(&features, StrokeType::Serve, &attention);
        assert_eq!(deviations[0].direction, Direction::Below);
    }

    #[test]
    fn test_top_k_truncation() {
        let translator = ImportanceTranslator::new(Arc::new(ReferenceStats::uniform()), 2);
        let attention = AttentionWeights::uniform(90, NUM_KEYPOINTS);
        let mut features = features_with_column(0, 5.0);
        for f in 1..10 {
            for t in 0..90 {
                features.matrix[[t, f]] = 5.0;
            }
        }
        let deviations = translator.translate(&features, StrokeType::Forehand, &attention);
        assert_eq!(deviations.len(), 2);
    }

    #[test]
    fn test_coaching_phrases() {
        assert_eq!(coaching_phrase("right_elbow_angle"), "right elbow extension");
        assert_eq!(coaching_phrase("right_wrist_speed"), "right wrist speed through the swing");
        assert_eq!(coaching_phrase("nose_x"), "nose horizontal positioning");
    }

    #[test]
    fn test_describe_renders_sigma() {
        let deviation = FeatureDeviation {
            feature_index: 25,
            name: "right_elbow_angle".to_string(),
            actual: 120.0,
            reference_mean: 150.0,
            reference_std: 10.0,
            z_score: -3.0,
            severity: Severity::Significant,
            direction: Direction::Below,
        };
        assert_eq!(deviation.describe(), "right elbow extension 3.0σ below reference");
    }
}
