//! Swing quality scoring.
//!
//! Two scorers share one contract: a trained sequence model with temporal
//! and joint attention evaluated through ONNX Runtime, and a deterministic
//! heuristic fallback driven by the reference statistics. Which one runs is
//! decided once at configuration time, not per call.
//!
//! Model artifact contract: input `(1, sequence_length, num_features)`,
//! outputs `(score, temporal_attention[sequence_length], joint_attention[17])`.
//! Any artifact meeting this shape contract is interchangeable.

use crate::constants::{NUM_FEATURES, NUM_KEYPOINTS};
use crate::features::SwingFeatures;
use crate::importance::FeatureDeviation;
use crate::reference_stats::ReferenceStats;
use crate::segmentation::{Phase, StrokeType};
use crate::{Error, Result};
use ndarray::{Array3, CowArray};
use ort::{Environment, Session, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// How many attention-ranked frames a score reports
const TOP_ATTENTION_FRAMES: usize = 3;

/// Importance distributions over frames and joints. Each vector is
/// non-negative and sums to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionWeights {
    pub temporal: Vec<f32>,
    pub joint: Vec<f32>,
}

impl AttentionWeights {
    /// Uniform distributions (the heuristic scorer's output)
    #[must_use]
    pub fn uniform(sequence_length: usize, num_joints: usize) -> Self {
        Self {
            temporal: vec![1.0 / sequence_length as f32; sequence_length],
            joint: vec![1.0 / num_joints as f32; num_joints],
        }
    }

    /// Sanitize raw model output into a probability distribution: negatives
    /// and non-finite values clamp to zero; an all-zero vector degrades to
    /// uniform.
    fn sanitize(raw: &[f32]) -> Vec<f32> {
        let mut weights: Vec<f32> = raw
            .iter()
            .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
            .collect();
        let sum: f32 = weights.iter().sum();
        if sum <= f32::EPSILON {
            let n = weights.len().max(1);
            return vec![1.0 / n as f32; n];
        }
        for w in &mut weights {
            *w /= sum;
        }
        weights
    }

    /// Frame indices sorted by descending temporal weight
    #[must_use]
    pub fn top_frames(&self, k: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.temporal.len()).collect();
        indices.sort_by(|&a, &b| {
            self.temporal[b]
                .partial_cmp(&self.temporal[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(k);
        indices
    }
}

/// Per-phase sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseScores {
    pub preparation: f32,
    pub backswing: f32,
    pub contact: f32,
    pub follow_through: f32,
}

impl PhaseScores {
    #[must_use]
    pub fn get(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Preparation => self.preparation,
            Phase::Backswing => self.backswing,
            Phase::Contact => self.contact,
            Phase::FollowThrough => self.follow_through,
            Phase::None => 0.0,
        }
    }

    fn set(&mut self, phase: Phase, value: f32) {
        match phase {
            Phase::Preparation => self.preparation = value,
            Phase::Backswing => self.backswing = value,
            Phase::Contact => self.contact = value,
            Phase::FollowThrough => self.follow_through = value,
            Phase::None => {}
        }
    }
}

/// The scored result for one swing segment. Created once by the scorer
/// (deviations are filled in by the importance translator during report
/// assembly) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisScore {
    /// Overall quality in [0, 100]
    pub overall: f32,
    pub phase_scores: PhaseScores,
    pub feature_deviations: Vec<FeatureDeviation>,
    /// Resampled frame indices with the highest temporal attention
    pub top_attention_frames: Vec<usize>,
    /// True when produced by the heuristic fallback rather than a trained model
    pub heuristic: bool,
}

/// Common contract for quality scorers
pub trait SwingScorer: Send {
    /// Score one swing's feature matrix.
    ///
    /// # Errors
    ///
    /// Returns an error only for model-level failures; malformed but
    /// recoverable inputs (short sequences) are absorbed.
    fn score(&self, features: &SwingFeatures, stroke: StrokeType) -> Result<(AnalysisScore, AttentionWeights)>;

    /// Whether this scorer is the heuristic fallback
    fn is_heuristic(&self) -> bool;

    /// Get scorer name
    fn name(&self) -> &str;
}

/// Select the scorer once at configuration time: the trained model when an
/// artifact is configured and loadable, otherwise the heuristic fallback
/// (if permitted).
///
/// # Errors
///
/// Returns a configuration error when no model is available and the
/// fallback is disabled, or when the artifact violates the shape contract.
pub fn create_scorer(
    model_path: Option<&Path>,
    allow_heuristic_fallback: bool,
    sequence_length: usize,
    stats: Arc<ReferenceStats>,
) -> Result<Box<dyn SwingScorer>> {
    match model_path {
        Some(path) if path.exists() => {
            let scorer = OnnxScorer::new(path, sequence_length)?;
            log::info!("Using trained scoring model: {}", path.display());
            Ok(Box::new(scorer))
        }
        Some(path) if !allow_heuristic_fallback => Err(Error::ConfigError(format!(
            "Scoring model not found and heuristic fallback disabled: {}",
            path.display()
        ))),
        None if !allow_heuristic_fallback => Err(Error::ConfigError(
            "No scoring model configured and heuristic fallback disabled".to_string(),
        )),
        _ => {
            log::warn!("No trained scoring model available, falling back to heuristic scorer");
            Ok(Box::new(HeuristicScorer::new(stats)))
        }
    }
}

/// Trained sequence model with temporal and joint attention
pub struct OnnxScorer {
    session: Session,
    sequence_length: usize,
}

impl OnnxScorer {
    /// Load the model and verify the input shape contract.
    ///
    /// # Errors
    ///
    /// A feature-count or sequence-length mismatch is a configuration error,
    /// not a runtime data error.
    pub fn new<P: AsRef<Path>>(model_path: P, sequence_length: usize) -> Result<Self> {
        log::info!("Initializing OnnxScorer with model: {}", model_path.as_ref().display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("swing_scorer")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Scoring model has no inputs".to_string()))?;

        // Shape contract: (batch, sequence_length, num_features). Dynamic
        // dimensions are accepted; declared ones must match.
        let dims = &input_meta.dimensions;
        if dims.len() >= 3 {
            if let Some(seq) = dims[1] {
                if seq as usize != sequence_length {
                    return Err(Error::ModelInputError(format!(
                        "Model expects sequence length {seq}, pipeline configured for {sequence_length}"
                    )));
                }
            }
            if let Some(feat) = dims[2] {
                if feat as usize != NUM_FEATURES {
                    return Err(Error::ModelInputError(format!(
                        "Model expects {feat} features, pipeline produces {NUM_FEATURES}"
                    )));
                }
            }
        }

        if session.outputs.len() < 3 {
            return Err(Error::ModelOutputError(format!(
                "Scoring model must expose (score, temporal attention, joint attention); found {} outputs",
                session.outputs.len()
            )));
        }

        Ok(Self {
            session,
            sequence_length,
        })
    }

    /// Stage the feature matrix as a batch-of-one tensor, zero-padding or
    /// truncating to the contract length
    fn stage_input(&self, features: &SwingFeatures) -> Array3<f32> {
        let mut input = Array3::zeros((1, self.sequence_length, NUM_FEATURES));
        let rows = features.matrix.nrows().min(self.sequence_length);
        for t in 0..rows {
            for f in 0..NUM_FEATURES {
                input[[0, t, f]] = features.matrix[[t, f]];
            }
        }
        input
    }

    /// Run the model over an input tensor, returning the raw triple
    fn forward(&self, input: Array3<f32>) -> Result<(f32, Vec<f32>, Vec<f32>)> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;
        if outputs.len() < 3 {
            return Err(Error::ModelOutputError(format!(
                "Scoring model returned {} outputs, expected 3",
                outputs.len()
            )));
        }

        let extract = |value: &Value| -> Result<Vec<f32>> {
            let tensor = value.try_extract::<f32>()?;
            let view = tensor.view();
            view.as_slice()
                .map(<[f32]>::to_vec)
                .ok_or_else(|| Error::ModelOutputError("Non-contiguous model output".to_string()))
        };

        let score = *extract(&outputs[0])?
            .first()
            .ok_or_else(|| Error::ModelOutputError("Empty score output".to_string()))?;
        let temporal = extract(&outputs[1])?;
        let joint = extract(&outputs[2])?;

        if temporal.len() != self.sequence_length {
            return Err(Error::ModelOutputError(format!(
                "Temporal attention has {} entries, expected {}",
                temporal.len(),
                self.sequence_length
            )));
        }
        if joint.len() != NUM_KEYPOINTS {
            return Err(Error::ModelOutputError(format!(
                "Joint attention has {} entries, expected {NUM_KEYPOINTS}",
                joint.len()
            )));
        }

        Ok((score, temporal, joint))
    }

    /// Score a phase by masking every frame outside its subrange and
    /// re-running the model
    fn phase_score(&self, features: &SwingFeatures, phase: Phase) -> Result<f32> {
        let range = features.boundaries.range(phase, features.sequence_length());
        if range.is_empty() {
            return Ok(0.0);
        }
        let mut input = self.stage_input(features);
        for t in 0..self.sequence_length {
            if !range.contains(&t) {
                for f in 0..NUM_FEATURES {
                    input[[0, t, f]] = 0.0;
                }
            }
        }
        let (score, _, _) = self.forward(input)?;
        Ok(score.clamp(0.0, 100.0))
    }
}

impl SwingScorer for OnnxScorer {
    fn score(&self, features: &SwingFeatures, _stroke: StrokeType) -> Result<(AnalysisScore, AttentionWeights)> {
        let (raw_score, raw_temporal, raw_joint) = self.forward(self.stage_input(features))?;

        let attention = AttentionWeights {
            temporal: AttentionWeights::sanitize(&raw_temporal),
            joint: AttentionWeights::sanitize(&raw_joint),
        };

        let mut phase_scores = PhaseScores {
            preparation: 0.0,
            backswing: 0.0,
            contact: 0.0,
            follow_through: 0.0,
        };
        for phase in Phase::SCORED {
            phase_scores.set(phase, self.phase_score(features, phase)?);
        }

        let score = AnalysisScore {
            overall: raw_score.clamp(0.0, 100.0),
            phase_scores,
            feature_deviations: Vec::new(),
            top_attention_frames: attention.top_frames(TOP_ATTENTION_FRAMES),
            heuristic: false,
        };
        Ok((score, attention))
    }

    fn is_heuristic(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "OnnxScorer"
    }
}

/// Deterministic rule-based scorer used when no trained model is available.
///
/// Penalizes the average excess |z-score| of every feature against the
/// reference population; a swing matching the reference exactly scores 100.
pub struct HeuristicScorer {
    stats: Arc<ReferenceStats>,
}

impl HeuristicScorer {
    #[must_use]
    pub fn new(stats: Arc<ReferenceStats>) -> Self {
        Self { stats }
    }

    /// Score a frame range of the matrix against a statistics table
    fn score_range(&self, features: &SwingFeatures, range: std::ops::Range<usize>, stroke: StrokeType, phase: Option<Phase>) -> f32 {
        let range = if range.is_empty() {
            0..features.sequence_length()
        } else {
            range
        };
        let Some(table) = self.stats.lookup(stroke, phase) else {
            log::warn!("No reference statistics for {stroke}, scoring neutral");
            return 50.0;
        };

        let len = range.len() as f32;
        let mut penalty_sum = 0.0f32;
        for f in 0..NUM_FEATURES {
            let mean: f32 = range.clone().map(|t| features.matrix[[t, f]]).sum::<f32>() / len;
            let z = table[f].z_score(mean).abs();
            // Deviations inside one sigma are free; beyond three they saturate
            penalty_sum += (z - 1.0).clamp(0.0, 3.0);
        }
        let penalty = penalty_sum / NUM_FEATURES as f32 / 3.0;
        (100.0 * (1.0 - penalty)).clamp(0.0, 100.0)
    }
}

impl SwingScorer for HeuristicScorer {
    fn score(&self, features: &SwingFeatures, stroke: StrokeType) -> Result<(AnalysisScore, AttentionWeights)> {
        let seq_len = features.sequence_length();
        let attention = AttentionWeights::uniform(seq_len, NUM_KEYPOINTS);

        let overall = self.score_range(features, 0..seq_len, stroke, None);

        let mut phase_scores = PhaseScores {
            preparation: 0.0,
            backswing: 0.0,
            contact: 0.0,
            follow_through: 0.0,
        };
        for phase in Phase::SCORED {
            let range = features.boundaries.range(phase, seq_len);
            phase_scores.set(phase, self.score_range(features, range, stroke, Some(phase)));
        }

        let score = AnalysisScore {
            overall,
            phase_scores,
            feature_deviations: Vec::new(),
            top_attention_frames: attention.top_frames(TOP_ATTENTION_FRAMES),
            heuristic: true,
        };
        Ok((score, attention))
    }

    fn is_heuristic(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "HeuristicScorer"
    }
}
