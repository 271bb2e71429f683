//! Reference population statistics for z-scoring observed features.
//!
//! Per stroke type the table carries an overall `(mean, std)` per feature
//! index plus optional per-phase tables. The file is YAML, versioned
//! alongside the scoring model, loaded once at startup, and never mutated —
//! safe for unsynchronized concurrent reads.

use crate::constants::NUM_FEATURES;
use crate::segmentation::{Phase, StrokeType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Reference mean and standard deviation of one feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureStat {
    pub mean: f32,
    pub std: f32,
}

impl FeatureStat {
    /// Z-score of an observed value against this reference
    #[must_use]
    pub fn z_score(&self, value: f32) -> f32 {
        if self.std <= 0.0 {
            return 0.0;
        }
        (value - self.mean) / self.std
    }
}

/// Per-stroke statistics: an overall table plus per-phase tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokeStats {
    /// One entry per feature index
    pub overall: Vec<FeatureStat>,
    /// Phase-restricted tables; phases missing here fall back to `overall`
    #[serde(default)]
    pub phases: BTreeMap<Phase, Vec<FeatureStat>>,
}

/// The process-wide reference distribution tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceStats {
    /// Version tag, kept in lockstep with the model artifact
    pub version: String,
    pub strokes: HashMap<StrokeType, StrokeStats>,
}

impl ReferenceStats {
    /// Load and validate a statistics table from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `StatsError` when the file is unreadable, malformed, or a
    /// table does not carry exactly one entry per feature.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::StatsError(format!("Failed to read {}: {e}", path.as_ref().display())))?;
        let stats: ReferenceStats =
            serde_yaml::from_str(&content).map_err(|e| Error::StatsError(format!("Failed to parse stats: {e}")))?;
        stats.validate()?;
        log::info!(
            "Loaded reference statistics v{} for {} stroke types",
            stats.version,
            stats.strokes.len()
        );
        Ok(stats)
    }

    /// Placeholder table (mean 0, std 1 for every feature of every stroke and
    /// phase). Useful for tests and for bootstrapping before a population has
    /// been collected; z-scores against it equal the raw feature values.
    #[must_use]
    pub fn uniform() -> Self {
        let table = vec![FeatureStat { mean: 0.0, std: 1.0 }; NUM_FEATURES];
        let strokes = [StrokeType::Forehand, StrokeType::Backhand, StrokeType::Serve]
            .into_iter()
            .map(|stroke| {
                (
                    stroke,
                    StrokeStats {
                        overall: table.clone(),
                        phases: Phase::SCORED.iter().map(|&p| (p, table.clone())).collect(),
                    },
                )
            })
            .collect();
        Self {
            version: "uniform".to_string(),
            strokes,
        }
    }

    /// Validate table shapes
    ///
    /// # Errors
    ///
    /// Returns `StatsError` on any table whose length differs from the
    /// feature count or whose std is not positive.
    pub fn validate(&self) -> Result<()> {
        for (stroke, stats) in &self.strokes {
            let check = |name: &str, table: &[FeatureStat]| -> Result<()> {
                if table.len() != NUM_FEATURES {
                    return Err(Error::StatsError(format!(
                        "{stroke} {name} table has {} entries, expected {NUM_FEATURES}",
                        table.len()
                    )));
                }
                if let Some(bad) = table.iter().position(|s| s.std <= 0.0 || !s.std.is_finite()) {
                    return Err(Error::StatsError(format!(
                        "{stroke} {name} table has non-positive std at feature {bad}"
                    )));
                }
                Ok(())
            };
            check("overall", &stats.overall)?;
            for (phase, table) in &stats.phases {
                check(phase.name(), table)?;
            }
        }
        Ok(())
    }

    /// Statistics table for a stroke, optionally restricted to a phase.
    /// A phase without its own table falls back to the stroke's overall table.
    #[must_use]
    pub fn lookup(&self, stroke: StrokeType, phase: Option<Phase>) -> Option<&[FeatureStat]> {
        let stats = self.strokes.get(&stroke)?;
        if let Some(phase) = phase {
            if let Some(table) = stats.phases.get(&phase) {
                return Some(table);
            }
        }
        Some(&stats.overall)
    }
}
