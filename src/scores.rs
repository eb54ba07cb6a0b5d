//! Per-class accuracy scores fed to the chart renderer.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// mAP50 per class from the last evaluation of the space-station model.
const MISSION_BASELINE: [(&str, f32); 7] = [
    ("OxygenTank", 0.772),
    ("NitrogenTank", 0.765),
    ("FirstAidBox", 0.746),
    ("FireAlarm", 0.661),
    ("SafetySwitchPanel", 0.734),
    ("EmergencyPhone", 0.600),
    ("FireExtinguisher", 0.807),
];

/// One object class and its accuracy score in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class: String,
    pub score: f32,
}

/// Ordered, validated class scores. Order defines bar order.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTable {
    entries: Vec<ClassScore>,
}

impl ScoreTable {
    /// Pairs `names` with `scores`, which must have equal length.
    pub fn from_parallel<S: AsRef<str>>(names: &[S], scores: &[f32]) -> Result<Self> {
        if names.len() != scores.len() {
            return Err(anyhow!(
                "class names and scores differ in length ({} names, {} scores)",
                names.len(),
                scores.len()
            ));
        }
        let entries = names
            .iter()
            .zip(scores)
            .map(|(name, &score)| ClassScore {
                class: name.as_ref().to_string(),
                score,
            })
            .collect();
        Self::new(entries)
    }

    pub fn new(entries: Vec<ClassScore>) -> Result<Self> {
        if entries.is_empty() {
            return Err(anyhow!("score table needs at least one class"));
        }
        for entry in &entries {
            if !(0.0..=1.0).contains(&entry.score) {
                return Err(anyhow!(
                    "score for {} must be within [0, 1], got {}",
                    entry.class,
                    entry.score
                ));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in evaluation results for the space-station classes.
    pub fn mission_baseline() -> Self {
        Self {
            entries: MISSION_BASELINE
                .iter()
                .map(|&(class, score)| ClassScore {
                    class: class.to_string(),
                    score,
                })
                .collect(),
        }
    }

    /// Loads a JSON array of `{"class": ..., "score": ...}` objects.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scores file {}", path.display()))?;
        let entries: Vec<ClassScore> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid scores file {}", path.display()))?;
        Self::new(entries).with_context(|| format!("invalid scores in {}", path.display()))
    }

    pub fn entries(&self) -> &[ClassScore] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_score(&self) -> f32 {
        self.entries.iter().map(|e| e.score).fold(0.0, f32::max)
    }

    /// Score relative to the table maximum, in `[0, 1]`.
    ///
    /// When every score is zero each entry is a maximum and maps to 1.
    pub fn normalized(&self, score: f32) -> f32 {
        let max = self.max_score();
        if max > 0.0 {
            (score / max).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}
