//! Evaluation configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of the fixed metric conventions.
///
/// - `ap=voc-exact`: AP integrates the precision envelope exactly over the
///   empirical recall steps (VOC style, with sentinels at recall 0 and 1).
/// - `mota=unclipped`: negative MOTA is reported as-is unless
///   [`EvalConfig::clip_negative_mota`] is set.
/// - `motp=raw-distance`: MOTP is the mean head-normalized distance of matches.
/// - `total=mean-of-defined-joints`: the total row averages joints that have
///   ground truth. A joint without ground truth has every column NaN,
///   tracking precision included, even when predictions exist for it.
pub const METRIC_CONVENTION: &str =
    "ap=voc-exact;mota=unclipped;motp=raw-distance;total=mean-of-defined-joints";

/// Configuration for an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum head-normalized distance for a correct joint (PCKh threshold).
    pub distance_threshold: f64,

    /// Head size = `head_size_factor` x head-box diagonal.
    pub head_size_factor: f64,

    /// Floor MOTA at zero instead of reporting negative values.
    pub clip_negative_mota: bool,

    /// Keep per-sequence result tables next to the merged totals.
    pub save_per_sequence: bool,

    /// Evaluate sequences in parallel.
    pub parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.5,
            head_size_factor: 0.6,
            clip_negative_mota: false,
            save_per_sequence: false,
            parallel: true,
        }
    }
}

impl EvalConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: EvalConfig = serde_json::from_str(&contents).map_err(|source| Error::Json {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.distance_threshold.is_finite() && self.distance_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "distance_threshold must be positive, got {}",
                self.distance_threshold
            )));
        }
        if !(self.head_size_factor.is_finite() && self.head_size_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "head_size_factor must be positive, got {}",
                self.head_size_factor
            )));
        }
        Ok(())
    }
}
