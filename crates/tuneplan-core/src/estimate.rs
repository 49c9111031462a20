use serde::{Deserialize, Serialize};

use crate::error::{Result, TpError};
use crate::instance::{find_instance, InstanceType};
use crate::model::ModelConfig;

/// Assumed wall-clock seconds per optimizer step. A rough placeholder rate,
/// not a measured one; pass a different rate to
/// [`estimate_cost_with_throughput`] to recalibrate.
pub const DEFAULT_SECS_PER_STEP: f64 = 2.0;

/// Cost band around the base estimate. Asymmetric: real runs tend to run
/// longer than the naive projection, not shorter.
const BAND_LOW: f64 = 0.8;
const BAND_HIGH: f64 = 1.5;

/// Cost and duration estimate for a training run.
///
/// An all-zero estimate is the degraded "cost unavailable" result returned
/// when the model's recommended instance is missing from the instance
/// table; see [`CostEstimate::is_unavailable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// USD, rounded to 2 decimals.
    pub min_cost: f64,
    /// USD, rounded to 2 decimals. Never below `min_cost`.
    pub max_cost: f64,
    /// Wall-clock hours, rounded to 1 decimal.
    pub estimated_hours: f64,
}

impl CostEstimate {
    /// The degraded estimate returned when the instance rate can't be
    /// resolved.
    pub fn unavailable() -> Self {
        Self { min_cost: 0.0, max_cost: 0.0, estimated_hours: 0.0 }
    }

    /// All-zero check. Note that a zero-row dataset legitimately estimates
    /// to zero as well; callers rendering "cost unavailable" usually know
    /// their dataset is non-empty.
    pub fn is_unavailable(&self) -> bool {
        self.min_cost == 0.0 && self.max_cost == 0.0 && self.estimated_hours == 0.0
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Estimate the cost of fine-tuning `model` on its recommended instance.
///
/// A model whose `recommended_instance` is missing from `instances` yields
/// `Ok(CostEstimate::unavailable())` rather than an error, so catalog
/// screens keep rendering when the two tables drift apart. Zero `epochs`
/// or `batch_size` is rejected.
pub fn estimate_cost(
    instances: &[(String, InstanceType)],
    model: &ModelConfig,
    dataset_size: u64,
    epochs: u32,
    batch_size: u32,
) -> Result<CostEstimate> {
    estimate_cost_with_throughput(
        instances,
        model,
        dataset_size,
        epochs,
        batch_size,
        DEFAULT_SECS_PER_STEP,
    )
}

/// Same as [`estimate_cost`] with an explicit seconds-per-step rate.
///
/// Hours are rounded to 1 decimal before the cost band is computed, so the
/// returned triple is self-consistent: `min_cost`/`max_cost` derive from
/// the `estimated_hours` the caller sees, not from an unrounded value.
pub fn estimate_cost_with_throughput(
    instances: &[(String, InstanceType)],
    model: &ModelConfig,
    dataset_size: u64,
    epochs: u32,
    batch_size: u32,
    secs_per_step: f64,
) -> Result<CostEstimate> {
    if epochs == 0 {
        return Err(TpError::InvalidConfig("epochs must be at least 1".into()));
    }
    if batch_size == 0 {
        return Err(TpError::InvalidConfig("batch size must be at least 1".into()));
    }

    let instance = match find_instance(instances, &model.recommended_instance) {
        Some(i) => i,
        None => return Ok(CostEstimate::unavailable()),
    };

    let steps_per_epoch = dataset_size.div_ceil(batch_size as u64);
    let total_steps = steps_per_epoch * epochs as u64;

    let estimated_hours = round1(total_steps as f64 * secs_per_step / 3600.0);
    let base_cost = estimated_hours * instance.cost_per_hour;

    Ok(CostEstimate {
        min_cost: round2(base_cost * BAND_LOW),
        max_cost: round2(base_cost * BAND_HIGH),
        estimated_hours,
    })
}
