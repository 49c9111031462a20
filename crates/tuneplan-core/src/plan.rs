use serde::Serialize;

use crate::config::{AdvancedTrainingConfig, TrainingConfig};
use crate::error::Result;
use crate::estimate::{estimate_cost, CostEstimate};
use crate::instance::{find_instance, InstanceType};
use crate::model::ModelConfig;

/// A fully resolved training run: the hyperparameters that will actually be
/// submitted plus the projected bill.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingPlan {
    pub model_id: String,
    pub model_name: String,
    pub instance_type: String,
    pub dataset_size: u64,
    pub config: AdvancedTrainingConfig,
    pub estimate: CostEstimate,
    /// Advisory only. A plan with warnings can still be submitted.
    pub warnings: Vec<String>,
}

/// Resolve `config` against `model` and price the run.
///
/// Budget and time caps from the simple config produce warnings, never
/// errors: the caller decides whether an over-budget plan is worth
/// launching.
pub fn build_plan(
    instances: &[(String, InstanceType)],
    model_id: &str,
    model: &ModelConfig,
    dataset_size: u64,
    config: &TrainingConfig,
) -> Result<TrainingPlan> {
    let resolved = config.effective(model, dataset_size)?;
    let estimate = estimate_cost(
        instances,
        model,
        dataset_size,
        resolved.epochs,
        resolved.batch_size,
    )?;

    let mut warnings = Vec::new();
    if find_instance(instances, &model.recommended_instance).is_none() {
        warnings.push(format!(
            "no pricing for instance {}; cost unknown",
            model.recommended_instance
        ));
    }
    if let Some(cap) = config.simple.max_cost_usd {
        if estimate.max_cost > cap {
            warnings.push(format!(
                "estimate up to ${:.2} exceeds the ${:.2} budget cap",
                estimate.max_cost, cap
            ));
        }
    }
    if let Some(cap) = config.simple.max_hours {
        if estimate.estimated_hours > cap {
            warnings.push(format!(
                "estimated {:.1} h exceeds the {:.1} h time cap",
                estimate.estimated_hours, cap
            ));
        }
    }

    Ok(TrainingPlan {
        model_id: model_id.to_string(),
        model_name: model.name.clone(),
        instance_type: model.recommended_instance.clone(),
        dataset_size,
        config: resolved,
        estimate,
        warnings,
    })
}
