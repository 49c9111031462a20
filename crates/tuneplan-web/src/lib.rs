use wasm_bindgen::prelude::*;

use tuneplan_core::config::{QualityPreset, TrainingConfig};
use tuneplan_core::estimate;
use tuneplan_core::instance::{self, InstanceType};
use tuneplan_core::model::{self, ModelConfig};
use tuneplan_core::plan;
use tuneplan_core::recommend::recommended_config;
use tuneplan_core::region::REGIONS;

// ---------------------------------------------------------------------------
// Bundled data
// ---------------------------------------------------------------------------

/// The bundled model catalog as [key, ModelConfig] pairs.
#[wasm_bindgen]
pub fn get_model_catalog() -> JsValue {
    match model::load_bundled_models() {
        Ok(models) => serde_wasm_bindgen::to_value(&models).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

/// The bundled instance table as [key, InstanceType] pairs.
#[wasm_bindgen]
pub fn get_instance_types() -> JsValue {
    match instance::load_bundled_instances() {
        Ok(instances) => serde_wasm_bindgen::to_value(&instances).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

/// Supported AWS regions.
#[wasm_bindgen]
pub fn get_regions() -> JsValue {
    serde_wasm_bindgen::to_value(REGIONS).unwrap_or(JsValue::NULL)
}

#[derive(serde::Serialize)]
struct PresetJs {
    id: &'static str,
    epochs: u32,
    learning_rate: f64,
    batch_size: u32,
}

/// The quality presets with their hyperparameter triples.
#[wasm_bindgen]
pub fn get_quality_presets() -> JsValue {
    let presets: Vec<PresetJs> = QualityPreset::ALL
        .iter()
        .map(|p| PresetJs {
            id: p.label(),
            epochs: p.epochs(),
            learning_rate: p.learning_rate(),
            batch_size: p.batch_size(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&presets).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Model lookup
// ---------------------------------------------------------------------------

/// Find a model in the catalog by id or fuzzy name.
/// Returns [key, ModelConfig] or null.
#[wasm_bindgen]
pub fn find_model(models: JsValue, query: &str) -> JsValue {
    let models: Vec<(String, ModelConfig)> = match serde_wasm_bindgen::from_value(models) {
        Ok(m) => m,
        Err(_) => return JsValue::NULL,
    };
    match model::find_model(&models, query) {
        Some((key, m)) => serde_wasm_bindgen::to_value(&(key, m)).unwrap_or(JsValue::NULL),
        None => JsValue::NULL,
    }
}

/// Whether a model needs quantized adapters (QLoRA) to train on one node.
#[wasm_bindgen]
pub fn is_large_model(model: JsValue) -> bool {
    match serde_wasm_bindgen::from_value::<ModelConfig>(model) {
        Ok(m) => m.is_large(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Recommendation and cost
// ---------------------------------------------------------------------------

/// Recommended hyperparameters for a model, dataset size and preset.
/// dataset_size is f64 to avoid BigInt on the JS side.
#[wasm_bindgen]
pub fn recommend(model: JsValue, dataset_size: f64, preset: &str) -> JsValue {
    let model: ModelConfig = match serde_wasm_bindgen::from_value(model) {
        Ok(m) => m,
        Err(_) => return JsValue::NULL,
    };
    let preset = match preset.parse::<QualityPreset>() {
        Ok(p) => p,
        Err(_) => return JsValue::NULL,
    };
    match recommended_config(&model, dataset_size as u64, preset) {
        Ok(rec) => serde_wasm_bindgen::to_value(&rec).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

/// Cost estimate for a run on the model's recommended instance.
#[wasm_bindgen]
pub fn estimate_cost(
    instances: JsValue,
    model: JsValue,
    dataset_size: f64,
    epochs: f64,
    batch_size: f64,
) -> JsValue {
    let instances: Vec<(String, InstanceType)> = match serde_wasm_bindgen::from_value(instances) {
        Ok(i) => i,
        Err(_) => return JsValue::NULL,
    };
    let model: ModelConfig = match serde_wasm_bindgen::from_value(model) {
        Ok(m) => m,
        Err(_) => return JsValue::NULL,
    };
    match estimate::estimate_cost(
        &instances,
        &model,
        dataset_size as u64,
        epochs as u32,
        batch_size as u32,
    ) {
        Ok(est) => serde_wasm_bindgen::to_value(&est).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

/// Resolve a full training plan: effective config, estimate and warnings.
#[wasm_bindgen]
pub fn build_plan(
    instances: JsValue,
    model_id: &str,
    model: JsValue,
    dataset_size: f64,
    config: JsValue,
) -> JsValue {
    let instances: Vec<(String, InstanceType)> = match serde_wasm_bindgen::from_value(instances) {
        Ok(i) => i,
        Err(_) => return JsValue::NULL,
    };
    let model: ModelConfig = match serde_wasm_bindgen::from_value(model) {
        Ok(m) => m,
        Err(_) => return JsValue::NULL,
    };
    let config: TrainingConfig = match serde_wasm_bindgen::from_value(config) {
        Ok(c) => c,
        Err(_) => return JsValue::NULL,
    };
    match plan::build_plan(&instances, model_id, &model, dataset_size as u64, &config) {
        Ok(p) => serde_wasm_bindgen::to_value(&p).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

// ---------------------------------------------------------------------------
// Step math
// ---------------------------------------------------------------------------

/// Total optimizer steps for a run: ceil(rows / batch) * epochs.
#[wasm_bindgen]
pub fn total_steps(dataset_size: f64, batch_size: f64, epochs: f64) -> f64 {
    if batch_size <= 0.0 {
        return 0.0;
    }
    (dataset_size / batch_size).ceil() * epochs
}
