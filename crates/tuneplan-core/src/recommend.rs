use serde::{Deserialize, Serialize};

use crate::config::QualityPreset;
use crate::error::{Result, TpError};
use crate::model::{FineTuneType, ModelConfig};

/// Warmup fraction applied to every recommended run.
pub const WARMUP_RATIO: f64 = 0.1;

/// Dataset size above which example packing is worth enabling.
/// Strict: a dataset of exactly this many rows does not pack.
pub const PACKING_THRESHOLD: u64 = 1000;

/// LoRA (rank, alpha) for large models running quantized adapters.
const LORA_LARGE: (u32, u32) = (16, 32);
/// LoRA (rank, alpha) for everything else.
const LORA_DEFAULT: (u32, u32) = (64, 128);

/// Hyperparameters recommended for a model, dataset size and preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedConfig {
    pub epochs: u32,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub warmup_ratio: f64,
    pub gradient_checkpointing: bool,
    pub packing: bool,
    pub fine_tune_type: FineTuneType,
    pub lora_rank: u32,
    pub lora_alpha: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantization_bits: Option<u8>,
}

/// Recommend a training configuration.
///
/// Large models are forced onto 4-bit QLoRA with a conservative rank;
/// everything else gets the model's first supported fine-tune type and a
/// wider adapter. The LoRA fields are filled in either way so switching a
/// full-weight run to an adapter needs no extra lookup; readers should
/// ignore them when `fine_tune_type` is `full`.
pub fn recommended_config(
    model: &ModelConfig,
    dataset_size: u64,
    preset: QualityPreset,
) -> Result<RecommendedConfig> {
    let large = model.is_large();

    let fine_tune_type = if large {
        FineTuneType::Qlora
    } else {
        *model.supported_fine_tune_types.first().ok_or_else(|| {
            TpError::InvalidConfig(format!("model {} supports no fine-tune types", model.name))
        })?
    };

    let (lora_rank, lora_alpha) = if large { LORA_LARGE } else { LORA_DEFAULT };

    Ok(RecommendedConfig {
        epochs: preset.epochs(),
        learning_rate: preset.learning_rate(),
        batch_size: preset.batch_size(),
        warmup_ratio: WARMUP_RATIO,
        gradient_checkpointing: true,
        packing: dataset_size > PACKING_THRESHOLD,
        fine_tune_type,
        lora_rank,
        lora_alpha,
        quantization_bits: if large { Some(4) } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSource;

    fn model(parameter_count: &str, types: &[FineTuneType]) -> ModelConfig {
        ModelConfig {
            name: format!("Test {parameter_count}"),
            provider: "Test".into(),
            source: ModelSource::Custom,
            platform_id: "test/model".into(),
            description: String::new(),
            parameter_count: parameter_count.into(),
            context_length: 4096,
            license: "MIT".into(),
            supported_fine_tune_types: types.to_vec(),
            recommended_instance: "ml.g5.2xlarge".into(),
            min_gpu_memory_gb: 16.0,
            cost_per_hour: 1.21,
            tags: vec!["test".into()],
        }
    }

    const ALL_TYPES: &[FineTuneType] =
        &[FineTuneType::Full, FineTuneType::Lora, FineTuneType::Qlora];

    #[test]
    fn medium_preset_baseline() {
        let m = model("8B", ALL_TYPES);
        let rec = recommended_config(&m, 500, QualityPreset::Medium).unwrap();
        assert_eq!(rec.epochs, 3);
        assert!((rec.learning_rate - 1e-5).abs() < 1e-12);
        assert_eq!(rec.batch_size, 4);
        assert!((rec.warmup_ratio - 0.1).abs() < 1e-12);
        assert!(rec.gradient_checkpointing);
        assert!(!rec.packing);
    }

    #[test]
    fn small_model_gets_first_supported_type() {
        let m = model("8B", ALL_TYPES);
        let rec = recommended_config(&m, 100, QualityPreset::Low).unwrap();
        assert_eq!(rec.fine_tune_type, FineTuneType::Full);
        assert_eq!(rec.lora_rank, 64);
        assert_eq!(rec.lora_alpha, 128);
        assert_eq!(rec.quantization_bits, None);

        let m = model("13B", &[FineTuneType::Lora, FineTuneType::Qlora]);
        let rec = recommended_config(&m, 100, QualityPreset::Low).unwrap();
        assert_eq!(rec.fine_tune_type, FineTuneType::Lora);
    }

    #[test]
    fn large_model_forced_to_qlora() {
        for label in ["70B", "40B"] {
            for preset in QualityPreset::ALL {
                let m = model(label, &[FineTuneType::Lora, FineTuneType::Qlora]);
                let rec = recommended_config(&m, 5000, preset).unwrap();
                assert_eq!(rec.fine_tune_type, FineTuneType::Qlora, "{label} {preset:?}");
                assert_eq!(rec.lora_rank, 16);
                assert_eq!(rec.lora_alpha, 32);
                assert_eq!(rec.quantization_bits, Some(4));
            }
        }
    }

    // The size check is a label substring test, so "140B" counts as large.
    // Pinned so a change to real size parsing is a conscious one.
    #[test]
    fn size_label_substring_quirk() {
        let m = model("140B", ALL_TYPES);
        let rec = recommended_config(&m, 100, QualityPreset::Medium).unwrap();
        assert_eq!(rec.fine_tune_type, FineTuneType::Qlora);
        assert_eq!(rec.quantization_bits, Some(4));

        // "2.7B" and "7B" contain sevens but not "70".
        for label in ["2.7B", "7B"] {
            let m = model(label, ALL_TYPES);
            let rec = recommended_config(&m, 100, QualityPreset::Medium).unwrap();
            assert_eq!(rec.fine_tune_type, FineTuneType::Full, "{label}");
        }
    }

    #[test]
    fn packing_boundary_is_strict() {
        let m = model("8B", ALL_TYPES);
        assert!(!recommended_config(&m, 0, QualityPreset::Medium).unwrap().packing);
        assert!(!recommended_config(&m, 1000, QualityPreset::Medium).unwrap().packing);
        assert!(recommended_config(&m, 1001, QualityPreset::Medium).unwrap().packing);
    }

    #[test]
    fn empty_type_list_rejected_for_small_models() {
        let m = model("8B", &[]);
        let err = recommended_config(&m, 100, QualityPreset::Medium).unwrap_err();
        assert!(matches!(err, TpError::InvalidConfig(_)));
    }

    #[test]
    fn empty_type_list_fine_for_large_models() {
        // QLoRA is forced before the supported list is consulted.
        let m = model("70B", &[]);
        let rec = recommended_config(&m, 100, QualityPreset::Medium).unwrap();
        assert_eq!(rec.fine_tune_type, FineTuneType::Qlora);
    }

    #[test]
    fn quantization_absent_in_json_for_small_models() {
        let m = model("8B", ALL_TYPES);
        let rec = recommended_config(&m, 100, QualityPreset::Medium).unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("quantization_bits").is_none());

        let m = model("70B", ALL_TYPES);
        let rec = recommended_config(&m, 100, QualityPreset::Medium).unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["quantization_bits"], 4);
    }
}
