use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{FineTuneType, ModelConfig};
use crate::recommend::{recommended_config, RecommendedConfig};

/// Named quality tier trading training time and cost against output quality.
/// Each tier maps to a fixed (epochs, learning rate, batch size) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    High,
}

impl QualityPreset {
    pub fn epochs(self) -> u32 {
        match self {
            QualityPreset::Low => 1,
            QualityPreset::Medium => 3,
            QualityPreset::High => 5,
        }
    }

    pub fn learning_rate(self) -> f64 {
        match self {
            QualityPreset::Low => 2e-5,
            QualityPreset::Medium => 1e-5,
            QualityPreset::High => 5e-6,
        }
    }

    pub fn batch_size(self) -> u32 {
        match self {
            QualityPreset::Low => 8,
            QualityPreset::Medium => 4,
            QualityPreset::High => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    pub const ALL: [QualityPreset; 3] =
        [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High];
}

impl std::str::FromStr for QualityPreset {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

/// What the tuned model is optimized to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    Instruction,
    Chat,
    Classification,
}

impl OutputStyle {
    pub fn label(self) -> &'static str {
        match self {
            OutputStyle::Instruction => "instruction",
            OutputStyle::Chat => "chat",
            OutputStyle::Classification => "classification",
        }
    }
}

impl std::str::FromStr for OutputStyle {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instruction" => Ok(Self::Instruction),
            "chat" => Ok(Self::Chat),
            "classification" | "class" => Ok(Self::Classification),
            other => Err(format!("unknown output style: {other}")),
        }
    }
}

/// Simple-mode wizard settings: a preset plus optional budget caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleTrainingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hours: Option<f64>,
    pub quality_preset: QualityPreset,
    pub output_style: OutputStyle,
}

impl SimpleTrainingConfig {
    pub fn new(preset: QualityPreset, style: OutputStyle) -> Self {
        Self {
            max_cost_usd: None,
            max_hours: None,
            quality_preset: preset,
            output_style: style,
        }
    }
}

/// Full hyperparameter set, either user-edited or seeded from a
/// recommendation. LoRA and quantization fields are absent when the
/// fine-tune type doesn't use them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedTrainingConfig {
    pub epochs: u32,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub warmup_ratio: f64,
    pub gradient_checkpointing: bool,
    pub packing: bool,
    pub fine_tune_type: FineTuneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_alpha: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantization_bits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
}

impl From<RecommendedConfig> for AdvancedTrainingConfig {
    fn from(r: RecommendedConfig) -> Self {
        Self {
            epochs: r.epochs,
            learning_rate: r.learning_rate,
            batch_size: r.batch_size,
            warmup_ratio: r.warmup_ratio,
            gradient_checkpointing: r.gradient_checkpointing,
            packing: r.packing,
            fine_tune_type: r.fine_tune_type,
            lora_rank: Some(r.lora_rank),
            lora_alpha: Some(r.lora_alpha),
            quantization_bits: r.quantization_bits,
            max_steps: None,
        }
    }
}

/// A run's training configuration: the simple-mode settings plus an
/// optional advanced override block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub simple: SimpleTrainingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedTrainingConfig>,
    pub use_advanced: bool,
}

impl TrainingConfig {
    pub fn with_preset(preset: QualityPreset, style: OutputStyle) -> Self {
        Self {
            simple: SimpleTrainingConfig::new(preset, style),
            advanced: None,
            use_advanced: false,
        }
    }

    /// The configuration a run would actually launch with: the advanced
    /// block when advanced mode is on and one exists, the recommendation
    /// for `model` and `dataset_size` otherwise.
    pub fn effective(
        &self,
        model: &ModelConfig,
        dataset_size: u64,
    ) -> Result<AdvancedTrainingConfig> {
        if self.use_advanced {
            if let Some(adv) = &self.advanced {
                return Ok(adv.clone());
            }
        }
        let recommended = recommended_config(model, dataset_size, self.simple.quality_preset)?;
        Ok(recommended.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn preset_triples() {
        assert_eq!(QualityPreset::Low.epochs(), 1);
        assert_eq!(QualityPreset::Low.batch_size(), 8);
        assert!((QualityPreset::Low.learning_rate() - 2e-5).abs() < 1e-12);

        assert_eq!(QualityPreset::Medium.epochs(), 3);
        assert_eq!(QualityPreset::Medium.batch_size(), 4);
        assert!((QualityPreset::Medium.learning_rate() - 1e-5).abs() < 1e-12);

        assert_eq!(QualityPreset::High.epochs(), 5);
        assert_eq!(QualityPreset::High.batch_size(), 2);
        assert!((QualityPreset::High.learning_rate() - 5e-6).abs() < 1e-12);
    }

    #[test]
    fn higher_presets_train_longer_and_gentler() {
        for w in QualityPreset::ALL.windows(2) {
            assert!(w[0].epochs() < w[1].epochs());
            assert!(w[0].learning_rate() > w[1].learning_rate());
            assert!(w[0].batch_size() > w[1].batch_size());
        }
    }

    #[test]
    fn preset_from_str() {
        assert_eq!(QualityPreset::from_str("low"), Ok(QualityPreset::Low));
        assert_eq!(QualityPreset::from_str("MED"), Ok(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("High"), Ok(QualityPreset::High));
        assert!(QualityPreset::from_str("ultra").is_err());
    }

    #[test]
    fn output_style_from_str() {
        assert_eq!(OutputStyle::from_str("chat"), Ok(OutputStyle::Chat));
        assert_eq!(OutputStyle::from_str("class"), Ok(OutputStyle::Classification));
        assert!(OutputStyle::from_str("poetry").is_err());
    }

    #[test]
    fn preset_serde_lowercase() {
        let json = serde_json::to_string(&QualityPreset::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let back: QualityPreset = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(back, QualityPreset::High);
    }
}
