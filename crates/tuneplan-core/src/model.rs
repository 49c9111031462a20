use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TpError};

/// How a fine-tuning run updates the base model's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineTuneType {
    Full,
    Lora,
    Qlora,
}

impl FineTuneType {
    pub fn label(self) -> &'static str {
        match self {
            FineTuneType::Full => "full",
            FineTuneType::Lora => "LoRA",
            FineTuneType::Qlora => "QLoRA",
        }
    }

    /// Adapter methods train a small extra weight set instead of the full model.
    pub fn is_adapter(self) -> bool {
        matches!(self, FineTuneType::Lora | FineTuneType::Qlora)
    }
}

/// Where the base model is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    Jumpstart,
    Huggingface,
    Custom,
}

impl ModelSource {
    pub fn label(self) -> &'static str {
        match self {
            ModelSource::Jumpstart => "JumpStart",
            ModelSource::Huggingface => "Hugging Face",
            ModelSource::Custom => "custom",
        }
    }
}

impl std::str::FromStr for ModelSource {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jumpstart" | "js" => Ok(Self::Jumpstart),
            "huggingface" | "hf" => Ok(Self::Huggingface),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// A fine-tunable base model from models.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub provider: String,
    pub source: ModelSource,
    /// Upstream identifier on the hosting platform (JumpStart slug or HF repo).
    pub platform_id: String,
    pub description: String,
    /// Free-form size label shown in the catalog, e.g. "8B" or "2.7B".
    pub parameter_count: String,
    pub context_length: u64,
    pub license: String,
    /// Ordered by preference; the first entry is the default for models that
    /// don't need quantized adapters.
    pub supported_fine_tune_types: Vec<FineTuneType>,
    /// Key into instances.toml.
    pub recommended_instance: String,
    pub min_gpu_memory_gb: f64,
    pub cost_per_hour: f64,
    pub tags: Vec<String>,
}

impl ModelConfig {
    /// Whether the model needs quantized adapters to fit a single training
    /// node. This is a substring test on the size label ("70" or "40"
    /// anywhere in `parameter_count`), so a hypothetical "140B" entry also
    /// counts as large. Kept as-is for catalog compatibility.
    pub fn is_large(&self) -> bool {
        self.parameter_count.contains("70") || self.parameter_count.contains("40")
    }

    /// Case-insensitive substring match on name, provider and tags.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.provider.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

#[derive(Debug, Deserialize)]
struct ModelsFile {
    model: BTreeMap<String, ModelConfig>,
}

/// Parse a model catalog from TOML string.
pub fn parse_models(toml_str: &str) -> Result<Vec<(String, ModelConfig)>> {
    let mf: ModelsFile =
        toml::from_str(toml_str).map_err(|e| TpError::Io(format!("bad models.toml: {e}")))?;
    Ok(mf.model.into_iter().collect())
}

/// Load a model catalog from a models.toml file.
#[cfg(feature = "network")]
pub fn load_models(path: &std::path::Path) -> Result<Vec<(String, ModelConfig)>> {
    let content = std::fs::read_to_string(path).map_err(|e| TpError::Io(e.to_string()))?;
    parse_models(&content)
}

/// Load the bundled models.toml from the data/ directory.
pub fn load_bundled_models() -> Result<Vec<(String, ModelConfig)>> {
    let toml_str = include_str!("../../../data/models.toml");
    parse_models(toml_str)
}

/// Load the catalog: cached file if available, otherwise bundled.
#[cfg(feature = "network")]
pub fn load_models_cached() -> Result<Vec<(String, ModelConfig)>> {
    if let Some(path) = crate::sync::cache_path("models.toml") {
        if let Ok(content) = std::fs::read_to_string(&path) {
            match parse_models(&content) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => tracing::warn!("ignoring unreadable cached models.toml: {e}"),
            }
        }
    }
    tracing::debug!("using bundled model catalog");
    load_bundled_models()
}

/// Find a model by catalog id: exact match first, then case-insensitive
/// substring on id and display name.
pub fn find_model<'a>(
    models: &'a [(String, ModelConfig)],
    query: &str,
) -> Option<(&'a str, &'a ModelConfig)> {
    if let Some((k, m)) = models.iter().find(|(k, _)| k == query) {
        return Some((k.as_str(), m));
    }
    let q = query.to_lowercase();
    models
        .iter()
        .find(|(k, m)| k.to_lowercase().contains(&q) || m.name.to_lowercase().contains(&q))
        .map(|(k, m)| (k.as_str(), m))
}

/// Like [`find_model`] but an error when nothing matches.
pub fn resolve_model<'a>(
    models: &'a [(String, ModelConfig)],
    query: &str,
) -> Result<(&'a str, &'a ModelConfig)> {
    find_model(models, query).ok_or_else(|| TpError::ModelNotFound(query.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bundled_models() {
        let models = load_bundled_models().expect("should parse bundled models.toml");
        assert_eq!(models.len(), 12, "expected 12 catalog models");

        // Check a known entry.
        let (_, llama) = models
            .iter()
            .find(|(k, _)| k == "llama-3-8b")
            .expect("llama-3-8b missing");
        assert_eq!(llama.name, "Llama 3 8B");
        assert_eq!(llama.provider, "Meta");
        assert_eq!(llama.source, ModelSource::Jumpstart);
        assert_eq!(llama.parameter_count, "8B");
        assert_eq!(llama.context_length, 8192);
        assert_eq!(llama.recommended_instance, "ml.g5.2xlarge");
        assert_eq!(
            llama.supported_fine_tune_types,
            vec![FineTuneType::Full, FineTuneType::Lora, FineTuneType::Qlora]
        );
        assert!((llama.cost_per_hour - 1.21).abs() < 1e-9);
    }

    #[test]
    fn all_models_have_valid_fields() {
        let models = load_bundled_models().unwrap();
        for (key, m) in &models {
            assert!(!m.name.is_empty(), "{key}: name is empty");
            assert!(!m.provider.is_empty(), "{key}: provider is empty");
            assert!(!m.platform_id.is_empty(), "{key}: platform_id is empty");
            assert!(!m.parameter_count.is_empty(), "{key}: parameter_count is empty");
            assert!(!m.license.is_empty(), "{key}: license is empty");
            assert!(m.context_length > 0, "{key}: context_length must be positive");
            assert!(
                !m.supported_fine_tune_types.is_empty(),
                "{key}: no fine-tune types"
            );
            assert!(!m.recommended_instance.is_empty(), "{key}: no instance");
            assert!(m.min_gpu_memory_gb > 0.0, "{key}: min_gpu_memory_gb must be positive");
            assert!(m.cost_per_hour > 0.0, "{key}: cost_per_hour must be positive");
            assert!(!m.tags.is_empty(), "{key}: tags are empty");
        }
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[model.test-model]
name = "Test Model"
provider = "Test"
source = "custom"
platform_id = "test/test-model"
description = "A test model."
parameter_count = "1B"
context_length = 2048
license = "MIT"
supported_fine_tune_types = ["lora"]
recommended_instance = "ml.g5.xlarge"
min_gpu_memory_gb = 8
cost_per_hour = 0.84
tags = ["test"]
"#;
        let models = parse_models(toml).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].0, "test-model");
        assert_eq!(models[0].1.source, ModelSource::Custom);
        assert_eq!(models[0].1.supported_fine_tune_types, vec![FineTuneType::Lora]);
    }

    #[test]
    fn is_large_matches_label_substring() {
        let models = load_bundled_models().unwrap();
        let by_key = |key: &str| {
            models
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, m)| m)
                .unwrap()
        };
        assert!(by_key("llama-3-70b").is_large());
        assert!(by_key("falcon-40b").is_large());
        assert!(!by_key("llama-3-8b").is_large());
        // "2.7B" contains a 7 but not "70".
        assert!(!by_key("phi-2").is_large());
    }

    #[test]
    fn matches_query_checks_name_provider_tags() {
        let models = load_bundled_models().unwrap();
        let (_, llama) = models.iter().find(|(k, _)| k == "llama-3-8b").unwrap();
        assert!(llama.matches_query("llama"));
        assert!(llama.matches_query("META"));
        assert!(llama.matches_query("chat"));
        assert!(!llama.matches_query("typescript"));
    }

    #[test]
    fn find_model_exact_then_fuzzy() {
        let models = load_bundled_models().unwrap();
        let (key, _) = find_model(&models, "phi-2").expect("exact id");
        assert_eq!(key, "phi-2");
        let (key, _) = find_model(&models, "zephyr").expect("id substring");
        assert_eq!(key, "zephyr-7b-beta");
        let (key, m) = find_model(&models, "Code Llama 13").expect("name substring");
        assert_eq!(key, "codellama-13b");
        assert_eq!(m.parameter_count, "13B");
        assert!(find_model(&models, "gpt-17").is_none());
    }

    #[test]
    fn resolve_model_error_names_the_query() {
        let models = load_bundled_models().unwrap();
        let err = resolve_model(&models, "gpt-17").unwrap_err();
        assert_eq!(err.to_string(), "model not found: gpt-17");
    }
}
