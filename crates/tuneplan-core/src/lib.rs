pub mod config;
pub mod error;
pub mod estimate;
pub mod instance;
pub mod model;
pub mod plan;
pub mod recommend;
pub mod region;
#[cfg(feature = "network")]
pub mod sync;

pub use config::{QualityPreset, SimpleTrainingConfig, TrainingConfig};
pub use error::TpError;
pub use estimate::CostEstimate;
pub use model::{FineTuneType, ModelConfig, ModelSource};
pub use plan::TrainingPlan;
pub use recommend::RecommendedConfig;
