use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TpError};

/// A training instance type from instances.toml.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceType {
    pub gpu_memory_gb: f64,
    pub vcpus: u32,
    /// On-demand training price in USD per hour.
    pub cost_per_hour: f64,
}

#[derive(Debug, Deserialize)]
struct InstancesFile {
    instance: BTreeMap<String, InstanceType>,
}

/// Parse instance types from TOML string.
pub fn parse_instances(toml_str: &str) -> Result<Vec<(String, InstanceType)>> {
    let inf: InstancesFile =
        toml::from_str(toml_str).map_err(|e| TpError::Io(format!("bad instances.toml: {e}")))?;
    Ok(inf.instance.into_iter().collect())
}

/// Load instance types from an instances.toml file.
#[cfg(feature = "network")]
pub fn load_instances(path: &std::path::Path) -> Result<Vec<(String, InstanceType)>> {
    let content = std::fs::read_to_string(path).map_err(|e| TpError::Io(e.to_string()))?;
    parse_instances(&content)
}

/// Load the bundled instances.toml from the data/ directory.
pub fn load_bundled_instances() -> Result<Vec<(String, InstanceType)>> {
    let toml_str = include_str!("../../../data/instances.toml");
    parse_instances(toml_str)
}

/// Load instance types: cached file if available, otherwise bundled.
#[cfg(feature = "network")]
pub fn load_instances_cached() -> Result<Vec<(String, InstanceType)>> {
    if let Some(path) = crate::sync::cache_path("instances.toml") {
        if let Ok(content) = std::fs::read_to_string(&path) {
            match parse_instances(&content) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => tracing::warn!("ignoring unreadable cached instances.toml: {e}"),
            }
        }
    }
    tracing::debug!("using bundled instance table");
    load_bundled_instances()
}

/// Exact lookup by instance type name.
pub fn find_instance<'a>(
    instances: &'a [(String, InstanceType)],
    key: &str,
) -> Option<&'a InstanceType> {
    instances.iter().find(|(k, _)| k == key).map(|(_, i)| i)
}

/// Lenient lookup for CLI input: "g5.2xlarge" matches "ml.g5.2xlarge".
pub fn match_instance<'a>(
    instances: &'a [(String, InstanceType)],
    query: &str,
) -> Option<(&'a str, &'a InstanceType)> {
    let q = query.to_lowercase();
    let q = q.strip_prefix("ml.").unwrap_or(&q);
    instances
        .iter()
        .find(|(k, _)| k.strip_prefix("ml.").unwrap_or(k) == q)
        .map(|(k, i)| (k.as_str(), i))
}
