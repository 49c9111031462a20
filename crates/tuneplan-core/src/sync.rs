use std::path::PathBuf;

use crate::error::{Result, TpError};
use crate::instance;
use crate::model;

const MODELS_URL: &str =
    "https://raw.githubusercontent.com/tuneplan/tuneplan/main/data/models.toml";
const INSTANCES_URL: &str =
    "https://raw.githubusercontent.com/tuneplan/tuneplan/main/data/instances.toml";

/// Return the cache directory for tuneplan data files.
/// Creates it if it doesn't exist.
pub fn cache_dir() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("tuneplan");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

/// Return the path to a cached data file, if the cache directory is available.
pub fn cache_path(filename: &str) -> Option<PathBuf> {
    Some(cache_dir()?.join(filename))
}

pub struct SyncResult {
    pub model_count: usize,
    pub instance_count: usize,
}

/// Download models.toml and instances.toml from GitHub, validate, and write to cache.
pub async fn sync_data() -> Result<SyncResult> {
    let client = reqwest::Client::new();
    let cache_dir =
        cache_dir().ok_or_else(|| TpError::Io("cannot determine cache directory".into()))?;

    // Download both in parallel.
    let (mo_resp, in_resp) = tokio::join!(
        client.get(MODELS_URL).send(),
        client.get(INSTANCES_URL).send(),
    );

    let mo_text = mo_resp
        .map_err(|e| TpError::Io(format!("failed to download models.toml: {e}")))?
        .text()
        .await
        .map_err(|e| TpError::Io(format!("failed to read models.toml response: {e}")))?;

    let in_text = in_resp
        .map_err(|e| TpError::Io(format!("failed to download instances.toml: {e}")))?
        .text()
        .await
        .map_err(|e| TpError::Io(format!("failed to read instances.toml response: {e}")))?;

    // Validate by parsing before writing.
    let models = model::parse_models(&mo_text)?;
    let instances = instance::parse_instances(&in_text)?;

    // Write to cache.
    std::fs::write(cache_dir.join("models.toml"), &mo_text)
        .map_err(|e| TpError::Io(format!("failed to write models.toml cache: {e}")))?;
    std::fs::write(cache_dir.join("instances.toml"), &in_text)
        .map_err(|e| TpError::Io(format!("failed to write instances.toml cache: {e}")))?;

    tracing::debug!(
        models = models.len(),
        instances = instances.len(),
        "data sync complete"
    );

    Ok(SyncResult {
        model_count: models.len(),
        instance_count: instances.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integration test: actually downloads from GitHub and validates.
    /// Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn sync_downloads_and_validates() {
        let result = sync_data().await.expect("sync should succeed");
        assert!(
            result.model_count >= 10,
            "expected >=10 models, got {}",
            result.model_count
        );
        assert!(
            result.instance_count >= 8,
            "expected >=8 instance types, got {}",
            result.instance_count
        );

        // Verify files were written to cache.
        let mo_path = cache_path("models.toml").expect("cache path");
        let in_path = cache_path("instances.toml").expect("cache path");
        assert!(mo_path.exists(), "models.toml not cached");
        assert!(in_path.exists(), "instances.toml not cached");
    }

    #[test]
    fn cache_aware_loaders_fall_back_to_bundled() {
        // Even without cache, load_models_cached and load_instances_cached work.
        let models = model::load_models_cached().expect("should load models");
        assert!(models.len() >= 12);
        let instances = instance::load_instances_cached().expect("should load instances");
        assert!(instances.len() >= 8);
    }
}
