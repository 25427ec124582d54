use anyhow::{Context, Result};
use silhouette_core::EngineConfig;
use std::path::Path;

/// Engine configuration for this run
///
/// Without a path the built-in defaults are used. An explicit path must
/// exist and parse.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::load(path)
        .with_context(|| format!("loading engine config {}", path.display()))?;
    log::info!("Loaded engine config from {} ({} fps)", path.display(), config.fps);
    Ok(config)
}
