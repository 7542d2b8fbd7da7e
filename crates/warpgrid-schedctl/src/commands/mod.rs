use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use warpgrid_scheduler::SchedulerConfig;
use warpgrid_state::StateStore;

pub mod fail;
pub mod faults;
pub mod seed;

/// Load the scheduler config, applying the `--state` override.
pub fn load_config(path: Option<&Path>, state: Option<PathBuf>) -> anyhow::Result<SchedulerConfig> {
    let mut config = match path {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SchedulerConfig::default(),
    };
    if state.is_some() {
        config.state.path = state;
    }
    Ok(config)
}

/// Open the on-disk state store named by the config.
///
/// Each invocation is its own process, so the in-memory fallback of
/// [`SchedulerConfig::open_store`] would lose every write; a path is required.
pub fn open_store(config: &SchedulerConfig) -> anyhow::Result<StateStore> {
    let path = config
        .state
        .path
        .as_deref()
        .context("no state store configured; pass --state or set [state].path")?;
    let store = config
        .open_store()
        .with_context(|| format!("opening state store {}", path.display()))?;
    info!("Using state store {}", path.display());
    Ok(store)
}
