//! Scheduler configuration (`scheduler.toml`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warpgrid_state::StateStore;

use crate::error::{SchedulerError, SchedulerResult};
use crate::notifier::{LogNotifier, NoopNotifier, Notifier};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// This scheduler's host name; part of the publisher id and fault rows.
    pub host: String,
    /// Placement passes allowed per request. `1` disables retries.
    pub max_attempts: u32,
    pub notifications: NotificationsConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationsConfig {
    pub driver: NotificationDriver,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationDriver {
    /// Emit notifications as tracing events.
    #[default]
    Log,
    /// Drop notifications.
    Noop,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateConfig {
    /// redb file; in-memory store when unset.
    pub path: Option<PathBuf>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            max_attempts: 3,
            notifications: NotificationsConfig::default(),
            state: StateConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.max_attempts == 0 {
            return Err(SchedulerError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(SchedulerError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// Open the state store at `state.path`, or an in-memory one when unset.
    pub fn open_store(&self) -> SchedulerResult<StateStore> {
        match &self.state.path {
            Some(path) => Ok(StateStore::open(path)?),
            None => {
                debug!("no state path configured, using in-memory store");
                Ok(StateStore::open_in_memory()?)
            }
        }
    }

    /// Notifier selected by `notifications.driver`.
    pub fn build_notifier(&self) -> Arc<dyn Notifier> {
        match self.notifications.driver {
            NotificationDriver::Log => Arc::new(LogNotifier::new(self.host.clone())),
            NotificationDriver::Noop => Arc::new(NoopNotifier),
        }
    }
}
