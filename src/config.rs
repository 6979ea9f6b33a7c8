//! Aggregator configuration.
//!
//! ```toml
//! update_cadence = "on_tick"    # or "always"
//! autodetect_device = false
//! initial_device = "keyboard"
//! ```
//!
//! Every key is optional; missing keys take the [`InputConfig::default`] values.

use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When queued input is folded into device state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCadence {
    /// Update synchronously after every raw event.
    #[default]
    Always,
    /// Wait for the host to call `tick`.
    #[serde(alias = "onTick")]
    OnTick,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub update_cadence: UpdateCadence,
    /// Pick the arbitrated device from activity. When off, `initial_device` is
    /// used for the whole lifetime.
    pub autodetect_device: bool,
    pub initial_device: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            update_cadence: UpdateCadence::Always,
            autodetect_device: true,
            initial_device: None,
        }
    }
}

impl InputConfig {
    /// Config with autodetection off and a fixed device.
    pub fn fixed_device(device: &str) -> Self {
        Self {
            autodetect_device: false,
            initial_device: Some(device.to_string()),
            ..Self::default()
        }
    }

    pub fn with_cadence(mut self, cadence: UpdateCadence) -> Self {
        self.update_cadence = cadence;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: InputConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.autodetect_device && self.initial_device.is_none() {
            return Err(InputError::InvalidConfig(
                "autodetect_device = false requires initial_device".into(),
            ));
        }
        Ok(())
    }
}
