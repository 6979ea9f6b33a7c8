//! Serializable action profiles.
//!
//! A profile describes keys and enabled flags; callbacks are attached in code
//! after loading. Profiles are only read, never written back.
//!
//! ```toml
//! name = "default"
//! description = "WASD + arrows"
//!
//! [actions.left]
//! keys = [65, 37]
//! enabled = true
//!
//! [actions.fire]
//! keys = [{ device = "gamepad", button = 0 }, { device = "pointer", button = 0 }]
//! enabled = true
//! ```

use crate::action::{Action, BoundKey};
use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Keys and enabled flag of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub keys: Vec<BoundKey>,
    pub enabled: bool,
}

/// Named set of action bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionEntry>,
}

impl ActionProfile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Loads a `.json` file as JSON and anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Table entries without callbacks, ready for `bind_actions`.
    pub fn into_actions(self) -> Vec<(String, Action)> {
        self.actions
            .into_iter()
            .map(|(name, entry)| (name, Action::new(entry.keys).enabled(entry.enabled)))
            .collect()
    }
}
