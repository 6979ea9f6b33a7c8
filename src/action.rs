//! Named actions and the table they live in.
//!
//! An [`Action`] binds a name to one or more [`BoundKey`]s. It is active when it
//! is enabled and any of its keys is down. Unqualified keys are read from the
//! arbitrated device; qualified keys always read their named device.
//!
//! Overlapping bindings are allowed: two enabled actions sharing a key are both
//! active while it is held.

use crate::aggregator::Aggregator;
use crate::error::{InputError, Result};
use crate::event::ButtonId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Lifecycle callback of an action.
pub type ActionCallback = Rc<dyn Fn()>;

/// A key an action listens to, optionally pinned to one device.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyRepr", into = "KeyRepr")]
pub struct BoundKey {
    pub device: Option<String>,
    pub button: ButtonId,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Plain(ButtonId),
    Qualified { device: String, button: ButtonId },
}

impl From<KeyRepr> for BoundKey {
    fn from(repr: KeyRepr) -> Self {
        match repr {
            KeyRepr::Plain(button) => BoundKey {
                device: None,
                button,
            },
            KeyRepr::Qualified { device, button } => BoundKey {
                device: Some(device),
                button,
            },
        }
    }
}

impl From<BoundKey> for KeyRepr {
    fn from(key: BoundKey) -> Self {
        match key.device {
            Some(device) => KeyRepr::Qualified {
                device,
                button: key.button,
            },
            None => KeyRepr::Plain(key.button),
        }
    }
}

impl BoundKey {
    /// Key read from the arbitrated device.
    pub fn any(button: impl Into<ButtonId>) -> Self {
        Self {
            device: None,
            button: button.into(),
        }
    }

    /// Key read from `device` only.
    pub fn on(device: &str, button: impl Into<ButtonId>) -> Self {
        Self {
            device: Some(device.to_string()),
            button: button.into(),
        }
    }

    pub fn is_pressed(&self, aggregator: &Aggregator) -> bool {
        aggregator.is_pressed(self.device.as_deref(), &self.button)
    }
}

impl From<ButtonId> for BoundKey {
    fn from(button: ButtonId) -> Self {
        Self::any(button)
    }
}

impl From<u32> for BoundKey {
    fn from(code: u32) -> Self {
        Self::any(code)
    }
}

impl From<&str> for BoundKey {
    fn from(name: &str) -> Self {
        Self::any(name)
    }
}

impl fmt::Display for BoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device {
            Some(device) => write!(f, "{device}:{}", self.button),
            None => write!(f, "{}", self.button),
        }
    }
}

/// One table entry.
#[derive(Clone)]
pub struct Action {
    pub keys: Vec<BoundKey>,
    pub enabled: bool,
    pub on_activate: Option<ActionCallback>,
    pub on_deactivate: Option<ActionCallback>,
}

impl Action {
    /// Enabled action without callbacks.
    pub fn new<K: Into<BoundKey>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            enabled: true,
            on_activate: None,
            on_deactivate: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn on_activate(mut self, f: impl Fn() + 'static) -> Self {
        self.on_activate = Some(Rc::new(f));
        self
    }

    pub fn on_deactivate(mut self, f: impl Fn() + 'static) -> Self {
        self.on_deactivate = Some(Rc::new(f));
        self
    }

    pub fn is_active(&self, aggregator: &Aggregator) -> bool {
        self.enabled && self.keys.iter().any(|key| key.is_pressed(aggregator))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("keys", &self.keys)
            .field("enabled", &self.enabled)
            .field("on_activate", &self.on_activate.is_some())
            .field("on_deactivate", &self.on_deactivate.is_some())
            .finish()
    }
}

/// Name → [`Action`] mapping. Keeps bind order; rebinding a name replaces the
/// whole entry in place.
#[derive(Clone, Debug, Default)]
pub struct ActionTable {
    entries: Vec<(String, Action)>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or fully replaces one entry.
    pub fn bind(&mut self, name: impl Into<String>, action: Action) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = action,
            None => self.entries.push((name, action)),
        }
    }

    /// Merges entries; last bind wins per name.
    pub fn bind_all<S: Into<String>>(&mut self, actions: impl IntoIterator<Item = (S, Action)>) {
        for (name, action) in actions {
            self.bind(name, action);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Action> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, action)| action)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Action> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, action)| action)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Enables `name`. Unknown names and already-enabled actions are no-ops.
    /// Returns whether anything changed.
    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disables `name`. Unknown names and already-disabled actions are no-ops.
    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.get_mut(name) {
            Some(action) if action.enabled != enabled => {
                action.enabled = enabled;
                true
            }
            Some(_) => false,
            None => {
                log::warn!("cannot toggle unbound action `{name}`");
                false
            }
        }
    }

    /// Fails with [`InputError::UnknownAction`] for names not in the table.
    pub fn is_active(&self, name: &str, aggregator: &Aggregator) -> Result<bool> {
        self.get(name)
            .map(|action| action.is_active(aggregator))
            .ok_or_else(|| InputError::UnknownAction(name.to_string()))
    }

    /// Names of every active action, in bind order.
    pub fn active_names(&self, aggregator: &Aggregator) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, action)| action.is_active(aggregator))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_any_active(&self, aggregator: &Aggregator) -> bool {
        self.entries
            .iter()
            .any(|(_, action)| action.is_active(aggregator))
    }
}
