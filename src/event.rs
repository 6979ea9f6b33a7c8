//! Raw host events, button identifiers and outbound notifications.
//!
//! The host delivers discrete press/release notifications as [`RawEvent`]s. A
//! device plugin turns each one into a canonical [`ButtonId`] inside its own
//! device namespace, so `ButtonId::Code(0)` on a keyboard and `ButtonId::Code(0)`
//! on a gamepad never collide.
//!
//! ## Value conventions
//! - **Keyboard:** `ButtonId::Code(key_code)` by default, or `ButtonId::Name(..)` when
//!   the keyboard plugin is registered with [`EventMapping::keyboard_by_name`](crate::plugin::EventMapping::keyboard_by_name).
//! - **Pointer:** `ButtonId::Code(button_index)`; motion is not tracked.
//! - **Gamepad:** `ButtonId::Code(index)` into the sampled button matrix; axes are
//!   normalized to `[-1.0, 1.0]`.
//!
//! Controllers answer back with [`Notification`]s, which carry no payload. Read
//! the current state through the controller instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque per-device identifier of a physical input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ButtonId {
    Code(u32),
    Name(String),
}

impl From<u32> for ButtonId {
    fn from(code: u32) -> Self {
        ButtonId::Code(code)
    }
}

impl From<&str> for ButtonId {
    fn from(name: &str) -> Self {
        ButtonId::Name(name.to_string())
    }
}

impl From<String> for ButtonId {
    fn from(name: String) -> Self {
        ButtonId::Name(name)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonId::Code(code) => write!(f, "{code}"),
            ButtonId::Name(name) => f.write_str(name),
        }
    }
}

/// Kind of a raw host notification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RawKind {
    KeyDown,
    KeyUp,
    PointerDown,
    PointerUp,
    /// Host-specific kind for custom plugins.
    Custom(String),
}

/// Device-specific payload of a raw notification.
#[derive(Clone, Debug, PartialEq)]
pub enum RawPayload {
    /// A keyboard key, by numeric code and (when the host knows it) its name.
    Key { code: u32, name: Option<String> },
    /// A pointer button index (0 = primary).
    Pointer { button: u16 },
    /// Already-canonical identifier, for custom plugins.
    Button(ButtonId),
}

/// Timestamped raw notification delivered by the host.
#[derive(Clone, Debug)]
pub struct RawEvent {
    pub kind: RawKind,
    pub payload: RawPayload,
}

impl RawEvent {
    pub fn new(kind: RawKind, payload: RawPayload) -> Self {
        Self { kind, payload }
    }

    pub fn key_down(code: u32) -> Self {
        Self::new(RawKind::KeyDown, RawPayload::Key { code, name: None })
    }

    pub fn key_up(code: u32) -> Self {
        Self::new(RawKind::KeyUp, RawPayload::Key { code, name: None })
    }

    /// Key press carrying both the numeric code and the host's key name.
    pub fn named_key_down(code: u32, name: &str) -> Self {
        Self::new(
            RawKind::KeyDown,
            RawPayload::Key {
                code,
                name: Some(name.to_string()),
            },
        )
    }

    pub fn named_key_up(code: u32, name: &str) -> Self {
        Self::new(
            RawKind::KeyUp,
            RawPayload::Key {
                code,
                name: Some(name.to_string()),
            },
        )
    }

    pub fn pointer_down(button: u16) -> Self {
        Self::new(RawKind::PointerDown, RawPayload::Pointer { button })
    }

    pub fn pointer_up(button: u16) -> Self {
        Self::new(RawKind::PointerUp, RawPayload::Pointer { button })
    }
}

/// Edge notification a controller dispatches to its attached target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// No action was active and now at least one is.
    ActionActivated,
    /// At least one action was active and now none is.
    ActionDeactivated,
}

impl Notification {
    /// Host-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::ActionActivated => "action-activated",
            Notification::ActionDeactivated => "action-deactivated",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
