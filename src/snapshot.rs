//! Per-update snapshot of device states.
//!
//! [`Snapshot`] is an **owned**, read-only view of every device at one point in
//! time, produced by [`Aggregator::snapshot`](crate::aggregator::Aggregator::snapshot).
//! It does not poll anything; it reflects the aggregator's last update.
//!
//! # Semantics
//! - Keys are device names as registered.
//! - Button lists are sorted, so two snapshots of the same state compare equal.
//! - `last_active` is the arbitrated device at capture time.
//!
//! # Example
//! ```
//! use inputgate::{Aggregator, ButtonId, DeviceKind};
//!
//! let mut agg = Aggregator::default();
//! agg.register_device("keyboard", DeviceKind::Keyboard);
//! agg.enqueue_press("keyboard", ButtonId::Code(32));
//! agg.update();
//!
//! let snap = agg.snapshot();
//! assert_eq!(snap.last_active.as_deref(), Some("keyboard"));
//! println!("{}", snap.to_json().unwrap());
//! ```

use crate::device::DeviceKind;
use crate::error::Result;
use crate::event::ButtonId;
use crate::state::DeviceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Captured state of one device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub kind: DeviceKind,
    pub connected: bool,
    pub just_connected: bool,
    pub just_disconnected: bool,
    pub pressed: Vec<ButtonId>,
    pub just_pressed: Vec<ButtonId>,
    pub just_released: Vec<ButtonId>,
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    pub fn capture(kind: DeviceKind, state: &DeviceState) -> Self {
        Self {
            kind,
            connected: state.is_connected(),
            just_connected: state.just_connected(),
            just_disconnected: state.just_disconnected(),
            pressed: sorted(state.pressed().iter()),
            just_pressed: sorted(state.just_pressed().iter()),
            just_released: sorted(state.just_released().iter()),
            axes: state.axes().to_vec(),
        }
    }
}

/// Owned snapshot of all devices (`name → DeviceSnapshot`) plus the arbitrated device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub devices: BTreeMap<String, DeviceSnapshot>,
    pub last_active: Option<String>,
}

impl Snapshot {
    /// Get the state for a specific device.
    #[inline]
    pub fn get(&self, device: &str) -> Option<&DeviceSnapshot> {
        self.devices.get(device)
    }

    /// Iterate `(name, state)` pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeviceSnapshot)> {
        self.devices.iter()
    }

    /// Pretty JSON rendering, handy for diagnostics.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn sorted<'a>(ids: impl Iterator<Item = &'a ButtonId>) -> Vec<ButtonId> {
    let mut out: Vec<ButtonId> = ids.cloned().collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use crate::aggregator::Aggregator;
    use crate::backends::virtual_input::VirtualGamepad;
    use crate::event::ButtonId;

    #[test]
    fn captures_connection_edges_and_releases() {
        let pad = VirtualGamepad::new("pad", 4, 0);
        let mut agg = Aggregator::default();
        agg.register_polled("gamepad", Box::new(pad.clone()));

        pad.connect();
        pad.press_button(2);
        agg.update();
        let snap = agg.snapshot();
        let state = snap.get("gamepad").unwrap();
        assert!(state.connected && state.just_connected && !state.just_disconnected);
        assert_eq!(state.just_pressed, vec![ButtonId::Code(2)]);
        assert!(state.just_released.is_empty());

        pad.disconnect();
        agg.update();
        let snap = agg.snapshot();
        let state = snap.get("gamepad").unwrap();
        assert!(!state.connected && state.just_disconnected && !state.just_connected);
        assert!(state.pressed.is_empty());
        assert_eq!(state.just_released, vec![ButtonId::Code(2)]);
    }
}
