//! Owns every registered [`DeviceState`], drives the per-update diff and picks
//! the arbitrated "last active" device.
//!
//! # Update order
//! [`Aggregator::update`] walks devices in registration order. A polled device
//! is sampled first (its button matrix is turned into queued presses/releases
//! and its axes and connection flag are recorded), then every device runs the
//! diff from [`crate::state`]. Arbitration runs last.
//!
//! # Arbitration
//! Last writer wins, not highest priority: discrete devices are checked in
//! registration order, then analog devices. A discrete device with a non-empty
//! `just_pressed` set takes over; an analog device takes over on a fresh press
//! or on any axis beyond [`ANALOG_DEADZONE`]. With no activity the previous
//! result stays. With autodetection off the configured device is used for the
//! whole lifetime and this step is skipped.

use crate::config::{InputConfig, UpdateCadence};
use crate::device::{DeviceKind, GamepadSnapshot, GamepadSource};
use crate::event::ButtonId;
use crate::snapshot::{DeviceSnapshot, Snapshot};
use crate::state::DeviceState;

/// Axis magnitude at or below which analog motion is ignored for arbitration.
pub const ANALOG_DEADZONE: f32 = 0.15;

struct DeviceSlot {
    name: String,
    kind: DeviceKind,
    state: DeviceState,
    source: Option<Box<dyn GamepadSource>>,
}

pub struct Aggregator {
    config: InputConfig,
    devices: Vec<DeviceSlot>,
    last_active: Option<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl Aggregator {
    /// An invalid config (autodetection off with no device to pin) is logged
    /// and falls back to autodetection.
    pub fn new(mut config: InputConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("{e}; falling back to device autodetection");
            config.autodetect_device = true;
        }
        let last_active = if config.autodetect_device {
            None
        } else {
            config.initial_device.clone()
        };
        Self {
            config,
            devices: Vec::new(),
            last_active,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn update_cadence(&self) -> UpdateCadence {
        self.config.update_cadence
    }

    /// Registers an event-driven device. Re-registering a name keeps its slot and
    /// state unless the kind changes, and drops any polled source it had.
    pub fn register_device(&mut self, name: &str, kind: DeviceKind) {
        match self.slot_mut(name) {
            Some(slot) => {
                if slot.kind != kind {
                    slot.state = DeviceState::new();
                    slot.kind = kind;
                }
                slot.source = None;
            }
            None => {
                log::debug!("registered device `{name}` ({kind:?})");
                self.devices.push(DeviceSlot {
                    name: name.to_string(),
                    kind,
                    state: DeviceState::new(),
                    source: None,
                });
            }
        }
    }

    /// Registers a polled gamepad. Replaces the source of an existing device with the same name.
    pub fn register_polled(&mut self, name: &str, source: Box<dyn GamepadSource>) {
        log::debug!("registered polled device `{name}` ({})", source.name());
        match self.slot_mut(name) {
            Some(slot) => {
                slot.kind = DeviceKind::Gamepad;
                slot.state = DeviceState::disconnected();
                slot.source = Some(source);
            }
            None => self.devices.push(DeviceSlot {
                name: name.to_string(),
                kind: DeviceKind::Gamepad,
                state: DeviceState::disconnected(),
                source: Some(source),
            }),
        }
    }

    /// Destroys a device and its state. Returns `false` if it was not registered.
    pub fn unregister_device(&mut self, name: &str) -> bool {
        let before = self.devices.len();
        self.devices.retain(|slot| slot.name != name);
        let removed = self.devices.len() != before;

        if removed
            && self.config.autodetect_device
            && self.last_active.as_deref() == Some(name)
        {
            self.last_active = None;
        }
        removed
    }

    /// Tears down every device.
    pub fn clear(&mut self) {
        self.devices.clear();
        if self.config.autodetect_device {
            self.last_active = None;
        }
    }

    /// Queues a press on `device`. Returns `false` for an unknown device.
    pub fn enqueue_press(&mut self, device: &str, id: ButtonId) -> bool {
        match self.slot_mut(device) {
            Some(slot) => {
                slot.state.enqueue_press(id);
                true
            }
            None => {
                log::warn!("press {id} for unknown device `{device}` dropped");
                false
            }
        }
    }

    /// Queues a release on `device`. Returns `false` for an unknown device.
    pub fn enqueue_release(&mut self, device: &str, id: ButtonId) -> bool {
        match self.slot_mut(device) {
            Some(slot) => {
                slot.state.enqueue_release(id);
                true
            }
            None => {
                log::warn!("release {id} for unknown device `{device}` dropped");
                false
            }
        }
    }

    /// Runs one update granule over every device, then arbitration.
    pub fn update(&mut self) {
        for slot in &mut self.devices {
            if let Some(source) = slot.source.as_mut() {
                let sample = source.sample();
                apply_sample(&mut slot.state, &sample);
                if slot.state.just_connected() {
                    log::debug!("device `{}` connected", slot.name);
                } else if slot.state.just_disconnected() {
                    log::debug!("device `{}` disconnected", slot.name);
                }
            }
            slot.state.update();
        }

        if self.config.autodetect_device {
            self.arbitrate();
        }
    }

    fn arbitrate(&mut self) {
        let mut winner: Option<&str> = None;

        for slot in self.devices.iter().filter(|s| !s.kind.is_analog()) {
            if !slot.state.just_pressed().is_empty() {
                winner = Some(slot.name.as_str());
            }
        }
        for slot in self.devices.iter().filter(|s| s.kind.is_analog()) {
            if slot.state.axis_exceeds(ANALOG_DEADZONE) || !slot.state.just_pressed().is_empty() {
                winner = Some(slot.name.as_str());
            }
        }

        if let Some(name) = winner {
            if self.last_active.as_deref() != Some(name) {
                log::debug!("last active device: {:?} -> `{name}`", self.last_active);
                self.last_active = Some(name.to_string());
            }
        }
    }

    /// The arbitrated device, if any.
    pub fn last_active_device(&self) -> Option<&str> {
        self.last_active.as_deref()
    }

    /// Reads `id` from `device`, or from the arbitrated device when `None`.
    /// Unknown devices read as not pressed.
    pub fn is_pressed(&self, device: Option<&str>, id: &ButtonId) -> bool {
        self.resolve(device)
            .map_or(false, |state| state.is_pressed(id))
    }

    pub fn is_just_pressed(&self, device: Option<&str>, id: &ButtonId) -> bool {
        self.resolve(device)
            .map_or(false, |state| state.is_just_pressed(id))
    }

    /// Axis value of `device` (or the arbitrated device); 0.0 when unknown.
    pub fn axis(&self, device: Option<&str>, index: usize) -> f32 {
        self.resolve(device)
            .map_or(0.0, |state| state.get_axis(index))
    }

    pub fn device(&self, name: &str) -> Option<&DeviceState> {
        self.slot(name).map(|slot| &slot.state)
    }

    pub fn device_kind(&self, name: &str) -> Option<DeviceKind> {
        self.slot(name).map(|slot| slot.kind)
    }

    pub fn contains_device(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Registered device names in registration order.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|slot| slot.name.as_str())
    }

    /// Owned, serializable view of every device.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            devices: self
                .devices
                .iter()
                .map(|slot| (slot.name.clone(), DeviceSnapshot::capture(slot.kind, &slot.state)))
                .collect(),
            last_active: self.last_active.clone(),
        }
    }

    fn resolve(&self, device: Option<&str>) -> Option<&DeviceState> {
        let name = device.or(self.last_active.as_deref())?;
        self.device(name)
    }

    fn slot(&self, name: &str) -> Option<&DeviceSlot> {
        self.devices.iter().find(|slot| slot.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut DeviceSlot> {
        self.devices.iter_mut().find(|slot| slot.name == name)
    }
}

/// Turns a hardware sample into queued edges plus raw axis/connection values.
fn apply_sample(state: &mut DeviceState, sample: &GamepadSnapshot) {
    state.set_connected(sample.connected);

    if !sample.connected {
        let held: Vec<ButtonId> = state.pressed().iter().cloned().collect();
        for id in held {
            state.enqueue_release(id);
        }
        state.set_axes(&[]);
        return;
    }

    for (index, &down) in sample.buttons.iter().enumerate() {
        let id = ButtonId::Code(index as u32);
        match (down, state.is_pressed(&id)) {
            (true, false) => state.enqueue_press(id),
            (false, true) => state.enqueue_release(id),
            _ => {}
        }
    }

    // Buttons past the end of the sampled matrix are released.
    let stale: Vec<ButtonId> = state
        .pressed()
        .iter()
        .filter(|id| matches!(id, ButtonId::Code(c) if *c as usize >= sample.buttons.len()))
        .cloned()
        .collect();
    for id in stale {
        state.enqueue_release(id);
    }

    state.set_axes(&sample.axes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualGamepad;

    fn keyboard_and_pad() -> (Aggregator, VirtualGamepad) {
        let pad = VirtualGamepad::new("pad", 4, 2);
        let mut agg = Aggregator::default();
        agg.register_device("keyboard", DeviceKind::Keyboard);
        agg.register_polled("gamepad", Box::new(pad.clone()));
        (agg, pad)
    }

    #[test]
    fn unpinned_fixed_config_falls_back_to_autodetection() {
        let mut agg = Aggregator::new(InputConfig {
            autodetect_device: false,
            initial_device: None,
            ..InputConfig::default()
        });
        assert!(agg.config().autodetect_device);

        agg.register_device("keyboard", DeviceKind::Keyboard);
        agg.enqueue_press("keyboard", ButtonId::Code(32));
        agg.update();
        assert_eq!(agg.last_active_device(), Some("keyboard"));
        assert!(agg.is_pressed(None, &ButtonId::Code(32)));
    }

    #[test]
    fn keyboard_press_wins_when_pad_is_idle() {
        let (mut agg, pad) = keyboard_and_pad();
        pad.connect();
        pad.set_axis(0, 0.1);

        agg.enqueue_press("keyboard", ButtonId::from("A"));
        agg.update();
        assert_eq!(agg.last_active_device(), Some("keyboard"));
    }

    #[test]
    fn analog_motion_overrides_keyboard_in_same_update() {
        let (mut agg, pad) = keyboard_and_pad();
        pad.connect();
        pad.set_axis(1, -0.5);

        agg.enqueue_press("keyboard", ButtonId::Code(65));
        agg.update();
        assert_eq!(agg.last_active_device(), Some("gamepad"));
    }

    #[test]
    fn arbitration_is_sticky_without_activity() {
        let (mut agg, pad) = keyboard_and_pad();
        pad.connect();
        agg.enqueue_press("keyboard", ButtonId::Code(65));
        agg.update();
        agg.update();
        agg.update();
        assert_eq!(agg.last_active_device(), Some("keyboard"));
        assert!(agg.is_pressed(None, &ButtonId::Code(65)));
    }

    #[test]
    fn later_discrete_device_overrides_earlier_one() {
        let mut agg = Aggregator::default();
        agg.register_device("keyboard", DeviceKind::Keyboard);
        agg.register_device("pointer", DeviceKind::Pointer);

        agg.enqueue_press("keyboard", ButtonId::Code(1));
        agg.enqueue_press("pointer", ButtonId::Code(0));
        agg.update();
        assert_eq!(agg.last_active_device(), Some("pointer"));
    }

    #[test]
    fn fixed_device_skips_arbitration() {
        let mut agg = Aggregator::new(InputConfig::fixed_device("keyboard"));
        agg.register_device("keyboard", DeviceKind::Keyboard);
        agg.register_device("pointer", DeviceKind::Pointer);

        agg.enqueue_press("pointer", ButtonId::Code(0));
        agg.update();
        assert_eq!(agg.last_active_device(), Some("keyboard"));
        assert!(!agg.is_pressed(None, &ButtonId::Code(0)));
        assert!(agg.is_pressed(Some("pointer"), &ButtonId::Code(0)));
    }

    #[test]
    fn unknown_devices_read_as_released() {
        let mut agg = Aggregator::default();
        assert!(!agg.is_pressed(None, &ButtonId::Code(1)));
        assert!(!agg.is_pressed(Some("nope"), &ButtonId::Code(1)));
        assert!(!agg.enqueue_press("nope", ButtonId::Code(1)));
        assert_eq!(agg.axis(Some("nope"), 0), 0.0);
    }

    #[test]
    fn polled_buttons_and_connection_flags() {
        let (mut agg, pad) = keyboard_and_pad();
        agg.update();
        assert!(!agg.device("gamepad").unwrap().is_connected());

        pad.connect();
        pad.press_button(2);
        agg.update();
        let state = agg.device("gamepad").unwrap();
        assert!(state.just_connected());
        assert!(state.is_pressed(&ButtonId::Code(2)));
        assert_eq!(agg.last_active_device(), Some("gamepad"));

        pad.disconnect();
        agg.update();
        let state = agg.device("gamepad").unwrap();
        assert!(state.just_disconnected());
        assert!(state.pressed().is_empty());
        assert_eq!(state.get_axis(0), 0.0);
    }

    #[test]
    fn unregistering_the_active_device_clears_arbitration() {
        let mut agg = Aggregator::default();
        agg.register_device("keyboard", DeviceKind::Keyboard);
        agg.enqueue_press("keyboard", ButtonId::Code(1));
        agg.update();

        assert!(agg.unregister_device("keyboard"));
        assert!(!agg.unregister_device("keyboard"));
        assert_eq!(agg.last_active_device(), None);
    }

    #[test]
    fn snapshot_lists_devices_in_order() {
        let (mut agg, pad) = keyboard_and_pad();
        pad.connect();
        agg.enqueue_press("keyboard", ButtonId::Code(9));
        agg.update();

        let snap = agg.snapshot();
        assert_eq!(snap.last_active.as_deref(), Some("keyboard"));
        assert_eq!(snap.get("keyboard").unwrap().pressed, vec![ButtonId::Code(9)]);
        assert!(snap.get("gamepad").unwrap().connected);
    }
}
