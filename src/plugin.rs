//! Device plugins: raw host events → queued canonical button ids.
//!
//! A plugin is an [`EventMapping`] bound to one device name. It subscribes to
//! the mapping's press and release kinds on an [`EventBus`](crate::eventbus::EventBus)
//! in the ingest phase, extracts a [`ButtonId`] from each payload and queues it
//! on the device. With [`UpdateCadence::Always`] it also runs an aggregator
//! update right away; with [`UpdateCadence::OnTick`] the host's tick does that.
//!
//! Built-in mappings cover keyboards (by key code or key name) and pointer
//! buttons. Gamepads are not event driven; see
//! [`DeviceManager::register_gamepad`](crate::manager::DeviceManager::register_gamepad).

use crate::aggregator::Aggregator;
use crate::config::UpdateCadence;
use crate::event::{ButtonId, RawEvent, RawKind, RawPayload};
use crate::eventbus::InputListener;
use std::cell::RefCell;
use std::rc::Weak;

/// Pulls a button id out of a raw payload. `None` means "not for this device".
pub type Extractor = fn(&RawPayload) -> Option<ButtonId>;

/// Declares how one class of raw events maps onto a device.
#[derive(Clone, Debug)]
pub struct EventMapping {
    pub press: RawKind,
    pub release: RawKind,
    pub extract: Extractor,
}

/// A translated raw event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Press(ButtonId),
    Release(ButtonId),
}

impl EventMapping {
    pub fn new(press: RawKind, release: RawKind, extract: Extractor) -> Self {
        Self {
            press,
            release,
            extract,
        }
    }

    /// Keyboard keyed by numeric key code.
    pub fn keyboard() -> Self {
        Self::new(RawKind::KeyDown, RawKind::KeyUp, key_code)
    }

    /// Keyboard keyed by the host's key name (falls back to the code when the
    /// host sent no name).
    pub fn keyboard_by_name() -> Self {
        Self::new(RawKind::KeyDown, RawKind::KeyUp, key_name)
    }

    /// Pointer buttons only; motion is ignored.
    pub fn pointer() -> Self {
        Self::new(RawKind::PointerDown, RawKind::PointerUp, pointer_button)
    }

    pub fn translate(&self, event: &RawEvent) -> Option<Signal> {
        let id = (self.extract)(&event.payload)?;
        if event.kind == self.press {
            Some(Signal::Press(id))
        } else if event.kind == self.release {
            Some(Signal::Release(id))
        } else {
            None
        }
    }
}

fn key_code(payload: &RawPayload) -> Option<ButtonId> {
    match payload {
        RawPayload::Key { code, .. } => Some(ButtonId::Code(*code)),
        RawPayload::Button(id) => Some(id.clone()),
        RawPayload::Pointer { .. } => None,
    }
}

fn key_name(payload: &RawPayload) -> Option<ButtonId> {
    match payload {
        RawPayload::Key {
            name: Some(name), ..
        } => Some(ButtonId::Name(name.clone())),
        RawPayload::Key { code, name: None } => Some(ButtonId::Code(*code)),
        RawPayload::Button(id) => Some(id.clone()),
        RawPayload::Pointer { .. } => None,
    }
}

fn pointer_button(payload: &RawPayload) -> Option<ButtonId> {
    match payload {
        RawPayload::Pointer { button } => Some(ButtonId::Code(u32::from(*button))),
        RawPayload::Button(id) => Some(id.clone()),
        RawPayload::Key { .. } => None,
    }
}

/// Listener installed on the source bus for one registered device.
pub(crate) struct DevicePlugin {
    pub(crate) device: String,
    pub(crate) mapping: EventMapping,
    pub(crate) aggregator: Weak<RefCell<Aggregator>>,
}

impl InputListener for DevicePlugin {
    fn on_input(&self, event: &RawEvent) {
        let Some(signal) = self.mapping.translate(event) else {
            return;
        };
        let Some(aggregator) = self.aggregator.upgrade() else {
            return;
        };

        log::trace!("`{}`: {:?}", self.device, signal);
        let mut aggregator = aggregator.borrow_mut();
        let queued = match signal {
            Signal::Press(id) => aggregator.enqueue_press(&self.device, id),
            Signal::Release(id) => aggregator.enqueue_release(&self.device, id),
        };
        if queued && aggregator.update_cadence() == UpdateCadence::Always {
            aggregator.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_mapping_translates_by_code() {
        let mapping = EventMapping::keyboard();
        assert_eq!(
            mapping.translate(&RawEvent::key_down(32)),
            Some(Signal::Press(ButtonId::Code(32)))
        );
        assert_eq!(
            mapping.translate(&RawEvent::named_key_up(32, "Space")),
            Some(Signal::Release(ButtonId::Code(32)))
        );
        assert_eq!(mapping.translate(&RawEvent::pointer_down(0)), None);
    }

    #[test]
    fn named_keyboard_prefers_names() {
        let mapping = EventMapping::keyboard_by_name();
        assert_eq!(
            mapping.translate(&RawEvent::named_key_down(87, "KeyW")),
            Some(Signal::Press(ButtonId::from("KeyW")))
        );
        assert_eq!(
            mapping.translate(&RawEvent::key_down(87)),
            Some(Signal::Press(ButtonId::Code(87)))
        );
    }

    #[test]
    fn pointer_mapping_ignores_keys() {
        let mapping = EventMapping::pointer();
        assert_eq!(
            mapping.translate(&RawEvent::pointer_up(2)),
            Some(Signal::Release(ButtonId::Code(2)))
        );
        assert_eq!(mapping.translate(&RawEvent::key_down(2)), None);
    }

    #[test]
    fn custom_kinds() {
        let mapping = EventMapping::new(
            RawKind::Custom("pedal-down".into()),
            RawKind::Custom("pedal-up".into()),
            |p| match p {
                RawPayload::Button(id) => Some(id.clone()),
                _ => None,
            },
        );
        let ev = RawEvent::new(
            RawKind::Custom("pedal-down".into()),
            RawPayload::Button(ButtonId::from("left")),
        );
        assert_eq!(mapping.translate(&ev), Some(Signal::Press(ButtonId::from("left"))));
    }
}
