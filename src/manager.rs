use crate::aggregator::Aggregator;
use crate::config::InputConfig;
use crate::device::{DeviceKind, GamepadSource};
use crate::event::ButtonId;
use crate::eventbus::{EventBus, EventFilter, Phase};
use crate::plugin::{DevicePlugin, EventMapping};
use crate::scope::AttachmentScope;
use crate::snapshot::Snapshot;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Re-evaluated after every [`DeviceManager::tick`].
pub(crate) trait Refresh {
    fn refresh(&self, devices: &DeviceManager);
}

/// Plugin registry around a shared [`Aggregator`].
///
/// Clones share the same aggregator. Each registered device name owns at most
/// one event wiring; registering the name again cancels the old wiring first.
/// Controllers built on the manager are refreshed after each tick, so one tick
/// is one update granule no matter how many controllers read it.
#[derive(Clone)]
pub struct DeviceManager {
    aggregator: Rc<RefCell<Aggregator>>,
    wiring: Rc<RefCell<HashMap<String, AttachmentScope>>>,
    refreshers: Rc<RefCell<Vec<Weak<dyn Refresh>>>>,
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl DeviceManager {
    pub fn new(config: InputConfig) -> Self {
        Self {
            aggregator: Rc::new(RefCell::new(Aggregator::new(config))),
            wiring: Rc::new(RefCell::new(HashMap::new())),
            refreshers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Registers an event-driven device fed by `source`.
    pub fn register(&self, name: &str, kind: DeviceKind, source: &EventBus, mapping: EventMapping) {
        self.cancel_wiring(name);
        self.aggregator.borrow_mut().register_device(name, kind);

        let scope = AttachmentScope::new();
        let filter = EventFilter::Kinds(vec![mapping.press.clone(), mapping.release.clone()]);
        source.add_listener(
            Phase::Ingest,
            filter,
            &scope,
            DevicePlugin {
                device: name.to_string(),
                mapping,
                aggregator: Rc::downgrade(&self.aggregator),
            },
        );
        self.wiring.borrow_mut().insert(name.to_string(), scope);
    }

    pub fn register_keyboard(&self, name: &str, source: &EventBus) {
        self.register(name, DeviceKind::Keyboard, source, EventMapping::keyboard());
    }

    pub fn register_pointer(&self, name: &str, source: &EventBus) {
        self.register(name, DeviceKind::Pointer, source, EventMapping::pointer());
    }

    /// Registers a polled gamepad, sampled once per update.
    pub fn register_gamepad(&self, name: &str, source: impl GamepadSource + 'static) {
        self.cancel_wiring(name);
        self.aggregator
            .borrow_mut()
            .register_polled(name, Box::new(source));
    }

    /// Cancels a device's wiring and destroys its state.
    pub fn unregister(&self, name: &str) -> bool {
        self.cancel_wiring(name);
        self.aggregator.borrow_mut().unregister_device(name)
    }

    /// Cancels every wiring and drops every device.
    pub fn teardown(&self) {
        for (_, scope) in self.wiring.borrow_mut().drain() {
            scope.cancel();
        }
        self.aggregator.borrow_mut().clear();
    }

    /// Externally driven update granule, followed by an edge refresh of every
    /// live controller built on this manager.
    pub fn tick(&self) {
        self.aggregator.borrow_mut().update();

        let live: Vec<Rc<dyn Refresh>> = {
            let mut refreshers = self.refreshers.borrow_mut();
            refreshers.retain(|r| r.strong_count() > 0);
            refreshers.iter().filter_map(Weak::upgrade).collect()
        };
        for refresher in live {
            refresher.refresh(self);
        }
    }

    pub(crate) fn add_refresher(&self, refresher: Weak<dyn Refresh>) {
        self.refreshers.borrow_mut().push(refresher);
    }

    pub fn is_pressed(&self, device: Option<&str>, id: &ButtonId) -> bool {
        self.aggregator.borrow().is_pressed(device, id)
    }

    pub fn last_active_device(&self) -> Option<String> {
        self.aggregator
            .borrow()
            .last_active_device()
            .map(str::to_string)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.aggregator.borrow().snapshot()
    }

    /// Read access to the aggregator.
    pub fn with<R>(&self, f: impl FnOnce(&Aggregator) -> R) -> R {
        f(&self.aggregator.borrow())
    }

    /// Write access, for hosts that queue input without a bus.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Aggregator) -> R) -> R {
        f(&mut self.aggregator.borrow_mut())
    }

    fn cancel_wiring(&self, name: &str) {
        if let Some(scope) = self.wiring.borrow_mut().remove(name) {
            log::debug!("replacing wiring of `{name}`");
            scope.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateCadence;
    use crate::event::RawEvent;

    #[test]
    fn always_cadence_updates_per_event() {
        let bus = EventBus::new();
        let devices = DeviceManager::default();
        devices.register_keyboard("keyboard", &bus);

        bus.emit(&RawEvent::key_down(32));
        assert!(devices.is_pressed(None, &ButtonId::Code(32)));

        bus.emit(&RawEvent::key_up(32));
        assert!(!devices.is_pressed(Some("keyboard"), &ButtonId::Code(32)));
    }

    #[test]
    fn on_tick_cadence_waits_for_tick() {
        let bus = EventBus::new();
        let devices = DeviceManager::new(InputConfig::default().with_cadence(UpdateCadence::OnTick));
        devices.register_keyboard("keyboard", &bus);

        bus.emit(&RawEvent::key_down(32));
        assert!(!devices.is_pressed(Some("keyboard"), &ButtonId::Code(32)));

        devices.tick();
        assert!(devices.is_pressed(Some("keyboard"), &ButtonId::Code(32)));
    }

    #[test]
    fn same_tick_tap_is_observed_once() {
        let bus = EventBus::new();
        let devices = DeviceManager::new(InputConfig::default().with_cadence(UpdateCadence::OnTick));
        devices.register_keyboard("keyboard", &bus);

        bus.emit_all(&[RawEvent::key_down(9), RawEvent::key_up(9)]);
        devices.tick();
        assert!(devices.is_pressed(Some("keyboard"), &ButtonId::Code(9)));
        devices.tick();
        assert!(!devices.is_pressed(Some("keyboard"), &ButtonId::Code(9)));
    }

    #[test]
    fn re_registering_replaces_wiring() {
        let bus = EventBus::new();
        let devices = DeviceManager::default();
        devices.register_keyboard("keyboard", &bus);
        devices.register_keyboard("keyboard", &bus);
        devices.register_keyboard("keyboard", &bus);
        assert_eq!(bus.listener_count(), 1);

        let other = EventBus::new();
        devices.register_keyboard("keyboard", &other);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(other.listener_count(), 1);
    }

    #[test]
    fn unregister_and_teardown_stop_delivery() {
        let bus = EventBus::new();
        let devices = DeviceManager::default();
        devices.register_keyboard("keyboard", &bus);
        devices.register_pointer("pointer", &bus);

        assert!(devices.unregister("keyboard"));
        bus.emit(&RawEvent::key_down(1));
        assert!(!devices.with(|agg| agg.contains_device("keyboard")));

        devices.teardown();
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(devices.with(|agg| agg.device_names().count()), 0);
    }
}
