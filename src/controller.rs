//! Action resolution and edge dispatch.
//!
//! A [`Controller`] owns an [`ActionTable`] and reads device state through a
//! shared [`DeviceManager`]. Whenever it evaluates (after every raw event routed
//! from its attached target, after every [`DeviceManager::tick`] and on [`Controller::refresh`])
//! it compares "is any action active" with the previous evaluation:
//!
//! | before | now   | effect                                                          |
//! | ------ | ----- | --------------------------------------------------------------- |
//! | false  | true  | `action-activated` to the target, then `on_activate` of every active action |
//! | true   | false | `action-deactivated` to the target, then `on_deactivate` of every action that was active at the activated edge |
//! | same   | same  | nothing                                                         |
//!
//! Holding a key that autorepeats therefore produces a single activation.
//! Callbacks run after every internal borrow is released, so they may call back
//! into the controller (for example to disable a competing action).
//!
//! # Example
//! ```
//! use inputgate::{Action, Controller, DeviceManager, EventBus, RawEvent};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let bus = EventBus::new();
//! let devices = DeviceManager::default();
//! devices.register_keyboard("keyboard", &bus);
//!
//! let jumps = Rc::new(Cell::new(0));
//! let counter = jumps.clone();
//! let controller = Controller::new(devices);
//! controller.bind_actions([(
//!     "jump",
//!     Action::new([32u32]).on_activate(move || counter.set(counter.get() + 1)),
//! )]);
//! controller.attach(&bus, false);
//!
//! bus.emit(&RawEvent::key_down(32));
//! bus.emit(&RawEvent::key_down(32));
//! assert!(controller.is_action_active("jump").unwrap());
//! assert_eq!(jumps.get(), 1);
//! ```

use crate::action::{Action, ActionCallback, ActionTable, BoundKey};
use crate::error::Result;
use crate::event::{Notification, RawEvent};
use crate::eventbus::{EventBus, EventFilter, Phase};
use crate::manager::{DeviceManager, Refresh};
use crate::profile::ActionProfile;
use crate::scope::AttachmentScope;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct Core {
    table: ActionTable,
    enabled: bool,
    target: Option<EventBus>,
    scope: Option<AttachmentScope>,
    /// Result of the previous evaluation.
    active: bool,
    /// `on_deactivate` of the actions that were active at the latest activated edge.
    fired: Vec<ActionCallback>,
}

/// An edge ready to be delivered once borrows are released.
struct Edge {
    notification: Notification,
    target: Option<EventBus>,
    callbacks: Vec<ActionCallback>,
}

impl Edge {
    fn deliver(self) {
        log::debug!("{}", self.notification);
        if let Some(target) = self.target {
            target.notify(self.notification);
        }
        for callback in self.callbacks {
            callback();
        }
    }
}

impl Core {
    fn deactivate(&mut self) -> Edge {
        self.active = false;
        Edge {
            notification: Notification::ActionDeactivated,
            target: self.target.clone(),
            callbacks: std::mem::take(&mut self.fired),
        }
    }

    fn evaluate(&mut self, devices: &DeviceManager) -> Option<Edge> {
        if !self.enabled {
            return None;
        }
        let active_now = devices.with(|agg| self.table.active_names(agg));

        match (self.active, active_now.is_empty()) {
            (false, false) => {
                self.active = true;
                let actions: Vec<&Action> = active_now
                    .iter()
                    .filter_map(|name| self.table.get(name))
                    .collect();
                let callbacks = actions
                    .iter()
                    .filter_map(|action| action.on_activate.clone())
                    .collect();
                self.fired = actions
                    .iter()
                    .filter_map(|action| action.on_deactivate.clone())
                    .collect();
                Some(Edge {
                    notification: Notification::ActionActivated,
                    target: self.target.clone(),
                    callbacks,
                })
            }
            (true, true) => Some(self.deactivate()),
            _ => None,
        }
    }
}

fn evaluate(core: &RefCell<Core>, devices: &DeviceManager) {
    let edge = core.borrow_mut().evaluate(devices);
    if let Some(edge) = edge {
        edge.deliver();
    }
}

impl Refresh for RefCell<Core> {
    fn refresh(&self, devices: &DeviceManager) {
        evaluate(self, devices);
    }
}

/// Resolves actions against device state and dispatches edge notifications.
///
/// Clones share the same table and attachment.
#[derive(Clone)]
pub struct Controller {
    core: Rc<RefCell<Core>>,
    devices: DeviceManager,
}

impl Controller {
    /// Enabled, detached controller with an empty table. It is refreshed after
    /// every [`DeviceManager::tick`] of `devices`.
    pub fn new(devices: DeviceManager) -> Self {
        let core = Rc::new(RefCell::new(Core {
            table: ActionTable::new(),
            enabled: true,
            target: None,
            scope: None,
            active: false,
            fired: Vec::new(),
        }));
        let refresher: Weak<dyn Refresh> = Rc::downgrade(&core) as Weak<RefCell<Core>>;
        devices.add_refresher(refresher);
        Self { core, devices }
    }

    /// Binds `actions` and attaches to `target` when one is given.
    pub fn with_actions<S: Into<String>>(
        devices: DeviceManager,
        actions: impl IntoIterator<Item = (S, Action)>,
        target: Option<&EventBus>,
    ) -> Self {
        let controller = Self::new(devices);
        controller.bind_actions(actions);
        if let Some(target) = target {
            controller.attach(target, false);
        }
        controller
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    /// Merges actions into the table; an existing name is replaced wholesale.
    pub fn bind_actions<S: Into<String>>(&self, actions: impl IntoIterator<Item = (S, Action)>) {
        self.core.borrow_mut().table.bind_all(actions);
        self.reevaluate();
    }

    pub fn bind_profile(&self, profile: ActionProfile) {
        log::debug!("binding profile `{}`", profile.name);
        self.bind_actions(profile.into_actions());
    }

    /// Binds an enabled action named after `key` that runs `callback` on activation.
    pub fn on_input(&self, key: impl Into<BoundKey>, callback: impl Fn() + 'static) {
        let key = key.into();
        let name = key.to_string();
        self.bind_actions([(name, Action::new([key]).on_activate(callback))]);
    }

    /// Tolerant: unknown or already-enabled actions are left alone.
    pub fn enable_action(&self, name: &str) {
        let changed = self.core.borrow_mut().table.enable(name);
        if changed {
            self.reevaluate();
        }
    }

    /// Tolerant: unknown or already-disabled actions are left alone.
    pub fn disable_action(&self, name: &str) {
        let changed = self.core.borrow_mut().table.disable(name);
        if changed {
            self.reevaluate();
        }
    }

    pub fn action_exists(&self, name: &str) -> bool {
        self.core.borrow().table.contains(name)
    }

    /// Whether `name` is enabled and one of its keys is down.
    ///
    /// Fails with [`InputError::UnknownAction`](crate::InputError::UnknownAction)
    /// for a name that was never bound.
    pub fn is_action_active(&self, name: &str) -> Result<bool> {
        let core = self.core.borrow();
        self.devices.with(|agg| core.table.is_active(name, agg))
    }

    pub fn is_any_action_active(&self) -> bool {
        let core = self.core.borrow();
        self.devices.with(|agg| core.table.is_any_active(agg))
    }

    pub fn enable(&self) {
        self.core.borrow_mut().enabled = true;
    }

    /// Stops evaluating. An open activation is closed with one deactivated edge.
    pub fn disable(&self) {
        let edge = {
            let mut core = self.core.borrow_mut();
            core.enabled = false;
            core.active.then(|| core.deactivate())
        };
        if let Some(edge) = edge {
            edge.deliver();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.core.borrow().enabled
    }

    /// Routes raw events delivered on `target` into edge detection and sends
    /// notifications there. Any previous attachment is cancelled first. Unless
    /// `suppress_enable` is set the controller is enabled as well.
    pub fn attach(&self, target: &EventBus, suppress_enable: bool) -> AttachmentScope {
        let scope = AttachmentScope::new();
        {
            let mut core = self.core.borrow_mut();
            if let Some(old) = core.scope.take() {
                old.cancel();
            }
            core.target = Some(target.clone());
            core.scope = Some(scope.clone());
            if !suppress_enable {
                core.enabled = true;
            }
        }

        let weak = Rc::downgrade(&self.core);
        let devices = self.devices.clone();
        target.add_listener(
            Phase::React,
            EventFilter::All,
            &scope,
            move |_: &RawEvent| {
                if let Some(core) = weak.upgrade() {
                    evaluate(&core, &devices);
                }
            },
        );
        log::debug!("controller attached");
        scope
    }

    /// Cancels the current attachment and forgets the target. Safe to call twice.
    pub fn detach(&self) {
        let mut core = self.core.borrow_mut();
        if let Some(scope) = core.scope.take() {
            scope.cancel();
            log::debug!("controller detached");
        }
        core.target = None;
    }

    pub fn is_attached(&self) -> bool {
        self.core.borrow().scope.is_some()
    }

    pub fn target(&self) -> Option<EventBus> {
        self.core.borrow().target.clone()
    }

    /// Evaluates edges against the current device state. The update granule
    /// itself belongs to [`DeviceManager::tick`], which also refreshes every
    /// controller built on it.
    pub fn refresh(&self) {
        evaluate(&self.core, &self.devices);
    }

    /// Table changes move "any action active" without a raw event, so an
    /// attached controller evaluates right away.
    fn reevaluate(&self) {
        if self.is_attached() {
            self.refresh();
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Controller")
            .field("actions", &core.table)
            .field("enabled", &core.enabled)
            .field("attached", &core.scope.is_some())
            .field("active", &core.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, UpdateCadence};
    use crate::error::InputError;
    use std::cell::Cell;

    fn setup() -> (EventBus, Controller) {
        let bus = EventBus::new();
        let devices = DeviceManager::default();
        devices.register_keyboard("keyboard", &bus);
        (bus, Controller::new(devices))
    }

    fn record(bus: &EventBus) -> Rc<RefCell<Vec<Notification>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        bus.observe(&AttachmentScope::new(), move |n| s.borrow_mut().push(n));
        seen
    }

    #[test]
    fn repeated_presses_activate_once() {
        let (bus, controller) = setup();
        controller.bind_actions([("jump", Action::new([32u32]))]);
        controller.attach(&bus, false);
        let seen = record(&bus);

        for _ in 0..5 {
            bus.emit(&RawEvent::key_down(32));
        }
        assert_eq!(*seen.borrow(), vec![Notification::ActionActivated]);

        bus.emit(&RawEvent::key_up(32));
        assert_eq!(
            *seen.borrow(),
            vec![Notification::ActionActivated, Notification::ActionDeactivated]
        );
    }

    #[test]
    fn deactivate_runs_callbacks_of_the_activated_set() {
        let (bus, controller) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        controller.bind_actions([
            (
                "left",
                Action::new([65u32])
                    .on_activate(move || l1.borrow_mut().push("left+"))
                    .on_deactivate(move || l2.borrow_mut().push("left-")),
            ),
            (
                "right",
                Action::new([68u32]).on_deactivate(move || l3.borrow_mut().push("right-")),
            ),
        ]);
        controller.attach(&bus, false);

        bus.emit(&RawEvent::key_down(65));
        // "right" joins while the aggregate is already active: no new edge.
        bus.emit(&RawEvent::key_down(68));
        bus.emit(&RawEvent::key_up(65));
        bus.emit(&RawEvent::key_up(68));

        assert_eq!(*log.borrow(), vec!["left+", "left-"]);
    }

    #[test]
    fn callbacks_may_reenter_the_controller() {
        let (bus, controller) = setup();
        let c = controller.clone();
        let c2 = controller.clone();
        controller.bind_actions([
            (
                "left",
                Action::new([65u32])
                    .on_activate(move || c.disable_action("right"))
                    .on_deactivate(move || c2.enable_action("right")),
            ),
            ("right", Action::new([68u32])),
        ]);
        controller.attach(&bus, false);

        bus.emit(&RawEvent::key_down(65));
        bus.emit(&RawEvent::key_down(68));
        assert!(!controller.is_action_active("right").unwrap());

        bus.emit(&RawEvent::key_up(68));
        bus.emit(&RawEvent::key_up(65));
        assert!(controller.core.borrow().table.get("right").unwrap().enabled);
    }

    #[test]
    fn unknown_action_query_fails() {
        let (_, controller) = setup();
        assert!(matches!(
            controller.is_action_active("nonexistent"),
            Err(InputError::UnknownAction(_))
        ));
        controller.enable_action("nonexistent");
        controller.disable_action("nonexistent");
        assert!(!controller.action_exists("nonexistent"));
    }

    #[test]
    fn reattach_does_not_duplicate_listeners() {
        let (bus, controller) = setup();
        controller.bind_actions([("jump", Action::new([32u32]))]);
        let before = bus.listener_count();

        let first = controller.attach(&bus, false);
        controller.attach(&bus, false);
        controller.attach(&bus, false);
        assert!(first.is_cancelled());
        assert_eq!(bus.listener_count(), before + 1);

        let seen = record(&bus);
        bus.emit(&RawEvent::key_down(32));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn detach_is_idempotent_and_stops_notifications() {
        let (bus, controller) = setup();
        controller.bind_actions([("jump", Action::new([32u32]))]);
        controller.detach();

        let scope = controller.attach(&bus, false);
        controller.detach();
        controller.detach();
        assert!(scope.is_cancelled());
        assert!(controller.target().is_none());

        let seen = record(&bus);
        bus.emit(&RawEvent::key_down(32));
        assert!(seen.borrow().is_empty());
        // State still flows through the device plugin.
        assert!(controller.is_action_active("jump").unwrap());
    }

    #[test]
    fn suppressed_attach_keeps_controller_disabled() {
        let (bus, controller) = setup();
        controller.bind_actions([("jump", Action::new([32u32]))]);
        controller.disable();
        controller.attach(&bus, true);
        assert!(!controller.is_enabled());

        let seen = record(&bus);
        bus.emit(&RawEvent::key_down(32));
        assert!(seen.borrow().is_empty());

        controller.enable();
        controller.refresh();
        assert_eq!(*seen.borrow(), vec![Notification::ActionActivated]);
    }

    #[test]
    fn disabling_while_active_closes_the_edge() {
        let (bus, controller) = setup();
        let closed = Rc::new(Cell::new(false));
        let c = closed.clone();
        controller.bind_actions([("jump", Action::new([32u32]).on_deactivate(move || c.set(true)))]);
        controller.attach(&bus, false);

        bus.emit(&RawEvent::key_down(32));
        controller.disable();
        assert!(closed.get());
    }

    #[test]
    fn on_tick_cadence_fires_on_tick() {
        let bus = EventBus::new();
        let devices = DeviceManager::new(InputConfig::default().with_cadence(UpdateCadence::OnTick));
        devices.register_keyboard("keyboard", &bus);
        let controller = Controller::with_actions(devices, [("jump", Action::new([32u32]))], Some(&bus));
        let seen = record(&bus);

        bus.emit(&RawEvent::key_down(32));
        assert!(seen.borrow().is_empty());

        controller.devices().tick();
        assert_eq!(*seen.borrow(), vec![Notification::ActionActivated]);
    }

    #[test]
    fn toggling_a_held_action_dispatches_edges() {
        let (bus, controller) = setup();
        let closed = Rc::new(Cell::new(0));
        let c = closed.clone();
        controller.bind_actions([(
            "jump",
            Action::new([32u32]).on_deactivate(move || c.set(c.get() + 1)),
        )]);
        controller.attach(&bus, false);
        let seen = record(&bus);

        bus.emit(&RawEvent::key_down(32));
        controller.disable_action("jump");
        assert!(!controller.is_any_action_active());
        assert_eq!(
            *seen.borrow(),
            vec![Notification::ActionActivated, Notification::ActionDeactivated]
        );
        assert_eq!(closed.get(), 1);

        // Disabling again changes nothing and must not re-dispatch.
        controller.disable_action("jump");
        controller.enable_action("jump");
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(seen.borrow()[2], Notification::ActionActivated);
    }

    #[test]
    fn binding_onto_a_held_key_activates_immediately() {
        let (bus, controller) = setup();
        controller.attach(&bus, false);
        let seen = record(&bus);

        bus.emit(&RawEvent::key_down(32));
        assert!(seen.borrow().is_empty());

        controller.bind_actions([("jump", Action::new([32u32]))]);
        assert_eq!(*seen.borrow(), vec![Notification::ActionActivated]);
    }

    #[test]
    fn deactivation_runs_callbacks_captured_at_activation() {
        let (bus, controller) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (old, new) = (log.clone(), log.clone());
        controller.bind_actions([(
            "jump",
            Action::new([32u32]).on_deactivate(move || old.borrow_mut().push("old")),
        )]);
        controller.attach(&bus, false);

        bus.emit(&RawEvent::key_down(32));
        controller.bind_actions([(
            "jump",
            Action::new([32u32]).on_deactivate(move || new.borrow_mut().push("new")),
        )]);
        bus.emit(&RawEvent::key_up(32));
        assert_eq!(*log.borrow(), vec!["old"]);
    }

    #[test]
    fn on_input_binds_by_key() {
        let (bus, controller) = setup();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        controller.on_input(87u32, move || h.set(h.get() + 1));
        controller.attach(&bus, false);

        bus.emit(&RawEvent::key_down(87));
        assert!(controller.action_exists("87"));
        assert_eq!(hits.get(), 1);
    }
}
