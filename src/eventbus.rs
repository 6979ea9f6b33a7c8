//! Host-side event hub.
//!
//! [`EventBus`] is the handle a host passes into the crate instead of the crate
//! reaching for ambient globals. It plays two roles:
//! - **raw-event source:** the host calls [`EventBus::emit`] for every press/release
//!   notification; device plugins and controllers subscribe with [`EventBus::add_listener`].
//! - **notification target:** controllers attached to the bus dispatch
//!   [`Notification`]s through [`EventBus::notify`]; the host reacts via [`EventBus::observe`].
//!
//! Listeners run in two phases: every [`Phase::Ingest`] listener (device plugins
//! feeding pending queues) before any [`Phase::React`] listener (controllers
//! reading the resulting state). Within a phase, registration order is kept.
//!
//! The bus is a cheap `Rc` handle and is meant for a single thread.

use crate::event::{Notification, RawEvent, RawKind};
use crate::scope::AttachmentScope;
use std::cell::RefCell;
use std::rc::Rc;

/// Trait for reacting to raw input events.
pub trait InputListener {
    fn on_input(&self, event: &RawEvent);
}

impl<F: Fn(&RawEvent)> InputListener for F {
    fn on_input(&self, event: &RawEvent) {
        self(event)
    }
}

/// Delivery phase of a raw listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Runs first. Used by device plugins to enqueue state.
    Ingest,
    /// Runs after every ingest listener. Used by controllers.
    React,
}

/// Determines which raw events a listener wants to receive.
#[derive(Debug, Clone)]
pub enum EventFilter {
    All,
    Kinds(Vec<RawKind>),
    Custom(fn(&RawEvent) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &RawEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kinds(kinds) => kinds.contains(&event.kind),
            EventFilter::Custom(f) => f(event),
        }
    }
}

struct ListenerEntry {
    id: u64,
    phase: Phase,
    filter: EventFilter,
    scope: AttachmentScope,
    enabled: bool,
    listener: Rc<dyn InputListener>,
}

struct ObserverEntry {
    id: u64,
    scope: AttachmentScope,
    observer: Rc<dyn Fn(Notification)>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
    observers: Vec<ObserverEntry>,
}

impl BusInner {
    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn prune(&mut self) {
        self.listeners.retain(|e| !e.scope.is_cancelled());
        self.observers.retain(|e| !e.scope.is_cancelled());
    }
}

/// Shared, single-threaded event hub. Clones refer to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw listener under `scope`. Returns an id for [`EventBus::remove_listener`].
    pub fn add_listener(
        &self,
        phase: Phase,
        filter: EventFilter,
        scope: &AttachmentScope,
        listener: impl InputListener + 'static,
    ) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.take_id();
        inner.listeners.push(ListenerEntry {
            id,
            phase,
            filter,
            scope: scope.clone(),
            enabled: true,
            listener: Rc::new(listener),
        });
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&self, id: u64) {
        if let Some(entry) = self.inner.borrow_mut().listeners.iter_mut().find(|e| e.id == id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&self, id: u64) {
        if let Some(entry) = self.inner.borrow_mut().listeners.iter_mut().find(|e| e.id == id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a raw listener or a notification observer.
    pub fn remove_listener(&self, id: u64) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.retain(|e| e.id != id);
        inner.observers.retain(|e| e.id != id);
    }

    /// Number of live raw listeners (cancelled scopes excluded).
    pub fn listener_count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.prune();
        inner.listeners.len()
    }

    /// Delivers one raw event to every enabled, matching, live listener.
    pub fn emit(&self, event: &RawEvent) {
        // Snapshot first so listeners may (un)subscribe or emit while we deliver.
        let mut targets: Vec<(Phase, AttachmentScope, Rc<dyn InputListener>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.prune();
            inner
                .listeners
                .iter()
                .filter(|e| e.enabled && e.filter.accepts(event))
                .map(|e| (e.phase, e.scope.clone(), e.listener.clone()))
                .collect()
        };
        targets.sort_by_key(|(phase, _, _)| *phase);

        log::trace!("emit {:?} to {} listener(s)", event.kind, targets.len());
        for (_, scope, listener) in targets {
            if scope.is_cancelled() {
                continue;
            }
            listener.on_input(event);
        }
    }

    /// Emits a batch of events in order.
    pub fn emit_all(&self, events: &[RawEvent]) {
        for event in events {
            self.emit(event);
        }
    }

    /// Subscribes to controller notifications dispatched on this bus.
    pub fn observe(
        &self,
        scope: &AttachmentScope,
        observer: impl Fn(Notification) + 'static,
    ) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.take_id();
        inner.observers.push(ObserverEntry {
            id,
            scope: scope.clone(),
            observer: Rc::new(observer),
        });
        id
    }

    /// Dispatches a notification to every live observer.
    pub fn notify(&self, notification: Notification) {
        let targets: Vec<(AttachmentScope, Rc<dyn Fn(Notification)>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.prune();
            inner
                .observers
                .iter()
                .map(|e| (e.scope.clone(), e.observer.clone()))
                .collect()
        };

        for (scope, observer) in targets {
            if !scope.is_cancelled() {
                observer(notification);
            }
        }
    }

    /// True if both handles point at the same bus.
    pub fn same_bus(&self, other: &EventBus) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("listeners", &inner.listeners.len())
            .field("observers", &inner.observers.len())
            .finish()
    }
}
