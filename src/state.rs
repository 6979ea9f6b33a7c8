//! Per-device level state and the per-update diff.
//!
//! Event handlers never touch [`DeviceState::pressed`] directly; they only queue
//! presses and releases. [`DeviceState::update`] folds the queues into the level
//! state once per update granule:
//!
//! 1. `previously_pressed := pressed`
//! 2. every queued press is inserted
//! 3. every queued release is removed, unless the same id was also pressed in
//!    this cycle; such a release is carried over to the next cycle so a
//!    press+release that landed inside one granule is still observed as a press
//! 4. `just_pressed := pressed − previously_pressed`
//! 5. the queues are cleared, keeping only the carried-over releases
//!
//! An update with empty queues leaves `pressed` untouched.

use crate::event::ButtonId;
use std::collections::HashSet;

/// Level and edge state of one registered device.
#[derive(Clone, Debug, Default)]
pub struct DeviceState {
    pressed: HashSet<ButtonId>,
    previously_pressed: HashSet<ButtonId>,
    just_pressed: HashSet<ButtonId>,
    just_released: HashSet<ButtonId>,
    pending_add: Vec<ButtonId>,
    pending_remove: Vec<ButtonId>,
    axes: Vec<f32>,
    connected: bool,
    just_connected: bool,
    just_disconnected: bool,
}

impl DeviceState {
    /// State of a discrete device, which is connected for as long as it is registered.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// State of a polled device; it stays disconnected until its first sample says otherwise.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Queues a press for the next update.
    pub fn enqueue_press(&mut self, id: ButtonId) {
        self.pending_add.push(id);
    }

    /// Queues a release for the next update.
    pub fn enqueue_release(&mut self, id: ButtonId) {
        self.pending_remove.push(id);
    }

    /// Folds the pending queues into the level state. See the module docs.
    pub fn update(&mut self) {
        self.previously_pressed.clone_from(&self.pressed);

        for id in &self.pending_add {
            if !self.pressed.contains(id) {
                self.pressed.insert(id.clone());
            }
        }

        let mut deferred = Vec::new();
        for id in self.pending_remove.drain(..) {
            if self.pending_add.contains(&id) {
                deferred.push(id);
            } else {
                self.pressed.remove(&id);
            }
        }

        self.just_pressed = set_difference(&self.pressed, &self.previously_pressed);
        self.just_released = set_difference(&self.previously_pressed, &self.pressed);

        self.pending_add.clear();
        self.pending_remove = deferred;
    }

    /// Records the sampled connection flag and derives the transition flags.
    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.just_connected = connected && !self.connected;
        self.just_disconnected = !connected && self.connected;
        self.connected = connected;
    }

    pub(crate) fn set_axes(&mut self, axes: &[f32]) {
        self.axes.clear();
        self.axes.extend_from_slice(axes);
    }

    /// True if `id` is currently down.
    pub fn is_pressed(&self, id: &ButtonId) -> bool {
        self.pressed.contains(id)
    }

    /// True if `id` went down during the latest update.
    pub fn is_just_pressed(&self, id: &ButtonId) -> bool {
        self.just_pressed.contains(id)
    }

    pub fn is_just_released(&self, id: &ButtonId) -> bool {
        self.just_released.contains(id)
    }

    pub fn pressed(&self) -> &HashSet<ButtonId> {
        &self.pressed
    }

    pub fn previously_pressed(&self) -> &HashSet<ButtonId> {
        &self.previously_pressed
    }

    pub fn just_pressed(&self) -> &HashSet<ButtonId> {
        &self.just_pressed
    }

    pub fn just_released(&self) -> &HashSet<ButtonId> {
        &self.just_released
    }

    /// Queued presses not yet folded in.
    pub fn pending_add(&self) -> &[ButtonId] {
        &self.pending_add
    }

    /// Queued releases not yet folded in, including carried-over ones.
    pub fn pending_remove(&self) -> &[ButtonId] {
        &self.pending_remove
    }

    /// Gets the value of an axis (0.0 if missing).
    pub fn get_axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    pub fn axes(&self) -> &[f32] {
        &self.axes
    }

    /// True if any axis magnitude exceeds `deadzone`.
    pub fn axis_exceeds(&self, deadzone: f32) -> bool {
        self.axes.iter().any(|v| v.abs() > deadzone)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn just_connected(&self) -> bool {
        self.just_connected
    }

    pub fn just_disconnected(&self) -> bool {
        self.just_disconnected
    }
}

/// `a − b` as a new owned set.
fn set_difference(a: &HashSet<ButtonId>, b: &HashSet<ButtonId>) -> HashSet<ButtonId> {
    a.difference(b).cloned().collect()
}
