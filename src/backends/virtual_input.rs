use crate::device::{GamepadSnapshot, GamepadSource};
use std::cell::RefCell;
use std::rc::Rc;

/// In-memory gamepad whose state the host sets directly.
///
/// Clones share state, so keep one handle for feeding input and register a
/// clone with the [`DeviceManager`](crate::manager::DeviceManager). Starts disconnected.
#[derive(Clone, Debug)]
pub struct VirtualGamepad {
    name: String,
    state: Rc<RefCell<GamepadSnapshot>>,
}

impl VirtualGamepad {
    pub fn new(name: &str, buttons: usize, axes: usize) -> Self {
        Self {
            name: name.to_string(),
            state: Rc::new(RefCell::new(GamepadSnapshot {
                connected: false,
                buttons: vec![false; buttons],
                axes: vec![0.0; axes],
            })),
        }
    }

    pub fn connect(&self) {
        self.state.borrow_mut().connected = true;
    }

    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn press_button(&self, button: usize) {
        self.set_button(button, true);
    }

    pub fn release_button(&self, button: usize) {
        self.set_button(button, false);
    }

    /// Sets an axis, clamped to `[-1.0, 1.0]`. Out-of-range indices grow the axis list.
    pub fn set_axis(&self, axis: usize, value: f32) {
        let mut state = self.state.borrow_mut();
        if axis >= state.axes.len() {
            state.axes.resize(axis + 1, 0.0);
        }
        state.axes[axis] = value.clamp(-1.0, 1.0);
    }

    fn set_button(&self, button: usize, down: bool) {
        let mut state = self.state.borrow_mut();
        if button >= state.buttons.len() {
            state.buttons.resize(button + 1, false);
        }
        state.buttons[button] = down;
    }
}

impl GamepadSource for VirtualGamepad {
    fn sample(&mut self) -> GamepadSnapshot {
        self.state.borrow().clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let pad = VirtualGamepad::new("pad", 2, 1);
        let mut registered = pad.clone();

        pad.connect();
        pad.press_button(5);
        pad.set_axis(0, 3.0);

        let sample = registered.sample();
        assert!(sample.connected);
        assert_eq!(sample.buttons.len(), 6);
        assert!(sample.buttons[5]);
        assert_eq!(sample.axes, vec![1.0]);
    }
}
