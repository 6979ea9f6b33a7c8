use serde::{Deserialize, Serialize};

/// Class of a registered device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Keyboard,
    Pointer,
    Gamepad,
}

impl DeviceKind {
    /// Analog devices take part in arbitration through their axes too, and are
    /// evaluated after every discrete device.
    pub fn is_analog(&self) -> bool {
        matches!(self, DeviceKind::Gamepad)
    }
}

/// Current hardware state of a polled device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub connected: bool,
    /// Button matrix; index `i` is `ButtonId::Code(i)`.
    pub buttons: Vec<bool>,
    /// Axes normalized to `[-1.0, 1.0]`.
    pub axes: Vec<f32>,
}

impl GamepadSnapshot {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// A device that is sampled once per update instead of pushing events.
pub trait GamepadSource {
    fn sample(&mut self) -> GamepadSnapshot;
    fn name(&self) -> &str;
}
