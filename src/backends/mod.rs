//! Polled gamepad backends for `inputgate`.
//!
//! Implementations of [`GamepadSource`](crate::device::GamepadSource), sampled
//! once per aggregator update.
//!
//! # Feature flags
//! - **`hid`** enables [`hid::HidGamepad`], a `hidapi` reader driven by a
//!   [`report::ReportLayout`].
//!
//! [`virtual_input::VirtualGamepad`] is always available for hosts that already
//! have gamepad state (and for tests).

pub mod report;
pub mod virtual_input;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;
