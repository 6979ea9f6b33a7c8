//! inputgate — polling-friendly input state for keyboard, pointer and gamepad,
//! resolved against a table of named actions.
//!
//! Raw host events flow through an [`EventBus`] into device plugins, which only
//! queue presses and releases. One update granule folds the queues into a stable
//! per-device snapshot, picks the last active device, and a [`Controller`]
//! turns that state into edge-triggered `action-activated` /
//! `action-deactivated` notifications plus per-action callbacks.
//!
//! ```text
//! host event → EventBus → plugin → pending queues → Aggregator::update → pressed sets
//!                                                                          ↓
//!                              notifications / callbacks ← Controller ← ActionTable
//! ```
//!
//! Everything is single-threaded and synchronous; the update cadence is either
//! per event or driven by the host's tick (see [`InputConfig`]).

pub mod action;
pub mod aggregator;
pub mod backends;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod manager;
pub mod plugin;
pub mod profile;
pub mod scope;
pub mod snapshot;
pub mod state;

pub use action::*;
pub use aggregator::*;
pub use config::*;
pub use controller::*;
pub use device::*;
pub use error::*;
pub use event::*;
pub use eventbus::*;
pub use manager::*;
pub use plugin::*;
pub use profile::*;
pub use scope::*;
pub use snapshot::*;
pub use state::*;
