//! Crate error type.
//!
//! Everything in `inputgate` is recoverable: the worst outcome of misuse is an
//! [`InputError`] returned from a query or a loader, never a panic.

use std::path::PathBuf;

/// Errors reported by `inputgate`.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// An activity query named an action that is not in the table.
    #[error("action `{0}` is not bound")]
    UnknownAction(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no HID device with vid=0x{vid:04x} pid=0x{pid:04x}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[cfg(feature = "hid")]
    #[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}

pub type Result<T> = std::result::Result<T, InputError>;
