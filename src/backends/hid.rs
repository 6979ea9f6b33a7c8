//! `hidapi`-backed polled gamepad.
//!
//! [`HidGamepad`] opens a device by vendor/product id in non-blocking mode. Each
//! [`GamepadSource::sample`] drains a bounded number of pending reports and
//! decodes the newest matching one with its [`ReportLayout`]. Without a new
//! report the previous state is repeated. A read error marks the device
//! disconnected until it is reopened.

use crate::backends::report::ReportLayout;
use crate::device::{GamepadSnapshot, GamepadSource};
use crate::error::{InputError, Result};
use hidapi::{HidApi, HidDevice};

/// Maximum number of HID reports drained per sample.
const MAX_REPORTS_PER_TICK: usize = 32;

pub struct HidGamepad {
    name: String,
    raw: Option<HidDevice>,
    layout: ReportLayout,
    buf: Vec<u8>,
    last: GamepadSnapshot,
}

impl HidGamepad {
    /// Opens the first device matching `vid`/`pid`.
    pub fn open(api: &HidApi, vid: u16, pid: u16, layout: ReportLayout) -> Result<Self> {
        let info = api
            .device_list()
            .find(|info| info.vendor_id() == vid && info.product_id() == pid)
            .ok_or(InputError::DeviceNotFound { vid, pid })?;

        let device = info.open_device(api)?;
        if let Err(e) = device.set_blocking_mode(false) {
            log::warn!("{vid:04x}:{pid:04x}: cannot switch to non-blocking reads: {e}");
        }

        let name = info.product_string().unwrap_or("HID gamepad").to_string();
        log::debug!("opened HID gamepad `{name}` ({vid:04x}:{pid:04x})");

        let buf = vec![0u8; layout.report_len.max(1)];
        Ok(Self {
            name,
            raw: Some(device),
            layout,
            buf,
            last: GamepadSnapshot {
                connected: true,
                ..GamepadSnapshot::default()
            },
        })
    }
}

impl GamepadSource for HidGamepad {
    fn sample(&mut self) -> GamepadSnapshot {
        let Some(raw) = self.raw.as_ref() else {
            return GamepadSnapshot::disconnected();
        };

        for _ in 0..MAX_REPORTS_PER_TICK {
            match raw.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Some(snapshot) = self.layout.decode(&self.buf[..n]) {
                        self.last = snapshot;
                    }
                }
                Err(e) => {
                    log::warn!("`{}` read failed, marking disconnected: {e}", self.name);
                    self.raw = None;
                    self.last = GamepadSnapshot::disconnected();
                    break;
                }
            }
        }
        self.last.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
