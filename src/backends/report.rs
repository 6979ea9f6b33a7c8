//! Byte layout of a raw gamepad input report.
//!
//! HID gamepads without a platform descriptor parser can still be read if the
//! report layout is known. A [`ReportLayout`] lists where each button bit and
//! each axis value lives, and decodes a report into a [`GamepadSnapshot`].
//!
//! ```toml
//! report_len = 8
//! report_id = 1          # optional: reports starting with another id are ignored
//!
//! buttons = [
//!   { byte = 5, bit = 0 },
//!   { byte = 5, bit = 1 },
//! ]
//!
//! [[axes]]
//! byte = 1
//! logical_min = 0
//! logical_max = 255
//!
//! [[axes]]
//! byte = 3
//! width = 2              # little-endian u16/i16
//! signed = true
//! logical_min = -32768
//! logical_max = 32767
//! ```

use crate::device::GamepadSnapshot;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitField {
    pub byte: usize,
    pub bit: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisField {
    pub byte: usize,
    /// 1 or 2 bytes.
    #[serde(default = "one")]
    pub width: u8,
    #[serde(default)]
    pub signed: bool,
    pub logical_min: i32,
    pub logical_max: i32,
}

fn one() -> u8 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    /// Read buffer size, including the report id byte if the device sends one.
    pub report_len: usize,
    #[serde(default)]
    pub report_id: Option<u8>,
    #[serde(default)]
    pub buttons: Vec<BitField>,
    #[serde(default)]
    pub axes: Vec<AxisField>,
}

impl ReportLayout {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Decodes one report. Returns `None` if it carries a different report id.
    /// Fields past the end of a short report read as released / centered.
    pub fn decode(&self, report: &[u8]) -> Option<GamepadSnapshot> {
        if let Some(id) = self.report_id {
            if report.first() != Some(&id) {
                return None;
            }
        }

        let buttons = self
            .buttons
            .iter()
            .map(|f| report.get(f.byte).map_or(false, |&b| (b >> (f.bit & 7)) & 1 != 0))
            .collect();

        let axes = self
            .axes
            .iter()
            .map(|f| match read_raw(report, f) {
                Some(raw) => normalize_axis_value(raw, f.logical_min, f.logical_max),
                None => 0.0,
            })
            .collect();

        Some(GamepadSnapshot {
            connected: true,
            buttons,
            axes,
        })
    }
}

fn read_raw(report: &[u8], field: &AxisField) -> Option<i32> {
    match field.width {
        2 => {
            let lo = *report.get(field.byte)?;
            let hi = *report.get(field.byte + 1)?;
            let v = u16::from_le_bytes([lo, hi]);
            Some(if field.signed { v as i16 as i32 } else { v as i32 })
        }
        _ => {
            let v = *report.get(field.byte)?;
            Some(if field.signed { v as i8 as i32 } else { v as i32 })
        }
    }
}

/// Normalize an integer axis value from `[lo..hi]` into `[-1.0, 1.0]` with clamping.
fn normalize_axis_value(v: i32, lo: i32, hi: i32) -> f32 {
    let lo = lo as f64;
    let hi = hi as f64;
    if (hi - lo).abs() < 1e-9 {
        return 0.0;
    }
    let t = (v as f64 - lo) / (hi - lo);
    (t * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
}
