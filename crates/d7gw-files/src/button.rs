//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Button press (file 51) and button configuration (file 61).
use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::record::FileRecord;
use crate::schema::{FieldKind, FieldSpec, FieldValue, Quantity, RecordKind, Schema};
use crate::wire::WireField;

static BUTTON_FIELDS: [FieldSpec; 3] = [
    FieldSpec::scalar("button_id", "ButtonId", FieldKind::U8, Quantity::Identifier),
    FieldSpec::scalar("mask", "Mask", FieldKind::Bool, Quantity::Flag),
    FieldSpec::scalar("buttons_state", "ButtonsState", FieldKind::U8, Quantity::State),
];

static BUTTON_SCHEMA: Schema = Schema {
    file_id: 51,
    name: "button",
    kind: RecordKind::Measurement,
    fields: &BUTTON_FIELDS,
    allocated_size: 6,
};

static BUTTON_CONFIG_FIELDS: [FieldSpec; 4] = [
    FieldSpec::scalar("transmit_mask_0", "TransmitMask0", FieldKind::Bool, Quantity::Flag),
    FieldSpec::scalar("transmit_mask_1", "TransmitMask1", FieldKind::Bool, Quantity::Flag),
    FieldSpec::scalar(
        "button_control_menu",
        "ButtonControlMenu",
        FieldKind::Bool,
        Quantity::Flag,
    ),
    FieldSpec::scalar("enabled", "Enabled", FieldKind::Bool, Quantity::Flag),
];

static BUTTON_CONFIG_SCHEMA: Schema = Schema {
    file_id: 61,
    name: "button-config",
    kind: RecordKind::Configuration,
    fields: &BUTTON_CONFIG_FIELDS,
    allocated_size: 4,
};

/// Bit mask of the buttons held down when the event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonState(pub u8);

impl ButtonState {
    /// Whether button `number` (1..=3) is pressed.
    pub fn is_pressed(self, number: u8) -> bool {
        (1..=3).contains(&number) && self.0 & (1 << (number - 1)) != 0
    }

    /// Numbers of all pressed buttons, ascending.
    pub fn pressed(self) -> Vec<u8> {
        (1..=3).filter(|number| self.is_pressed(*number)).collect()
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pressed = self.pressed();
        if pressed.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<String> = pressed.iter().map(|n| format!("button{}", n)).collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Button event reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonFile {
    /// Button that triggered the report.
    pub button_id: u8,
    /// Whether that button is pressed.
    pub mask: bool,
    /// All buttons currently pressed.
    pub buttons_state: u8,
}

impl ButtonFile {
    /// Decoded view of `buttons_state`.
    pub fn state(&self) -> ButtonState {
        ButtonState(self.buttons_state)
    }
}

impl FileRecord for ButtonFile {
    const SCHEMA: &'static Schema = &BUTTON_SCHEMA;

    fn read_fields<B: Buf>(buf: &mut B) -> Self {
        Self {
            button_id: u8::read(buf),
            mask: bool::read(buf),
            buttons_state: u8::read(buf),
        }
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B) {
        self.button_id.write(buf);
        self.mask.write(buf);
        self.buttons_state.write(buf);
    }

    fn field_values(&self) -> Vec<FieldValue> {
        let mut out = Vec::with_capacity(3);
        self.button_id.push_values(&mut out);
        self.mask.push_values(&mut out);
        self.buttons_state.push_values(&mut out);
        out
    }
}

impl fmt::Display for ButtonFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "button_id={}, mask={}, buttons_state={} ({})",
            self.button_id,
            self.mask,
            self.buttons_state,
            self.state()
        )
    }
}

/// Button reporting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfigFile {
    /// Report button 0 events.
    pub transmit_mask_0: bool,
    /// Report button 1 events.
    pub transmit_mask_1: bool,
    /// On-device configuration menu enabled.
    pub button_control_menu: bool,
    /// Button reporting enabled.
    pub enabled: bool,
}

impl Default for ButtonConfigFile {
    fn default() -> Self {
        Self {
            transmit_mask_0: true,
            transmit_mask_1: true,
            button_control_menu: true,
            enabled: true,
        }
    }
}

impl FileRecord for ButtonConfigFile {
    const SCHEMA: &'static Schema = &BUTTON_CONFIG_SCHEMA;

    fn read_fields<B: Buf>(buf: &mut B) -> Self {
        Self {
            transmit_mask_0: bool::read(buf),
            transmit_mask_1: bool::read(buf),
            button_control_menu: bool::read(buf),
            enabled: bool::read(buf),
        }
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B) {
        self.transmit_mask_0.write(buf);
        self.transmit_mask_1.write(buf);
        self.button_control_menu.write(buf);
        self.enabled.write(buf);
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Bool(self.transmit_mask_0),
            FieldValue::Bool(self.transmit_mask_1),
            FieldValue::Bool(self.button_control_menu),
            FieldValue::Bool(self.enabled),
        ]
    }
}

impl fmt::Display for ButtonConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transmit_mask_0={}, transmit_mask_1={}, button_control_menu={}, enabled={}",
            self.transmit_mask_0, self.transmit_mask_1, self.button_control_menu, self.enabled
        )
    }
}
