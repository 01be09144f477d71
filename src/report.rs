//! Packing of [`JoystickState`] into the joystick input report.
//!
//! The layout is driven by [`FIELDS`], which lists every field with its byte offset,
//! bit shift within that byte and width. Multi-byte fields are little-endian; sub-byte
//! fields are packed least-significant-bit first.
//!
//! | offset | bits | field                                   |
//! |-------:|-----:|-----------------------------------------|
//! | 0      | 8    | report ID (`0x03`)                      |
//! | 1      | 32   | buttons, bit `i` = button `i`           |
//! | 5      | 16   | throttle                                |
//! | 7      | 16   | rudder                                  |
//! | 9      | 4    | hat 0 (low nibble)                      |
//! | 9      | 4    | hat 1 (high nibble)                     |
//! | 10..22 | 16   | X, Y, Z, Rx, Ry, Rz                     |
//!
//! Hats carry a direction code 0..=7 (up, then clockwise in 45° steps) or
//! [`HAT_IDLE`] when centered.
use crate::descriptor::REPORT_ID;
use crate::state::{Axis, Buttons, HatDirection, HatSwitch, JoystickState};

/// Size of an encoded report, including the report ID byte.
pub const REPORT_LEN: usize = 22;

/// Hat code sent for a centered hat. Lies outside the declared logical range.
pub const HAT_IDLE: u8 = 8;

/// An encoded joystick input report.
pub type Report = [u8; REPORT_LEN];

/// The control a table row carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    ReportId,
    Buttons,
    Throttle,
    Rudder,
    Hat(u8),
    Axis(Axis),
}

/// Where one field lives inside the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSpec {
    pub name: &'static str,
    pub field: Field,
    /// Byte holding the least significant bit of the field.
    pub offset: usize,
    /// Bit position of the field inside `offset`; non-zero only for sub-byte fields.
    pub shift: u8,
    pub bits: u32,
}

impl FieldSpec {
    const fn new(name: &'static str, field: Field, offset: usize, shift: u8, bits: u32) -> Self {
        Self {
            name,
            field,
            offset,
            shift,
            bits,
        }
    }

    /// Absolute bit position of the field within the report.
    pub const fn bit_offset(&self) -> u32 {
        self.offset as u32 * 8 + self.shift as u32
    }

    const fn mask(&self) -> u32 {
        if self.bits >= 32 {
            u32::MAX
        } else {
            (1 << self.bits) - 1
        }
    }

    fn put(&self, buf: &mut Report, value: u32) {
        let value = value & self.mask();
        if self.bits < 8 {
            buf[self.offset] |= (value as u8) << self.shift;
        } else {
            let len = self.bits as usize / 8;
            buf[self.offset..self.offset + len].copy_from_slice(&value.to_le_bytes()[..len]);
        }
    }

    fn get(&self, buf: &Report) -> u32 {
        if self.bits < 8 {
            u32::from(buf[self.offset] >> self.shift) & self.mask()
        } else {
            let len = self.bits as usize / 8;
            let mut le = [0u8; 4];
            le[..len].copy_from_slice(&buf[self.offset..self.offset + len]);
            u32::from_le_bytes(le)
        }
    }
}

/// Every field of the report in wire order.
pub const FIELDS: [FieldSpec; 12] = [
    FieldSpec::new("report_id", Field::ReportId, 0, 0, 8),
    FieldSpec::new("buttons", Field::Buttons, 1, 0, 32),
    FieldSpec::new("throttle", Field::Throttle, 5, 0, 16),
    FieldSpec::new("rudder", Field::Rudder, 7, 0, 16),
    FieldSpec::new("hat0", Field::Hat(0), 9, 0, 4),
    FieldSpec::new("hat1", Field::Hat(1), 9, 4, 4),
    FieldSpec::new("x", Field::Axis(Axis::X), 10, 0, 16),
    FieldSpec::new("y", Field::Axis(Axis::Y), 12, 0, 16),
    FieldSpec::new("z", Field::Axis(Axis::Z), 14, 0, 16),
    FieldSpec::new("rx", Field::Axis(Axis::Rx), 16, 0, 16),
    FieldSpec::new("ry", Field::Axis(Axis::Ry), 18, 0, 16),
    FieldSpec::new("rz", Field::Axis(Axis::Rz), 20, 0, 16),
];

// Every field fits inside the report and whole-byte fields are byte aligned.
const _: () = {
    let mut i = 0;
    while i < FIELDS.len() {
        let f = &FIELDS[i];
        assert!(f.bit_offset() + f.bits <= REPORT_LEN as u32 * 8);
        assert!(f.bits < 8 || (f.shift == 0 && f.bits % 8 == 0));
        i += 1;
    }
};

/// Wire code of a hat switch.
pub const fn hat_code(hat: HatSwitch) -> u8 {
    match hat {
        HatSwitch::Centered => HAT_IDLE,
        HatSwitch::Pressed(dir) => dir.code(),
    }
}

/// Inverse of [`hat_code`]. Codes outside 0..=7 read as centered.
pub const fn hat_from_code(code: u8) -> HatSwitch {
    match HatDirection::from_code(code) {
        Some(dir) => HatSwitch::Pressed(dir),
        None => HatSwitch::Centered,
    }
}

fn field_value(state: &JoystickState, field: Field) -> u32 {
    match field {
        Field::ReportId => u32::from(REPORT_ID),
        Field::Buttons => state.buttons.raw(),
        Field::Throttle => u32::from(state.throttle),
        Field::Rudder => u32::from(state.rudder),
        Field::Hat(n) => state
            .hats
            .get(n as usize)
            .map_or(u32::from(HAT_IDLE), |h| u32::from(hat_code(*h))),
        Field::Axis(axis) => u32::from(state.axis(axis) as u16),
    }
}

/// Packs `state` into a report, ready for the transport.
pub fn encode(state: &JoystickState) -> Report {
    let mut buf = [0u8; REPORT_LEN];
    for spec in FIELDS.iter() {
        spec.put(&mut buf, field_value(state, spec.field));
    }
    buf
}

/// Unpacks a report produced by [`encode`].
///
/// Returns `None` when `data` is not a joystick report.
pub fn decode(data: &[u8]) -> Option<JoystickState> {
    let buf: &Report = data.try_into().ok()?;
    let mut state = JoystickState::neutral();
    for spec in FIELDS.iter() {
        let value = spec.get(buf);
        match spec.field {
            Field::ReportId if value != u32::from(REPORT_ID) => return None,
            Field::ReportId => {}
            Field::Buttons => state.buttons = Buttons(value),
            Field::Throttle => state.throttle = value as u16,
            Field::Rudder => state.rudder = value as u16,
            Field::Hat(n) => {
                if let Some(hat) = state.hats.get_mut(n as usize) {
                    *hat = hat_from_code(value as u8);
                }
            }
            Field::Axis(axis) => {
                state.set_axis(axis, value as u16 as i16);
            }
        }
    }
    Some(state)
}
