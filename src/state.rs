//! In-memory joystick state: axes, buttons, throttle, rudder and hat switches.
use serde::{Deserialize, Serialize};

/// Number of buttons carried by the report.
pub const BUTTON_COUNT: u8 = 32;

/// Number of hat switches carried by the report.
pub const HAT_COUNT: u8 = 2;

/// The six signed axes of the joystick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
    /// Rotation around X.
    Rx,
    /// Rotation around Y.
    Ry,
    /// Rotation around Z.
    Rz,
}

/// Outcome of a state mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Update {
    /// The field was written.
    Applied,
    /// Nothing was written.
    Ignored(Ignored),
}

impl Update {
    pub fn is_applied(self) -> bool {
        self == Update::Applied
    }
}

/// Why a mutation left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ignored {
    /// Button index was 32 or above.
    ButtonOutOfRange,
    /// Hat id was neither 0 nor 1.
    HatOutOfRange,
    /// Hat value was neither -1 nor 0..=7.
    HatValueOutOfRange,
}

/// A validated button index, 0..=31.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonIndex(u8);

impl ButtonIndex {
    pub const fn new(index: u8) -> Option<Self> {
        if index < BUTTON_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Button state as a 32-bit bitfield, bit `i` being button `i`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u32);

impl Buttons {
    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn set(&mut self, button: ButtonIndex, pressed: bool) {
        let mask = 1u32 << button.get();
        if pressed {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: ButtonIndex) -> bool {
        self.0 & (1u32 << button.get()) != 0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A validated hat switch id, 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HatId(u8);

impl HatId {
    pub const fn new(id: u8) -> Option<Self> {
        if id < HAT_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// The eight directions of a hat switch, clockwise from up in 45° steps.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HatDirection {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
}

impl HatDirection {
    pub const ALL: [HatDirection; 8] = [
        HatDirection::Up,
        HatDirection::UpRight,
        HatDirection::Right,
        HatDirection::DownRight,
        HatDirection::Down,
        HatDirection::DownLeft,
        HatDirection::Left,
        HatDirection::UpLeft,
    ];

    /// Direction for a code in 0..=7.
    pub const fn from_code(code: u8) -> Option<Self> {
        if code < 8 {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn degrees(self) -> u16 {
        self as u16 * 45
    }
}

/// State of one hat switch.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HatSwitch {
    #[default]
    Centered,
    Pressed(HatDirection),
}

impl HatSwitch {
    /// Raw value used by callers to mean "no direction".
    pub const CENTERED_RAW: i16 = -1;

    /// Accepts -1 (centered) or a direction code 0..=7.
    pub const fn from_raw(value: i16) -> Option<Self> {
        match value {
            Self::CENTERED_RAW => Some(HatSwitch::Centered),
            0..=7 => match HatDirection::from_code(value as u8) {
                Some(dir) => Some(HatSwitch::Pressed(dir)),
                None => None,
            },
            _ => None,
        }
    }

    /// Maps an angle in degrees onto the nearest lower 45° step.
    /// Any negative angle means centered; angles wrap at 360.
    pub const fn from_degrees(degrees: i16) -> Self {
        if degrees < 0 {
            return HatSwitch::Centered;
        }
        match HatDirection::from_code(((degrees % 360) / 45) as u8) {
            Some(dir) => HatSwitch::Pressed(dir),
            None => HatSwitch::Centered,
        }
    }

    pub const fn raw(self) -> i16 {
        match self {
            HatSwitch::Centered => Self::CENTERED_RAW,
            HatSwitch::Pressed(dir) => dir.code() as i16,
        }
    }
}

/// Snapshot of every control of the joystick.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickState {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub rx: i16,
    pub ry: i16,
    pub rz: i16,
    pub buttons: Buttons,
    pub throttle: u16,
    pub rudder: u16,
    pub hats: [HatSwitch; HAT_COUNT as usize],
}

impl JoystickState {
    /// All axes at zero, buttons released, hats centered.
    pub const fn neutral() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            rx: 0,
            ry: 0,
            rz: 0,
            buttons: Buttons::NONE,
            throttle: 0,
            rudder: 0,
            hats: [HatSwitch::Centered; HAT_COUNT as usize],
        }
    }

    pub fn axis(&self, axis: Axis) -> i16 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::Rx => self.rx,
            Axis::Ry => self.ry,
            Axis::Rz => self.rz,
        }
    }

    pub fn set_axis(&mut self, axis: Axis, value: i16) -> Update {
        let slot = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::Rx => &mut self.rx,
            Axis::Ry => &mut self.ry,
            Axis::Rz => &mut self.rz,
        };
        *slot = value;
        Update::Applied
    }

    pub fn set_button(&mut self, index: u8, pressed: bool) -> Update {
        match ButtonIndex::new(index) {
            Some(button) => {
                self.buttons.set(button, pressed);
                Update::Applied
            }
            None => Update::Ignored(Ignored::ButtonOutOfRange),
        }
    }

    pub fn set_throttle(&mut self, value: u16) -> Update {
        self.throttle = value;
        Update::Applied
    }

    pub fn set_rudder(&mut self, value: u16) -> Update {
        self.rudder = value;
        Update::Applied
    }

    /// Sets hat `hat` from a raw value: -1 centered, 0..=7 a direction.
    pub fn set_hat_switch(&mut self, hat: u8, value: i16) -> Update {
        let Some(id) = HatId::new(hat) else {
            return Update::Ignored(Ignored::HatOutOfRange);
        };
        match HatSwitch::from_raw(value) {
            Some(switch) => self.set_hat(id, switch),
            None => Update::Ignored(Ignored::HatValueOutOfRange),
        }
    }

    /// Sets hat `hat` from an angle in degrees, negative meaning centered.
    pub fn set_hat_switch_degrees(&mut self, hat: u8, degrees: i16) -> Update {
        match HatId::new(hat) {
            Some(id) => self.set_hat(id, HatSwitch::from_degrees(degrees)),
            None => Update::Ignored(Ignored::HatOutOfRange),
        }
    }

    pub fn set_hat(&mut self, hat: HatId, switch: HatSwitch) -> Update {
        self.hats[hat.get() as usize] = switch;
        Update::Applied
    }

    pub fn hat(&self, hat: HatId) -> HatSwitch {
        self.hats[hat.get() as usize]
    }
}
