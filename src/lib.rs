//! A USB HID joystick for usb-device
//!
//! This crate implements a joystick with six 16-bit axes, 32 buttons, a throttle,
//! a rudder and two hat switches. It holds the joystick state, packs it into the
//! input report declared by its HID report descriptor, and hands reports to a
//! transport, normally the [`hid_class::JoystickClass`] USB class.
//!
//! ```ignore
//! let class = JoystickClass::new(&usb_bus, 10);
//! let mut joystick = Joystick::new(class);
//! joystick.begin(true);
//! joystick.set_x_axis(-1200);
//! joystick.press_button(0);
//! joystick.set_hat_switch(0, 2);
//!
//! // from the USB interrupt or main loop
//! usb_dev.poll(&mut [joystick.sink_mut()]);
//! ```
//!
//! Out-of-range inputs (a button index above 31, a hat other than 0 or 1, a hat value
//! other than -1 or 0..=7) never touch the state; setters report them as
//! [`Update::Ignored`].
#![cfg_attr(not(test), no_std)]

pub use usb_device::{Result, UsbError};
pub mod descriptor;
pub mod hid_class;
pub mod joystick;
pub mod report;
pub mod shared;
pub mod state;
pub mod transport;

pub use joystick::Joystick;
pub use report::{decode, encode, Report, REPORT_LEN};
pub use shared::SharedJoystick;
pub use state::{Axis, Buttons, HatDirection, HatSwitch, Ignored, JoystickState, Update};
pub use transport::ReportSink;
