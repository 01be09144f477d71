//! The joystick device: state, lifecycle and report transmission.
use crate::report::{encode, Report};
use crate::state::{Axis, HatId, HatSwitch, JoystickState, Update};
use crate::transport::ReportSink;

/// A joystick sending its state through a [`ReportSink`].
///
/// The joystick starts inactive. Setters always update the state, but reports are only
/// transmitted between [`Joystick::begin`] and [`Joystick::end`]: immediately after each
/// applied mutation when auto-send is on, otherwise on [`Joystick::send_state`].
///
/// A report the sink refuses is remembered; [`Joystick::poll`] retries it so the host
/// ends up with the latest state even when no further mutation follows.
pub struct Joystick<S: ReportSink> {
    sink: S,
    state: JoystickState,
    active: bool,
    auto_send: bool,
    pending: bool,
}

impl<S: ReportSink> Joystick<S> {
    /// Creates an inactive joystick in the neutral state.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: JoystickState::neutral(),
            active: false,
            auto_send: false,
            pending: false,
        }
    }

    /// Activates the joystick and sends the current state, so the host starts from it.
    /// With `auto_send`, every applied setter sends a report.
    pub fn begin(&mut self, auto_send: bool) {
        self.active = true;
        self.auto_send = auto_send;
        #[cfg(feature = "defmt")]
        defmt::debug!("joystick active, auto_send={}", auto_send);
        self.send_state();
    }

    /// Deactivates the joystick. Later mutations are kept but not transmitted.
    pub fn end(&mut self) {
        self.active = false;
        #[cfg(feature = "defmt")]
        defmt::debug!("joystick inactive");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn auto_send(&self) -> bool {
        self.auto_send
    }

    pub fn set_auto_send(&mut self, auto_send: bool) {
        self.auto_send = auto_send;
    }

    pub fn state(&self) -> &JoystickState {
        &self.state
    }

    /// Whether the last report was refused by the sink and still needs sending.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Retries a refused report. Call from the main loop or after polling the USB device.
    pub fn poll(&mut self) {
        if self.pending {
            self.send_state();
        }
    }

    /// The report the current state encodes to.
    pub fn report(&self) -> Report {
        encode(&self.state)
    }

    /// Sends the current state, if active.
    pub fn send_state(&mut self) {
        if !self.active {
            return;
        }
        let report = encode(&self.state);
        match self.sink.send_report(&report) {
            Ok(_) => {
                self.pending = false;
                #[cfg(feature = "defmt")]
                defmt::trace!("joystick report {=[u8]:x}", &report[..]);
            }
            Err(_e) => {
                self.pending = true;
                #[cfg(feature = "defmt")]
                defmt::warn!("joystick report not sent: {}", _e);
            }
        }
    }

    fn updated(&mut self, update: Update) -> Update {
        if update.is_applied() && self.auto_send {
            self.send_state();
        }
        update
    }

    pub fn set_axis(&mut self, axis: Axis, value: i16) -> Update {
        let update = self.state.set_axis(axis, value);
        self.updated(update)
    }

    pub fn set_x_axis(&mut self, value: i16) -> Update {
        self.set_axis(Axis::X, value)
    }

    pub fn set_y_axis(&mut self, value: i16) -> Update {
        self.set_axis(Axis::Y, value)
    }

    pub fn set_z_axis(&mut self, value: i16) -> Update {
        self.set_axis(Axis::Z, value)
    }

    pub fn set_x_axis_rotation(&mut self, value: i16) -> Update {
        self.set_axis(Axis::Rx, value)
    }

    pub fn set_y_axis_rotation(&mut self, value: i16) -> Update {
        self.set_axis(Axis::Ry, value)
    }

    pub fn set_z_axis_rotation(&mut self, value: i16) -> Update {
        self.set_axis(Axis::Rz, value)
    }

    /// Presses or releases button `index`; indices 32 and above are ignored.
    pub fn set_button(&mut self, index: u8, pressed: bool) -> Update {
        let update = self.state.set_button(index, pressed);
        self.updated(update)
    }

    pub fn press_button(&mut self, index: u8) -> Update {
        self.set_button(index, true)
    }

    pub fn release_button(&mut self, index: u8) -> Update {
        self.set_button(index, false)
    }

    pub fn set_throttle(&mut self, value: u16) -> Update {
        let update = self.state.set_throttle(value);
        self.updated(update)
    }

    pub fn set_rudder(&mut self, value: u16) -> Update {
        let update = self.state.set_rudder(value);
        self.updated(update)
    }

    /// Sets hat 0 or 1 to -1 (centered) or a direction code 0..=7.
    pub fn set_hat_switch(&mut self, hat: u8, value: i16) -> Update {
        let update = self.state.set_hat_switch(hat, value);
        self.updated(update)
    }

    /// Sets hat 0 or 1 from an angle in degrees; negative means centered.
    pub fn set_hat_switch_degrees(&mut self, hat: u8, degrees: i16) -> Update {
        let update = self.state.set_hat_switch_degrees(hat, degrees);
        self.updated(update)
    }

    pub fn set_hat(&mut self, hat: HatId, switch: HatSwitch) -> Update {
        let update = self.state.set_hat(hat, switch);
        self.updated(update)
    }

    /// Replaces the whole state as a single mutation.
    pub fn set_state(&mut self, state: JoystickState) -> Update {
        self.state = state;
        self.updated(Update::Applied)
    }

    /// Returns every control to neutral as a single mutation.
    pub fn reset(&mut self) -> Update {
        self.set_state(JoystickState::neutral())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
