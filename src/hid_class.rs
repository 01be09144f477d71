//! Implements the joystick HID interface for a usb-device device.
use usb_device::class_prelude::*;
use usb_device::Result;

use crate::descriptor::{REPORT_DESCRIPTOR, REPORT_ID};
use crate::report::{encode, Report, REPORT_LEN};
use crate::state::JoystickState;
use crate::transport::ReportSink;

const USB_CLASS_HID: u8 = 0x03;
const USB_SUBCLASS_NONE: u8 = 0x00;
const USB_PROTOCOL_NONE: u8 = 0x00;

// HID
const HID_DESC_DESCTYPE_HID: u8 = 0x21;
const HID_DESC_DESCTYPE_HID_REPORT: u8 = 0x22;
const HID_DESC_SPEC_1_10: [u8; 2] = [0x10, 0x01];
const HID_DESC_COUNTRY_UNSPEC: u8 = 0x00;

const HID_REQ_SET_IDLE: u8 = 0x0a;
const HID_REQ_GET_IDLE: u8 = 0x02;
const HID_REQ_GET_REPORT: u8 = 0x01;
const HID_REQ_SET_REPORT: u8 = 0x09;

const HID_REPORT_TYPE_INPUT: u8 = 0x01;

const MAX_PACKET_SIZE: u16 = 64;

/// Body of the class-specific HID descriptor, without the length and type prefix.
const fn hid_descriptor_body() -> [u8; 7] {
    let len = REPORT_DESCRIPTOR.len();
    [
        // HID Class spec version
        HID_DESC_SPEC_1_10[0],
        HID_DESC_SPEC_1_10[1],
        // Country code not supported
        HID_DESC_COUNTRY_UNSPEC,
        // Number of following descriptors
        1,
        // We have a HID report descriptor the host should read
        HID_DESC_DESCTYPE_HID_REPORT,
        // HID report descriptor size,
        (len & 0xFF) as u8,
        (len >> 8 & 0xFF) as u8,
    ]
}

/// Report bookkeeping of the class, independent of the endpoint it writes to.
///
/// Holds the last report handed over (answered on GET_REPORT), a report the endpoint
/// was too busy to take, and the idle rate set by the host. The idle rate is recorded
/// and read back only: reports go out on state changes, never repeated on a timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputReports {
    last: Report,
    pending: Option<Report>,
    idle_rate: u8,
}

impl Default for InputReports {
    fn default() -> Self {
        Self::new()
    }
}

impl InputReports {
    pub fn new() -> Self {
        Self {
            last: encode(&JoystickState::neutral()),
            pending: None,
            idle_rate: 0,
        }
    }

    pub fn last(&self) -> &Report {
        &self.last
    }

    pub fn pending(&self) -> Option<&Report> {
        self.pending.as_ref()
    }

    pub fn idle_rate(&self) -> u8 {
        self.idle_rate
    }

    /// Records `report` and writes it with `write`.
    ///
    /// A joystick report refused with `WouldBlock` is kept as pending, replacing any
    /// older pending report, and counts as accepted.
    pub fn submit(
        &mut self,
        report: &[u8],
        write: impl FnOnce(&[u8]) -> Result<usize>,
    ) -> Result<usize> {
        let full = Report::try_from(report).ok();
        if let Some(full) = full {
            self.last = full;
        }
        match (write(report), full) {
            (Ok(n), _) => {
                self.pending = None;
                Ok(n)
            }
            (Err(UsbError::WouldBlock), Some(full)) => {
                self.pending = Some(full);
                Ok(report.len())
            }
            (Err(e), _) => Err(e),
        }
    }

    /// Writes the pending report, if any. It stays pending while the endpoint is busy.
    pub fn flush(&mut self, write: impl FnOnce(&[u8]) -> Result<usize>) -> Result<usize> {
        let Some(report) = self.pending.take() else {
            return Ok(0);
        };
        match write(&report) {
            Ok(n) => Ok(n),
            Err(UsbError::WouldBlock) => {
                self.pending = Some(report);
                Err(UsbError::WouldBlock)
            }
            Err(e) => Err(e),
        }
    }

    /// Data answering GET_REPORT with the given wValue and wLength, `None` to stall.
    pub fn get_report(&self, value: u16, length: u16) -> Option<&[u8]> {
        let [id, typ] = value.to_le_bytes();
        if typ == HID_REPORT_TYPE_INPUT && id == REPORT_ID {
            Some(&self.last[..REPORT_LEN.min(length as usize)])
        } else {
            None
        }
    }

    /// Applies a class OUT request. Returns whether it is accepted.
    pub fn control_out(&mut self, request: u8, value: u16) -> bool {
        match request {
            HID_REQ_SET_IDLE => {
                self.idle_rate = (value >> 8) as u8;
                true
            }
            // The joystick has no output reports
            HID_REQ_SET_REPORT => false,
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.idle_rate = 0;
        self.pending = None;
    }
}

/// JoystickClass exposes the joystick report descriptor and an interrupt IN endpoint
/// carrying joystick input reports.
///
/// A report written while the endpoint still holds the previous one is sent once the
/// host has collected that one.
pub struct JoystickClass<'a, B: UsbBus> {
    if_num: InterfaceNumber,
    in_ep: EndpointIn<'a, B>,
    reports: InputReports,
}

impl<'a, B: UsbBus> JoystickClass<'a, B> {
    /// Creates a new JoystickClass with the provided UsbBus.
    ///
    /// poll_ms configures how frequently the host should poll for input reports.
    /// A lower value means better latency, at the expense of bandwidth on the bus.
    /// A value of 1 to 10 suits a joystick.
    pub fn new(alloc: &'a UsbBusAllocator<B>, poll_ms: u8) -> Self {
        Self {
            if_num: alloc.interface(),
            in_ep: alloc.interrupt(MAX_PACKET_SIZE, poll_ms),
            reports: InputReports::new(),
        }
    }

    /// Tries to write an input (device-to-host) report from the given raw bytes.
    /// The report ID must be present before the contents of the report.
    pub fn push_raw_input(&self, data: &[u8]) -> Result<usize> {
        self.in_ep.write(data)
    }

    /// The last joystick report handed to this class.
    pub fn last_report(&self) -> &Report {
        self.reports.last()
    }

    /// Idle rate requested by the host, in units of 4 ms. Zero means indefinite.
    /// Recorded only; reports are not repeated at this rate.
    pub fn idle_rate(&self) -> u8 {
        self.reports.idle_rate()
    }
}

impl<B: UsbBus> ReportSink for JoystickClass<'_, B> {
    fn send_report(&mut self, report: &[u8]) -> Result<usize> {
        let in_ep = &self.in_ep;
        self.reports.submit(report, |data| in_ep.write(data))
    }
}

impl<B: UsbBus> UsbClass<B> for JoystickClass<'_, B> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        writer.interface(
            self.if_num,
            USB_CLASS_HID,
            USB_SUBCLASS_NONE,
            USB_PROTOCOL_NONE,
        )?;

        writer.write(HID_DESC_DESCTYPE_HID, &hid_descriptor_body())?;

        writer.endpoint(&self.in_ep)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.reports.reset();
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr != self.in_ep.address() {
            return;
        }
        let in_ep = &self.in_ep;
        self.reports.flush(|data| in_ep.write(data)).ok();
    }

    // Handle control requests to the host.
    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = xfer.request();

        // Bail out if its not relevant to our interface.
        if !(req.recipient == control::Recipient::Interface
            && req.index == u8::from(self.if_num) as u16)
        {
            return;
        }

        match (req.request_type, req.request) {
            (control::RequestType::Standard, control::Request::GET_DESCRIPTOR) => {
                match (req.value >> 8) as u8 {
                    HID_DESC_DESCTYPE_HID_REPORT => {
                        xfer.accept_with_static(REPORT_DESCRIPTOR).ok();
                    }
                    HID_DESC_DESCTYPE_HID => {
                        let body = hid_descriptor_body();
                        let mut buf = [0u8; 9];
                        // Length of buf inclusive of size prefix
                        buf[0] = buf.len() as u8;
                        // Descriptor type
                        buf[1] = HID_DESC_DESCTYPE_HID;
                        buf[2..].copy_from_slice(&body);
                        xfer.accept_with(&buf).ok();
                    }
                    _ => {}
                }
            }
            (control::RequestType::Class, HID_REQ_GET_REPORT) => {
                match self.reports.get_report(req.value, req.length) {
                    Some(data) => xfer.accept_with(data).ok(),
                    None => xfer.reject().ok(),
                };
            }
            (control::RequestType::Class, HID_REQ_GET_IDLE) => {
                xfer.accept_with(&[self.reports.idle_rate()]).ok();
            }
            _ => {}
        }
    }

    // Handle a control request from the host.
    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = xfer.request();

        // Bail out if its not relevant to our interface.
        if !(req.recipient == control::Recipient::Interface
            && req.index == u8::from(self.if_num) as u16)
        {
            return;
        }

        if req.request_type != control::RequestType::Class {
            return;
        }

        if self.reports.control_out(req.request, req.value) {
            xfer.accept().ok();
        } else {
            xfer.reject().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_descriptor_body() {
        let body = hid_descriptor_body();
        assert_eq!(body[..5], [0x10, 0x01, 0x00, 1, HID_DESC_DESCTYPE_HID_REPORT]);
        assert_eq!(
            u16::from_le_bytes([body[5], body[6]]) as usize,
            REPORT_DESCRIPTOR.len()
        );
    }

    fn report_with_x(x: i16) -> Report {
        let mut state = JoystickState::neutral();
        state.x = x;
        encode(&state)
    }

    #[test]
    fn test_submit_updates_last_report() {
        let mut reports = InputReports::new();
        assert_eq!(*reports.last(), encode(&JoystickState::neutral()));

        let report = report_with_x(12);
        let mut written = Vec::new();
        let sent = reports.submit(&report, |data| {
            written.extend_from_slice(data);
            Ok(data.len())
        });
        assert_eq!(sent, Ok(REPORT_LEN));
        assert_eq!(written, report);
        assert_eq!(*reports.last(), report);
        assert!(reports.pending().is_none());
    }

    #[test]
    fn test_busy_endpoint_keeps_newest_report() {
        let mut reports = InputReports::new();
        let first = report_with_x(1);
        let second = report_with_x(2);

        assert_eq!(reports.submit(&first, |_| Err(UsbError::WouldBlock)), Ok(REPORT_LEN));
        assert_eq!(reports.submit(&second, |_| Err(UsbError::WouldBlock)), Ok(REPORT_LEN));
        assert_eq!(reports.pending(), Some(&second));

        // Still busy: the report stays queued.
        assert_eq!(reports.flush(|_| Err(UsbError::WouldBlock)), Err(UsbError::WouldBlock));
        assert_eq!(reports.pending(), Some(&second));

        let mut written = Vec::new();
        let flushed = reports.flush(|data| {
            written.extend_from_slice(data);
            Ok(data.len())
        });
        assert_eq!(flushed, Ok(REPORT_LEN));
        assert_eq!(written, second);
        assert!(reports.pending().is_none());
        assert_eq!(reports.flush(|_| panic!("nothing to write")), Ok(0));
    }

    #[test]
    fn test_successful_write_drops_stale_pending() {
        let mut reports = InputReports::new();
        reports.submit(&report_with_x(1), |_| Err(UsbError::WouldBlock)).ok();
        reports.submit(&report_with_x(2), |data| Ok(data.len())).ok();
        assert!(reports.pending().is_none());
    }

    #[test]
    fn test_other_write_errors_are_returned() {
        let mut reports = InputReports::new();
        let report = report_with_x(3);
        assert_eq!(
            reports.submit(&report, |_| Err(UsbError::InvalidState)),
            Err(UsbError::InvalidState)
        );
        assert!(reports.pending().is_none());
        // Short buffers are not joystick reports and are never queued.
        assert_eq!(
            reports.submit(&report[..4], |_| Err(UsbError::WouldBlock)),
            Err(UsbError::WouldBlock)
        );
        assert_eq!(*reports.last(), report);
    }

    #[test]
    fn test_get_report() {
        let mut reports = InputReports::new();
        let report = report_with_x(-5);
        reports.submit(&report, |data| Ok(data.len())).ok();

        let input = u16::from_le_bytes([REPORT_ID, HID_REPORT_TYPE_INPUT]);
        assert_eq!(reports.get_report(input, 64), Some(&report[..]));
        assert_eq!(reports.get_report(input, 3), Some(&report[..3]));

        let wrong_id = u16::from_le_bytes([REPORT_ID + 1, HID_REPORT_TYPE_INPUT]);
        assert_eq!(reports.get_report(wrong_id, 64), None);
        let feature = u16::from_le_bytes([REPORT_ID, 0x03]);
        assert_eq!(reports.get_report(feature, 64), None);
    }

    #[test]
    fn test_idle_round_trip() {
        let mut reports = InputReports::new();
        assert_eq!(reports.idle_rate(), 0);
        assert!(reports.control_out(HID_REQ_SET_IDLE, 0x7D00));
        assert_eq!(reports.idle_rate(), 0x7D);

        reports.reset();
        assert_eq!(reports.idle_rate(), 0);
    }

    #[test]
    fn test_set_report_rejected() {
        let mut reports = InputReports::new();
        assert!(!reports.control_out(HID_REQ_SET_REPORT, 0x0203));
        assert!(!reports.control_out(0x0b, 0)); // SET_PROTOCOL
        assert_eq!(reports, InputReports::new());
    }
}
