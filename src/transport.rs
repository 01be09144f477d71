//! The seam between the joystick and whatever carries its reports to the host.
use usb_device::Result;

/// Destination for encoded input reports.
///
/// The joystick hands over complete reports, report ID included, and does not act on
/// the result; retrying or dropping is up to the implementation.
pub trait ReportSink {
    /// Transmits one input report, returning the number of bytes accepted.
    fn send_report(&mut self, report: &[u8]) -> Result<usize>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn send_report(&mut self, report: &[u8]) -> Result<usize> {
        (**self).send_report(report)
    }
}
