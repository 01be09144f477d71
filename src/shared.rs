//! A joystick that can be shared between the main loop and interrupt handlers.
use core::cell::RefCell;

use critical_section::Mutex;

use crate::joystick::Joystick;
use crate::transport::ReportSink;

/// Wraps a [`Joystick`] so it can live in a `static` and be reached from both thread
/// and interrupt context. Every access runs inside a critical section, so a setter and
/// the report it triggers are never interleaved with another access.
///
/// ```ignore
/// static JOYSTICK: SharedJoystick<MySink> = SharedJoystick::empty();
///
/// JOYSTICK.install(Joystick::new(sink)).ok();
/// JOYSTICK.with(|j| j.begin(true));
/// JOYSTICK.with(|j| j.press_button(3));
/// ```
pub struct SharedJoystick<S: ReportSink> {
    inner: Mutex<RefCell<Option<Joystick<S>>>>,
}

impl<S: ReportSink> SharedJoystick<S> {
    /// A slot with no joystick installed yet.
    pub const fn empty() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn new(joystick: Joystick<S>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Some(joystick))),
        }
    }

    /// Puts `joystick` in the slot, returning the one it replaces.
    ///
    /// Called from within [`SharedJoystick::with`], the slot is busy and `joystick` is
    /// handed back as the error.
    pub fn install(&self, joystick: Joystick<S>) -> Result<Option<Joystick<S>>, Joystick<S>> {
        critical_section::with(|cs| match self.inner.borrow(cs).try_borrow_mut() {
            Ok(mut slot) => Ok(slot.replace(joystick)),
            Err(_) => Err(joystick),
        })
    }

    /// Removes the joystick from the slot.
    ///
    /// Returns `None` when the slot is empty or when called from within
    /// [`SharedJoystick::with`].
    pub fn take(&self) -> Option<Joystick<S>> {
        critical_section::with(|cs| self.inner.borrow(cs).try_borrow_mut().ok()?.take())
    }

    /// Runs `f` on the joystick inside a critical section.
    ///
    /// Returns `None` when no joystick is installed or when called re-entrantly from
    /// within `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Joystick<S>) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow(cs).try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joystick::tests::RecordingSink;

    #[test]
    fn test_empty_slot_is_noop() {
        let shared: SharedJoystick<RecordingSink> = SharedJoystick::empty();
        assert_eq!(shared.with(|j| j.press_button(0)), None);
        assert!(shared.take().is_none());
    }

    #[test]
    fn test_shared_setters_send() {
        let shared = SharedJoystick::new(Joystick::new(RecordingSink::default()));
        shared.with(|j| j.begin(true));
        assert!(shared.with(|j| j.press_button(4)).unwrap().is_applied());
        assert!(shared.with(|j| j.set_throttle(10)).unwrap().is_applied());

        let joystick = shared.take().unwrap();
        // The state sent by begin, then one per setter.
        assert_eq!(joystick.sink().reports.len(), 3);
        assert!(shared.with(|j| j.is_active()).is_none());
    }

    #[test]
    fn test_reentrant_access_is_refused() {
        let shared = SharedJoystick::new(Joystick::new(RecordingSink::default()));
        let nested = shared.with(|_| shared.with(|j| j.set_x_axis(1)));
        assert_eq!(nested, Some(None));
        assert_eq!(shared.with(|j| j.state().x), Some(0));
    }

    #[test]
    fn test_install_replaces() {
        let shared = SharedJoystick::empty();
        assert!(matches!(
            shared.install(Joystick::new(RecordingSink::default())),
            Ok(None)
        ));
        shared.with(|j| j.set_rudder(3));
        let old = shared.install(Joystick::new(RecordingSink::default()));
        assert_eq!(old.ok().flatten().map(|j| j.state().rudder), Some(3));
    }

    #[test]
    fn test_reentrant_install_and_take_are_refused() {
        let shared = SharedJoystick::new(Joystick::new(RecordingSink::default()));
        shared.with(|j| j.set_throttle(5));

        let taken = shared.with(|_| shared.take().is_some());
        assert_eq!(taken, Some(false));

        let refused = shared.with(|_| {
            let mut spare = Joystick::new(RecordingSink::default());
            spare.set_throttle(6);
            shared.install(spare).err().map(|j| j.state().throttle)
        });
        assert_eq!(refused, Some(Some(6)));

        // The installed joystick is untouched.
        assert_eq!(shared.with(|j| j.state().throttle), Some(5));
    }
}
