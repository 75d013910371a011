//! The lifecycle state enum and the cross-task state shared with [`crate::device::Control`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::status::ModemStatus;

/// The eleven states of the modem lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    Idle,
    PowerOn,
    RunInit,
    ConnectCmux,
    OpenDlci1,
    OpenDlci2,
    RunDial,
    Register,
    CarrierOn,
    CarrierOff,
    PowerOff,
}

/// State observable from [`crate::device::Control`] without going through
/// the event queue: the current lifecycle state and the last modem status
/// captured from chat parses.
pub struct Shared {
    inner: Mutex<NoopRawMutex, RefCell<SharedInner>>,
    /// Asserted exactly once, when `PowerOff` is left on the way to `Idle`
    /// (or directly on reaching `Idle` with no power GPIO configured),
    /// unblocking a pending `Control::suspend()` call.
    suspended: Signal<NoopRawMutex, ()>,
}

struct SharedInner {
    state: LifecycleState,
    status: ModemStatus,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(SharedInner {
                state: LifecycleState::Idle,
                status: ModemStatus::new(),
            })),
            suspended: Signal::new(),
        }
    }

    pub fn set_state(&self, state: LifecycleState) {
        self.inner.lock(|s| s.borrow_mut().state = state);
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock(|s| s.borrow().state)
    }

    pub fn update_status(&self, f: impl FnOnce(&mut ModemStatus)) {
        self.inner.lock(|s| f(&mut s.borrow_mut().status));
    }

    pub fn status(&self) -> ModemStatus {
        self.inner.lock(|s| s.borrow().status.clone())
    }

    pub fn signal_suspended(&self) {
        self.suspended.signal(());
    }

    pub async fn wait_suspended(&self) {
        self.suspended.wait().await;
    }
}

/// The two actions a host's power-management policy can invoke.
///
/// Modelled as an enum rather than a string/integer so "unsupported
/// action" is a compile-time impossibility instead of a runtime fallback —
/// the original C driver's two-action `pm_device_action` surface had a
/// third, "not supported", arm for exactly this reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerAction {
    Resume,
    Suspend,
}
