//! Static, per-device storage: everything [`crate::device::new_cellular`]
//! needs to live in `static` rather than be stack-allocated, matching the
//! teacher's `asynch::Resources` split between long-lived storage and the
//! `Control`/`Runner` handles that borrow it.

use crate::cmux;
use crate::event::EventQueue;
use crate::state::Shared;
use crate::uart::UartPipe;

/// Owns the UART pipe, the CMUX channel storage and the lifecycle's shared
/// state/event queue for one modem instance. `R`/`W` are the UART's already
/// split read/write halves, the same split the CMUX frame pump is driven
/// over.
pub struct Resources<R, W> {
    pub(crate) uart: UartPipe<R, W>,
    pub(crate) mux: cmux::Mux,
    pub(crate) shared: Shared,
    pub(crate) events: EventQueue,
}

impl<R, W> Resources<R, W> {
    pub const fn new(rx: R, tx: W) -> Self {
        Self {
            uart: UartPipe::new(rx, tx),
            mux: cmux::Mux::new(),
            shared: Shared::new(),
            events: EventQueue::new(),
        }
    }
}
