//! The two handles applications hold: [`Control`] for power actions and
//! status queries, [`Runner`] for the task that has to keep being polled.
//! Mirrors the teacher's `Control`/`Runner` split, where `Control` only
//! ever touches shared state through `Shared`/`EventQueue` and `Runner`
//! owns everything that actually talks to the UART.

use embassy_time::{with_timeout, Duration};
use embedded_io_async::{Read, Write};

use crate::config::CellularConfig;
use crate::cmux::{self, DlciPipe};
use crate::error::Error;
use crate::event::{Event, EventQueue};
use crate::lifecycle::Lifecycle;
use crate::pipe::Pipe;
use crate::ppp::PppInterface;
use crate::resources::Resources;
use crate::state::{LifecycleState, PowerAction, Shared};
use crate::status::ModemStatus;
use crate::uart::UartPipe;

/// How long [`Control::run_action`] waits for a requested suspend to
/// complete before giving up.
const SUSPEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Power-management and status entry point. Cheap to hold onto: every
/// method either reads [`Shared`] or posts to the [`EventQueue`], never
/// touching the UART directly.
pub struct Control<'a> {
    shared: &'a Shared,
    events: &'a EventQueue,
}

impl<'a> Control<'a> {
    /// Current lifecycle state, for diagnostics/logging.
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// Last modem status captured from chat-script parses.
    pub fn status(&self) -> ModemStatus {
        self.shared.status()
    }

    /// `true` once registration and packet-service attach both hold and the
    /// lifecycle has reached `CarrierOn`.
    pub fn is_carrier_up(&self) -> bool {
        self.shared.state() == LifecycleState::CarrierOn
    }

    /// Requests a power action and waits for it to take effect.
    ///
    /// `Resume` only has to post the event: the lifecycle driver picks it
    /// up the next time it blocks in `Idle`. `Suspend` waits for the
    /// driver to actually power the modem down and return to `Idle`,
    /// timing out after 30 s the same way the original `suspend()` call
    /// does.
    pub async fn run_action(&self, action: PowerAction) -> Result<(), Error> {
        match action {
            PowerAction::Resume => {
                self.events.clear_suspend();
                self.events.delegate(Event::Resume);
                Ok(())
            }
            PowerAction::Suspend => {
                self.events.request_suspend();
                with_timeout(SUSPEND_TIMEOUT, self.shared.wait_suspended())
                    .await
                    .map_err(|_| Error::SuspendTimeout)
            }
        }
    }
}

/// The cooperative worker task. Alternates between owning the raw UART
/// (while the chat engine talks directly to it) and pumping CMUX frames
/// over the same UART concurrently with the rest of the lifecycle, the
/// same two-phase split the teacher's PPP runner drives through `select4`.
pub struct Runner<'a, R, W, C, N> {
    uart: &'a mut UartPipe<R, W>,
    mux: &'a mut cmux::Mux,
    lifecycle: Lifecycle<'a>,
    config: C,
    net: N,
}

impl<'a, R, W, C, N> Runner<'a, R, W, C, N>
where
    R: Read,
    W: Write,
    C: CellularConfig,
    N: PppInterface,
{
    /// Runs forever: one pass through this loop is one full power cycle
    /// (suspend to idle, then back up again on the next `Resume`).
    pub async fn run(&mut self) -> ! {
        loop {
            self.lifecycle
                .run_to_cmux(self.uart, &mut self.config, &mut self.net)
                .await;

            let (mux_runner, [ch1, ch2]) = self.mux.start();
            let mut dlci1 = DlciPipe::new(ch1);
            let mut dlci2 = DlciPipe::new(ch2);

            // The CMUX frame pump needs the UART's genuinely separate
            // rx/tx halves, not one combined duplex handle.
            let (rx, tx) = self.uart.split();
            let pump = mux_runner.run(rx, tx, cmux::MAX_FRAME_SIZE);
            let drive = self.lifecycle.run_from_cmux::<R, W>(
                &mut dlci1,
                &mut dlci2,
                &mut self.config,
                &mut self.net,
            );

            // `run_from_cmux` always returns once the modem has been
            // suspended back to idle; the frame pump has no natural end
            // and is simply dropped when it does.
            embassy_futures::select::select(pump, drive).await;

            self.uart.close().await;
        }
    }
}

/// Builds the [`Control`]/[`Runner`] pair for one modem instance from its
/// static [`Resources`] and board-specific [`CellularConfig`].
///
/// Destructures the `&mut Resources` up front so `Control`'s immutable
/// borrow of `shared`/`events` and `Runner`'s exclusive borrow of
/// `uart`/`mux` are disjoint fields rather than a reborrow of the same
/// `&mut Resources`, which the borrow checker would otherwise reject.
pub fn new_cellular<R, W, C, N>(
    resources: &mut Resources<R, W>,
    config: C,
    net: N,
) -> (Control<'_>, Runner<'_, R, W, C, N>)
where
    R: Read,
    W: Write,
    C: CellularConfig,
    N: PppInterface,
{
    let Resources {
        uart,
        mux,
        shared,
        events,
    } = resources;

    let control = Control {
        shared: &*shared,
        events: &*events,
    };
    let lifecycle = Lifecycle::new(&*shared, &*events);
    let runner = Runner {
        uart,
        mux,
        lifecycle,
        config,
        net,
    };

    (control, runner)
}
