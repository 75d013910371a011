//! The eleven-state modem lifecycle driver.
//!
//! Split into two phases that mirror how the UART is actually shared:
//! [`Lifecycle::run_to_cmux`] drives the modem from `Idle` through sending
//! `AT+CMUX=...`, while the UART Pipe is exclusively owned by the chat
//! engine; [`Lifecycle::run_from_cmux`] drives everything from `OpenDlci1`
//! onward, once the caller has started pumping CMUX frames over the same
//! UART concurrently. The caller (`device::Runner::run`) alternates between
//! the two exactly once per power cycle, racing the CMUX frame pump against
//! `run_from_cmux` the same way the teacher's PPP runner races its
//! multiplexer pump against the rest of its driver loop.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Read, Write};

use crate::chat::{Chat, Outcome};
use crate::cmux::{AnyPipe, DlciPipe};
use crate::config::CellularConfig;
use crate::event::{Event, EventQueue};
use crate::fmt::{debug, info, warn};
use crate::pipe::Pipe;
use crate::ppp::PppInterface;
use crate::scripts::{self, ConnectScratch};
use crate::state::{LifecycleState, Shared};
use crate::uart::UartPipe;

/// Delay between dial attempts and between CMUX settling and the first
/// DLCI use.
const SETTLE: Duration = Duration::from_millis(500);
const REGISTER_POLL: Duration = Duration::from_secs(2);
const CARRIER_POLL: Duration = Duration::from_secs(4);
const CARRIER_OFF_WAIT: Duration = Duration::from_secs(1);
const POWER_PULSE: Duration = Duration::from_millis(1500);
const RESET_PULSE: Duration = Duration::from_millis(100);
const STARTUP_WAIT: Duration = Duration::from_secs(10);

pub struct Lifecycle<'a> {
    shared: &'a Shared,
    events: &'a EventQueue,
}

impl<'a> Lifecycle<'a> {
    pub const fn new(shared: &'a Shared, events: &'a EventQueue) -> Self {
        Self { shared, events }
    }

    fn enter(&self, next: LifecycleState) {
        debug!("lifecycle: entering new state");
        self.shared.set_state(next);
    }

    /// Blocks on `Resume`, then brings the modem up through sending
    /// `AT+CMUX=...`. Retries power pulses and the init script indefinitely
    /// on failure, per ground truth's unbounded bring-up retry.
    pub async fn run_to_cmux<R, W>(
        &self,
        uart: &mut UartPipe<R, W>,
        config: &mut impl CellularConfig,
        net: &mut impl PppInterface,
    ) where
        R: Read,
        W: Write,
    {
        self.enter(LifecycleState::Idle);
        self.wait_for_resume().await;

        let _ = uart.open().await;

        let has_power = config.power_pin().is_some();
        let has_reset = config.reset_pin().is_some();

        if has_power || has_reset {
            self.enter(LifecycleState::PowerOn);
            self.pulse_power_on(config).await;
        }

        loop {
            self.enter(LifecycleState::RunInit);

            let mut chat: Chat<'_, AnyPipe<'_, '_, R, W>> = Chat::new();
            let mut any_uart = AnyPipe::Uart(uart);
            if chat.attach(&mut any_uart).is_err() {
                warn!("lifecycle: UART busy entering RunInit");
                Timer::after(SETTLE).await;
                continue;
            }

            let script = scripts::init_script();
            let outcome = chat
                .run(&script, |index, argv| {
                    if index == scripts::INIT_IMEI_INDEX && !argv.is_empty() {
                        self.shared
                            .update_status(|s| s.set_imei_from_ascii(argv[0]));
                    } else if index == scripts::INIT_MODEL_INDEX && !argv.is_empty() {
                        self.shared.update_status(|s| s.set_hardware_model(argv[0]));
                    }
                })
                .await;
            chat.release();

            match outcome {
                Outcome::Success => {
                    info!("lifecycle: init script succeeded");
                    let status = self.shared.status();
                    if let Some(imei) = status.imei() {
                        net.set_link_addr(imei);
                    }
                    break;
                }
                Outcome::Failed => {
                    warn!("lifecycle: init script failed, retrying");
                    if has_power {
                        self.enter(LifecycleState::PowerOn);
                        self.pulse_power_on(config).await;
                    }
                }
            }
        }

        self.enter(LifecycleState::ConnectCmux);
        // The CMUX handshake itself (SABM/UA on DLCI 0) is handled by the
        // frame pump the caller is about to start; this settle gives the
        // modem time to switch its UART framing before frames arrive.
        Timer::after(SETTLE).await;
    }

    /// Drives `OpenDlci1` through `PowerOff`/`Idle`, assuming the CMUX frame
    /// pump is already running concurrently over the same UART. Returns once
    /// the modem has been suspended back to `Idle` (power pulsed down first
    /// if a power GPIO is configured), at which point the caller should stop
    /// pumping CMUX frames and close the UART.
    pub async fn run_from_cmux<R, W>(
        &self,
        dlci1: &mut DlciPipe<'_>,
        dlci2: &mut DlciPipe<'_>,
        config: &mut impl CellularConfig,
        net: &mut impl PppInterface,
    ) where
        R: Read,
        W: Write,
    {
        self.enter(LifecycleState::OpenDlci1);
        let _ = dlci1.open().await;
        self.events.delegate(Event::Dlci1Opened);

        self.enter(LifecycleState::OpenDlci2);
        let _ = dlci2.open().await;
        self.events.delegate(Event::Dlci2Opened);

        'dial: loop {
            if self.dial::<R, W>(dlci2, &*config).await.is_suspend() {
                self.power_down_to_idle(config).await;
                return;
            }
            // RunDial's leave action: release Chat (already done inside
            // `dial`) then attach PPP to DLCI 2. Runs every successful
            // dial, including re-dials after a registration drop.
            net.attach(dlci2);

            let registered = self.register::<R, W>(dlci1).await;
            if registered.is_suspend() {
                self.power_down_to_idle(config).await;
                return;
            }

            self.enter(LifecycleState::CarrierOn);
            net.carrier_on();
            info!("lifecycle: carrier up");
            loop {
                let outcome = self.poll_net_stat::<R, W>(dlci1).await;
                match outcome {
                    PollResult::Suspend => {
                        // CarrierOn's leave action: release PPP before
                        // entering CarrierOff, whose own enter action brings
                        // the carrier down.
                        net.release();
                        self.enter(LifecycleState::CarrierOff);
                        net.carrier_off();
                        info!("lifecycle: carrier down");
                        Timer::after(CARRIER_OFF_WAIT).await;
                        self.power_down_to_idle(config).await;
                        return;
                    }
                    PollResult::Progressed if !self.shared.status().is_registered() => {
                        // Ground truth's carrier-lost handler re-dials
                        // without tearing down PPP's DLCI 2 attachment.
                        warn!("lifecycle: registration lost, re-dialling");
                        continue 'dial;
                    }
                    PollResult::Progressed | PollResult::Idle => {
                        Timer::after(CARRIER_POLL).await;
                    }
                }
            }
        }
    }

    async fn pulse_power_on(&self, config: &mut impl CellularConfig) {
        if let Some(pin) = config.power_pin() {
            let _ = pin.set_low();
            Timer::after(POWER_PULSE).await;
            let _ = pin.set_high();
            Timer::after(STARTUP_WAIT).await;
        } else if let Some(pin) = config.reset_pin() {
            let _ = pin.set_high();
            Timer::after(RESET_PULSE).await;
            let _ = pin.set_low();
            Timer::after(STARTUP_WAIT).await;
        }
    }

    async fn power_down_to_idle(&self, config: &mut impl CellularConfig) {
        if config.power_pin().is_some() {
            self.enter(LifecycleState::PowerOff);
            if let Some(pin) = config.power_pin() {
                let _ = pin.set_low();
            }
            Timer::after(POWER_PULSE).await;
            if let Some(pin) = config.power_pin() {
                let _ = pin.set_high();
            }
            Timer::after(STARTUP_WAIT).await;
        } else if let Some(pin) = config.reset_pin() {
            let _ = pin.set_high();
            Timer::after(RESET_PULSE).await;
            if let Some(pin) = config.reset_pin() {
                let _ = pin.set_low();
            }
        }

        self.enter(LifecycleState::Idle);
        self.events.clear_suspend();
        self.shared.signal_suspended();
        info!("lifecycle: suspended, back to idle");
    }

    async fn dial<R, W>(
        &self,
        dlci2: &mut DlciPipe<'_>,
        config: &impl CellularConfig,
    ) -> DialResult
    where
        R: Read,
        W: Write,
    {
        loop {
            if self.events.is_suspend_requested() {
                return DialResult::Suspend;
            }

            self.enter(LifecycleState::RunDial);
            Timer::after(SETTLE).await;

            let mut chat: Chat<'_, AnyPipe<'_, '_, R, W>> = Chat::new();
            let mut any_dlci2 = AnyPipe::Dlci(dlci2);
            if chat.attach(&mut any_dlci2).is_err() {
                warn!("lifecycle: DLCI2 busy entering RunDial");
                Timer::after(SETTLE).await;
                continue;
            }

            let mut scratch = ConnectScratch::new();
            let script = scratch.build(config);
            let outcome = chat.run(&script, |_, _| {}).await;
            chat.release();

            match outcome {
                Outcome::Success => {
                    info!("lifecycle: dial succeeded");
                    return DialResult::Dialled;
                }
                Outcome::Failed => {
                    warn!("lifecycle: dial failed, retrying");
                }
            }
        }
    }

    async fn register<R, W>(&self, dlci1: &mut DlciPipe<'_>) -> RegisterResult
    where
        R: Read,
        W: Write,
    {
        self.enter(LifecycleState::Register);
        loop {
            if self.events.is_suspend_requested() {
                return RegisterResult::Suspend;
            }

            let outcome = self.poll_net_stat::<R, W>(dlci1).await;
            if matches!(outcome, PollResult::Progressed) && self.shared.status().is_registered() {
                info!("lifecycle: registered");
                return RegisterResult::Registered;
            }

            Timer::after(REGISTER_POLL).await;
        }
    }

    async fn poll_net_stat<R, W>(&self, dlci1: &mut DlciPipe<'_>) -> PollResult
    where
        R: Read,
        W: Write,
    {
        if self.events.is_suspend_requested() {
            return PollResult::Suspend;
        }

        let mut chat: Chat<'_, AnyPipe<'_, '_, R, W>> = Chat::new();
        let mut any_dlci1 = AnyPipe::Dlci(dlci1);
        if chat.attach(&mut any_dlci1).is_err() {
            warn!("lifecycle: DLCI1 busy polling registration");
            return PollResult::Idle;
        }

        let script = scripts::net_stat_script();
        let outcome = chat
            .run(&script, |index, argv| match index {
                scripts::NET_STAT_CREG_INDEX => {
                    self.shared.update_status(|s| s.set_registration(argv));
                }
                scripts::NET_STAT_CGATT_INDEX => {
                    self.shared
                        .update_status(|s| s.set_packet_service_attached(argv));
                }
                _ => {}
            })
            .await;
        chat.release();

        match outcome {
            Outcome::Success => PollResult::Progressed,
            Outcome::Failed => PollResult::Idle,
        }
    }

    /// Blocks until a `Resume` is delivered. Any other event observed while
    /// idle (a stale `Suspend`, for instance) is dropped: `Idle` only reacts
    /// to `Resume`.
    async fn wait_for_resume(&self) {
        self.events.clear_suspend();
        loop {
            let events = self.events.wait_and_drain().await;
            if events.iter().any(|e| *e == Event::Resume) {
                return;
            }
        }
    }
}

enum DialResult {
    Dialled,
    Suspend,
}

impl DialResult {
    fn is_suspend(&self) -> bool {
        matches!(self, DialResult::Suspend)
    }
}

enum RegisterResult {
    Registered,
    Suspend,
}

impl RegisterResult {
    fn is_suspend(&self) -> bool {
        matches!(self, RegisterResult::Suspend)
    }
}

enum PollResult {
    Progressed,
    Idle,
    Suspend,
}
