//! 3GPP TS 27.010 basic-mode multiplexing over the UART [`Pipe`].
//!
//! The byte-level framer (flag bytes, address/control/length/FCS,
//! byte-stuffing) is not reimplemented here: it is vendored exactly the way
//! the teacher crate vendors it, as `embassy-at-cmux`. This module is the
//! thin attach/connect/DLCI-open contract layered on top of it, plus the
//! [`AnyPipe`] adapter that lets the chat engine rebind across the UART and
//! the two DLCI sub-channels without being generic over three different
//! concrete types.

use embedded_io_async::{ErrorType, Read, Write};

use crate::error::Error;
use crate::pipe::Pipe;
use crate::uart::UartPipe;

/// Maximum CMUX frame payload, matching the `N1` parameter sent in the
/// `AT+CMUX=` init command.
pub const MAX_FRAME_SIZE: usize = 127;
/// Per-channel buffer size; sized generously above one frame so a full
/// frame can be queued without the mux runner stalling.
pub const CHANNEL_SIZE: usize = MAX_FRAME_SIZE * 2;
/// DLCI 1 (status/control) and DLCI 2 (data), plus the mux's own DLCI 0.
pub const CHANNEL_COUNT: usize = 2;

pub type Mux = embassy_at_cmux::Mux<CHANNEL_COUNT, CHANNEL_SIZE>;
pub type MuxRunner<'a> = embassy_at_cmux::Runner<'a, CHANNEL_COUNT, CHANNEL_SIZE>;
pub type Channel<'a> = embassy_at_cmux::Channel<'a, CHANNEL_SIZE>;

/// A single DLCI sub-Pipe. Opening is a formality here: the underlying
/// channel is already live once [`Mux::start`] has run, exactly as the
/// teacher's PPP runner uses its channels immediately without a separate
/// per-DLCI open handshake.
pub struct DlciPipe<'a> {
    channel: Channel<'a>,
}

impl<'a> DlciPipe<'a> {
    pub fn new(channel: Channel<'a>) -> Self {
        Self { channel }
    }
}

impl<'a> ErrorType for DlciPipe<'a> {
    type Error = Error;
}

impl<'a> Read for DlciPipe<'a> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.channel.read(buf).await.map_err(|_| Error::Io)
    }
}

impl<'a> Write for DlciPipe<'a> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.channel.write(buf).await.map_err(|_| Error::Io)
    }

    async fn flush(&mut self) -> Result<(), Error> {
        self.channel.flush().await.map_err(|_| Error::Io)
    }
}

impl<'a> Pipe for DlciPipe<'a> {
    async fn open(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Unifies the three concrete Pipe backends the chat engine is rebound
/// across over its lifetime, so [`crate::chat::Chat`] need only be generic
/// over this one type. `R`/`W` are the UART's split read/write halves,
/// matching [`UartPipe`].
pub enum AnyPipe<'p, 'd, R, W> {
    Uart(&'p mut UartPipe<R, W>),
    Dlci(&'p mut DlciPipe<'d>),
}

impl<'p, 'd, R, W> ErrorType for AnyPipe<'p, 'd, R, W> {
    type Error = Error;
}

impl<'p, 'd, R: Read, W> Read for AnyPipe<'p, 'd, R, W> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        match self {
            AnyPipe::Uart(p) => p.read(buf).await,
            AnyPipe::Dlci(p) => p.read(buf).await,
        }
    }
}

impl<'p, 'd, R, W: Write> Write for AnyPipe<'p, 'd, R, W> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        match self {
            AnyPipe::Uart(p) => p.write(buf).await,
            AnyPipe::Dlci(p) => p.write(buf).await,
        }
    }

    async fn flush(&mut self) -> Result<(), Error> {
        match self {
            AnyPipe::Uart(p) => p.flush().await,
            AnyPipe::Dlci(p) => p.flush().await,
        }
    }
}

impl<'p, 'd, R: Read, W: Write> Pipe for AnyPipe<'p, 'd, R, W> {
    async fn open(&mut self) -> Result<(), Error> {
        match self {
            AnyPipe::Uart(p) => p.open().await,
            AnyPipe::Dlci(p) => p.open().await,
        }
    }

    async fn close(&mut self) {
        match self {
            AnyPipe::Uart(p) => p.close().await,
            AnyPipe::Dlci(p) => p.close().await,
        }
    }
}
