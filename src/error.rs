//! Error taxonomy shared by every layer of the driver.

use embedded_hal::digital::ErrorKind as PinErrorKind;

/// Top level error type returned from the fallible operations of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A Pipe (UART, DLCI) is already attached to another consumer.
    Busy,
    /// The underlying transport returned an I/O error.
    Io,
    /// A GPIO operation failed.
    Pin,
    /// An AT transport/encoding error, forwarded from `atat`.
    At(AtError),
    /// A chat script ran to completion without success: timeout or abort-line match.
    ScriptFailed,
    /// The CMUX handshake did not complete.
    CmuxTimeout,
    /// The external `suspend()` call did not complete within its 30 s deadline.
    SuspendTimeout,
}

/// Narrowed mirror of `atat::Error`, kept `Copy` so it composes into the crate's
/// own `Error` without pulling atat's error lifetime/generic parameters along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AtError {
    Read,
    Write,
    Timeout,
    Aborted,
    InvalidResponse,
    Parse,
}

impl From<atat::Error> for Error {
    fn from(e: atat::Error) -> Self {
        Error::At(match e {
            atat::Error::Read => AtError::Read,
            atat::Error::Write => AtError::Write,
            atat::Error::Timeout => AtError::Timeout,
            atat::Error::Aborted => AtError::Aborted,
            atat::Error::InvalidResponse => AtError::InvalidResponse,
            atat::Error::Parse => AtError::Parse,
            _ => AtError::InvalidResponse,
        })
    }
}

impl From<PinErrorKind> for Error {
    fn from(_: PinErrorKind) -> Self {
        Error::Pin
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Busy => write!(f, "resource already attached"),
            Error::Io => write!(f, "I/O error"),
            Error::Pin => write!(f, "GPIO error"),
            Error::At(e) => write!(f, "AT transport error: {:?}", e),
            Error::ScriptFailed => write!(f, "chat script failed"),
            Error::CmuxTimeout => write!(f, "CMUX handshake did not complete"),
            Error::SuspendTimeout => write!(f, "suspend did not complete in time"),
        }
    }
}

impl core::error::Error for Error {}
