//! Bidirectional byte-channel abstraction with asynchronous open/close.
//!
//! A [`Pipe`] is the capability the chat engine, CMUX and PPP layers share:
//! bytes in, bytes out, and an explicit async `open`. Ownership transfer
//! between consumers (Chat ↔ CMUX ↔ PPP) is expressed by moving a `&mut`
//! borrow of the concrete pipe between them rather than through a runtime
//! attach/release contract — the borrow checker enforces the "at most one
//! consumer" invariant structurally.

use embedded_io_async::{Read, Write};

use crate::error::Error;

/// A byte transport that must be opened before use and can be closed again.
///
/// Implementors also provide [`embedded_io_async::Read`]/[`Write`] for the
/// byte-level traffic once open.
pub trait Pipe: Read<Error = Error> + Write<Error = Error> {
    /// Resolves once the underlying transport is ready for traffic.
    async fn open(&mut self) -> Result<(), Error>;

    /// Tears down the transport. Infallible by contract: a Pipe that can't
    /// cleanly close still releases its resources.
    async fn close(&mut self);
}
