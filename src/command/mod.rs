//! Typed encoding for the one AT command whose wire bytes are not fixed at
//! compile time: the PDP context definition used to dial. Every other line
//! in the scripts of [`crate::scripts`] is a literal byte string, because
//! the chat engine ([`crate::chat`]) consumes raw lines rather than
//! `atat`'s typed response structs — there is nothing for a derived
//! `Response` type to parse.

mod psn;

pub use psn::SetPDPContextDefinition;

use atat::atat_derive::AtatResp;

/// Placeholder response type for commands this crate only ever encodes,
/// never decodes through `atat`.
#[derive(Clone, AtatResp)]
pub struct NoResponse;
