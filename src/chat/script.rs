//! Scripted AT dialogues run by the chat engine.

use embassy_time::Duration;

/// A response pattern: a line prefix, an optional argument separator, and
/// the index this match reports back to the caller's callback.
#[derive(Clone, Copy)]
pub struct Match<'a> {
    /// Leading bytes a response line must start with, e.g. `b"+CREG: "`.
    pub prefix: &'a [u8],
    /// Byte that separates arguments within the matched line, e.g. `b','`.
    /// `0` means "do not split, argv has a single element".
    pub separator: u8,
}

impl<'a> Match<'a> {
    pub const fn new(prefix: &'a [u8], separator: u8) -> Self {
        Self { prefix, separator }
    }
}

/// One step of a [`Script`]: a request line, and either an expected
/// response match or a dead-time to wait after sending.
#[derive(Clone, Copy)]
pub struct Request<'a> {
    /// Bytes to send, without the trailing delimiter. Empty means a
    /// "blank request": nothing is transmitted, but `response` is still
    /// awaited — used to consume a second response line triggered by the
    /// previous request without re-sending it.
    pub send: &'a [u8],
    /// Expected response pattern. `None` means "no response expected";
    /// `dead_time` is then how long to wait before the next request.
    pub response: Option<Match<'a>>,
    /// Dead time observed after a no-response request. Meaningless when
    /// `response` is `Some`.
    pub dead_time: Duration,
}

impl<'a> Request<'a> {
    /// A request with an expected response, no dead time.
    pub const fn expect(send: &'a [u8], response: Match<'a>) -> Self {
        Self {
            send,
            response: Some(response),
            dead_time: Duration::from_ticks(0),
        }
    }

    /// A blank row: no bytes sent, but a response is still awaited.
    pub const fn blank(response: Match<'a>) -> Self {
        Self {
            send: b"",
            response: Some(response),
            dead_time: Duration::from_ticks(0),
        }
    }

    /// A fire-and-forget request with no expected response.
    pub const fn no_response(send: &'a [u8], dead_time: Duration) -> Self {
        Self {
            send,
            response: None,
            dead_time,
        }
    }
}

/// An ordered AT dialogue with its failure patterns and overall deadline.
pub struct Script<'a> {
    pub requests: &'a [Request<'a>],
    /// Lines that, if seen at any point while a response is pending,
    /// abort the script immediately with [`crate::chat::Outcome::Failed`].
    pub abort_matches: &'a [&'a [u8]],
    pub timeout: Duration,
}

impl<'a> Script<'a> {
    pub const fn new(
        requests: &'a [Request<'a>],
        abort_matches: &'a [&'a [u8]],
        timeout: Duration,
    ) -> Self {
        Self {
            requests,
            abort_matches,
            timeout,
        }
    }
}
