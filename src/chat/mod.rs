//! A scripted AT dialogue runner.
//!
//! The chat engine accumulates bytes from an attached [`Pipe`] until a line
//! delimiter (`\r`; `\n` is filtered on ingest), matches the line against
//! the current request's expected response (and against the script's abort
//! patterns), and reports a single [`Outcome`] once the script completes,
//! times out, or hits an abort line.
//!
//! This is deliberately not built on `atat`'s typed `AtatClient`: the
//! dialogues here are driven by prefix/separator matching against raw
//! lines rather than derive-macro response parsing, which is what lets one
//! engine run the init, dial and status-poll scripts without a response
//! type per command.

pub mod script;

use embassy_time::{with_timeout, Instant};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::error::Error;
use crate::pipe::Pipe;
use script::Script;

const LINE_CAP: usize = 128;
const MAX_ARGS: usize = 8;

/// Result of running a [`script::Script`] to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Success,
    Failed,
}

/// Runs [`script::Script`]s over an attached [`Pipe`].
///
/// Generic over the attached Pipe type so the same engine instance can be
/// rebound across its lifetime (UART, then DLCI2, then DLCI1) as long as
/// every binding resolves to the same concrete `P` — see [`crate::cmux::AnyPipe`].
pub struct Chat<'a, P: Pipe> {
    pipe: Option<&'a mut P>,
    line: Vec<u8, LINE_CAP>,
}

impl<'a, P: Pipe> Chat<'a, P> {
    pub const fn new() -> Self {
        Self {
            pipe: None,
            line: Vec::new(),
        }
    }

    /// Binds the engine to a Pipe. Fails with [`Error::Busy`] if already
    /// attached — callers must `release` first.
    pub fn attach(&mut self, pipe: &'a mut P) -> Result<(), Error> {
        if self.pipe.is_some() {
            return Err(Error::Busy);
        }
        self.pipe = Some(pipe);
        self.line.clear();
        Ok(())
    }

    /// Detaches from the Pipe. Safe to call when nothing is attached.
    pub fn release(&mut self) {
        self.pipe = None;
    }

    pub fn is_attached(&self) -> bool {
        self.pipe.is_some()
    }

    /// Runs `script` to completion, invoking `on_match(request_index, argv)`
    /// for every expected response that fires.
    pub async fn run(
        &mut self,
        script: &Script<'_>,
        mut on_match: impl FnMut(usize, &[&[u8]]),
    ) -> Outcome {
        let deadline = Instant::now() + script.timeout;

        for (index, request) in script.requests.iter().enumerate() {
            if !request.send.is_empty() {
                if self.send_line(request.send).await.is_err() {
                    return Outcome::Failed;
                }
            }

            match request.response {
                Some(m) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    let fut = self.wait_for_match(m, script.abort_matches, &mut |argv| {
                        on_match(index, argv)
                    });
                    match with_timeout(remaining, fut).await {
                        Ok(Ok(())) => {}
                        _ => return Outcome::Failed,
                    }
                }
                None => {
                    embassy_time::Timer::after(request.dead_time).await;
                }
            }
        }

        Outcome::Success
    }

    /// No running script can be aborted out-of-band from inside `run` in
    /// this cooperative, single-worker model: a `Suspend` event observed by
    /// the caller simply lets the in-flight `run` future be dropped. This
    /// method exists for the rare case a caller holds a script result it
    /// no longer wants to act on.
    pub fn abort(&mut self) {}

    async fn send_line(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let pipe = self.pipe.as_mut().ok_or(Error::Io)?;
        pipe.write_all(bytes).await.map_err(|_| Error::Io)?;
        pipe.write_all(b"\r").await.map_err(|_| Error::Io)?;
        pipe.flush().await.map_err(|_| Error::Io)
    }

    /// Reads until a line matches `target` or an abort line is seen,
    /// invoking `on_match` with the split argv while the matched line is
    /// still in scope.
    async fn wait_for_match(
        &mut self,
        target: script::Match<'_>,
        abort_matches: &[&[u8]],
        on_match: &mut dyn FnMut(&[&[u8]]),
    ) -> Result<(), Error> {
        loop {
            if let Some(line_end) = self.next_line_end() {
                let mut line: Vec<u8, LINE_CAP> = Vec::new();
                line.extend_from_slice(&self.line[..line_end]).ok();
                let consumed = line_end + 1; // also drop the '\r' delimiter
                self.line.copy_within(consumed.., 0);
                self.line.truncate(self.line.len() - consumed);

                if abort_matches.iter().any(|a| line.starts_with(a)) {
                    return Err(Error::ScriptFailed);
                }

                if line.starts_with(target.prefix) {
                    let rest = &line[target.prefix.len()..];
                    let mut argv: Vec<&[u8], MAX_ARGS> = Vec::new();
                    if target.separator == 0 {
                        let _ = argv.push(rest);
                    } else {
                        for part in rest.split(|&b| b == target.separator) {
                            if argv.push(part).is_err() {
                                break;
                            }
                        }
                    }
                    on_match(&argv);
                    return Ok(());
                }
                // Non-matching, non-abort line: keep reading (e.g. an
                // echoed command, or an unrelated URC).
                continue;
            }

            let pipe = self.pipe.as_mut().ok_or(Error::Io)?;
            let mut byte = [0u8; 1];
            let n = pipe.read(&mut byte).await.map_err(|_| Error::Io)?;
            if n == 0 {
                continue;
            }
            if byte[0] == b'\n' {
                continue;
            }
            if self.line.push(byte[0]).is_err() {
                // Line too long for the buffer: drop it and start over,
                // same effect as an unmatched line.
                self.line.clear();
            }
        }
    }

    fn next_line_end(&self) -> Option<usize> {
        self.line.iter().position(|&b| b == b'\r')
    }
}

trait WriteAllExt: Write {
    async fn write_all(&mut self, mut buf: &[u8]) -> Result<(), Self::Error> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            buf = &buf[n..];
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteAllExt for W {}

#[cfg(test)]
mod tests {
    use super::script::{Match, Request, Script};
    use super::*;
    use embassy_time::Duration;
    use embedded_io_async::ErrorType;

    struct FakePipe {
        rx: &'static [u8],
        pos: usize,
        tx: Vec<u8, 256>,
    }

    impl ErrorType for FakePipe {
        type Error = Error;
    }

    impl Read for FakePipe {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
            if self.pos >= self.rx.len() {
                return Ok(0);
            }
            buf[0] = self.rx[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for FakePipe {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
            self.tx.extend_from_slice(buf).ok();
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    impl Pipe for FakePipe {
        async fn open(&mut self) -> Result<(), Error> {
            Ok(())
        }
        async fn close(&mut self) {}
    }

    #[test]
    fn matches_blank_request_two_line_response() {
        embassy_futures::block_on(async {
            let mut pipe = FakePipe {
                rx: b"123456789012345\r\r\nOK\r",
                pos: 0,
                tx: Vec::new(),
            };
            let mut chat: Chat<'_, FakePipe> = Chat::new();
            chat.attach(&mut pipe).unwrap();

            let mut captured: Vec<u8, 16> = Vec::new();
            let script = Script::new(
                &[
                    Request::expect(b"AT+CGSN", Match::new(b"", 0)),
                    Request::blank(Match::new(b"OK", 0)),
                ],
                &[b"ERROR"],
                Duration::from_secs(4),
            );

            let outcome = chat
                .run(&script, |idx, argv| {
                    if idx == 0 {
                        captured.extend_from_slice(argv[0]).ok();
                    }
                })
                .await;

            assert_eq!(outcome, Outcome::Success);
            assert_eq!(&captured[..], b"123456789012345");
        });
    }

    #[test]
    fn abort_line_fails_the_script() {
        embassy_futures::block_on(async {
            let mut pipe = FakePipe {
                rx: b"ERROR\r",
                pos: 0,
                tx: Vec::new(),
            };
            let mut chat: Chat<'_, FakePipe> = Chat::new();
            chat.attach(&mut pipe).unwrap();

            let script = Script::new(
                &[Request::expect(b"ATD*99#", Match::new(b"CONNECT", 0))],
                &[b"ERROR", b"NO CARRIER"],
                Duration::from_secs(2),
            );

            let outcome = chat.run(&script, |_, _| {}).await;
            assert_eq!(outcome, Outcome::Failed);
        });
    }

    #[test]
    fn separator_splits_registration_argv() {
        embassy_futures::block_on(async {
            let mut pipe = FakePipe {
                rx: b"+CREG: 0,5\r",
                pos: 0,
                tx: Vec::new(),
            };
            let mut chat: Chat<'_, FakePipe> = Chat::new();
            chat.attach(&mut pipe).unwrap();

            let mut tech = 0u8;
            let mut stat = 0u8;
            let script = Script::new(
                &[Request::expect(b"AT+CREG?", Match::new(b"+CREG: ", b','))],
                &[b"ERROR"],
                Duration::from_secs(2),
            );

            chat.run(&script, |_, argv| {
                if argv.len() == 2 {
                    tech = argv[0][0] - b'0';
                    stat = argv[1][0] - b'0';
                }
            })
            .await;

            assert_eq!(tech, 0);
            assert_eq!(stat, 5);
        });
    }

    #[test]
    fn attach_while_busy_fails() {
        let mut pipe = FakePipe {
            rx: b"",
            pos: 0,
            tx: Vec::new(),
        };
        let mut other = FakePipe {
            rx: b"",
            pos: 0,
            tx: Vec::new(),
        };
        let mut chat: Chat<'_, FakePipe> = Chat::new();
        chat.attach(&mut pipe).unwrap();
        assert_eq!(chat.attach(&mut other), Err(Error::Busy));
    }
}
