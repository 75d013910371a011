//! Concrete chat scripts run by the lifecycle driver.
//!
//! `init_script` and `net_stat_script` are entirely static: every line is a
//! literal byte string known at compile time. `connect_script` is the one
//! exception, since the PDP context line carries the APN and credentials
//! read from [`CellularConfig`] at dial time — the caller supplies the
//! scratch storage the encoded line and its `Request` live in, so the
//! script can still borrow 'static-free data without an allocator.

use atat::AtatCmd;
use embassy_time::Duration;

use crate::chat::script::{Match, Request, Script};
use crate::command::SetPDPContextDefinition;
use crate::config::CellularConfig;

/// `on_match` index at which `init_script` reports the IMEI line.
pub const INIT_IMEI_INDEX: usize = 7;
/// `on_match` index at which `init_script` reports the hardware model line.
pub const INIT_MODEL_INDEX: usize = 9;

/// Power-on bring-up: four unanswered settle pokes, echo off, verbose
/// errors, deregister the unsolicited `+CREG` URC, read identity, then
/// switch the line into 3GPP TS 27.010 multiplexed mode with two data
/// channels.
pub const fn init_script() -> Script<'static> {
    Script::new(
        &[
            Request::no_response(b"AT", Duration::from_millis(100)), // 0: settle after power-on
            Request::no_response(b"AT", Duration::from_millis(100)), // 1
            Request::no_response(b"AT", Duration::from_millis(100)), // 2
            Request::no_response(b"AT", Duration::from_millis(100)), // 3
            Request::expect(b"ATE0", Match::new(b"OK", 0)),           // 4
            Request::expect(b"AT+CMEE=1", Match::new(b"OK", 0)),      // 5
            Request::expect(b"AT+CREG=0", Match::new(b"OK", 0)),      // 6
            Request::expect(b"AT+CGSN", Match::new(b"", 0)),          // 7: IMEI line
            Request::blank(Match::new(b"OK", 0)),                     // 8: trailing OK
            Request::expect(b"AT+CGMM", Match::new(b"", 0)),          // 9: model line
            Request::blank(Match::new(b"OK", 0)),                     // 10: trailing OK
            Request::expect(
                b"AT+CMUX=0,0,5,127,10,3,30,10,2",
                Match::new(b"OK", 0),
            ), // 11
            Request::no_response(b"", Duration::from_millis(100)),    // 12: let CMUX settle
        ],
        &[b"ERROR"],
        Duration::from_secs(10),
    )
}

/// `on_match` index at which `net_stat_script` reports `+CREG`.
pub const NET_STAT_CREG_INDEX: usize = 0;
/// `on_match` index at which `net_stat_script` reports `+CGATT`.
pub const NET_STAT_CGATT_INDEX: usize = 2;

/// Polled on DLCI 1 while waiting for registration: access technology and
/// registration status, then packet-service attach state. Ground truth
/// interleaves a blank `OK` row after each query, for modems that emit the
/// data line and the trailing `OK` as two separate terminated lines.
pub const fn net_stat_script() -> Script<'static> {
    Script::new(
        &[
            Request::expect(b"AT+CREG?", Match::new(b"+CREG: ", b',')),
            Request::blank(Match::new(b"OK", 0)),
            Request::expect(b"AT+CGATT?", Match::new(b"+CGATT: ", 0)),
            Request::blank(Match::new(b"OK", 0)),
        ],
        &[b"ERROR"],
        Duration::from_secs(5),
    )
}

/// PDP context id used for the single always-on context this driver dials.
const CID: u8 = 1;
/// Big enough for `AT+CGDCONT=1,"IP","<99 bytes>","<64 bytes>","<64 bytes>"`.
const CGDCONT_BUF_LEN: usize = 256;

/// Scratch storage for [`connect_script`], owned by the caller so the
/// script it builds can borrow from it without an allocator.
pub struct ConnectScratch {
    line: [u8; CGDCONT_BUF_LEN],
    requests: [Request<'static>; 2],
}

impl ConnectScratch {
    pub const fn new() -> Self {
        Self {
            line: [0; CGDCONT_BUF_LEN],
            requests: [
                Request::no_response(b"", Duration::from_ticks(0)),
                Request::no_response(b"", Duration::from_ticks(0)),
            ],
        }
    }

    /// Builds the dial script: define the PDP context with the configured
    /// APN/credentials, then dial it.
    ///
    /// `atat`'s command encoder writes a trailing `\r\n` that the chat
    /// engine's own `send_line` would otherwise duplicate, so the encoded
    /// line is trimmed of its terminator before it becomes a `Request`.
    pub fn build<'a>(&'a mut self, config: &impl CellularConfig) -> Script<'a> {
        let cmd = SetPDPContextDefinition {
            cid: CID,
            pdp_type: "IP",
            apn: config.apn(),
            username: config.username(),
            password: config.password(),
        };
        let n = cmd.write(&mut self.line);
        let mut end = n;
        while end > 0 && matches!(self.line[end - 1], b'\r' | b'\n') {
            end -= 1;
        }
        let cgdcont_line: &'a [u8] = &self.line[..end];

        self.requests[0] = Request::expect(cgdcont_line, Match::new(b"OK", 0));
        self.requests[1] = Request::expect(b"ATD*99#", Match::new(b"CONNECT", 0));

        Script::new(
            &self.requests[..],
            &[b"ERROR", b"BUSY", b"NO ANSWER", b"NO CARRIER", b"NO DIALTONE"],
            Duration::from_secs(15),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedConfig;

    impl CellularConfig for FixedConfig {
        type PowerPin = crate::config::NoPin;
        type ResetPin = crate::config::NoPin;

        fn power_pin(&mut self) -> Option<&mut Self::PowerPin> {
            None
        }

        fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
            None
        }

        fn apn(&self) -> &str {
            "internet"
        }

        fn username(&self) -> &str {
            "user"
        }

        fn password(&self) -> &str {
            "pass"
        }
    }

    #[test]
    fn cgdcont_line_has_no_duplicated_terminator() {
        let mut scratch = ConnectScratch::new();
        let script = scratch.build(&FixedConfig);
        let cgdcont = script.requests[0].send;
        assert!(!cgdcont.ends_with(b"\r"));
        assert!(!cgdcont.ends_with(b"\n"));
        assert_eq!(
            cgdcont,
            b"AT+CGDCONT=1,\"IP\",\"internet\",\"user\",\"pass\""
        );
    }

    #[test]
    fn init_script_reports_imei_at_documented_index() {
        let script = init_script();
        assert_eq!(script.requests[INIT_IMEI_INDEX].send, b"AT+CGSN");
        assert_eq!(script.requests[INIT_MODEL_INDEX].send, b"AT+CGMM");
    }
}
