//! 18.4 PDP context definition, `+CGDCONT` — the one script line that needs
//! runtime values (APN/username/password) spliced in rather than a literal
//! byte string.

use atat::atat_derive::AtatCmd;

use super::NoResponse;

/// Defines the PDP context dialled by `ATD*99#` immediately after.
///
/// Ground truth (`modem_cellular.c`) emits all five fields including
/// username/password inline on `+CGDCONT`, rather than routing them through
/// a separate authentication command — this mirrors that exactly rather
/// than the three-field form most 3GPP-pure modems document.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGDCONT", NoResponse)]
pub struct SetPDPContextDefinition<'a> {
    #[at_arg(position = 0)]
    pub cid: u8,
    #[at_arg(position = 1, len = 6)]
    pub pdp_type: &'a str,
    #[at_arg(position = 2, len = 99)]
    pub apn: &'a str,
    #[at_arg(position = 3, len = 64)]
    pub username: &'a str,
    #[at_arg(position = 4, len = 64)]
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atat::AtatCmd;

    #[test]
    fn encodes_apn_and_credentials() {
        let cmd = SetPDPContextDefinition {
            cid: 1,
            pdp_type: "IP",
            apn: "internet",
            username: "user",
            password: "pass",
        };
        let mut buf = [0u8; 64];
        let n = cmd.write(&mut buf);
        assert_eq!(
            &buf[..n],
            b"AT+CGDCONT=1,\"IP\",\"internet\",\"user\",\"pass\"\r\n"
        );
    }
}
