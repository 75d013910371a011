//! Modem status captured from chat-script parses: identity and the two
//! registration fields the lifecycle driver polls.

use heapless::String;

/// The 15-digit IMEI, stored as digit-valued bytes (0-9), not ASCII.
pub type Imei = [u8; 15];

#[derive(Clone)]
pub struct ModemStatus {
    imei: Option<Imei>,
    hardware_model: String<64>,
    access_tech: u8,
    registration_status: u8,
    packet_service_attached: bool,
}

impl ModemStatus {
    pub const fn new() -> Self {
        Self {
            imei: None,
            hardware_model: String::new(),
            access_tech: 0,
            registration_status: 0,
            packet_service_attached: false,
        }
    }

    pub fn imei(&self) -> Option<&Imei> {
        self.imei.as_ref()
    }

    pub fn hardware_model(&self) -> &str {
        &self.hardware_model
    }

    pub fn access_tech(&self) -> u8 {
        self.access_tech
    }

    pub fn registration_status(&self) -> u8 {
        self.registration_status
    }

    pub fn packet_service_attached(&self) -> bool {
        self.packet_service_attached
    }

    /// `CREG: stat = 5` (roaming, registered) and `CGATT: 1` together mean
    /// the packet-data link can be treated as carrying traffic.
    pub fn is_registered(&self) -> bool {
        self.registration_status == 5 && self.packet_service_attached
    }

    /// Parses the ASCII-digit line emitted by `AT+CGSN` into digit-valued
    /// bytes. Any argv that isn't exactly 15 ASCII digits is ignored —
    /// mirrors ground truth silently discarding malformed `argc`.
    pub fn set_imei_from_ascii(&mut self, ascii: &[u8]) {
        if ascii.len() != 15 || !ascii.iter().all(u8::is_ascii_digit) {
            return;
        }
        let mut digits = [0u8; 15];
        for (dst, &src) in digits.iter_mut().zip(ascii) {
            *dst = src - b'0';
        }
        self.imei = Some(digits);
    }

    pub fn set_hardware_model(&mut self, ascii: &[u8]) {
        let _ = self.hardware_model.clear();
        let _ = self
            .hardware_model
            .push_str(core::str::from_utf8(ascii).unwrap_or(""));
    }

    /// `+CREG: <tech>,<stat>[,...]`. Extra trailing fields (location area
    /// code, cell id) are accepted and ignored. A line with fewer than two
    /// fields is ignored entirely.
    pub fn set_registration(&mut self, argv: &[&[u8]]) {
        if argv.len() < 2 {
            return;
        }
        if let (Some(&tech), Some(&stat)) = (single_digit(argv[0]), single_digit(argv[1])) {
            self.access_tech = tech;
            self.registration_status = stat;
        }
    }

    /// `+CGATT: <state>`.
    pub fn set_packet_service_attached(&mut self, argv: &[&[u8]]) {
        if argv.len() != 1 {
            return;
        }
        if let Some(&state) = single_digit(argv[0]) {
            self.packet_service_attached = state == 1;
        }
    }
}

fn single_digit(field: &[u8]) -> Option<&u8> {
    if field.len() == 1 && field[0].is_ascii_digit() {
        Some(&field[0])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imei_parses_fifteen_digits() {
        let mut status = ModemStatus::new();
        status.set_imei_from_ascii(b"123456789012345");
        assert_eq!(
            status.imei(),
            Some(&[1u8, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn imei_rejects_wrong_length() {
        let mut status = ModemStatus::new();
        status.set_imei_from_ascii(b"12345");
        assert_eq!(status.imei(), None);
    }

    #[test]
    fn registration_tracks_creg_fields() {
        let mut status = ModemStatus::new();
        status.set_registration(&[b"0", b"5"]);
        status.set_packet_service_attached(&[b"1"]);
        assert!(status.is_registered());
    }

    #[test]
    fn malformed_registration_argc_is_ignored() {
        let mut status = ModemStatus::new();
        status.set_registration(&[b"0"]);
        assert_eq!(status.registration_status(), 0);
        assert!(!status.is_registered());
    }
}
