//! PPP FCS-16 (RFC 1662) used as the HDLC frame check sequence.
//!
//! The meter transmits the one's complement of the computed FCS in
//! big-endian order; [`wire_fcs`] produces the value in exactly that form
//! so the deframer can compare it against the stored trailer directly.

use once_cell::sync::Lazy;

/// Initial FCS accumulator value.
pub const FCS_INIT: u16 = 0xFFFF;

/// Reflected CRC-16 polynomial (x^16 + x^12 + x^5 + 1).
const FCS_POLY: u16 = 0x8408;

static FCS_TABLE: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut table = [0u16; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut v = i as u16;
        for _ in 0..8 {
            v = if v & 1 != 0 { (v >> 1) ^ FCS_POLY } else { v >> 1 };
        }
        *entry = v;
    }
    table
});

/// Update the FCS accumulator over `data`, table-driven.
pub fn pppfcs16(mut fcs: u16, data: &[u8]) -> u16 {
    for &byte in data {
        fcs = (fcs >> 8) ^ FCS_TABLE[((fcs ^ byte as u16) & 0xFF) as usize];
    }
    fcs
}

/// Compute the FCS of `data` as it appears on the wire: one's complement
/// of the accumulator, byte-swapped to match the big-endian trailer.
pub fn wire_fcs(data: &[u8]) -> u16 {
    (pppfcs16(FCS_INIT, data) ^ 0xFFFF).swap_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // CRC-16/X-25 check value for "123456789" is 0x906E.
        assert_eq!(pppfcs16(FCS_INIT, b"123456789") ^ 0xFFFF, 0x906E);
    }

    #[test]
    fn test_good_fcs_constant() {
        // Appending the complemented FCS (LE) to the data yields the
        // residual 0xF0B8, per RFC 1662.
        let mut data = b"123456789".to_vec();
        let fcs = pppfcs16(FCS_INIT, &data) ^ 0xFFFF;
        data.push((fcs & 0xFF) as u8);
        data.push((fcs >> 8) as u8);
        assert_eq!(pppfcs16(FCS_INIT, &data), 0xF0B8);
    }

    #[test]
    fn test_wire_fcs_matches_captured_frame() {
        // First frame of the captured meter push: header + information,
        // FCS trailer 0xB3 0xF2.
        let frame = crate::util::hex::hex_to_bytes(concat!(
            "a084ceff0313128be6e700e04000010000700f000232240c07e60b0b0514251e",
            "ff800000020f010f020412002809060008190900ff0f02120000020412002809",
            "060008190900ff0f01120000020412000109060000600100ff0f021200000204",
            "12000309060100010700ff0f02120000020412000309060100020700ff0f0212",
            "0000",
        ));
        assert_eq!(wire_fcs(&frame), 0xB3F2);
    }
}
