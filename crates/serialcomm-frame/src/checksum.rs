//! Longitudinal redundancy check over frame payloads.
//!
//! The check byte is the 8-bit sum of the payload, complemented, plus two.
//! It catches single-byte corruption and some multi-byte patterns. It is not
//! an integrity guarantee against anyone who wants to forge a frame.

/// Compute the check byte for a complete payload.
///
/// ```
/// use serialcomm_frame::checksum;
///
/// assert_eq!(checksum(&[]), 0x01);
/// assert_eq!(checksum(&[0x00, 0x00, 0x04, 0xD2]), 0x2B);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut lrc = Lrc::new();
    lrc.update(bytes);
    lrc.finish()
}

/// Running checksum for a payload that arrives in pieces.
///
/// Feeding the payload through any number of [`update`](Lrc::update) calls
/// gives the same [`finish`](Lrc::finish) value as [`checksum`] over the whole
/// payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lrc {
    sum: u8,
}

impl Lrc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.sum = bytes.iter().fold(self.sum, |acc, b| acc.wrapping_add(*b));
    }

    /// The check byte for everything fed so far.
    pub fn finish(&self) -> u8 {
        (self.sum ^ 0xFF).wrapping_add(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(checksum(&[]), 0x01);
    }

    #[test]
    fn timestamp_1234_example() {
        assert_eq!(checksum(&[0x00, 0x00, 0x04, 0xD2]), 0x2B);
    }

    #[test]
    fn sum_wraps_modulo_256() {
        // 0xFF + 0x02 = 0x101 -> 0x01; !0x01 = 0xFE; +2 = 0x00
        assert_eq!(checksum(&[0xFF, 0x02]), 0x00);
        // sum 0xFE -> !0xFE = 0x01 -> 0x03
        assert_eq!(checksum(&[0xFE]), 0x03);
        // sum 0xFF -> 0x00 + 2
        assert_eq!(checksum(&[0xFF]), 0x02);
    }

    #[test]
    fn single_byte_corruption_changes_checksum() {
        let payload = [0x10, 0x20, 0x30, 0x40];
        let good = checksum(&payload);
        for i in 0..payload.len() {
            let mut corrupted = payload;
            corrupted[i] ^= 0x01;
            assert_ne!(checksum(&corrupted), good, "flip at index {i}");
        }
    }

    #[test]
    fn incremental_matches_one_shot() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(700).collect();
        let mut lrc = Lrc::new();
        for chunk in payload.chunks(7) {
            lrc.update(chunk);
        }
        assert_eq!(lrc.finish(), checksum(&payload));
    }

    #[test]
    fn deterministic() {
        let payload = b"\x00\x05hello";
        assert_eq!(checksum(payload), checksum(payload));
    }
}
