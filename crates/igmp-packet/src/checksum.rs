//! The Internet checksum (RFC 1071) as used by IGMP and the IPv4 header.
//!
//! The word summing and folding is derived from [`libpnet`] which is available under the Apache 2.0
//! license.
//!
//! [`libpnet`]: https://github.com/libpnet/libpnet

/// Calculate the checksum for an `IGMP` message.
///
/// The checksum field (the second 16-bit word) is treated as zero whatever its stored value.
#[must_use]
pub fn igmp_checksum(data: &[u8]) -> u16 {
    checksum(data, 1)
}

/// Calculate the checksum for an `Ipv4` header.
#[must_use]
pub fn ipv4_header_checksum(data: &[u8]) -> u16 {
    checksum(data, 5)
}

fn checksum(data: &[u8], ignore_word: usize) -> u16 {
    if data.is_empty() {
        return 0;
    }
    let sum = sum_be_words(data, ignore_word);
    finalize_checksum(sum)
}

fn sum_be_words(data: &[u8], ignore_word: usize) -> u32 {
    let mut words = data.chunks_exact(2);
    let mut sum = words
        .by_ref()
        .enumerate()
        .filter(|(i, _)| *i != ignore_word)
        .map(|(_, word)| u32::from(u16::from_be_bytes([word[0], word[1]])))
        .fold(0_u32, u32::wrapping_add);
    if let [last] = words.remainder() {
        if data.len() / 2 != ignore_word {
            sum = sum.wrapping_add(u32::from(*last) << 8);
        }
    }
    sum
}

const fn finalize_checksum(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !sum as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test]
    fn test_empty_checksum() {
        assert_eq!(0, ipv4_header_checksum(&[]));
        assert_eq!(0, igmp_checksum(&[]));
    }

    #[test]
    fn test_odd_length() {
        assert_eq!(65535, ipv4_header_checksum(&[0x00]));
        assert_eq!(0xeeff, igmp_checksum(&[0x11]));
    }

    #[test_case(&hex!("11 00 00 00 00 00 00 00"), 0xeeff; "igmpv1 query")]
    #[test_case(&hex!("12 00 00 00 e0 00 00 fc"), 0x0d03; "igmpv1 report")]
    #[test_case(&hex!("11 64 00 00 00 00 00 00"), 0xee9b; "igmpv2 general query")]
    #[test_case(&hex!("17 00 00 00 ef ff ff fa"), 0xf904; "igmpv2 leave group")]
    #[test_case(&hex!("16 00 00 00 e0 00 00 01"), 0x09fe; "igmpv2 report")]
    #[test_case(&hex!("11 6f 00 00 e0 00 00 01"), 0x0e8f; "igmpv2 group specific query")]
    fn test_igmp_checksum(bytes: &[u8], expected: u16) {
        assert_eq!(expected, igmp_checksum(bytes));
    }

    #[test]
    fn test_igmp_checksum_ignores_stored_value() {
        let zeroed = hex!("12 00 00 00 e0 00 00 fc");
        let stored = hex!("12 00 0d 03 e0 00 00 fc");
        let garbage = hex!("12 00 ab cd e0 00 00 fc");
        assert_eq!(igmp_checksum(&zeroed), igmp_checksum(&stored));
        assert_eq!(igmp_checksum(&zeroed), igmp_checksum(&garbage));
    }

    #[test]
    fn test_igmp_checksum_folds_carries() {
        let bytes = hex!("ff ff 00 00 ff ff ff ff ff ff ff ff");
        assert_eq!(0x0000, igmp_checksum(&bytes));
    }

    #[test]
    fn test_ipv4_header_checksum() {
        let bytes = hex!("45 00 0f fc 38 c0 00 00 40 01 2e 3b 0a 00 00 02 0a 00 00 01");
        assert_eq!(0x1e3f, ipv4_header_checksum(&bytes));
    }
}
