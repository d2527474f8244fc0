//! IGMP wire format parsing and building.
//!
//! The following messages are supported:
//! - `IGMPv1` Membership Query and Membership Report
//! - `IGMPv2` Membership Query, Membership Report and Leave Group
//! - `IGMPv3` Membership Query and Membership Report (with group records)
//!
//! A minimal `IPv4` header view is provided so that IGMP messages can be dispatched from a captured
//! IP datagram.
//!
//! # Endianness
//!
//! The internal representation is held in network byte order (big-endian) and
//! all accessor methods take and return data in host byte order, converting as
//! necessary for the given architecture.
//!
//! # Views
//!
//! Every message type is a view over a caller owned byte slice. No bytes are
//! copied: getters read the slice and setters write it immediately. A view
//! created with `new` over a mutable slice initializes the bytes the protocol
//! pins for that message (type, reserved bits, fixed fields) so a zeroed
//! buffer becomes a structurally valid, though unchecksummed, message.
//!
//! # Example
//!
//! The following example dispatches an `IGMPv2` query and asserts its fields:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use igmp_packet::igmp::{parse_igmp_message, IgmpMessage};
//! use igmp_packet::IpProtocol;
//! use std::time::Duration;
//!
//! let buf = hex_literal::hex!("11 64 ee 9b 00 00 00 00");
//! let message = parse_igmp_message(&buf, IpProtocol::Igmp, 28, 20)?;
//! let IgmpMessage::V2Query(query) = message else {
//!     anyhow::bail!("expected an IGMPv2 query");
//! };
//! assert_eq!(Duration::from_secs(10), query.get_max_response_time().duration());
//! assert!(query.is_valid_checksum());
//! # Ok(())
//! # }
//! ```
//!
//! The following example builds an `IGMPv2` Leave Group message:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use igmp_packet::igmp::v2::LeaveGroupPacket;
//! use std::net::Ipv4Addr;
//!
//! let mut buf = [0; LeaveGroupPacket::minimum_packet_size()];
//! let mut leave = LeaveGroupPacket::new(&mut buf)?;
//! leave.set_group_address(Ipv4Addr::new(239, 255, 255, 250));
//! leave.set_checksum(leave.calculate_checksum());
//! assert_eq!(leave.packet(), &hex_literal::hex!("17 00 f9 04 ef ff ff fa"));
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod buffer;

/// Codec errors.
pub mod error;

/// Functions for calculating network checksums.
pub mod checksum;

/// `IGMP` messages.
pub mod igmp;

/// `IPv4` packets.
pub mod ipv4;

/// The IP packet next layer protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    Igmp,
    Udp,
    Tcp,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::Igmp => 2,
            Self::Udp => 17,
            Self::Tcp => 6,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            2 => Self::Igmp,
            17 => Self::Udp,
            6 => Self::Tcp,
            p => Self::Other(p),
        }
    }
}

/// Format a payload as a hexadecimal string.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, IpProtocol::Icmp)]
    #[test_case(2, IpProtocol::Igmp)]
    #[test_case(6, IpProtocol::Tcp)]
    #[test_case(17, IpProtocol::Udp)]
    #[test_case(103, IpProtocol::Other(103))]
    fn test_ip_protocol(id: u8, expected: IpProtocol) {
        assert_eq!(expected, IpProtocol::from(id));
        assert_eq!(id, expected.id());
    }

    #[test]
    fn test_fmt_payload() {
        assert_eq!("", fmt_payload(&[]));
        assert_eq!("11 64 ee 9b", fmt_payload(&[0x11, 0x64, 0xee, 0x9b]));
    }
}
