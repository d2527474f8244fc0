use crate::buffer::Buffer;
use crate::checksum::ipv4_header_checksum;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_OFFSET: usize = 0;
const IHL_OFFSET: usize = 0;
const TOTAL_LENGTH_OFFSET: usize = 2;
const TIME_TO_LIVE_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const CHECKSUM_OFFSET: usize = 10;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;

/// Represents a read only view of an IPv4 Packet.
///
/// Only the fields needed to locate and dispatch an encapsulated IGMP message are exposed.
///
/// The internal representation is held in network byte order (big-endian) and all accessor methods
/// take and return data in host byte order, converting as necessary for the given architecture.
pub struct Ipv4Packet<'a> {
    buf: Buffer<'a>,
}

impl<'a> Ipv4Packet<'a> {
    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Immutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv4Packet"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        (self.buf.read(VERSION_OFFSET) & 0xf0) >> 4
    }

    /// The header length in 32-bit words.
    #[must_use]
    pub fn get_header_length(&self) -> u8 {
        self.buf.read(IHL_OFFSET) & 0xf
    }

    /// The header length in bytes.
    #[must_use]
    pub fn header_size(&self) -> usize {
        usize::from(self.get_header_length()) * 4
    }

    #[must_use]
    pub fn get_total_length(&self) -> u16 {
        self.buf.get_u16(TOTAL_LENGTH_OFFSET)
    }

    #[must_use]
    pub fn get_ttl(&self) -> u8 {
        self.buf.read(TIME_TO_LIVE_OFFSET)
    }

    #[must_use]
    pub fn get_protocol(&self) -> IpProtocol {
        IpProtocol::from(self.buf.read(PROTOCOL_OFFSET))
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        self.buf.get_u16(CHECKSUM_OFFSET)
    }

    #[must_use]
    pub fn get_source(&self) -> Ipv4Addr {
        self.buf.get_ipv4(SOURCE_OFFSET)
    }

    #[must_use]
    pub fn get_destination(&self) -> Ipv4Addr {
        self.buf.get_ipv4(DESTINATION_OFFSET)
    }

    /// Calculate the header checksum over the header (including options).
    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        let end = self.header_size().min(self.buf.len());
        ipv4_header_checksum(&self.buf.as_slice()[..end])
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        self.get_checksum() == self.calculate_checksum()
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Everything after the header, including any link layer padding.
    ///
    /// A header length below the minimum is read as the minimum and one beyond the buffer as the
    /// whole buffer.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let offset = self
            .header_size()
            .clamp(Self::minimum_packet_size(), self.buf.len());
        &self.buf.as_slice()[offset..]
    }
}

impl Debug for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.get_version())
            .field("header_length", &self.get_header_length())
            .field("total_length", &self.get_total_length())
            .field("ttl", &self.get_ttl())
            .field("protocol", &self.get_protocol())
            .field("checksum", &self.get_checksum())
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    const V1_REPORT: [u8; 28] = hex!(
        "
        45 c0 00 1c 00 00 40 00 01 02 d6 71 c0 a8 01 0a
        e0 00 00 fc 12 00 0d 03 e0 00 00 fc
        "
    );

    #[test]
    fn test_view() {
        let packet = Ipv4Packet::new_view(&V1_REPORT).unwrap();
        assert_eq!(4, packet.get_version());
        assert_eq!(5, packet.get_header_length());
        assert_eq!(20, packet.header_size());
        assert_eq!(28, packet.get_total_length());
        assert_eq!(1, packet.get_ttl());
        assert_eq!(IpProtocol::Igmp, packet.get_protocol());
        assert_eq!(Ipv4Addr::new(192, 168, 1, 10), packet.get_source());
        assert_eq!(Ipv4Addr::new(224, 0, 0, 252), packet.get_destination());
        assert_eq!(&hex!("12 00 0d 03 e0 00 00 fc"), packet.payload());
        assert!(packet.is_valid_checksum());
    }

    #[test]
    fn test_view_with_router_alert_option() {
        let buf = hex!(
            "
            46 c0 00 20 00 00 40 00 01 02 41 04 c0 a8 01 0a
            e0 00 00 16 94 04 00 00 16 00 09 fe e0 00 00 01
            "
        );
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(24, packet.header_size());
        assert_eq!(32, packet.get_total_length());
        assert_eq!(Ipv4Addr::new(224, 0, 0, 22), packet.get_destination());
        assert_eq!(&hex!("16 00 09 fe e0 00 00 01"), packet.payload());
    }

    #[test_case(0x02, IpProtocol::Igmp)]
    #[test_case(0x11, IpProtocol::Udp)]
    #[test_case(0xff, IpProtocol::Other(255))]
    fn test_protocol(id: u8, expected: IpProtocol) {
        let mut buf = V1_REPORT;
        buf[9] = id;
        assert_eq!(expected, Ipv4Packet::new_view(&buf).unwrap().get_protocol());
    }

    #[test]
    fn test_header_checksum() {
        let buf = hex!("45 00 0f fc 38 c0 00 00 40 01 00 00 0a 00 00 02 0a 00 00 01");
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert!(!packet.is_valid_checksum());
        assert_eq!(0x1e3f, packet.calculate_checksum());
    }

    #[test_case(0x40, 20; "header length below minimum")]
    #[test_case(0x4f, 28; "header length beyond buffer")]
    fn test_payload_bounds(first_byte: u8, offset: usize) {
        let mut buf = V1_REPORT;
        buf[0] = first_byte;
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(&V1_REPORT[offset..], packet.payload());
    }

    #[test]
    fn test_new_view_insufficient_buffer() {
        const SIZE: usize = Ipv4Packet::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = Ipv4Packet::new_view(&buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("Ipv4Packet"), SIZE, SIZE - 1),
            err
        );
    }
}
