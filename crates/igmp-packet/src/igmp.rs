use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::ipv4::Ipv4Packet;
use crate::IpProtocol;
use std::net::Ipv4Addr;
use tracing::instrument;

/// `IGMPv3` group records.
pub mod group_record;

/// Scalar field types shared by the `IGMP` messages.
pub mod types;

pub mod v1;
pub mod v2;
pub mod v3;

pub use group_record::{GroupRecord, GroupRecords};
pub use types::{
    mant_exp, AuxiliaryWord, IgmpType, MaxResponseCode, QueryIntervalCode, RecordType,
    ResponseTime, RobustnessVariable,
};

pub(crate) const TYPE_OFFSET: usize = 0;
pub(crate) const SECOND_BYTE_OFFSET: usize = 1;
pub(crate) const CHECKSUM_OFFSET: usize = 2;
pub(crate) const GROUP_ADDRESS_OFFSET: usize = 4;

/// The size of the header shared by every `IGMP` message.
pub const HEADER_SIZE: usize = 8;

pub(crate) fn check_size(name: &str, minimum: usize, provided: usize) -> Result<()> {
    if provided >= minimum {
        Ok(())
    } else {
        Err(Error::InsufficientPacketBuffer(
            String::from(name),
            minimum,
            provided,
        ))
    }
}

pub(crate) fn check_type(expected: IgmpType, packet: &[u8]) -> Result<()> {
    match packet[TYPE_OFFSET] {
        found if found == expected.id() => Ok(()),
        found => Err(Error::TypeMismatch(expected.id(), found)),
    }
}

/// A classified `IGMP` message.
#[derive(Debug)]
pub enum IgmpMessage<'a> {
    V1Query(v1::MembershipQueryPacket<'a>),
    V1Report(v1::MembershipReportPacket<'a>),
    V2Query(v2::MembershipQueryPacket<'a>),
    V2Report(v2::MembershipReportPacket<'a>),
    V2LeaveGroup(v2::LeaveGroupPacket<'a>),
    V3Query(v3::MembershipQueryPacket<'a>),
    V3Report(v3::MembershipReportPacket<'a>),
}

macro_rules! with_packet {
    ($message:expr, $packet:ident => $body:expr) => {
        match $message {
            IgmpMessage::V1Query($packet) => $body,
            IgmpMessage::V1Report($packet) => $body,
            IgmpMessage::V2Query($packet) => $body,
            IgmpMessage::V2Report($packet) => $body,
            IgmpMessage::V2LeaveGroup($packet) => $body,
            IgmpMessage::V3Query($packet) => $body,
            IgmpMessage::V3Report($packet) => $body,
        }
    };
}

impl IgmpMessage<'_> {
    #[must_use]
    pub fn igmp_type(&self) -> IgmpType {
        with_packet!(self, p => p.get_igmp_type())
    }

    /// The `IGMP` version which defines this message.
    #[must_use]
    pub const fn version(&self) -> u8 {
        match self {
            Self::V1Query(_) | Self::V1Report(_) => 1,
            Self::V2Query(_) | Self::V2Report(_) | Self::V2LeaveGroup(_) => 2,
            Self::V3Query(_) | Self::V3Report(_) => 3,
        }
    }

    #[must_use]
    pub fn get_checksum(&self) -> u16 {
        with_packet!(self, p => p.get_checksum())
    }

    /// The group address, `None` for messages without one.
    #[must_use]
    pub fn get_group_address(&self) -> Option<Ipv4Addr> {
        match self {
            Self::V1Query(p) => Some(p.get_group_address()),
            Self::V1Report(p) => Some(p.get_group_address()),
            Self::V2Query(p) => Some(p.get_group_address()),
            Self::V2Report(p) => Some(p.get_group_address()),
            Self::V2LeaveGroup(p) => Some(p.get_group_address()),
            Self::V3Query(p) => Some(p.get_group_address()),
            Self::V3Report(_) => None,
        }
    }

    #[must_use]
    pub fn calculate_checksum(&self) -> u16 {
        with_packet!(self, p => p.calculate_checksum())
    }

    #[must_use]
    pub fn is_valid_checksum(&self) -> bool {
        with_packet!(self, p => p.is_valid_checksum())
    }

    /// The size of the message in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        with_packet!(self, p => p.size())
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        with_packet!(self, p => p.packet())
    }

    /// # Panics
    ///
    /// Panics if the message was parsed from an immutable slice.
    pub fn set_checksum(&mut self, val: u16) {
        with_packet!(self, p => p.set_checksum(val));
    }

    /// Set the group address where the message carries a mutable one.
    ///
    /// # Panics
    ///
    /// Panics if the message was parsed from an immutable slice.
    pub fn set_group_address(&mut self, val: Ipv4Addr) -> Result<()> {
        match self {
            Self::V1Query(_) => Err(Error::UnsupportedOperation(
                "IGMPv1 Membership Query group address is always 0.0.0.0",
            )),
            Self::V3Report(_) => Err(Error::UnsupportedOperation(
                "IGMPv3 Membership Report has no group address",
            )),
            Self::V1Report(p) => {
                p.set_group_address(val);
                Ok(())
            }
            Self::V2Query(p) => {
                p.set_group_address(val);
                Ok(())
            }
            Self::V2Report(p) => {
                p.set_group_address(val);
                Ok(())
            }
            Self::V2LeaveGroup(p) => {
                p.set_group_address(val);
                Ok(())
            }
            Self::V3Query(p) => {
                p.set_group_address(val);
                Ok(())
            }
        }
    }

    /// Set the `IGMPv2` Max Resp Time, only an `IGMPv2` query carries one.
    ///
    /// # Panics
    ///
    /// Panics if the message was parsed from an immutable slice.
    pub fn set_max_response_time(&mut self, val: ResponseTime) -> Result<()> {
        match self {
            Self::V2Query(p) => {
                p.set_max_response_time(val);
                Ok(())
            }
            Self::V1Query(_) | Self::V1Report(_) => Err(Error::UnsupportedOperation(
                "IGMPv1 messages have no max response time",
            )),
            Self::V2Report(_) => Err(Error::UnsupportedOperation(
                "IGMPv2 Membership Report response time is always 0",
            )),
            Self::V2LeaveGroup(_) => Err(Error::UnsupportedOperation(
                "IGMPv2 Leave Group response time is always 0",
            )),
            Self::V3Query(_) => Err(Error::UnsupportedOperation(
                "IGMPv3 Membership Query response time is a max response code",
            )),
            Self::V3Report(_) => Err(Error::UnsupportedOperation(
                "IGMPv3 Membership Report has no response time",
            )),
        }
    }
}

/// Classify the `IGMP` message carried in an `IPv4` payload.
///
/// `total_length` and `header_size` are taken from the `IPv4` header. The returned view covers
/// exactly `total_length - header_size` bytes of `payload`, any trailing link layer padding is
/// excluded. The checksum is not verified.
#[instrument(skip(payload), level = "trace")]
pub fn parse_igmp_message(
    payload: &[u8],
    protocol: IpProtocol,
    total_length: usize,
    header_size: usize,
) -> Result<IgmpMessage<'_>> {
    let igmp_size = igmp_size(payload.len(), protocol, total_length, header_size)?;
    let message = classify(Buffer::Immutable(&payload[..igmp_size]))?;
    tracing::debug!(igmp_type = %message.igmp_type(), version = message.version(), igmp_size);
    Ok(message)
}

/// Classify the `IGMP` message carried in a mutable `IPv4` payload.
///
/// Unlike the `new` constructors of the message types no bytes are initialized.
#[instrument(skip(payload), level = "trace")]
pub fn parse_igmp_message_mut(
    payload: &mut [u8],
    protocol: IpProtocol,
    total_length: usize,
    header_size: usize,
) -> Result<IgmpMessage<'_>> {
    let igmp_size = igmp_size(payload.len(), protocol, total_length, header_size)?;
    let message = classify(Buffer::Mutable(&mut payload[..igmp_size]))?;
    tracing::debug!(igmp_type = %message.igmp_type(), version = message.version(), igmp_size);
    Ok(message)
}

/// Classify the `IGMP` message carried in an `IPv4` packet.
///
/// A header length shorter than the fixed `IPv4` header or longer than the packet is
/// `MalformedLength`.
pub fn parse_ipv4_packet<'a>(ipv4: &'a Ipv4Packet<'_>) -> Result<IgmpMessage<'a>> {
    let total_length = usize::from(ipv4.get_total_length());
    let header_size = ipv4.header_size();
    if header_size < Ipv4Packet::minimum_packet_size() || header_size > ipv4.packet().len() {
        tracing::debug!(total_length, header_size, "malformed IPv4 header length");
        return Err(Error::MalformedLength(total_length, header_size));
    }
    parse_igmp_message(ipv4.payload(), ipv4.get_protocol(), total_length, header_size)
}

fn igmp_size(
    available: usize,
    protocol: IpProtocol,
    total_length: usize,
    header_size: usize,
) -> Result<usize> {
    if protocol != IpProtocol::Igmp {
        tracing::debug!(protocol = protocol.id(), "payload is not IGMP");
        return Err(Error::ProtocolMismatch(protocol.id()));
    }
    let igmp_size = total_length
        .checked_sub(header_size)
        .filter(|size| *size >= HEADER_SIZE && size % 4 == 0)
        .ok_or_else(|| {
            tracing::debug!(total_length, header_size, "malformed IGMP message length");
            Error::MalformedLength(total_length, header_size)
        })?;
    check_size("IgmpMessage", igmp_size, available)?;
    Ok(igmp_size)
}

fn classify(buf: Buffer<'_>) -> Result<IgmpMessage<'_>> {
    let igmp_type = IgmpType::try_from(buf.read(TYPE_OFFSET))?;
    Ok(match igmp_type {
        IgmpType::MembershipQuery if buf.read(SECOND_BYTE_OFFSET) == 0 => {
            IgmpMessage::V1Query(v1::MembershipQueryPacket::bind(buf))
        }
        IgmpType::MembershipQuery if buf.len() == HEADER_SIZE => {
            IgmpMessage::V2Query(v2::MembershipQueryPacket::bind(buf))
        }
        IgmpType::MembershipQuery => IgmpMessage::V3Query(v3::MembershipQueryPacket::bind(buf)),
        IgmpType::V1MembershipReport => {
            IgmpMessage::V1Report(v1::MembershipReportPacket::bind(buf))
        }
        IgmpType::V2MembershipReport => {
            IgmpMessage::V2Report(v2::MembershipReportPacket::bind(buf))
        }
        IgmpType::LeaveGroup => IgmpMessage::V2LeaveGroup(v2::LeaveGroupPacket::bind(buf)),
        IgmpType::V3MembershipReport => {
            IgmpMessage::V3Report(v3::MembershipReportPacket::bind(buf))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::time::Duration;
    use test_case::test_case;

    fn parse(payload: &[u8]) -> Result<IgmpMessage<'_>> {
        parse_igmp_message(payload, IpProtocol::Igmp, 20 + payload.len(), 20)
    }

    #[test_case(&hex!("11 00 ee ff 00 00 00 00"), IgmpType::MembershipQuery, 1; "v1 query")]
    #[test_case(&hex!("12 00 0d 03 e0 00 00 fc"), IgmpType::V1MembershipReport, 1; "v1 report")]
    #[test_case(&hex!("11 64 ee 9b 00 00 00 00"), IgmpType::MembershipQuery, 2; "v2 query")]
    #[test_case(&hex!("16 00 09 fe e0 00 00 01"), IgmpType::V2MembershipReport, 2; "v2 report")]
    #[test_case(&hex!("17 00 f9 04 ef ff ff fa"), IgmpType::LeaveGroup, 2; "v2 leave group")]
    #[test_case(&hex!("11 18 ec d3 00 00 00 00 02 14 00 00"), IgmpType::MembershipQuery, 3; "v3 query")]
    #[test_case(&hex!("22 00 e3 38 00 00 00 01 04 00 00 00 ef c3 07 02"), IgmpType::V3MembershipReport, 3; "v3 report")]
    fn test_classify(payload: &[u8], igmp_type: IgmpType, version: u8) {
        let message = parse(payload).unwrap();
        assert_eq!(igmp_type, message.igmp_type());
        assert_eq!(version, message.version());
        assert_eq!(payload.len(), message.size());
        assert!(message.is_valid_checksum());
    }

    #[test]
    fn test_v1_query_with_trailing_bytes() {
        let payload = hex!("11 00 ee ff 00 00 00 00 00 00 00 00");
        let message = parse(&payload).unwrap();
        assert!(matches!(message, IgmpMessage::V1Query(_)));
        assert_eq!(8, message.size());
    }

    #[test]
    fn test_excludes_padding() {
        let payload = hex!("16 00 09 fe e0 00 00 01 00 00 00 00 00 00");
        let message = parse_igmp_message(&payload, IpProtocol::Igmp, 32, 24).unwrap();
        assert!(matches!(message, IgmpMessage::V2Report(_)));
        assert_eq!(&payload[..8], message.packet());
    }

    #[test]
    fn test_protocol_mismatch() {
        let payload = hex!("11 64 ee 9b 00 00 00 00");
        assert_eq!(
            Error::ProtocolMismatch(17),
            parse_igmp_message(&payload, IpProtocol::Udp, 28, 20).unwrap_err()
        );
    }

    #[test_case(25, 20; "too short")]
    #[test_case(30, 20; "not word aligned")]
    #[test_case(20, 24; "header exceeds total length")]
    fn test_malformed_length(total_length: usize, header_size: usize) {
        let payload = [0x11; 16];
        assert_eq!(
            Error::MalformedLength(total_length, header_size),
            parse_igmp_message(&payload, IpProtocol::Igmp, total_length, header_size)
                .unwrap_err()
        );
    }

    #[test]
    fn test_truncated_payload() {
        let payload = hex!("11 64 ee 9b 00 00 00 00");
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("IgmpMessage"), 12, 8),
            parse_igmp_message(&payload, IpProtocol::Igmp, 32, 20).unwrap_err()
        );
    }

    #[test]
    fn test_unknown_type() {
        let payload = hex!("13 00 00 00 00 00 00 00");
        assert_eq!(
            Error::UnknownEnumValue("IgmpType", 0x13),
            parse(&payload).unwrap_err()
        );
    }

    #[test]
    fn test_group_address() {
        let v2 = hex!("17 00 f9 04 ef ff ff fa");
        let v3 = hex!("22 00 e3 38 00 00 00 01 04 00 00 00 ef c3 07 02");
        assert_eq!(
            Some(Ipv4Addr::new(239, 255, 255, 250)),
            parse(&v2).unwrap().get_group_address()
        );
        assert_eq!(None, parse(&v3).unwrap().get_group_address());
    }

    #[test_case(&hex!("11 00 ee ff 00 00 00 00"); "v1 query")]
    #[test_case(&hex!("22 00 e3 38 00 00 00 01 04 00 00 00 ef c3 07 02"); "v3 report")]
    fn test_set_group_address_unsupported(payload: &[u8]) {
        let mut buf = payload.to_vec();
        let total_length = 20 + buf.len();
        let mut message =
            parse_igmp_message_mut(&mut buf, IpProtocol::Igmp, total_length, 20).unwrap();
        let err = message
            .set_group_address(Ipv4Addr::new(224, 0, 0, 252))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
        assert_eq!(payload, message.packet());
    }

    #[test_case(&hex!("11 00 ee ff 00 00 00 00"); "v1 query")]
    #[test_case(&hex!("12 00 0d 03 e0 00 00 fc"); "v1 report")]
    #[test_case(&hex!("16 00 09 fe e0 00 00 01"); "v2 report")]
    #[test_case(&hex!("17 00 f9 04 ef ff ff fa"); "v2 leave group")]
    #[test_case(&hex!("11 18 ec d3 00 00 00 00 02 14 00 00"); "v3 query")]
    #[test_case(&hex!("22 00 e3 38 00 00 00 01 04 00 00 00 ef c3 07 02"); "v3 report")]
    fn test_set_max_response_time_unsupported(payload: &[u8]) {
        let mut buf = payload.to_vec();
        let total_length = 20 + buf.len();
        let mut message =
            parse_igmp_message_mut(&mut buf, IpProtocol::Igmp, total_length, 20).unwrap();
        let err = message
            .set_max_response_time(ResponseTime::new(100))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
        assert_eq!(payload, message.packet());
    }

    #[test]
    fn test_leave_group_response_time_reason() {
        let mut buf = hex!("17 00 f9 04 ef ff ff fa");
        let mut message = parse_igmp_message_mut(&mut buf, IpProtocol::Igmp, 28, 20).unwrap();
        assert_eq!(
            Error::UnsupportedOperation("IGMPv2 Leave Group response time is always 0"),
            message.set_max_response_time(ResponseTime::ZERO).unwrap_err()
        );
    }

    #[test]
    fn test_mutate_parsed_v2_query() {
        let mut buf = hex!("11 64 ee 9b 00 00 00 00");
        let mut message = parse_igmp_message_mut(&mut buf, IpProtocol::Igmp, 28, 20).unwrap();
        let time = ResponseTime::from_duration(Duration::from_millis(11_100)).unwrap();
        message.set_max_response_time(time).unwrap();
        message
            .set_group_address(Ipv4Addr::new(224, 0, 0, 1))
            .unwrap();
        assert!(!message.is_valid_checksum());
        message.set_checksum(message.calculate_checksum());
        assert_eq!(0x0e8f, message.get_checksum());
        assert_eq!(&hex!("11 6f 0e 8f e0 00 00 01"), message.packet());
    }

    #[test]
    fn test_parse_ipv4_packet() {
        let buf = hex!(
            "
            46 c0 00 20 00 00 40 00 01 02 41 04 c0 a8 01 0a
            e0 00 00 16 94 04 00 00 16 00 09 fe e0 00 00 01
            00 00 00 00 00 00 00 00 00 00 00 00 00 00
            "
        );
        let ipv4 = Ipv4Packet::new_view(&buf).unwrap();
        let message = parse_ipv4_packet(&ipv4).unwrap();
        let IgmpMessage::V2Report(report) = message else {
            panic!("expected IGMPv2 report");
        };
        assert_eq!(Ipv4Addr::new(224, 0, 0, 1), report.get_group_address());
        assert!(report.is_valid_checksum());
    }

    #[test_case(0x40, 0; "header length zero")]
    #[test_case(0x44, 16; "header length below minimum")]
    #[test_case(0x4f, 60; "header length beyond packet")]
    fn test_parse_ipv4_packet_bad_header_length(first_byte: u8, header_size: usize) {
        let mut buf = hex!(
            "
            45 c0 00 1c 00 00 40 00 01 02 d6 71 c0 a8 01 0a
            e0 00 00 16 16 00 09 fe e0 00 00 01
            "
        );
        buf[0] = first_byte;
        let ipv4 = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(
            Error::MalformedLength(28, header_size),
            parse_ipv4_packet(&ipv4).unwrap_err()
        );
    }
}
